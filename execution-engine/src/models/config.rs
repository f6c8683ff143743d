use crate::error::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use trading::Instrument;

fn default_account_name() -> String {
    "paper".to_string()
}

fn default_balance() -> f64 {
    25_000.0
}

fn default_series_capacity() -> usize {
    1024
}

fn default_event_capacity() -> usize {
    1024
}

/// Starting state of the simulated account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    #[serde(default = "default_account_name")]
    name: String,
    #[serde(default = "default_balance")]
    balance: f64,
    /// Charged per unit of closed volume on every realization.
    #[serde(default)]
    commission: f64,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            name: default_account_name(),
            balance: default_balance(),
            commission: 0.0,
        }
    }
}

impl AccountConfig {
    pub fn new(name: impl Into<String>, balance: f64) -> Self {
        Self {
            name: name.into(),
            balance,
            commission: 0.0,
        }
    }

    pub fn with_commission(mut self, commission: f64) -> Self {
        self.commission = commission;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn commission(&self) -> f64 {
        self.commission
    }
}

/// One tick file feeding one instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    instrument: String,
    path: PathBuf,
}

impl FeedConfig {
    pub fn new(instrument: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            instrument: instrument.into(),
            path: path.into(),
        }
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    account: AccountConfig,
    #[serde(default)]
    instruments: Vec<Instrument>,
    /// Feeds in priority order. Ties between simultaneous points go to the earlier entry.
    #[serde(default)]
    feeds: Vec<FeedConfig>,
    /// Delay between emitted points. Unset replays as fast as possible.
    #[serde(default)]
    pace_ms: Option<u64>,
    #[serde(default = "default_series_capacity")]
    series_capacity: usize,
    #[serde(default = "default_event_capacity")]
    event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            account: AccountConfig::default(),
            instruments: Vec::new(),
            feeds: Vec::new(),
            pace_ms: None,
            series_capacity: default_series_capacity(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl EngineConfig {
    /// Layers `path` (format picked by extension) under `ENGINE__*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix("ENGINE")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    pub fn with_account(mut self, account: AccountConfig) -> Self {
        self.account = account;
        self
    }

    pub fn with_instrument(mut self, instrument: Instrument) -> Self {
        self.instruments.push(instrument);
        self
    }

    pub fn with_feed(mut self, feed: FeedConfig) -> Self {
        self.feeds.push(feed);
        self
    }

    pub fn with_pace_ms(mut self, pace_ms: u64) -> Self {
        self.pace_ms = Some(pace_ms);
        self
    }

    pub fn account(&self) -> &AccountConfig {
        &self.account
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn feeds(&self) -> &[FeedConfig] {
        &self.feeds
    }

    pub fn pace_ms(&self) -> Option<u64> {
        self.pace_ms
    }

    pub fn series_capacity(&self) -> usize {
        self.series_capacity
    }

    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }
}
