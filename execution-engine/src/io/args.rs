use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Engine configuration file (TOML, JSON or YAML).
    /// `ENGINE__*` environment variables override its values.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON array of order requests submitted before the replay starts
    #[arg(short, long)]
    pub orders: Option<PathBuf>,

    /// Delay between replayed points, in milliseconds
    #[arg(long)]
    pub pace_ms: Option<u64>,

    /// Pretty-print the final ledger snapshot
    #[arg(long)]
    pub pretty: bool,
}
