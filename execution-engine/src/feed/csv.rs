//! Tick files.
//!
//! One record per line, comma separated:
//!
//! ```text
//! instrument,time,bid,bid_size,ask,ask_size
//! ```
//!
//! The instrument column may be omitted, in which case the feed's instrument
//! is used. `time` is RFC 3339 or unix milliseconds. A header line, blank lines
//! and lines starting with `#` are ignored.

use crate::error::{EngineError, Result};
use chrono::{DateTime, TimeZone, Utc};
use log::warn;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use thiserror::Error;
use trading::{DataFeed, FeedRead, Point};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("expected 5 or 6 fields, got {0}")]
    FieldCount(usize),
    #[error("invalid {field} '{value}'")]
    Number { field: &'static str, value: String },
    #[error("invalid time '{0}'")]
    Time(String),
    #[error("zero timestamp")]
    SentinelTime,
}

fn parse_time(value: &str) -> std::result::Result<DateTime<Utc>, RecordError> {
    if let Ok(time) = DateTime::parse_from_rfc3339(value) {
        return Ok(time.with_timezone(&Utc));
    }
    let ms: i64 = value
        .parse()
        .map_err(|_| RecordError::Time(value.to_string()))?;
    if ms == 0 {
        return Err(RecordError::SentinelTime);
    }
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| RecordError::Time(value.to_string()))
}

fn parse_number(field: &'static str, value: &str) -> std::result::Result<f64, RecordError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RecordError::Number {
            field,
            value: value.to_string(),
        })
}

/// Parses one record. `instrument` is used when the record has no instrument column.
pub fn parse_record(line: &str, instrument: &str) -> std::result::Result<Point, RecordError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let (instrument, rest) = match fields.len() {
        6 => (fields[0], &fields[1..]),
        5 => (instrument, &fields[..]),
        n => return Err(RecordError::FieldCount(n)),
    };

    let time = parse_time(rest[0])?;
    let bid = parse_number("bid", rest[1])?;
    let bid_size = parse_number("bid_size", rest[2])?;
    let ask = parse_number("ask", rest[3])?;
    let ask_size = parse_number("ask_size", rest[4])?;

    if time.timestamp_millis() == 0 {
        return Err(RecordError::SentinelTime);
    }
    Ok(Point::new(instrument, time, bid, ask).with_sizes(bid_size, ask_size))
}

/// A `DataFeed` reading tick records line by line.
pub struct CsvFeed<R> {
    name: String,
    instrument: String,
    lines: Lines<R>,
    line_no: usize,
}

impl CsvFeed<BufReader<File>> {
    pub fn open(path: &Path, instrument: &str) -> Result<Self> {
        let file = File::open(path).map_err(|source| EngineError::Feed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(
            path.display().to_string(),
            instrument,
            BufReader::new(file),
        ))
    }
}

impl<R: BufRead> CsvFeed<R> {
    pub fn new(name: impl Into<String>, instrument: &str, reader: R) -> Self {
        Self {
            name: name.into(),
            instrument: instrument.to_string(),
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead + Send> DataFeed for CsvFeed<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_point(&mut self) -> FeedRead {
        loop {
            let line = match self.lines.next() {
                None => return FeedRead::Exhausted,
                Some(Err(e)) => {
                    warn!("Feed {} stopped reading: {}", self.name, e);
                    return FeedRead::Exhausted;
                }
                Some(Ok(line)) => line,
            };
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if self.line_no == 1 && trimmed.to_ascii_lowercase().contains("bid") {
                continue;
            }

            return match parse_record(trimmed, &self.instrument) {
                Ok(point) => FeedRead::Point(point),
                Err(e) => {
                    warn!("Feed {} line {}: {}", self.name, self.line_no, e);
                    FeedRead::Skipped
                }
            };
        }
    }
}
