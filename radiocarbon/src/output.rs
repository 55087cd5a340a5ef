use std::fmt;

use clap::ValueEnum;
use radiocarbon_resolver::ResolutionResult;

/// Output rendering of a resolved timestamp. Applied only at this
/// boundary; everything below works on the raw unix value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimestampFormat {
    Unix,
    Human,
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimestampFormat::Unix => "unix",
            TimestampFormat::Human => "human",
        })
    }
}

pub fn render(result: &ResolutionResult, format: TimestampFormat) -> String {
    match format {
        TimestampFormat::Unix => result.block_time.to_string(),
        TimestampFormat::Human => {
            chrono::DateTime::from_timestamp(result.block_time, 0)
                .map(|utc| utc.format("%Y-%m-%d %H:%M:%S").to_string())
                // out-of-range block times fall back to the raw value
                .unwrap_or_else(|| result.block_time.to_string())
        }
    }
}
