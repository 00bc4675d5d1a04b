use std::fmt;
use std::path::PathBuf;

use mechanics::HorizonError;
use thiserror::Error;

/// The three logged series a replay is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    SampleTimes,
    States,
    Controls,
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SeriesKind::SampleTimes => "sample time",
            SeriesKind::States => "state",
            SeriesKind::Controls => "control",
        };
        f.write_str(name)
    }
}

/// Errors raised while loading logs, building the engine or rendering frames.
///
/// All of them come from invalid input and are reported at the boundary where
/// they are detected; nothing is retried.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("state dimension is {found}, the vehicle model expects {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("frame {index} is out of range, replay has {total} frames")]
    IndexOutOfRange { index: usize, total: usize },

    #[error("skip stride must be a positive integer, got {0}")]
    InvalidStride(usize),

    #[error("{0} series is missing or empty")]
    MissingOrEmptySeries(SeriesKind),

    #[error("{states} states but {controls} control snapshots")]
    LengthMismatch { states: usize, controls: usize },

    #[error("control snapshot {row} has {found} values, the horizon has {expected} steps")]
    HorizonMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid prediction horizon: {0}")]
    InvalidHorizon(#[from] HorizonError),

    #[error("invalid sample times: {0}")]
    InvalidSampleTimes(String),

    #[error("{}:{line}: {message}", .path.display())]
    LogParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no directory starting with '{prefix}' in {}", .root.display())]
    NoLogDirectory { root: PathBuf, prefix: String },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("frame sink failed: {0}")]
    Sink(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ReplayError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
