//! Reading controller logs from disk.
//!
//! Each log is a plain numeric table: one row per line, values separated by
//! whitespace. The controller writes `t.log` (sample time in ms), `x.log`
//! (state rows) and `uopt.log` (optimized control sequence rows) into one
//! run directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{ReplayError, SeriesKind};

pub const SAMPLE_TIMES_FILE: &str = "t.log";
pub const STATES_FILE: &str = "x.log";
pub const CONTROLS_FILE: &str = "uopt.log";

/// Parses a whitespace-delimited table. Blank lines are skipped; `nan` and
/// `inf` are accepted as values. `path` is only used for error reporting.
pub fn parse_table(text: &str, path: &Path) -> Result<Vec<Vec<f64>>, ReplayError> {
    let mut rows = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|_| ReplayError::LogParse {
                    path: path.to_path_buf(),
                    line: i + 1,
                    message: format!("'{token}' is not a number"),
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        rows.push(row);
    }
    Ok(rows)
}

/// Reads one table. A missing file is reported as a missing series of `kind`.
pub fn load_table(path: &Path, kind: SeriesKind) -> Result<Vec<Vec<f64>>, ReplayError> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ReplayError::MissingOrEmptySeries(kind),
        _ => ReplayError::io(path, e),
    })?;
    let rows = parse_table(&text, path)?;
    debug!("read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// The three raw series of one controller run, not yet validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogSeries {
    pub sample_times: Vec<f64>,
    pub states: Vec<Vec<f64>>,
    pub controls: Vec<Vec<f64>>,
}

impl LogSeries {
    pub fn load(dir: &Path) -> Result<Self, ReplayError> {
        let time_path = dir.join(SAMPLE_TIMES_FILE);
        let time_rows = load_table(&time_path, SeriesKind::SampleTimes)?;
        let mut sample_times = Vec::with_capacity(time_rows.len());
        for (i, row) in time_rows.into_iter().enumerate() {
            match row.as_slice() {
                [t] => sample_times.push(*t),
                _ => {
                    return Err(ReplayError::LogParse {
                        path: time_path,
                        line: i + 1,
                        message: format!("expected one sample time per row, found {}", row.len()),
                    });
                }
            }
        }

        let states = load_table(&dir.join(STATES_FILE), SeriesKind::States)?;
        let controls = load_table(&dir.join(CONTROLS_FILE), SeriesKind::Controls)?;

        info!(
            "loaded {} samples, {} states, {} control snapshots from {}",
            sample_times.len(),
            states.len(),
            controls.len(),
            dir.display()
        );

        Ok(LogSeries {
            sample_times,
            states,
            controls,
        })
    }

    /// Width of the first control snapshot, the horizon discretization of the run.
    pub fn horizon_width(&self) -> Option<usize> {
        self.controls.first().map(Vec::len)
    }
}

/// Finds the newest run directory under `root` whose name starts with
/// `prefix`. Runs are named `<prefix>..._<n>`; the greatest integer `n`
/// wins. Directories without a numeric suffix are ignored.
pub fn find_latest_directory(root: &Path, prefix: &str) -> Result<PathBuf, ReplayError> {
    let entries = std::fs::read_dir(root).map_err(|e| ReplayError::io(root, e))?;

    let mut latest: Option<(u64, PathBuf)> = None;
    for entry in entries {
        let entry = entry.map_err(|e| ReplayError::io(root, e))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with(prefix) {
            continue;
        }
        let Some(stamp) = name.rsplit('_').next().and_then(|s| s.parse::<u64>().ok()) else {
            continue;
        };
        if latest.as_ref().is_none_or(|(best, _)| stamp > *best) {
            latest = Some((stamp, path));
        }
    }

    latest
        .map(|(_, path)| path)
        .ok_or_else(|| ReplayError::NoLogDirectory {
            root: root.to_path_buf(),
            prefix: prefix.to_string(),
        })
}
