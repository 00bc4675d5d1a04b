//! Validated, immutable views of the three logged series.

use log::warn;
use mechanics::{LOGGED_STATE_DIM, LoggedState};

use crate::error::{ReplayError, SeriesKind};

/// Controller sample times, logged in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTimes {
    millis: Vec<f64>,
}

impl SampleTimes {
    /// Requires at least two finite, strictly increasing timestamps.
    pub fn new(millis: Vec<f64>) -> Result<Self, ReplayError> {
        if millis.is_empty() {
            return Err(ReplayError::MissingOrEmptySeries(SeriesKind::SampleTimes));
        }
        if millis.len() < 2 {
            return Err(ReplayError::InvalidSampleTimes(
                "at least two samples are needed to derive the sampling period".into(),
            ));
        }
        if let Some(i) = millis.iter().position(|t| !t.is_finite()) {
            return Err(ReplayError::InvalidSampleTimes(format!(
                "sample {i} is not finite"
            )));
        }
        if let Some(i) = millis.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ReplayError::InvalidSampleTimes(format!(
                "sample {} does not increase ({} ms after {} ms)",
                i + 1,
                millis[i + 1],
                millis[i]
            )));
        }
        Ok(SampleTimes { millis })
    }

    pub fn len(&self) -> usize {
        self.millis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.millis.is_empty()
    }

    /// Nominal sampling period in seconds, taken from the first two samples.
    pub fn sample_period(&self) -> f64 {
        (self.millis[1] - self.millis[0]) / 1000.0
    }
}

/// Logged vehicle states, one row per sample.
///
/// Non-finite components are logging gaps; they are replaced with zero when
/// the series is built.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSeries {
    rows: Vec<LoggedState>,
    sanitized: usize,
}

impl StateSeries {
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, ReplayError> {
        if rows.is_empty() {
            return Err(ReplayError::MissingOrEmptySeries(SeriesKind::States));
        }
        if let Some(row) = rows.iter().find(|r| r.len() != LOGGED_STATE_DIM) {
            return Err(ReplayError::DimensionMismatch {
                expected: LOGGED_STATE_DIM,
                found: row.len(),
            });
        }

        let mut sanitized = 0;
        let rows: Vec<LoggedState> = rows
            .iter()
            .map(|row| {
                LoggedState::from_iterator(row.iter().map(|&v| {
                    if v.is_finite() {
                        v
                    } else {
                        sanitized += 1;
                        0.0
                    }
                }))
            })
            .collect();

        if sanitized > 0 {
            warn!("replaced {sanitized} non-finite state values with 0");
        }

        Ok(StateSeries { rows, sanitized })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LoggedState> {
        self.rows.get(index)
    }

    /// Number of values that were replaced with zero.
    pub fn sanitized(&self) -> usize {
        self.sanitized
    }
}

/// Optimized control sequences, one snapshot of `horizon` values per sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSeries {
    rows: Vec<Vec<f64>>,
}

impl ControlSeries {
    pub fn from_rows(rows: Vec<Vec<f64>>, horizon: usize) -> Result<Self, ReplayError> {
        if rows.is_empty() {
            return Err(ReplayError::MissingOrEmptySeries(SeriesKind::Controls));
        }
        if let Some((row, snapshot)) = rows.iter().enumerate().find(|(_, r)| r.len() != horizon) {
            return Err(ReplayError::HorizonMismatch {
                row,
                expected: horizon,
                found: snapshot.len(),
            });
        }
        Ok(ControlSeries { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&[f64]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }
}
