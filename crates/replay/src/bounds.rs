use mechanics::PredictedPath;
use serde::{Deserialize, Serialize};

/// Plot extent shared by every frame of a replay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl GlobalBounds {
    /// Extent containing nothing; folding any point into it yields that point.
    pub fn empty() -> Self {
        GlobalBounds {
            x_min: f64::INFINITY,
            x_max: f64::NEG_INFINITY,
            y_min: f64::INFINITY,
            y_max: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x_min > self.x_max || self.y_min > self.y_max
    }

    /// Folds the extent of `path` into the running extrema.
    pub fn include(&mut self, path: &PredictedPath) {
        if let Some((x_min, x_max, y_min, y_max)) = path.extent() {
            self.x_min = self.x_min.min(x_min);
            self.x_max = self.x_max.max(x_max);
            self.y_min = self.y_min.min(y_min);
            self.y_max = self.y_max.max(y_max);
        }
    }

    /// Expands every side by `margin` plot units.
    pub fn padded(self, margin: f64) -> Self {
        GlobalBounds {
            x_min: self.x_min - margin,
            x_max: self.x_max + margin,
            y_min: self.y_min - margin,
            y_max: self.y_max + margin,
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        (self.x_min..=self.x_max).contains(&x) && (self.y_min..=self.y_max).contains(&y)
    }

    /// True when `other` lies inside `self` with a gap on every side.
    pub fn strictly_contains(&self, other: &GlobalBounds) -> bool {
        self.x_min < other.x_min
            && self.x_max > other.x_max
            && self.y_min < other.y_min
            && self.y_max > other.y_max
    }
}

/// Fixed value range for plotting control snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlRange {
    pub min: f64,
    pub max: f64,
}

impl ControlRange {
    /// Margin as a fraction of the value span.
    pub const MARGIN_RATIO: f64 = 0.1;

    /// Range over every finite value of every snapshot, widened by a tenth of
    /// the span on each side. A flat series gets a unit-wide window around its
    /// value.
    pub fn from_snapshots(rows: &[Vec<f64>]) -> Self {
        let (min, max) = rows
            .iter()
            .flatten()
            .copied()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });

        if min > max {
            return ControlRange {
                min: -0.5,
                max: 0.5,
            };
        }

        let span = max - min;
        let margin = if span > 0.0 {
            span * Self::MARGIN_RATIO
        } else {
            0.5
        };
        ControlRange {
            min: min - margin,
            max: max + margin,
        }
    }
}
