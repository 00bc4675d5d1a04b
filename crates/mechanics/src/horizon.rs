//! Forward simulation of one controller prediction.
//!
//! Given the state at the start of a control cycle and the optimized control
//! sequence of that cycle, the horizon simulator integrates the vehicle model
//! over the prediction horizon and returns the predicted path in plot
//! coordinates.

use serde::{Deserialize, Serialize};
use simcore::{IntegrationScheme, Integrator, SimContext};
use thiserror::Error;

use crate::bicycle::{BicycleState, KinematicBicycle, VehicleModelParams};

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum HorizonError {
    #[error("horizon must have at least one step")]
    ZeroSteps,
    #[error("prediction duration must be positive and finite, got {0}")]
    InvalidDuration(f64),
}

/// Predicted path of one control cycle as paired coordinate series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictedPath {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl PredictedPath {
    pub fn with_capacity(n: usize) -> Self {
        PredictedPath {
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, x: f64, y: f64) {
        self.x.push(x);
        self.y.push(y);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    /// `(x_min, x_max, y_min, y_max)` of the path, `None` when empty.
    pub fn extent(&self) -> Option<(f64, f64, f64, f64)> {
        if self.is_empty() {
            return None;
        }
        let fold_min = |v: &[f64]| v.iter().copied().fold(f64::INFINITY, f64::min);
        let fold_max = |v: &[f64]| v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some((
            fold_min(&self.x),
            fold_max(&self.x),
            fold_min(&self.y),
            fold_max(&self.y),
        ))
    }
}

/// Integrates the kinematic bicycle over a fixed prediction horizon.
///
/// Stateless: the same snapshot always produces the same path.
#[derive(Debug, Clone, Copy)]
pub struct HorizonSimulator<I = IntegrationScheme> {
    model: KinematicBicycle,
    steps: usize,
    predict_duration: f64,
    integrator: I,
}

impl HorizonSimulator {
    /// Creates a simulator with `steps` explicit Euler steps spread evenly over `predict_duration` seconds.
    pub fn new(
        params: VehicleModelParams,
        steps: usize,
        predict_duration: f64,
    ) -> Result<Self, HorizonError> {
        if steps == 0 {
            return Err(HorizonError::ZeroSteps);
        }
        if !(predict_duration.is_finite() && predict_duration > 0.0) {
            return Err(HorizonError::InvalidDuration(predict_duration));
        }
        Ok(HorizonSimulator {
            model: KinematicBicycle::new(params),
            steps,
            predict_duration,
            integrator: IntegrationScheme::ExplicitEuler,
        })
    }
}

impl<I: Integrator> HorizonSimulator<I> {
    pub fn with_integrator<J: Integrator>(self, integrator: J) -> HorizonSimulator<J> {
        HorizonSimulator {
            model: self.model,
            steps: self.steps,
            predict_duration: self.predict_duration,
            integrator,
        }
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn predict_duration(&self) -> f64 {
        self.predict_duration
    }

    /// Integration step `T_predict / N`.
    pub fn step_size(&self) -> f64 {
        self.predict_duration / self.steps as f64
    }

    /// Simulates one prediction starting from `initial`.
    ///
    /// Step `k` applies `controls[k]`. The position before each step is
    /// recorded, so the path has exactly `steps` points, starts at the initial
    /// position and leaves out the state after the last step. If `controls`
    /// is shorter than the horizon its last value is held (zero when empty).
    pub fn simulate(&self, initial: &BicycleState, controls: &[f64]) -> PredictedPath {
        let mut path = PredictedPath::with_capacity(self.steps);
        let mut ctx = SimContext {
            dt: self.step_size(),
            t: 0.0,
        };
        let mut x = *initial;

        for k in 0..self.steps {
            path.push(x[0], x[1]);
            let u = controls
                .get(k)
                .or_else(|| controls.last())
                .copied()
                .unwrap_or(0.0);
            x = self.integrator.step(&self.model, &ctx, &x, &u);
            ctx = ctx.advanced();
        }

        path
    }
}
