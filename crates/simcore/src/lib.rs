//! Shared simulation primitives: step context, continuous-time dynamics and
//! fixed-step integrators.

pub mod integrators;

use nalgebra::SVector;

pub use integrators::{ExplicitEuler, IntegrationScheme, Integrator, RungeKutta4};

#[derive(Debug, Clone, Copy)]
pub struct SimContext {
    pub dt: f64,
    pub t: f64,
}

impl SimContext {
    /// Context for the next step of a fixed-step run.
    pub fn advanced(&self) -> Self {
        SimContext {
            dt: self.dt,
            t: self.t + self.dt,
        }
    }
}

/// A continuous-time system `ẋ = f(x, u)` over a fixed-size state vector.
pub trait Dynamics<const D: usize> {
    /// Input held constant over one integration step.
    type Input;

    fn derivative(&self, ctx: &SimContext, x: &SVector<f64, D>, u: &Self::Input) -> SVector<f64, D>;
}
