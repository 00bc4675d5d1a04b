use nalgebra::SVector;
use serde::{Deserialize, Serialize};

use crate::{Dynamics, SimContext};

/// A generic fixed-step integration strategy.
pub trait Integrator {
    /// Advances `x` by one step of `ctx.dt`, holding `u` constant over the step.
    fn step<M, const D: usize>(
        &self,
        model: &M,
        ctx: &SimContext,
        x: &SVector<f64, D>,
        u: &M::Input,
    ) -> SVector<f64, D>
    where
        M: Dynamics<D>;
}

/// Explicit (forward) Euler integrator.
/// First-order accurate; the derivative is only evaluated at the start of the step.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitEuler;

impl Integrator for ExplicitEuler {
    fn step<M, const D: usize>(
        &self,
        model: &M,
        ctx: &SimContext,
        x: &SVector<f64, D>,
        u: &M::Input,
    ) -> SVector<f64, D>
    where
        M: Dynamics<D>,
    {
        x + model.derivative(ctx, x, u) * ctx.dt
    }
}

/// Classic fourth-order Runge-Kutta integrator.
/// Four derivative evaluations per step with the input held (zero-order hold).
#[derive(Debug, Clone, Copy, Default)]
pub struct RungeKutta4;

impl Integrator for RungeKutta4 {
    fn step<M, const D: usize>(
        &self,
        model: &M,
        ctx: &SimContext,
        x: &SVector<f64, D>,
        u: &M::Input,
    ) -> SVector<f64, D>
    where
        M: Dynamics<D>,
    {
        let dt = ctx.dt;
        let half = SimContext {
            dt,
            t: ctx.t + 0.5 * dt,
        };
        let end = ctx.advanced();

        let k1 = model.derivative(ctx, x, u);
        let k2 = model.derivative(&half, &(x + k1 * (0.5 * dt)), u);
        let k3 = model.derivative(&half, &(x + k2 * (0.5 * dt)), u);
        let k4 = model.derivative(&end, &(x + k3 * dt), u);

        x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0)
    }
}

/// Integrator selection that can live in a serialized configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationScheme {
    #[default]
    ExplicitEuler,
    RungeKutta4,
}

impl Integrator for IntegrationScheme {
    fn step<M, const D: usize>(
        &self,
        model: &M,
        ctx: &SimContext,
        x: &SVector<f64, D>,
        u: &M::Input,
    ) -> SVector<f64, D>
    where
        M: Dynamics<D>,
    {
        match self {
            IntegrationScheme::ExplicitEuler => ExplicitEuler.step(model, ctx, x, u),
            IntegrationScheme::RungeKutta4 => RungeKutta4.step(model, ctx, x, u),
        }
    }
}
