use nalgebra::{Vector3, Vector4};
use serde::{Deserialize, Serialize};
use simcore::{Dynamics, SimContext};

/// Model state `(p_x, p_y, ψ, δ)`: position, heading and actual steering angle.
pub type BicycleState = Vector4<f64>;

/// State as the controller logs it: `(p_y, ψ, δ)`. The longitudinal position is not logged.
pub type LoggedState = Vector3<f64>;

/// Number of columns in a logged state row.
pub const LOGGED_STATE_DIM: usize = 3;

/// Constants of the kinematic bicycle model, fixed for the lifetime of a replay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleModelParams {
    /// Constant forward speed in m/s.
    pub velocity: f64,
    /// Distance between front and rear axle in m.
    pub wheel_base: f64,
    /// First-order lag of the steering actuator in s.
    pub steering_time_constant: f64,
}

impl Default for VehicleModelParams {
    fn default() -> Self {
        VehicleModelParams {
            velocity: 1.0,
            wheel_base: 2.74,
            steering_time_constant: 0.3,
        }
    }
}

/// Moves a logged state into the ego-relative frame of a single prediction.
///
/// Every prediction is drawn from the longitudinal origin, so the missing
/// `p_x` coordinate is reset to zero at the start of each control cycle.
pub fn ego_relative(logged: &LoggedState) -> BicycleState {
    Vector4::new(0.0, logged[0], logged[1], logged[2])
}

/// Kinematic single-track vehicle with a first-order steering lag.
/// The input is the commanded steering angle.
#[derive(Debug, Clone, Copy, Default)]
pub struct KinematicBicycle {
    pub params: VehicleModelParams,
}

impl KinematicBicycle {
    pub fn new(params: VehicleModelParams) -> Self {
        KinematicBicycle { params }
    }
}

impl Dynamics<4> for KinematicBicycle {
    type Input = f64;

    fn derivative(&self, _ctx: &SimContext, x: &BicycleState, u: &f64) -> BicycleState {
        let v = self.params.velocity;
        let heading = x[2];
        let steer = x[3];

        Vector4::new(
            v * heading.cos(),
            v * heading.sin(),
            v * steer.tan() / self.params.wheel_base,
            -(steer - u) / self.params.steering_time_constant,
        )
    }
}
