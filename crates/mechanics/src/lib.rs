pub mod bicycle;
pub mod horizon;

pub use bicycle::{BicycleState, KinematicBicycle, LOGGED_STATE_DIM, LoggedState, VehicleModelParams, ego_relative};
pub use horizon::{HorizonError, HorizonSimulator, PredictedPath};
