//! Replay engine for receding-horizon controller logs.
//!
//! Logged vehicle states and optimized control sequences are turned into one
//! predicted path per control cycle. The engine fixes the plot extent once,
//! up front, and then renders any frame on demand, in any order.

pub mod bounds;
pub mod config;
pub mod engine;
pub mod error;
pub mod logs;
pub mod series;
pub mod sink;

pub use bounds::{ControlRange, GlobalBounds};
pub use config::ReplayConfig;
pub use engine::{FrameView, PlaybackConfig, RenderState, ReplayEngine};
pub use error::{ReplayError, SeriesKind};
pub use logs::{LogSeries, find_latest_directory};
pub use sink::{FrameBuffer, FrameSink, PlaybackMeta, SinkError, frame_file_name};
