//! Consumers of rendered frames.
//!
//! Live playback and still-frame export consume the same sequence of render
//! states; only what they do with each frame differs.

use serde::{Deserialize, Serialize};

use crate::bounds::{ControlRange, GlobalBounds};
use crate::engine::RenderState;

pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// Timing and layout shared by all frames of one playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackMeta {
    pub total_frames: usize,
    pub skip_frames: usize,
    /// Logged sampling period in seconds.
    pub sample_period: f64,
    /// Time between two displayed frames, `sample_period * skip_frames`.
    pub frame_interval: f64,
    /// Effective playback rate, `1 / frame_interval`.
    pub frame_rate: f64,
    pub bounds: GlobalBounds,
    pub control_range: ControlRange,
}

/// Still-frame file name for playback index `index`.
pub fn frame_file_name(index: usize) -> String {
    format!("frame_{index:04}.png")
}

pub trait FrameSink {
    /// Called once before the first frame.
    fn begin(&mut self, _meta: &PlaybackMeta) -> Result<(), SinkError> {
        Ok(())
    }

    /// Called for every frame, in playback order.
    fn consume(&mut self, frame: &RenderState) -> Result<(), SinkError>;

    /// Called once after the last frame.
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Keeps every frame in memory, for viewers that seek freely.
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    pub meta: Option<PlaybackMeta>,
    pub frames: Vec<RenderState>,
    pub finished: bool,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RenderState> {
        self.frames.get(index)
    }
}

impl FrameSink for FrameBuffer {
    fn begin(&mut self, meta: &PlaybackMeta) -> Result<(), SinkError> {
        self.meta = Some(meta.clone());
        self.frames.clear();
        self.frames.reserve(meta.total_frames);
        self.finished = false;
        Ok(())
    }

    fn consume(&mut self, frame: &RenderState) -> Result<(), SinkError> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.finished = true;
        Ok(())
    }
}
