//! Live playback window: the predicted path with fixed axes next to the
//! control snapshot it was simulated from.

use std::time::{Duration, Instant};

use egui_plot::{Legend, Line, Plot, PlotBounds, PlotPoints};
use replay::{FrameBuffer, FrameSink, PlaybackMeta, RenderState, SinkError};

const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(100);
const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(1);
const MAX_FRAME_INTERVAL: Duration = Duration::from_secs(60);

/// Buffers the rendered frames and plays them back at the logged rate.
pub struct LiveCanvas {
    frames: FrameBuffer,
    current: usize,
    playing: bool,
    looping: bool,
    last_advance: Instant,
}

impl LiveCanvas {
    pub fn new() -> Self {
        LiveCanvas {
            frames: FrameBuffer::new(),
            current: 0,
            playing: true,
            looping: true,
            last_advance: Instant::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn current(&self) -> Option<&RenderState> {
        self.frames.get(self.current)
    }

    /// Logged frame interval, clamped so a degenerate sample period can
    /// neither spin the UI loop nor overflow a `Duration`.
    fn frame_interval(&self) -> Duration {
        self.frames
            .meta
            .as_ref()
            .map(|m| m.frame_interval)
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(|s| s.clamp(MIN_FRAME_INTERVAL.as_secs_f64(), MAX_FRAME_INTERVAL.as_secs_f64()))
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
            .unwrap_or(DEFAULT_FRAME_INTERVAL)
    }

    /// Skips ahead by however many whole frame intervals have passed.
    fn advance(&mut self, now: Instant) {
        if !self.playing || self.frames.is_empty() {
            self.last_advance = now;
            return;
        }
        let interval = self.frame_interval();
        let elapsed = now.saturating_duration_since(self.last_advance);
        let interval_ns = interval.as_nanos();
        let steps = elapsed.as_nanos() / interval_ns;
        if steps == 0 {
            return;
        }
        // Remainder is below `interval`, which is at most MAX_FRAME_INTERVAL.
        let remainder = (elapsed.as_nanos() % interval_ns) as u64;
        self.last_advance = now - Duration::from_nanos(remainder);

        let len = self.frames.len() as u128;
        let target = self.current as u128 + steps;
        if target < len {
            self.current = target as usize;
        } else if self.looping {
            self.current = (target % len) as usize;
        } else {
            self.current = self.frames.len() - 1;
            self.playing = false;
            self.last_advance = now;
        }
    }
}

impl Default for LiveCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSink for LiveCanvas {
    fn begin(&mut self, meta: &PlaybackMeta) -> Result<(), SinkError> {
        self.current = 0;
        self.frames.begin(meta)
    }

    fn consume(&mut self, frame: &RenderState) -> Result<(), SinkError> {
        self.frames.consume(frame)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.last_advance = Instant::now();
        self.frames.finish()
    }
}

impl eframe::App for LiveCanvas {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.advance(Instant::now());

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                if ui.button(if self.playing { "⏸ Pause" } else { "▶ Play" }).clicked() {
                    self.playing = !self.playing;
                }
                ui.checkbox(&mut self.looping, "Loop");

                ui.separator();

                let last = self.frames.len().saturating_sub(1);
                ui.label("Frame");
                if ui.add(egui::Slider::new(&mut self.current, 0..=last)).changed() {
                    self.playing = false;
                }

                if let Some(meta) = &self.frames.meta {
                    ui.separator();
                    ui.label(format!(
                        "skip {} · {:.1} fps",
                        meta.skip_frames, meta.frame_rate
                    ));
                }
            });
        });

        let (Some(meta), Some(frame)) = (self.frames.meta.as_ref(), self.current()) else {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.label("No frames to show.");
            });
            return;
        };

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(frame.elapsed_label.as_str());
            ui.columns(2, |cols| {
                cols[0].label("Predicted path");
                let b = meta.bounds;
                Plot::new("path_plot")
                    .legend(Legend::default())
                    .allow_scroll(false)
                    .x_axis_label("x [m]")
                    .y_axis_label("y [m]")
                    .show(&mut cols[0], |plot_ui| {
                        plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                            [b.x_min, b.y_min],
                            [b.x_max, b.y_max],
                        ));
                        plot_ui.line(Line::new(
                            "predicted path",
                            PlotPoints::from_iter(frame.predicted_path.points().map(|(x, y)| [x, y])),
                        ));
                    });

                cols[1].label("Optimized control sequence");
                let r = meta.control_range;
                let last_step = frame.controls.len().saturating_sub(1).max(1) as f64;
                Plot::new("control_plot")
                    .legend(Legend::default())
                    .allow_scroll(false)
                    .x_axis_label("step")
                    .y_axis_label("u")
                    .show(&mut cols[1], |plot_ui| {
                        plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                            [0.0, r.min],
                            [last_step, r.max],
                        ));
                        plot_ui.line(Line::new(
                            "optimized u",
                            PlotPoints::from_iter(
                                frame
                                    .controls
                                    .iter()
                                    .enumerate()
                                    .map(|(k, &u)| [k as f64, u]),
                            ),
                        ));
                    });
            });
        });

        ctx.request_repaint_after(Duration::from_millis(10));
    }
}
