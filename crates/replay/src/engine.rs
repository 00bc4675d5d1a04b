//! Frame-accurate replay of logged predictions.

use log::{debug, info, warn};
use mechanics::{HorizonSimulator, PredictedPath, VehicleModelParams, ego_relative};
use serde::{Deserialize, Serialize};

use crate::bounds::{ControlRange, GlobalBounds};
use crate::config::ReplayConfig;
use crate::error::{ReplayError, SeriesKind};
use crate::logs::LogSeries;
use crate::series::{ControlSeries, SampleTimes, StateSeries};
use crate::sink::{FrameSink, PlaybackMeta};

/// Stride over the logged samples and the number of frames it yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackConfig {
    skip_frames: usize,
    total_frames: usize,
}

impl PlaybackConfig {
    /// Plays every sample.
    pub fn new(samples: usize) -> Self {
        PlaybackConfig {
            skip_frames: 1,
            total_frames: samples,
        }
    }

    /// `total_frames = floor(samples / stride)`; a zero stride is rejected.
    pub fn with_stride(samples: usize, stride: usize) -> Result<Self, ReplayError> {
        if stride == 0 {
            return Err(ReplayError::InvalidStride(stride));
        }
        Ok(PlaybackConfig {
            skip_frames: stride,
            total_frames: samples / stride,
        })
    }

    pub fn skip_frames(&self) -> usize {
        self.skip_frames
    }

    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    /// Logged sample shown at playback index `frame`.
    pub fn sample_index(&self, frame: usize) -> usize {
        frame * self.skip_frames
    }
}

/// Everything drawn for one playback index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderState {
    pub frame_index: usize,
    pub sample_index: usize,
    pub predicted_path: PredictedPath,
    /// Control snapshot the path was simulated with.
    pub controls: Vec<f64>,
    pub elapsed_seconds: f64,
    /// Elapsed time with one decimal, e.g. `"0.2 [s]"` for sample 2 at 100 ms.
    pub elapsed_label: String,
}

/// The two drawables of the current frame: predicted-path curve and time text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameView {
    pub path_curve: PredictedPath,
    pub time_text: String,
}

/// Owns the logged series and answers "what is drawn at playback index `i`".
///
/// Construction simulates every frame once to fix the plot extent, so axes
/// never rescale during playback. After that any frame can be rendered in
/// any order.
#[derive(Debug, Clone)]
pub struct ReplayEngine {
    times: SampleTimes,
    states: StateSeries,
    controls: ControlSeries,
    simulator: HorizonSimulator,
    playback: PlaybackConfig,
    bounds: GlobalBounds,
    control_range: ControlRange,
    view: FrameView,
}

impl ReplayEngine {
    /// Builds an engine from the three aligned series with explicit Euler
    /// prediction and a stride of one.
    pub fn new(
        sample_times: Vec<f64>,
        states: Vec<Vec<f64>>,
        controls: Vec<Vec<f64>>,
        params: VehicleModelParams,
        horizon_steps: usize,
        predict_duration: f64,
        margin: f64,
    ) -> Result<Self, ReplayError> {
        let config = ReplayConfig {
            vehicle: params,
            horizon_steps: Some(horizon_steps),
            predict_duration,
            margin,
            ..ReplayConfig::default()
        };
        let series = LogSeries {
            sample_times,
            states,
            controls,
        };
        Self::from_config(series, &config)
    }

    /// Builds an engine from loaded logs. The horizon defaults to the width of
    /// the first control snapshot; the configured stride is applied after the
    /// bounds pre-scan.
    pub fn from_config(series: LogSeries, config: &ReplayConfig) -> Result<Self, ReplayError> {
        if series.sample_times.is_empty() {
            return Err(ReplayError::MissingOrEmptySeries(SeriesKind::SampleTimes));
        }
        if series.states.is_empty() {
            return Err(ReplayError::MissingOrEmptySeries(SeriesKind::States));
        }
        let horizon_steps = config
            .horizon_steps
            .or_else(|| series.horizon_width())
            .ok_or(ReplayError::MissingOrEmptySeries(SeriesKind::Controls))?;

        let simulator = HorizonSimulator::new(config.vehicle, horizon_steps, config.predict_duration)?
            .with_integrator(config.integration);

        let times = SampleTimes::new(series.sample_times)?;
        let states = StateSeries::from_rows(series.states)?;
        let controls = ControlSeries::from_rows(series.controls, horizon_steps)?;
        if states.len() != controls.len() {
            return Err(ReplayError::LengthMismatch {
                states: states.len(),
                controls: controls.len(),
            });
        }
        if times.len() != states.len() {
            warn!(
                "{} sample times for {} states; only the first two times are used",
                times.len(),
                states.len()
            );
        }

        let control_range = ControlRange::from_snapshots(controls.rows());
        let mut engine = ReplayEngine {
            playback: PlaybackConfig::new(states.len()),
            times,
            states,
            controls,
            simulator,
            bounds: GlobalBounds::empty(),
            control_range,
            view: FrameView::default(),
        };
        engine.bounds = engine.scan_extent().padded(config.margin);

        info!(
            "replay ready: {} frames, dt {:.3} s, horizon {} steps over {} s, bounds x [{:.3}, {:.3}] y [{:.3}, {:.3}]",
            engine.total_frames(),
            engine.sample_period(),
            engine.simulator.steps(),
            engine.simulator.predict_duration(),
            engine.bounds.x_min,
            engine.bounds.x_max,
            engine.bounds.y_min,
            engine.bounds.y_max
        );

        if config.skip_frames != 1 {
            engine.set_skip_frames(config.skip_frames)?;
        }
        Ok(engine)
    }

    /// Folds the extent of every frame's predicted path.
    fn scan_extent(&self) -> GlobalBounds {
        let mut extent = GlobalBounds::empty();
        for frame in 0..self.playback.total_frames() {
            if let Some(path) = self.predict(self.playback.sample_index(frame)) {
                extent.include(&path);
            }
        }
        extent
    }

    /// Predicted path for logged sample `sample`, in the ego-relative frame.
    fn predict(&self, sample: usize) -> Option<PredictedPath> {
        let state = self.states.get(sample)?;
        let controls = self.controls.get(sample)?;
        Some(self.simulator.simulate(&ego_relative(state), controls))
    }

    /// Changes the stride. The frame count follows; the bounds do not.
    /// On error the previous stride is kept.
    pub fn set_skip_frames(&mut self, stride: usize) -> Result<(), ReplayError> {
        self.playback = PlaybackConfig::with_stride(self.states.len(), stride)?;
        info!(
            "skip frames set to {stride}, {} frames",
            self.playback.total_frames()
        );
        Ok(())
    }

    /// Computes frame `index` without touching the current view.
    pub fn frame_state(&self, index: usize) -> Result<RenderState, ReplayError> {
        let out_of_range = ReplayError::IndexOutOfRange {
            index,
            total: self.playback.total_frames(),
        };
        if index >= self.playback.total_frames() {
            return Err(out_of_range);
        }

        let sample = self.playback.sample_index(index);
        let predicted_path = self.predict(sample).ok_or(out_of_range)?;
        let controls = self.controls.get(sample).map(<[f64]>::to_vec).unwrap_or_default();
        let elapsed_seconds = sample as f64 * self.sample_period();

        Ok(RenderState {
            frame_index: index,
            sample_index: sample,
            predicted_path,
            controls,
            elapsed_seconds,
            elapsed_label: format!("{elapsed_seconds:.1} [s]"),
        })
    }

    /// Renders frame `index` and points the view's drawables at it.
    pub fn render_frame(&mut self, index: usize) -> Result<RenderState, ReplayError> {
        let state = self.frame_state(index)?;
        self.view.path_curve.clone_from(&state.predicted_path);
        self.view.time_text.clone_from(&state.elapsed_label);
        debug!("rendered frame {index} (sample {})", state.sample_index);
        Ok(state)
    }

    /// Renders every frame in playback order.
    pub fn render_all(&mut self) -> Result<Vec<RenderState>, ReplayError> {
        (0..self.total_frames())
            .map(|i| self.render_frame(i))
            .collect()
    }

    /// Streams every frame into `sink`. Returns the number of frames delivered.
    pub fn play_into(&mut self, sink: &mut dyn FrameSink) -> Result<usize, ReplayError> {
        let meta = self.meta();
        sink.begin(&meta)?;
        for i in 0..meta.total_frames {
            let state = self.render_frame(i)?;
            sink.consume(&state)?;
        }
        sink.finish()?;
        info!(
            "played {} frames at {:.1} fps",
            meta.total_frames, meta.frame_rate
        );
        Ok(meta.total_frames)
    }

    pub fn meta(&self) -> PlaybackMeta {
        let frame_interval = self.sample_period() * self.playback.skip_frames() as f64;
        PlaybackMeta {
            total_frames: self.playback.total_frames(),
            skip_frames: self.playback.skip_frames(),
            sample_period: self.sample_period(),
            frame_interval,
            frame_rate: 1.0 / frame_interval,
            bounds: self.bounds,
            control_range: self.control_range,
        }
    }

    pub fn sample_period(&self) -> f64 {
        self.times.sample_period()
    }

    pub fn total_frames(&self) -> usize {
        self.playback.total_frames()
    }

    pub fn skip_frames(&self) -> usize {
        self.playback.skip_frames()
    }

    pub fn playback(&self) -> &PlaybackConfig {
        &self.playback
    }

    pub fn bounds(&self) -> &GlobalBounds {
        &self.bounds
    }

    pub fn control_range(&self) -> &ControlRange {
        &self.control_range
    }

    pub fn view(&self) -> &FrameView {
        &self.view
    }

    pub fn horizon_steps(&self) -> usize {
        self.simulator.steps()
    }

    /// Number of state values that were replaced with zero when loading.
    pub fn sanitized_values(&self) -> usize {
        self.states.sanitized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{FrameBuffer, SinkError};
    use approx::assert_relative_eq;
    use simcore::IntegrationScheme;

    const N: usize = 10;
    const T_PREDICT: f64 = 0.1;

    fn times(n: usize, step_ms: f64) -> Vec<f64> {
        (0..n).map(|i| i as f64 * step_ms).collect()
    }

    fn params() -> VehicleModelParams {
        VehicleModelParams {
            velocity: 1.0,
            wheel_base: 2.74,
            steering_time_constant: 0.3,
        }
    }

    /// Five straight-ahead samples with zero steering commands.
    fn straight_engine(step_ms: f64) -> ReplayEngine {
        ReplayEngine::new(
            times(5, step_ms),
            vec![vec![0.0; 3]; 5],
            vec![vec![0.0; N]; 5],
            params(),
            N,
            T_PREDICT,
            0.1,
        )
        .unwrap()
    }

    /// Samples whose lateral offset jumps around, ending near the middle.
    fn offset_engine(margin: f64) -> ReplayEngine {
        let offsets = [0.0, 5.0, -3.0, 1.0];
        let states = offsets.iter().map(|&y| vec![y, 0.1, 0.0]).collect();
        let controls = vec![vec![0.05; N]; offsets.len()];
        ReplayEngine::new(
            times(offsets.len(), 10.0),
            states,
            controls,
            params(),
            N,
            T_PREDICT,
            margin,
        )
        .unwrap()
    }

    #[test]
    fn test_straight_scenario_first_frame() {
        let mut engine = straight_engine(10.0);

        let frame = engine.render_frame(0).unwrap();

        assert_eq!(frame.predicted_path.len(), N);
        assert!(frame.predicted_path.y.iter().all(|&y| y == 0.0));
        for pair in frame.predicted_path.x.windows(2) {
            assert!(pair[1] > pair[0]);
            assert_relative_eq!(pair[1] - pair[0], 1.0 * T_PREDICT / N as f64, epsilon = 1e-12);
        }
        assert_eq!(frame.elapsed_label, "0.0 [s]");
    }

    #[test]
    fn test_label_is_sample_time_in_seconds() {
        let mut engine = straight_engine(100.0);
        assert_relative_eq!(engine.sample_period(), 0.1);

        assert_eq!(engine.render_frame(2).unwrap().elapsed_label, "0.2 [s]");

        engine.set_skip_frames(2).unwrap();
        assert_eq!(engine.total_frames(), 2);
        let frame = engine.render_frame(1).unwrap();
        assert_eq!(frame.sample_index, 2);
        assert_eq!(frame.elapsed_label, "0.2 [s]");
        assert!(matches!(
            engine.render_frame(2),
            Err(ReplayError::IndexOutOfRange { index: 2, total: 2 })
        ));

        // 10 ms sampling: sample 2 is at 0.02 s.
        let mut engine = straight_engine(10.0);
        let frame = engine.render_frame(2).unwrap();
        assert_relative_eq!(frame.elapsed_seconds, 0.02);
        assert_eq!(frame.elapsed_label, "0.0 [s]");
    }

    #[test]
    fn test_straight_scenario_bounds() {
        let engine = straight_engine(10.0);
        let bounds = engine.bounds();

        assert_relative_eq!(bounds.x_min, -0.1, epsilon = 1e-12);
        assert_relative_eq!(bounds.x_max, 0.09 + 0.1, epsilon = 1e-12);
        assert_relative_eq!(bounds.y_min, -0.1, epsilon = 1e-12);
        assert_relative_eq!(bounds.y_max, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_bounds_fold_every_frame() {
        let mut engine = offset_engine(0.0);
        let bounds = *engine.bounds();

        // The extreme offsets come from frames 1 and 2, not the last frame.
        assert!(bounds.y_max >= 5.0);
        assert!(bounds.y_min <= -3.0);

        for frame in engine.render_all().unwrap() {
            for (x, y) in frame.predicted_path.points() {
                assert!(bounds.contains_point(x, y));
            }
        }
    }

    #[test]
    fn test_larger_margin_strictly_contains_smaller() {
        let narrow = offset_engine(0.1);
        let wide = offset_engine(0.2);

        assert!(wide.bounds().strictly_contains(narrow.bounds()));
    }

    #[test]
    fn test_frame_count_follows_stride() {
        let mut engine = straight_engine(10.0);
        assert_eq!(engine.skip_frames(), 1);
        assert_eq!(engine.total_frames(), 5);

        for (stride, expected) in [(1, 5), (2, 2), (3, 1), (5, 1), (6, 0), (100, 0)] {
            engine.set_skip_frames(stride).unwrap();
            assert_eq!(engine.total_frames(), expected, "stride {stride}");
            assert_eq!(engine.total_frames(), 5 / stride);
        }
    }

    #[test]
    fn test_zero_stride_keeps_previous_configuration() {
        let mut engine = straight_engine(10.0);
        engine.set_skip_frames(2).unwrap();

        let err = engine.set_skip_frames(0).unwrap_err();

        assert!(matches!(err, ReplayError::InvalidStride(0)));
        assert_eq!(engine.skip_frames(), 2);
        assert_eq!(engine.total_frames(), 2);
    }

    #[test]
    fn test_stride_does_not_rescan_bounds() {
        let mut engine = offset_engine(0.1);
        let before = *engine.bounds();

        engine.set_skip_frames(3).unwrap();

        assert_eq!(*engine.bounds(), before);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut engine = straight_engine(10.0);
        let total = engine.total_frames();

        let err = engine.render_frame(total).unwrap_err();
        assert!(matches!(err, ReplayError::IndexOutOfRange { index, total: t } if index == total && t == total));

        engine.set_skip_frames(10).unwrap();
        assert!(matches!(
            engine.render_frame(0),
            Err(ReplayError::IndexOutOfRange { index: 0, total: 0 })
        ));
    }

    #[test]
    fn test_render_is_idempotent_and_updates_view() {
        let mut engine = offset_engine(0.1);

        let first = engine.render_frame(2).unwrap();
        let second = engine.render_frame(2).unwrap();

        assert_eq!(first, second);
        assert_eq!(engine.view().path_curve, first.predicted_path);
        assert_eq!(engine.view().time_text, first.elapsed_label);

        // Seeking backwards is as good as playing forward.
        engine.render_frame(3).unwrap();
        assert_eq!(engine.render_frame(2).unwrap(), first);
        assert_eq!(engine.frame_state(2).unwrap(), first);
    }

    #[test]
    fn test_frame_state_leaves_view_alone() {
        let engine = offset_engine(0.1);

        engine.frame_state(1).unwrap();

        assert_eq!(engine.view(), &FrameView::default());
    }

    #[test]
    fn test_render_all_in_order() {
        let mut engine = straight_engine(10.0);
        engine.set_skip_frames(2).unwrap();

        let frames = engine.render_all().unwrap();

        let samples: Vec<usize> = frames.iter().map(|f| f.sample_index).collect();
        assert_eq!(samples, vec![0, 2]);
        assert_eq!(engine.view().time_text, frames[1].elapsed_label);
    }

    #[test]
    fn test_non_finite_states_become_zero() {
        let engine = ReplayEngine::new(
            times(2, 10.0),
            vec![vec![f64::NAN, 0.0, 0.0], vec![0.0, f64::INFINITY, 0.0]],
            vec![vec![0.0; N]; 2],
            params(),
            N,
            T_PREDICT,
            0.1,
        )
        .unwrap();

        assert_eq!(engine.sanitized_values(), 2);
        let frame = engine.frame_state(0).unwrap();
        assert!(frame.predicted_path.y.iter().all(|&y| y == 0.0));
    }

    #[test]
    fn test_construction_errors() {
        let build = |t: Vec<f64>, x: Vec<Vec<f64>>, u: Vec<Vec<f64>>, n: usize| {
            ReplayEngine::new(t, x, u, params(), n, T_PREDICT, 0.1)
        };

        assert!(matches!(
            build(vec![], vec![vec![0.0; 3]], vec![vec![0.0; N]], N),
            Err(ReplayError::MissingOrEmptySeries(SeriesKind::SampleTimes))
        ));
        assert!(matches!(
            build(times(2, 10.0), vec![], vec![vec![0.0; N]], N),
            Err(ReplayError::MissingOrEmptySeries(SeriesKind::States))
        ));
        assert!(matches!(
            build(times(2, 10.0), vec![vec![0.0; 3]], vec![], N),
            Err(ReplayError::MissingOrEmptySeries(SeriesKind::Controls))
        ));
        assert!(matches!(
            build(times(2, 10.0), vec![vec![0.0; 4]; 2], vec![vec![0.0; N]; 2], N),
            Err(ReplayError::DimensionMismatch { expected: 3, found: 4 })
        ));
        assert!(matches!(
            build(times(3, 10.0), vec![vec![0.0; 3]; 3], vec![vec![0.0; N]; 2], N),
            Err(ReplayError::LengthMismatch { states: 3, controls: 2 })
        ));
        assert!(matches!(
            build(times(2, 10.0), vec![vec![0.0; 3]; 2], vec![vec![0.0; N - 1]; 2], N),
            Err(ReplayError::HorizonMismatch { row: 0, .. })
        ));
        assert!(matches!(
            build(times(2, 10.0), vec![vec![0.0; 3]; 2], vec![vec![]; 2], 0),
            Err(ReplayError::InvalidHorizon(_))
        ));
    }

    #[test]
    fn test_from_config_uses_log_width_and_stride() {
        let series = LogSeries {
            sample_times: times(6, 20.0),
            states: vec![vec![0.0, 0.0, 0.0]; 6],
            controls: vec![vec![0.1; 4]; 6],
        };
        let config = ReplayConfig {
            skip_frames: 2,
            integration: IntegrationScheme::RungeKutta4,
            ..ReplayConfig::default()
        };

        let engine = ReplayEngine::from_config(series, &config).unwrap();

        assert_eq!(engine.horizon_steps(), 4);
        assert_eq!(engine.skip_frames(), 2);
        assert_eq!(engine.total_frames(), 3);
        assert_eq!(engine.frame_state(1).unwrap().controls, vec![0.1; 4]);
    }

    #[test]
    fn test_meta_frame_rate() {
        let mut engine = straight_engine(10.0);
        engine.set_skip_frames(2).unwrap();

        let meta = engine.meta();

        assert_eq!(meta.total_frames, 2);
        assert_relative_eq!(meta.frame_interval, 0.02);
        assert_relative_eq!(meta.frame_rate, 50.0, epsilon = 1e-9);
        assert_eq!(meta.bounds, *engine.bounds());
    }

    #[test]
    fn test_play_into_drives_sink() {
        let mut engine = offset_engine(0.1);
        let mut buffer = FrameBuffer::new();

        let played = engine.play_into(&mut buffer).unwrap();

        assert_eq!(played, 4);
        assert!(buffer.finished);
        assert_eq!(buffer.meta.as_ref().unwrap().total_frames, 4);
        assert_eq!(buffer.len(), 4);
        assert_eq!(buffer.get(3).unwrap(), &engine.frame_state(3).unwrap());
    }

    struct FailingSink {
        fail_at: usize,
        seen: usize,
    }

    impl FrameSink for FailingSink {
        fn consume(&mut self, _frame: &RenderState) -> Result<(), SinkError> {
            if self.seen == self.fail_at {
                return Err("disk full".into());
            }
            self.seen += 1;
            Ok(())
        }
    }

    #[test]
    fn test_sink_error_stops_playback() {
        let mut engine = straight_engine(10.0);
        let mut sink = FailingSink { fail_at: 1, seen: 0 };

        let err = engine.play_into(&mut sink).unwrap_err();

        assert!(matches!(err, ReplayError::Sink(_)));
        assert_eq!(sink.seen, 1);
    }

    #[test]
    fn test_engine_can_move_across_threads() {
        fn assert_send<T: Send>() {}
        assert_send::<ReplayEngine>();
    }
}
