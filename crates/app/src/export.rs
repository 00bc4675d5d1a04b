//! Still-frame export: one PNG per playback index plus timing metadata for
//! an external video encoder.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::info;
use plotters::prelude::*;
use replay::{FrameSink, PlaybackMeta, RenderState, SinkError, frame_file_name};

pub const PLOTS_DIR: &str = "plots";
pub const TIMING_FILE: &str = "timing.json";

const PATH_COLOR: RGBColor = RGBColor(0x00, 0x63, 0xB1);

/// Writes `<out>/plots/frame_%04d.png` for every frame and `<out>/timing.json`
/// when playback finishes.
pub struct PngFrameExporter {
    out_dir: PathBuf,
    size: (u32, u32),
    meta: Option<PlaybackMeta>,
    written: usize,
}

impl PngFrameExporter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        PngFrameExporter {
            out_dir: out_dir.into(),
            size: (800, 600),
            meta: None,
            written: 0,
        }
    }

    pub fn plots_dir(&self) -> PathBuf {
        self.out_dir.join(PLOTS_DIR)
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.plots_dir().join(frame_file_name(index))
    }

    pub fn timing_path(&self) -> PathBuf {
        self.out_dir.join(TIMING_FILE)
    }

    pub fn written(&self) -> usize {
        self.written
    }

    fn draw(
        &self,
        path: &Path,
        frame: &RenderState,
        meta: &PlaybackMeta,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let root = BitMapBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE)?;

        let b = &meta.bounds;
        let mut chart = ChartBuilder::on(&root)
            .caption("Predicted Path", ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(b.x_min..b.x_max, b.y_min..b.y_max)?;

        chart.configure_mesh().x_desc("x [m]").y_desc("y [m]").draw()?;

        chart.draw_series(LineSeries::new(
            frame.predicted_path.points(),
            PATH_COLOR.stroke_width(2),
        ))?;

        if let Some(start) = frame.predicted_path.points().next() {
            chart.draw_series(std::iter::once(Circle::new(start, 4, PATH_COLOR.filled())))?;
        }

        let (w, h) = self.size;
        root.draw_text(
            &frame.elapsed_label,
            &("sans-serif", 20).into_font().color(&BLACK),
            ((w as f64 * 0.80) as i32, (h as f64 * 0.88) as i32),
        )?;

        root.present()?;
        Ok(())
    }
}

impl FrameSink for PngFrameExporter {
    fn begin(&mut self, meta: &PlaybackMeta) -> Result<(), SinkError> {
        std::fs::create_dir_all(self.plots_dir())?;
        self.meta = Some(meta.clone());
        self.written = 0;
        Ok(())
    }

    fn consume(&mut self, frame: &RenderState) -> Result<(), SinkError> {
        let meta = self
            .meta
            .as_ref()
            .ok_or("frame received before playback began")?;
        let path = self.frame_path(frame.frame_index);
        self.draw(&path, frame, meta)
            .map_err(|e| format!("{}: {e}", path.display()))?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        let meta = self
            .meta
            .as_ref()
            .ok_or("playback finished before it began")?;
        let file = File::create(self.timing_path())?;
        serde_json::to_writer_pretty(BufWriter::new(file), meta)?;
        info!(
            "wrote {} frames to {} ({:.1} fps)",
            self.written,
            self.plots_dir().display(),
            meta.frame_rate
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replay::{ControlRange, GlobalBounds, LogSeries, ReplayConfig, ReplayEngine};

    fn meta(total_frames: usize) -> PlaybackMeta {
        PlaybackMeta {
            total_frames,
            skip_frames: 2,
            sample_period: 0.01,
            frame_interval: 0.02,
            frame_rate: 50.0,
            bounds: GlobalBounds {
                x_min: -0.1,
                x_max: 1.0,
                y_min: -0.5,
                y_max: 0.5,
            },
            control_range: ControlRange { min: -1.0, max: 1.0 },
        }
    }

    #[test]
    fn test_frame_paths_follow_naming_convention() {
        let exporter = PngFrameExporter::new("/tmp/run_1");

        assert_eq!(
            exporter.frame_path(7),
            PathBuf::from("/tmp/run_1/plots/frame_0007.png")
        );
        assert_eq!(exporter.timing_path(), PathBuf::from("/tmp/run_1/timing.json"));
    }

    #[test]
    fn test_timing_metadata_written_on_finish() {
        let out = std::env::temp_dir().join(format!("mpc_replay_export_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&out);
        let mut exporter = PngFrameExporter::new(&out);

        exporter.begin(&meta(0)).unwrap();
        exporter.finish().unwrap();

        assert!(exporter.plots_dir().is_dir());
        let text = std::fs::read_to_string(exporter.timing_path()).unwrap();
        let written: PlaybackMeta = serde_json::from_str(&text).unwrap();
        assert_eq!(written, meta(0));
        std::fs::remove_dir_all(&out).unwrap();
    }

    #[test]
    fn test_finish_without_begin_fails() {
        let mut exporter = PngFrameExporter::new("/nonexistent/out");
        assert!(exporter.finish().is_err());
    }

    #[test]
    fn test_plays_engine_into_numbered_pngs() {
        let out = std::env::temp_dir().join(format!("mpc_replay_frames_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&out);
        let horizon = 10;
        let series = LogSeries {
            sample_times: (0..6).map(|i| i as f64 * 10.0).collect(),
            states: (0..6).map(|i| vec![0.1 * i as f64, 0.05, 0.0]).collect(),
            controls: vec![vec![0.1; horizon]; 6],
        };
        let config = ReplayConfig {
            skip_frames: 2,
            ..ReplayConfig::default()
        };
        let mut engine = ReplayEngine::from_config(series, &config).unwrap();
        let mut exporter = PngFrameExporter::new(&out);

        let played = engine.play_into(&mut exporter).unwrap();

        assert_eq!(played, 3);
        assert_eq!(exporter.written(), engine.total_frames());
        for i in 0..played {
            let path = out.join("plots").join(format!("frame_{i:04}.png"));
            let size = std::fs::metadata(&path).unwrap().len();
            assert!(size > 0, "{} is empty", path.display());
        }
        assert!(!exporter.frame_path(played).exists());
        assert!(exporter.timing_path().is_file());
        std::fs::remove_dir_all(&out).unwrap();
    }
}
