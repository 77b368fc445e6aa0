use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use crate::{
    foundation::core::Dims,
    foundation::error::{VizError, VizResult},
    render::canvas::{Canvas, RenderSettings},
    render::layers,
    snapshot::loader::SnapshotSource,
    snapshot::model::GroundTruth,
};

/// Step limit used when none is configured.
pub const DEFAULT_STEP_LIMIT: u32 = 10_000;

/// Options for a composition run.
#[derive(Clone, Debug)]
pub struct ComposeOpts {
    /// Draw `sample_grid` values as text on every cell.
    pub labels: bool,
    /// Highest step index rendered.
    pub limit: u32,
    /// Overlay base name; iteration `i` reads `{overlay}_{i}.json`.
    pub overlay: Option<String>,
    /// Prefix for every input file.
    pub input_dir: Option<PathBuf>,
    /// Where frames are written; defaults to `input_dir`.
    pub out_dir: Option<PathBuf>,
}

impl Default for ComposeOpts {
    fn default() -> Self {
        Self {
            labels: false,
            limit: DEFAULT_STEP_LIMIT,
            overlay: None,
            input_dir: None,
            out_dir: None,
        }
    }
}

impl ComposeOpts {
    pub fn source_for(&self, base: &str) -> SnapshotSource {
        SnapshotSource::new(base)
            .with_input_dir(self.input_dir.clone())
            .with_overlay(self.overlay.clone())
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.out_dir.as_deref().or(self.input_dir.as_deref())
    }
}

/// Per-base progression. `Init` loads the ground truth; `Done` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComposerState {
    Init,
    GroundTruthFrame,
    StepFrame(u32),
    FinalFrame,
    Done,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub base: String,
    pub dims: Dims,
    /// Every PNG written, in order.
    pub frames_written: Vec<PathBuf>,
    /// Number of step frames (contiguous from 1).
    pub steps_rendered: u32,
    pub elapsed: Duration,
}

#[derive(Default)]
struct RunState {
    ground_truth: Option<GroundTruth>,
    frames_written: Vec<PathBuf>,
    steps_rendered: u32,
}

impl RunState {
    fn ground_truth(&self) -> VizResult<&GroundTruth> {
        self.ground_truth
            .as_ref()
            .ok_or_else(|| VizError::Other(anyhow::anyhow!("ground truth not loaded (bug)")))
    }
}

/// Drives the frame series for one base name at a time, reusing a single canvas.
#[derive(Debug)]
pub struct FrameComposer {
    canvas: Canvas,
    opts: ComposeOpts,
}

impl FrameComposer {
    pub fn new(settings: RenderSettings, opts: ComposeOpts) -> VizResult<Self> {
        Ok(Self::with_canvas(Canvas::new(settings)?, opts))
    }

    pub fn with_canvas(canvas: Canvas, opts: ComposeOpts) -> Self {
        Self { canvas, opts }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn opts(&self) -> &ComposeOpts {
        &self.opts
    }

    /// Render every frame for `base`: ground truth, steps `1..` until the first missing step file
    /// or `limit`, then the final path.
    ///
    /// A parse or I/O failure stops this base early; frames already written stay on disk.
    #[tracing::instrument(skip(self))]
    pub fn run(&mut self, base: &str) -> VizResult<RunSummary> {
        let started = Instant::now();
        let source = self.opts.source_for(base);
        let mut run = RunState::default();

        let mut state = ComposerState::Init;
        while state != ComposerState::Done {
            state = self.advance(&source, state, &mut run)?;
        }

        let summary = RunSummary {
            base: base.to_string(),
            dims: run.ground_truth()?.dims(),
            frames_written: run.frames_written,
            steps_rendered: run.steps_rendered,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            frames = summary.frames_written.len(),
            steps = summary.steps_rendered,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "run complete"
        );
        Ok(summary)
    }

    /// Run each base name in turn. A failing base is logged and reported; the rest still run.
    pub fn run_batch(&mut self, bases: &[String]) -> Vec<(String, VizResult<RunSummary>)> {
        let mut out = Vec::with_capacity(bases.len());
        for base in bases {
            let res = self.run(base);
            if let Err(e) = &res {
                tracing::error!(base = base.as_str(), error = %e, "run aborted");
                // Leave nothing of the failed frame behind for the next base.
                self.canvas.clear();
            }
            out.push((base.clone(), res));
        }
        out
    }

    fn advance(
        &mut self,
        source: &SnapshotSource,
        state: ComposerState,
        run: &mut RunState,
    ) -> VizResult<ComposerState> {
        match state {
            ComposerState::Init => {
                let gt = source.load_ground_truth()?;
                tracing::debug!(dims = %gt.dims(), "ground truth loaded");
                self.canvas.set_dims(gt.dims());
                self.canvas.clear();
                run.ground_truth = Some(gt);
                Ok(ComposerState::GroundTruthFrame)
            }
            ComposerState::GroundTruthFrame => {
                self.compose_ground_truth_frame(source, run.ground_truth()?)?;
                let path = self.output_path(source, "ground_truth");
                self.write_frame(&path)?;
                run.frames_written.push(path);
                Ok(ComposerState::StepFrame(1))
            }
            ComposerState::StepFrame(i) if i > self.opts.limit => {
                tracing::debug!(limit = self.opts.limit, "step limit reached");
                Ok(ComposerState::FinalFrame)
            }
            ComposerState::StepFrame(i) => {
                match self.compose_step_frame(source, run.ground_truth()?, i) {
                    Ok(()) => {}
                    Err(e) if e.is_not_found() => {
                        tracing::debug!(step = i, "no more steps");
                        return Ok(ComposerState::FinalFrame);
                    }
                    Err(e) => return Err(e),
                }
                let path = self.output_path(source, &format!("step_{i}"));
                self.write_frame(&path)?;
                run.frames_written.push(path);
                run.steps_rendered += 1;
                Ok(ComposerState::StepFrame(i + 1))
            }
            ComposerState::FinalFrame => {
                self.compose_final_frame(source, run.ground_truth()?)?;
                let path = self.output_path(source, "final_path");
                self.write_frame(&path)?;
                run.frames_written.push(path);
                Ok(ComposerState::Done)
            }
            ComposerState::Done => Ok(ComposerState::Done),
        }
    }

    /// Ground truth plus start/goal markers.
    pub fn compose_ground_truth_frame(
        &mut self,
        source: &SnapshotSource,
        gt: &GroundTruth,
    ) -> VizResult<()> {
        let canvas = &mut self.canvas;
        canvas.draw_title(&format!("{} Ground Truth", title_name(source)))?;
        layers::draw_ground_truth(canvas, gt)?;
        layers::draw_start_goal(canvas, gt);
        Ok(())
    }

    /// Iteration `i`. Returns `NotFound` (with nothing drawn) when the step file is absent.
    pub fn compose_step_frame(
        &mut self,
        source: &SnapshotSource,
        gt: &GroundTruth,
        i: u32,
    ) -> VizResult<()> {
        let dims = gt.dims();
        let step = source.load_step(i, dims)?;
        let overlay = match source.overlay() {
            Some(_) => match source.load_overlay(i, dims) {
                Ok(mask) => Some(mask),
                Err(e) if e.is_not_found() => {
                    tracing::debug!(step = i, "no overlay for this step");
                    None
                }
                Err(e) => return Err(e),
            },
            None => None,
        };
        let heat = layers::build_heatmap(&step.paths, dims)
            .map_err(|msg| VizError::parse(source.step_path(i), msg))?;

        let canvas = &mut self.canvas;
        canvas.draw_title(&format!(
            "{} Sample Grid at Iteration {i}",
            title_name(source)
        ))?;
        layers::draw_ground_truth(canvas, gt)?;
        if let Some(mask) = &overlay {
            layers::draw_overlay(canvas, mask)?;
        }
        layers::draw_heatmap(canvas, &heat)?;
        if self.opts.labels {
            match &step.sample_grid {
                Some(grid) => layers::draw_scalar_labels(canvas, grid)?,
                None => tracing::debug!(step = i, "labels requested but no sample_grid"),
            }
        }
        layers::draw_goal(canvas, gt.goal);
        layers::draw_cursor(canvas, step.current, step.next);
        if let Some(stats) = &step.stats {
            layers::draw_stats(canvas, stats)?;
        }
        Ok(())
    }

    /// Ground truth, start/goal and the weighted path trace with its length.
    pub fn compose_final_frame(
        &mut self,
        source: &SnapshotSource,
        gt: &GroundTruth,
    ) -> VizResult<()> {
        let final_path = match source.load_final_path() {
            Ok(fp) => Some(fp),
            Err(e) if e.is_not_found() => {
                tracing::warn!(error = %e, "final path missing; rendering without trace");
                None
            }
            Err(e) => return Err(e),
        };

        let canvas = &mut self.canvas;
        canvas.draw_title(&format!("{} Final Path", title_name(source)))?;
        layers::draw_ground_truth(canvas, gt)?;
        layers::draw_start_goal(canvas, gt);
        if let Some(fp) = &final_path {
            layers::draw_final_path(canvas, fp);
            layers::draw_path_length(canvas, fp.length)?;
        }
        Ok(())
    }

    /// Render only step `i` of `base` to `out`.
    pub fn render_step_to(&mut self, base: &str, i: u32, out: &Path) -> VizResult<()> {
        let source = self.opts.source_for(base);
        let gt = source.load_ground_truth()?;
        self.canvas.set_dims(gt.dims());
        self.canvas.clear();
        self.compose_step_frame(&source, &gt, i)?;
        self.write_frame(out)
    }

    pub fn output_path(&self, source: &SnapshotSource, suffix: &str) -> PathBuf {
        let file_name = format!("{}_{suffix}.png", source.base());
        match self.opts.output_dir() {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        }
    }

    fn write_frame(&mut self, path: &Path) -> VizResult<()> {
        self.canvas.save_png(path)?;
        tracing::debug!(path = %path.display(), "wrote frame");
        self.canvas.clear();
        Ok(())
    }
}

fn title_name(source: &SnapshotSource) -> String {
    let base = source.base();
    let name = Path::new(base)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(base);
    layers::display_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_dir_defaults_to_input_dir() {
        let opts = ComposeOpts {
            input_dir: Some(PathBuf::from("in")),
            ..ComposeOpts::default()
        };
        assert_eq!(opts.output_dir(), Some(Path::new("in")));

        let opts = ComposeOpts {
            input_dir: Some(PathBuf::from("in")),
            out_dir: Some(PathBuf::from("out")),
            ..ComposeOpts::default()
        };
        assert_eq!(opts.output_dir(), Some(Path::new("out")));
    }

    #[test]
    fn default_limit_is_large() {
        assert_eq!(ComposeOpts::default().limit, DEFAULT_STEP_LIMIT);
        assert!(!ComposeOpts::default().labels);
    }

    #[test]
    fn source_carries_overlay_and_dir() {
        let opts = ComposeOpts {
            overlay: Some("vision".into()),
            input_dir: Some(PathBuf::from("d")),
            ..ComposeOpts::default()
        };
        let src = opts.source_for("maze");
        assert_eq!(src.base(), "maze");
        assert_eq!(src.overlay(), Some("vision"));
        assert_eq!(src.input_dir(), Some(Path::new("d")));
    }

    #[test]
    fn title_uses_file_name_of_base() {
        let src = SnapshotSource::new("runs/MAZE");
        assert_eq!(title_name(&src), "Maze");
    }
}
