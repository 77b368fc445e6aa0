//! Pathviz renders the debug snapshots of a grid pathfinding run into PNG frames.
//!
//! A run for one base name `B` reads JSON snapshots written by an external planner and produces
//! `B_ground_truth.png`, one `B_step_{i}.png` per contiguous iteration, and `B_final_path.png`.
//!
//! # Pipeline overview
//!
//! 1. **Load**: [`SnapshotSource`] reads `B_ground_truth.json`, `B_step_{i}.json`, overlay masks and
//!    `B_final_path.json` into typed records. Producer grids are x-major and are transposed once.
//! 2. **Map**: [`to_plot_xy`] places points at cell centres with row 0 at the top; rasters always
//!    cover the fixed extent `[0, cols, 0, rows]`.
//! 3. **Layer**: the functions in [`layers`] each add one visual concern to a shared [`Canvas`].
//! 4. **Compose**: [`FrameComposer`] walks ground truth, steps and final path, writing one PNG per
//!    frame and clearing (never recreating) the canvas in between.
//!
//! A missing step file ends the series. A malformed file aborts that base name only.
#![forbid(unsafe_code)]

mod compose;
mod foundation;
mod plot;
mod render;
mod snapshot;

pub use compose::composer::{
    ComposeOpts, ComposerState, DEFAULT_STEP_LIMIT, FrameComposer, RunSummary,
};
pub use compose::preview::{open_in_viewer, preview_path, preview_step};
pub use foundation::core::{Dims, Grid, GridPoint, Point, Rect, Rgba8, parse_hex_color};
pub use foundation::error::{VizError, VizResult};
pub use plot::colormap::{
    Colormap, GRAY, GREYS, OVERLAY, VIRIDIS, VIRIDIS_CLEAR_ZERO, marker_color,
};
pub use plot::coords::{
    Extent, MarkerShape, PlotPoint, direction_marker, raster_extent, step_marker, to_plot_xy,
};
pub use render::canvas::{Canvas, Primitive, RenderSettings, Viewport, pt_to_px};
pub use render::layers;
pub use render::raster::Raster;
pub use render::text::{FONT_ENV, TextEngine};
pub use snapshot::loader::SnapshotSource;
pub use snapshot::model::{Edge, FinalPath, GroundTruth, OverlayMask, SampleSnapshot};
