//! One renderer per visual concern. Each is additive: it only draws onto the canvas.
//!
//! Point layers go through [`to_plot_xy`]; raster layers go through [`Canvas::draw_raster`], which
//! always paints over the fixed `[0, cols, 0, rows]` extent.

use crate::{
    foundation::core::{Dims, Grid, GridPoint},
    foundation::error::VizResult,
    plot::colormap::{GRAY, GREYS, OVERLAY, VIRIDIS, VIRIDIS_CLEAR_ZERO, marker_color},
    plot::coords::{MarkerShape, direction_marker, to_plot_xy},
    render::canvas::Canvas,
    render::raster::Raster,
    snapshot::model::{FinalPath, GroundTruth, OverlayMask},
};

/// Upper bound for marker area in square points; sparse grids stop growing here.
pub const MAX_MARKER_AREA_PT2: f64 = 100.0;
pub const HEATMAP_OPACITY: f32 = 0.5;
pub const OVERLAY_OPACITY: f32 = 0.5;
pub const PATH_WIDTH_PT: f64 = 4.0;

const LABEL_PT: f64 = 10.0;
const STATS_PT: f64 = 12.0;
const PATH_LEN_PT: f64 = 14.0;

/// Marker area shrinks with grid density: `min(15000 / max(cols, rows), MAX_MARKER_AREA_PT2)`.
pub fn marker_area(dims: Dims) -> f64 {
    (15000.0 / f64::from(dims.max_side().max(1))).min(MAX_MARKER_AREA_PT2)
}

pub fn draw_ground_truth(canvas: &mut Canvas, gt: &GroundTruth) -> VizResult<()> {
    canvas.draw_raster(&Raster::from_mask(&gt.grid, &GRAY), 1.0)
}

/// Start as a circle, goal as a square.
pub fn draw_start_goal(canvas: &mut Canvas, gt: &GroundTruth) {
    let dims = canvas.dims();
    if let Some(start) = gt.start {
        canvas.draw_marker(
            to_plot_xy(start, dims),
            MarkerShape::Circle,
            marker_area(dims),
            marker_color(),
        );
    }
    draw_goal(canvas, gt.goal);
}

pub fn draw_goal(canvas: &mut Canvas, goal: Option<GridPoint>) {
    let dims = canvas.dims();
    if let Some(goal) = goal {
        canvas.draw_marker(
            to_plot_xy(goal, dims),
            MarkerShape::Square,
            marker_area(dims),
            marker_color(),
        );
    }
}

/// Scatter visit counts into a zeroed `rows x cols` field at `(row = y, col = x)`.
///
/// A later entry for the same cell overwrites an earlier one.
pub fn build_heatmap(paths: &[(GridPoint, f64)], dims: Dims) -> Result<Grid<f64>, String> {
    let mut heat = Grid::filled(dims, 0.0);
    for &(p, count) in paths {
        if !dims.contains(p) {
            return Err(format!(
                "path point [{}, {}] outside grid {dims}",
                p.x, p.y
            ));
        }
        if let Some(cell) = heat.get_mut(p.x as u32, p.y as u32) {
            *cell = count;
        }
    }
    Ok(heat)
}

pub fn draw_heatmap(canvas: &mut Canvas, heat: &Grid<f64>) -> VizResult<()> {
    canvas.draw_raster(
        &Raster::from_scalar(heat, &VIRIDIS_CLEAR_ZERO),
        HEATMAP_OPACITY,
    )
}

pub fn draw_overlay(canvas: &mut Canvas, mask: &OverlayMask) -> VizResult<()> {
    canvas.draw_raster(&Raster::from_mask(&mask.grid, &OVERLAY), OVERLAY_OPACITY)
}

/// Round to 3 decimals and print the shortest form with at least one fractional digit.
pub fn format_label(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let r = (v * 1000.0).round() / 1000.0;
    let mut s = r.to_string();
    if !s.contains('.') {
        s.push_str(".0");
    }
    s
}

/// Every cell's value as text at its centre, greyscale keyed to the value.
pub fn draw_scalar_labels(canvas: &mut Canvas, grid: &Grid<f64>) -> VizResult<()> {
    let dims = canvas.dims();
    let (_, cell_h) = canvas.viewport().cell_px();
    let size_px = canvas.pt_to_px(LABEL_PT).min(cell_h * 0.3).max(1.0);
    for (col, row, &v) in grid.iter_cells() {
        let at = to_plot_xy(GridPoint::new(i64::from(col), i64::from(row)), dims);
        canvas.draw_label(&format_label(v), at, size_px, GREYS.sample(v))?;
    }
    Ok(())
}

/// Each edge as a thick segment coloured by its weight.
pub fn draw_final_path(canvas: &mut Canvas, fp: &FinalPath) {
    let dims = canvas.dims();
    for &((a, b), weight) in &fp.path {
        canvas.draw_segment(
            to_plot_xy(a, dims),
            to_plot_xy(b, dims),
            PATH_WIDTH_PT,
            VIRIDIS.sample(weight),
        );
    }
}

pub fn draw_path_length(canvas: &mut Canvas, length: Option<f64>) -> VizResult<()> {
    match length {
        Some(len) => canvas.draw_text_box(&format!("Path Len: {len}"), PATH_LEN_PT),
        None => Ok(()),
    }
}

/// `current` as a circle, `next` shaped by the direction of travel.
pub fn draw_cursor(canvas: &mut Canvas, current: Option<GridPoint>, next: Option<GridPoint>) {
    let dims = canvas.dims();
    let area = marker_area(dims);
    if let Some(current) = current {
        canvas.draw_marker(
            to_plot_xy(current, dims),
            MarkerShape::Circle,
            area,
            marker_color(),
        );
    }
    if let Some(next) = next {
        canvas.draw_marker(
            to_plot_xy(next, dims),
            direction_marker(current, next),
            area,
            marker_color(),
        );
    }
}

pub fn draw_stats(canvas: &mut Canvas, stats: &[String]) -> VizResult<()> {
    if stats.is_empty() {
        return Ok(());
    }
    canvas.draw_text_box(&stats.join("\n"), STATS_PT)
}

/// `"maze"` -> `"Maze"`, `"MAZE"` -> `"Maze"`.
pub fn display_name(base: &str) -> String {
    let mut chars = base.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
