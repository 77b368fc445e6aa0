//! Typed snapshot records and their on-disk JSON shapes.
//!
//! The `Raw*` structs mirror the documents the search side writes. Conversion into the public
//! records transposes grids into row-major storage and checks shapes against the run's [`Dims`].

use crate::foundation::core::{Dims, Grid, GridPoint};

/// Static occupancy grid plus optional endpoints.
#[derive(Clone, Debug, PartialEq)]
pub struct GroundTruth {
    pub grid: Grid<bool>,
    pub start: Option<GridPoint>,
    pub goal: Option<GridPoint>,
}

impl GroundTruth {
    pub fn dims(&self) -> Dims {
        self.grid.dims()
    }
}

/// One iteration of the search.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SampleSnapshot {
    pub sample_grid: Option<Grid<f64>>,
    pub paths: Vec<(GridPoint, f64)>,
    pub current: Option<GridPoint>,
    pub next: Option<GridPoint>,
    pub stats: Option<Vec<String>>,
}

/// Secondary boolean field drawn over the ground truth (e.g. sensor vision).
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayMask {
    pub grid: Grid<bool>,
}

/// A single edge of the final route.
pub type Edge = (GridPoint, GridPoint);

#[derive(Clone, Debug, PartialEq, Default)]
pub struct FinalPath {
    pub path: Vec<(Edge, f64)>,
    pub length: Option<f64>,
}

/// Boolean grid cell; producers emit either JSON booleans or 0/1 numbers.
#[derive(Clone, Copy, Debug, serde::Deserialize)]
#[serde(untagged)]
pub(crate) enum MaskCell {
    Bool(bool),
    Number(f64),
}

impl From<MaskCell> for bool {
    fn from(c: MaskCell) -> Self {
        match c {
            MaskCell::Bool(b) => b,
            MaskCell::Number(n) => n != 0.0,
        }
    }
}

/// Stats entry: a plain line or a `[key, value]` pair.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(untagged)]
pub(crate) enum StatLine {
    Text(String),
    Pair(String, String),
    Other(serde_json::Value),
}

impl StatLine {
    pub(crate) fn into_line(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Pair(k, v) => format!("{k}: {v}"),
            Self::Other(v) => v.to_string(),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct RawGroundTruth {
    pub grid: Vec<Vec<MaskCell>>,
    #[serde(default)]
    pub start: Option<GridPoint>,
    #[serde(default)]
    pub goal: Option<GridPoint>,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct RawStep {
    #[serde(default)]
    pub sample_grid: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    pub paths: Option<Vec<(GridPoint, f64)>>,
    #[serde(default)]
    pub current: Option<GridPoint>,
    #[serde(default)]
    pub next: Option<GridPoint>,
    #[serde(default)]
    pub stats: Option<Vec<StatLine>>,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct RawOverlay {
    pub grid: Vec<Vec<MaskCell>>,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct RawFinalPath {
    #[serde(default)]
    pub path: Option<Vec<(Edge, f64)>>,
    #[serde(default)]
    pub length: Option<f64>,
}

fn mask_grid(columns: Vec<Vec<MaskCell>>) -> Result<Grid<bool>, String> {
    let columns = columns
        .into_iter()
        .map(|c| c.into_iter().map(bool::from).collect())
        .collect();
    Grid::from_columns(columns)
}

impl RawGroundTruth {
    pub(crate) fn into_ground_truth(self) -> Result<GroundTruth, String> {
        let grid = mask_grid(self.grid)?;
        let dims = grid.dims();
        if dims.cols == 0 || dims.rows == 0 {
            return Err(format!("ground truth grid is empty ({dims})"));
        }
        Ok(GroundTruth {
            grid,
            start: self.start,
            goal: self.goal,
        })
    }
}

impl RawStep {
    pub(crate) fn into_snapshot(self, dims: Dims) -> Result<SampleSnapshot, String> {
        let sample_grid = match self.sample_grid {
            // The producer writes `[]` when there is no sample grid for this iteration.
            Some(columns) if !columns.is_empty() => {
                let grid = Grid::from_columns(columns)?;
                grid.expect_dims(dims, "sample_grid")?;
                Some(grid)
            }
            _ => None,
        };
        Ok(SampleSnapshot {
            sample_grid,
            paths: self.paths.unwrap_or_default(),
            current: self.current,
            next: self.next,
            stats: self
                .stats
                .map(|lines| lines.into_iter().map(StatLine::into_line).collect()),
        })
    }
}

impl RawOverlay {
    pub(crate) fn into_overlay(self, dims: Dims) -> Result<OverlayMask, String> {
        let grid = mask_grid(self.grid)?;
        grid.expect_dims(dims, "overlay grid")?;
        Ok(OverlayMask { grid })
    }
}

impl RawFinalPath {
    pub(crate) fn into_final_path(self) -> FinalPath {
        FinalPath {
            path: self.path.unwrap_or_default(),
            length: self.length,
        }
    }
}
