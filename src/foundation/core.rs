use crate::foundation::error::{VizError, VizResult};

pub use kurbo::{Point, Rect};

/// Grid extent shared by every grid-shaped record of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dims {
    pub cols: u32,
    pub rows: u32,
}

impl Dims {
    pub fn new(cols: u32, rows: u32) -> Self {
        Self { cols, rows }
    }

    pub fn max_side(self) -> u32 {
        self.cols.max(self.rows)
    }

    pub fn cell_count(self) -> usize {
        self.cols as usize * self.rows as usize
    }

    pub fn contains(self, p: GridPoint) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < i64::from(self.cols) && p.y < i64::from(self.rows)
    }
}

impl std::fmt::Display for Dims {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}

/// Cell coordinate in grid-index space (`x` = column, `y` = row, row 0 at the top).
///
/// Serialized as a two-element array `[x, y]`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(from = "(i64, i64)", into = "(i64, i64)")]
pub struct GridPoint {
    pub x: i64,
    pub y: i64,
}

impl GridPoint {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Component-wise `self - other`.
    pub fn offset_from(self, other: GridPoint) -> (i64, i64) {
        (self.x.saturating_sub(other.x), self.y.saturating_sub(other.y))
    }
}

impl From<(i64, i64)> for GridPoint {
    fn from((x, y): (i64, i64)) -> Self {
        Self { x, y }
    }
}

impl From<GridPoint> for (i64, i64) {
    fn from(p: GridPoint) -> Self {
        (p.x, p.y)
    }
}

/// Row-major 2D storage: `cells[row * cols + col]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    dims: Dims,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn filled(dims: Dims, value: T) -> Self {
        Self {
            dims,
            cells: vec![value; dims.cell_count()],
        }
    }

    /// Transpose a column-major nested array (`columns[x][y]`) into row-major storage.
    ///
    /// Every inner column must have the same length.
    pub fn from_columns(columns: Vec<Vec<T>>) -> Result<Self, String> {
        let cols = columns.len();
        let rows = columns.first().map_or(0, Vec::len);
        if let Some((x, col)) = columns.iter().enumerate().find(|(_, c)| c.len() != rows) {
            return Err(format!(
                "ragged grid: column {x} has {} cells, expected {rows}",
                col.len()
            ));
        }
        let dims = Dims::new(
            u32::try_from(cols).map_err(|_| "grid too wide".to_string())?,
            u32::try_from(rows).map_err(|_| "grid too tall".to_string())?,
        );

        let mut cells = Vec::with_capacity(dims.cell_count());
        for y in 0..rows {
            for column in &columns {
                cells.push(column[y].clone());
            }
        }
        Ok(Self { dims, cells })
    }
}

impl<T> Grid<T> {
    pub fn dims(&self) -> Dims {
        self.dims
    }

    pub fn get(&self, col: u32, row: u32) -> Option<&T> {
        if col >= self.dims.cols || row >= self.dims.rows {
            return None;
        }
        self.cells.get(self.index(col, row))
    }

    pub fn get_mut(&mut self, col: u32, row: u32) -> Option<&mut T> {
        if col >= self.dims.cols || row >= self.dims.rows {
            return None;
        }
        let i = self.index(col, row);
        self.cells.get_mut(i)
    }

    pub fn at(&self, p: GridPoint) -> Option<&T> {
        if !self.dims.contains(p) {
            return None;
        }
        self.get(p.x as u32, p.y as u32)
    }

    /// Iterate `(col, row, value)` in row-major order.
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u32, &T)> + '_ {
        let cols = self.dims.cols.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, v)| ((i as u32) % cols, (i as u32) / cols, v))
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// Fails with a shape-mismatch error unless `self` spans exactly `dims`.
    pub fn expect_dims(&self, dims: Dims, what: &str) -> Result<(), String> {
        if self.dims != dims {
            return Err(format!(
                "{what} shape {} does not match ground truth {dims}",
                self.dims
            ));
        }
        Ok(())
    }

    fn index(&self, col: u32, row: u32) -> usize {
        row as usize * self.dims.cols as usize + col as usize
    }
}

/// Straight (non-premultiplied) RGBA8.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub fn is_transparent(self) -> bool {
        self.a == 0
    }

    pub fn to_premul(self) -> [u8; 4] {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        [
            premul(self.r, self.a),
            premul(self.g, self.a),
            premul(self.b, self.a),
            self.a,
        ]
    }

    /// Linear interpolation in sRGB space, `t` clamped to `[0, 1]`.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| -> u8 {
            (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8
        };
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

/// Parse `#rrggbb` or `#rrggbbaa`.
pub fn parse_hex_color(s: &str) -> VizResult<Rgba8> {
    let hex = s.trim().trim_start_matches('#');
    let byte = |i: usize| -> VizResult<u8> {
        hex.get(i..i + 2)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(|| VizError::validation(format!("invalid color '{s}'")))
    };
    match hex.len() {
        6 => Ok(Rgba8::new(byte(0)?, byte(2)?, byte(4)?, 255)),
        8 => Ok(Rgba8::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => Err(VizError::validation(format!("invalid color '{s}'"))),
    }
}
