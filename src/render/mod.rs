pub mod canvas;
pub mod layers;
pub mod raster;
pub mod text;
