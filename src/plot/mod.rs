pub mod colormap;
pub mod coords;
