pub mod composer;
pub mod preview;
