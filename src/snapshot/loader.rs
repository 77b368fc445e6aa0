use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;

use crate::{
    foundation::core::Dims,
    foundation::error::{VizError, VizResult},
    snapshot::model::{
        FinalPath, GroundTruth, OverlayMask, RawFinalPath, RawGroundTruth, RawOverlay, RawStep,
        SampleSnapshot,
    },
};

/// Where the documents of one run live.
///
/// File names follow the producer's convention:
/// `{base}_ground_truth.json`, `{base}_step_{i}.json`, `{overlay}_{i}.json` and
/// `{base}_final_path.json`, each resolved under `input_dir` when one is set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotSource {
    input_dir: Option<PathBuf>,
    base: String,
    overlay: Option<String>,
}

impl SnapshotSource {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            input_dir: None,
            base: base.into(),
            overlay: None,
        }
    }

    pub fn with_input_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.input_dir = dir;
        self
    }

    pub fn with_overlay(mut self, overlay: Option<String>) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn overlay(&self) -> Option<&str> {
        self.overlay.as_deref()
    }

    pub fn input_dir(&self) -> Option<&Path> {
        self.input_dir.as_deref()
    }

    pub fn ground_truth_path(&self) -> PathBuf {
        self.resolve(&format!("{}_ground_truth.json", self.base))
    }

    pub fn step_path(&self, i: u32) -> PathBuf {
        self.resolve(&format!("{}_step_{i}.json", self.base))
    }

    pub fn overlay_path(&self, i: u32) -> Option<PathBuf> {
        self.overlay
            .as_ref()
            .map(|name| self.resolve(&format!("{name}_{i}.json")))
    }

    pub fn final_path_path(&self) -> PathBuf {
        self.resolve(&format!("{}_final_path.json", self.base))
    }

    pub fn load_ground_truth(&self) -> VizResult<GroundTruth> {
        let path = self.ground_truth_path();
        let raw: RawGroundTruth = read_json(&path)?;
        raw.into_ground_truth()
            .map_err(|msg| VizError::parse(&path, msg))
    }

    /// Load iteration `i`. `NotFound` marks the end of the series.
    pub fn load_step(&self, i: u32, dims: Dims) -> VizResult<SampleSnapshot> {
        let path = self.step_path(i);
        let raw: RawStep = read_json(&path)?;
        raw.into_snapshot(dims)
            .map_err(|msg| VizError::parse(&path, msg))
    }

    /// Load the overlay mask for iteration `i`.
    ///
    /// Returns `NotFound` both when the file is absent and when no overlay name is configured.
    pub fn load_overlay(&self, i: u32, dims: Dims) -> VizResult<OverlayMask> {
        let path = self
            .overlay_path(i)
            .ok_or_else(|| VizError::NotFound(self.resolve(&format!("<no overlay>_{i}.json"))))?;
        let raw: RawOverlay = read_json(&path)?;
        raw.into_overlay(dims)
            .map_err(|msg| VizError::parse(&path, msg))
    }

    pub fn load_final_path(&self) -> VizResult<FinalPath> {
        let path = self.final_path_path();
        let raw: RawFinalPath = read_json(&path)?;
        Ok(raw.into_final_path())
    }

    fn resolve(&self, file_name: &str) -> PathBuf {
        match &self.input_dir {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        }
    }
}

/// Open, parse and close one JSON document.
fn read_json<T: DeserializeOwned>(path: &Path) -> VizResult<T> {
    let f = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(VizError::NotFound(path.to_path_buf()));
        }
        Err(e) => return Err(VizError::io(path, e)),
    };
    let r = BufReader::new(f);
    serde_json::from_reader(r).map_err(|e| {
        if e.is_io() {
            VizError::io(path, std::io::Error::other(e))
        } else {
            VizError::parse(path, e.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_convention() {
        let src = SnapshotSource::new("maze")
            .with_input_dir(Some(PathBuf::from("runs")))
            .with_overlay(Some("vision".to_string()));
        assert_eq!(
            src.ground_truth_path(),
            PathBuf::from("runs").join("maze_ground_truth.json")
        );
        assert_eq!(src.step_path(12), PathBuf::from("runs").join("maze_step_12.json"));
        assert_eq!(
            src.overlay_path(3),
            Some(PathBuf::from("runs").join("vision_3.json"))
        );
        assert_eq!(
            src.final_path_path(),
            PathBuf::from("runs").join("maze_final_path.json")
        );
    }

    #[test]
    fn no_input_dir_means_relative_names() {
        let src = SnapshotSource::new("a");
        assert_eq!(src.step_path(1), PathBuf::from("a_step_1.json"));
        assert_eq!(src.overlay_path(1), None);
    }

    #[test]
    fn overlay_without_name_is_not_found() {
        let src = SnapshotSource::new("a");
        let err = src.load_overlay(1, Dims::new(1, 1)).unwrap_err();
        assert!(err.is_not_found());
    }
}
