use std::path::{Path, PathBuf};

pub type VizResult<T> = Result<T, VizError>;

#[derive(thiserror::Error, Debug)]
pub enum VizError {
    /// The file does not exist. For step files this is the end of the series.
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("parse error in '{}': {msg}", path.display())]
    Parse { path: PathBuf, msg: String },

    #[error("io error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("render error: {0}")]
    Render(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VizError {
    pub fn parse(path: impl AsRef<Path>, msg: impl Into<String>) -> Self {
        Self::Parse {
            path: path.as_ref().to_path_buf(),
            msg: msg.into(),
        }
    }

    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            VizError::parse("a.json", "x")
                .to_string()
                .contains("parse error in 'a.json':")
        );
        assert!(VizError::render("x").to_string().contains("render error:"));
        assert!(
            VizError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            VizError::NotFound(PathBuf::from("b_step_4.json"))
                .to_string()
                .contains("b_step_4.json")
        );
    }

    #[test]
    fn only_not_found_ends_a_series() {
        assert!(VizError::NotFound(PathBuf::from("x")).is_not_found());
        assert!(!VizError::parse("x", "bad").is_not_found());
        let io = std::io::Error::other("denied");
        assert!(!VizError::io("x", io).is_not_found());
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = VizError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
