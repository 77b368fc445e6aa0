use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::{
    compose::composer::FrameComposer,
    foundation::error::{VizError, VizResult},
};

/// Where the preview of step `i` of `base` is written.
pub fn preview_path(base: &str, i: u32) -> PathBuf {
    let name = Path::new(base)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(base);
    std::env::temp_dir().join(format!("{name}_step_{i}_preview.png"))
}

/// Render a single step frame to a temporary PNG and optionally hand it to the image viewer.
///
/// Unlike the batch run, a missing step file is an error here.
#[tracing::instrument(skip(composer))]
pub fn preview_step(
    composer: &mut FrameComposer,
    base: &str,
    i: u32,
    open: bool,
) -> VizResult<PathBuf> {
    let out = preview_path(base, i);
    composer.render_step_to(base, i, &out)?;
    tracing::info!(path = %out.display(), "preview written");
    if open {
        open_in_viewer(&out)?;
    }
    Ok(out)
}

/// Launch the platform's default image viewer on `path` without waiting for it.
pub fn open_in_viewer(path: &Path) -> VizResult<()> {
    let mut cmd = viewer_command(path);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    cmd.spawn().map_err(|e| {
        VizError::Other(anyhow::anyhow!(
            "failed to launch image viewer for '{}': {e}",
            path.display()
        ))
    })?;
    Ok(())
}

fn viewer_command(path: &Path) -> Command {
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(path);
        cmd
    } else if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]).arg(path);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(path);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_lands_in_temp_dir() {
        let p = preview_path("runs/maze", 3);
        assert_eq!(p.parent(), Some(std::env::temp_dir().as_path()));
        assert_eq!(
            p.file_name().and_then(|s| s.to_str()),
            Some("maze_step_3_preview.png")
        );
    }

    #[test]
    fn viewer_receives_the_file() {
        let cmd = viewer_command(Path::new("x.png"));
        assert!(cmd.get_args().any(|a| a == "x.png"));
    }
}
