use std::path::{Path, PathBuf};

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_pathviz")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "pathviz.exe"
            } else {
                "pathviz"
            });
            p
        })
}

fn write_run(dir: &Path, base: &str) {
    std::fs::write(
        dir.join(format!("{base}_ground_truth.json")),
        r#"{"grid": [[true, true, true], [true, false, true], [true, true, true]], "start": [0, 0], "goal": [2, 2]}"#,
    )
    .unwrap();
    std::fs::write(
        dir.join(format!("{base}_step_1.json")),
        r#"{"sample_grid": [[0.1, 0.2, 0.3], [0.0, 0.0, 0.0], [0.4, 0.5, 0.6]], "paths": [[[0, 0], 1.0], [[0, 1], 2.0]], "current": [0, 0], "next": [0, 1], "stats": ["expanded 2"]}"#,
    )
    .unwrap();
    std::fs::write(
        dir.join(format!("{base}_final_path.json")),
        r#"{"path": [[[[0, 0], [0, 1]], 0.5], [[[0, 1], [0, 2]], 1.0]], "length": 2.0}"#,
    )
    .unwrap();
}

fn fresh_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("cli_smoke").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn cli_batch_writes_frame_series() {
    let dir = fresh_dir("batch");
    write_run(&dir, "maze");
    let out = dir.join("frames");

    let status = std::process::Command::new(exe())
        .args(["--labels", "--limit", "5", "--width", "200", "--height", "150"])
        .arg("--dir")
        .arg(&dir)
        .arg("--out-dir")
        .arg(&out)
        .arg("maze")
        .status()
        .unwrap();

    assert!(status.success());
    for name in [
        "maze_ground_truth.png",
        "maze_step_1.png",
        "maze_final_path.png",
    ] {
        assert!(out.join(name).exists(), "{name} missing");
    }
    assert!(!out.join("maze_step_2.png").exists());
    let img = image::open(out.join("maze_step_1.png")).unwrap();
    assert_eq!((img.width(), img.height()), (200, 150));
}

#[test]
fn cli_keeps_going_after_a_failed_base_and_exits_nonzero() {
    let dir = fresh_dir("partial");
    write_run(&dir, "ok");

    let status = std::process::Command::new(exe())
        .arg("--dir")
        .arg(&dir)
        .args(["missing", "ok"])
        .status()
        .unwrap();

    assert!(!status.success());
    assert!(dir.join("ok_final_path.png").exists());
}

#[test]
fn cli_preview_writes_temp_png_without_viewer() {
    let dir = fresh_dir("preview");
    write_run(&dir, "pv_smoke");
    let expected = std::env::temp_dir().join("pv_smoke_step_1_preview.png");
    let _ = std::fs::remove_file(&expected);

    let status = std::process::Command::new(exe())
        .args(["--step", "1", "--no-open"])
        .arg("--dir")
        .arg(&dir)
        .arg("pv_smoke")
        .status()
        .unwrap();

    assert!(status.success());
    assert!(expected.exists());
    assert!(!dir.join("pv_smoke_step_1.png").exists());
}

#[test]
fn cli_preview_of_missing_step_fails() {
    let dir = fresh_dir("preview_missing");
    write_run(&dir, "pm");

    let status = std::process::Command::new(exe())
        .args(["--step", "9", "--no-open"])
        .arg("--dir")
        .arg(&dir)
        .arg("pm")
        .status()
        .unwrap();

    assert!(!status.success());
}

#[test]
fn cli_preview_keeps_going_after_a_failed_base() {
    let dir = fresh_dir("preview_partial");
    write_run(&dir, "pv_after_missing");
    let expected = std::env::temp_dir().join("pv_after_missing_step_1_preview.png");
    let _ = std::fs::remove_file(&expected);

    let status = std::process::Command::new(exe())
        .args(["--step", "1", "--no-open"])
        .arg("--dir")
        .arg(&dir)
        .args(["missing", "pv_after_missing"])
        .status()
        .unwrap();

    assert!(!status.success());
    assert!(expected.exists());
}
