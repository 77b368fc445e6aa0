use std::path::{Path, PathBuf};

use pathviz::{Dims, GridPoint, SnapshotSource, VizError};

fn fixture_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("loader").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write(dir: &Path, file_name: &str, body: &str) {
    std::fs::write(dir.join(file_name), body).unwrap();
}

fn source(dir: &Path, base: &str) -> SnapshotSource {
    SnapshotSource::new(base).with_input_dir(Some(dir.to_path_buf()))
}

#[test]
fn ground_truth_dims_are_cols_by_rows() {
    let dir = fixture_dir("dims");
    // Three columns of two cells each.
    write(
        &dir,
        "g_ground_truth.json",
        r#"{"grid": [[true, false], [true, true], [false, false]], "start": [0, 1], "goal": [2, 0]}"#,
    );
    let gt = source(&dir, "g").load_ground_truth().unwrap();
    assert_eq!(gt.dims(), Dims::new(3, 2));
    assert_eq!(gt.start, Some(GridPoint::new(0, 1)));
    assert_eq!(gt.goal, Some(GridPoint::new(2, 0)));
    assert_eq!(gt.grid.get(0, 1), Some(&false));
    assert_eq!(gt.grid.get(1, 1), Some(&true));
    assert_eq!(
        pathviz::raster_extent(gt.dims()).as_array(),
        [0.0, 3.0, 0.0, 2.0]
    );
}

#[test]
fn absent_step_is_not_found_and_malformed_step_is_parse() {
    let dir = fixture_dir("kinds");
    write(&dir, "k_step_2.json", "{\"paths\": [[[0, 0], 1.0]");
    let src = source(&dir, "k");

    let missing = src.load_step(1, Dims::new(2, 2)).unwrap_err();
    assert!(missing.is_not_found());

    let broken = src.load_step(2, Dims::new(2, 2)).unwrap_err();
    assert!(matches!(broken, VizError::Parse { .. }), "{broken}");
    assert!(!broken.is_not_found());
}

#[test]
fn missing_keys_are_absent_values() {
    let dir = fixture_dir("optional");
    write(&dir, "o_ground_truth.json", r#"{"grid": [[false]]}"#);
    write(&dir, "o_step_1.json", "{}");
    write(&dir, "o_final_path.json", "{}");
    let src = source(&dir, "o");

    let gt = src.load_ground_truth().unwrap();
    assert_eq!((gt.start, gt.goal), (None, None));

    let step = src.load_step(1, gt.dims()).unwrap();
    assert!(step.sample_grid.is_none());
    assert!(step.paths.is_empty());
    assert_eq!((step.current, step.next), (None, None));
    assert!(step.stats.is_none());

    let fp = src.load_final_path().unwrap();
    assert!(fp.path.is_empty());
    assert_eq!(fp.length, None);
}

#[test]
fn explicit_nulls_are_absent_values() {
    let dir = fixture_dir("nulls");
    write(
        &dir,
        "n_step_1.json",
        r#"{"sample_grid": null, "paths": [], "current": null, "next": null, "stats": null}"#,
    );
    let step = source(&dir, "n").load_step(1, Dims::new(1, 1)).unwrap();
    assert!(step.sample_grid.is_none() && step.current.is_none() && step.stats.is_none());
}

#[test]
fn step_fields_parse() {
    let dir = fixture_dir("step");
    write(
        &dir,
        "s_step_4.json",
        r#"{
            "sample_grid": [[0.0, 0.5], [1.0, 0.25]],
            "paths": [[[1, 0], 3.0], [[0, 1], 1.0]],
            "current": [1, 0],
            "next": [1, 1],
            "stats": ["expanded 12", ["open", "4"]]
        }"#,
    );
    let step = source(&dir, "s").load_step(4, Dims::new(2, 2)).unwrap();
    let grid = step.sample_grid.unwrap();
    // sample_grid[x][y] -> get(col = x, row = y)
    assert_eq!(grid.get(1, 0), Some(&1.0));
    assert_eq!(grid.get(0, 1), Some(&0.5));
    assert_eq!(step.paths, vec![(GridPoint::new(1, 0), 3.0), (GridPoint::new(0, 1), 1.0)]);
    assert_eq!(step.current, Some(GridPoint::new(1, 0)));
    assert_eq!(step.next, Some(GridPoint::new(1, 1)));
    assert_eq!(
        step.stats,
        Some(vec!["expanded 12".to_string(), "open: 4".to_string()])
    );
}

#[test]
fn sample_grid_shape_mismatch_is_parse_error() {
    let dir = fixture_dir("shape");
    write(&dir, "m_step_1.json", r#"{"sample_grid": [[0.0, 1.0, 2.0]]}"#);
    let err = source(&dir, "m").load_step(1, Dims::new(2, 2)).unwrap_err();
    match err {
        VizError::Parse { msg, .. } => assert!(msg.contains("does not match ground truth"), "{msg}"),
        other => panic!("expected parse error, got {other}"),
    }
}

#[test]
fn overlay_reads_its_own_name() {
    let dir = fixture_dir("overlay");
    write(&dir, "vision_3.json", r#"{"grid": [[1, 0], [0, 0]]}"#);
    let src = source(&dir, "whatever").with_overlay(Some("vision".to_string()));

    let mask = src.load_overlay(3, Dims::new(2, 2)).unwrap();
    assert_eq!(mask.grid.get(0, 0), Some(&true));
    assert_eq!(mask.grid.get(0, 1), Some(&false));

    assert!(src.load_overlay(4, Dims::new(2, 2)).unwrap_err().is_not_found());
}

#[test]
fn final_path_edges_and_length() {
    let dir = fixture_dir("final");
    write(
        &dir,
        "f_final_path.json",
        r#"{"path": [[[[0, 0], [1, 0]], 0.5], [[[1, 0], [1, 1]], 1.0]], "length": 2.0}"#,
    );
    let fp = source(&dir, "f").load_final_path().unwrap();
    assert_eq!(fp.path.len(), 2);
    assert_eq!(
        fp.path[1],
        ((GridPoint::new(1, 0), GridPoint::new(1, 1)), 1.0)
    );
    assert_eq!(fp.length, Some(2.0));
}
