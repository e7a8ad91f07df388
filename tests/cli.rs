use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn dendroplot(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dendroplot"))
        .args(args)
        .args(["-v", "0"])
        .output()
        .expect("could not run dendroplot")
}

fn write_linkage(dir: &Path) -> String {
    let path = dir.join("enlace_minima.txt");
    fs::write(&path, "0.0000 1.0000 0.5000 2.0000\n2.0000 3.0000 1.2000 3.0000\n").unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn renders_the_example_dendrogram() {
    let tmp_dir = tempfile::TempDir::new().expect("could not create a tmp dir");
    let linkage = write_linkage(tmp_dir.path());
    let out = tmp_dir.path().join("dendrograma_minima.png");

    let output = dendroplot(&[&linkage, "A,B,C", out.to_str().unwrap(), "minima"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stdout));

    let img = image::open(&out).unwrap().to_rgb8();
    assert_eq!(img.dimensions(), (1200, 800));
    // both links use a distinct viridis color: the first and last of the scale
    assert!(img.pixels().any(|p| p.0 == [68, 1, 84]));
    assert!(img.pixels().any(|p| p.0 == [253, 231, 37]));
}

#[test]
fn svg_output_carries_the_annotations() {
    let tmp_dir = tempfile::TempDir::new().expect("could not create a tmp dir");
    let linkage = write_linkage(tmp_dir.path());
    let out = tmp_dir.path().join("dendrograma.svg");

    let output = dendroplot(&[&linkage, "A,B,C", out.to_str().unwrap(), "promedio"]);
    assert!(output.status.success());

    let svg = fs::read_to_string(&out).unwrap();
    assert!(svg.contains(">0.50</text>"));
    assert!(svg.contains(">1.20</text>"));
    assert!(svg.contains("Distancia Promedio"));
    assert_eq!(svg.matches("<circle").count(), 2);
}

#[test]
fn label_count_mismatch_writes_nothing() {
    let tmp_dir = tempfile::TempDir::new().expect("could not create a tmp dir");
    let linkage = write_linkage(tmp_dir.path());
    let out = tmp_dir.path().join("never.png");

    let output = dendroplot(&[&linkage, "A,B", out.to_str().unwrap(), "minima"]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("3 leaves vs 2 labels"), "{}", stdout);
    assert!(!out.exists());
}

#[test]
fn missing_linkage_file_is_named() {
    let tmp_dir = tempfile::TempDir::new().expect("could not create a tmp dir");
    let missing = tmp_dir.path().join("no_such_linkage.txt");
    let out = tmp_dir.path().join("never.png");

    let output = dendroplot(&[missing.to_str().unwrap(), "A,B,C", out.to_str().unwrap(), "minima"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("no_such_linkage.txt"));
    assert!(!out.exists());
}

#[test]
fn wrong_arity_prints_usage() {
    let output = Command::new(env!("CARGO_BIN_EXE_dendroplot"))
        .args(["enlace.txt", "A,B,C", "out.png"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("Usage: dendroplot"));
}

#[test]
fn malformed_rows_are_unexpected_errors() {
    let tmp_dir = tempfile::TempDir::new().expect("could not create a tmp dir");
    let linkage = tmp_dir.path().join("bad.txt");
    fs::write(&linkage, "0 1 zero 2\n2 3 1.2 3\n").unwrap();
    let out = tmp_dir.path().join("never.png");

    let output = dendroplot(&[linkage.to_str().unwrap(), "A,B,C", out.to_str().unwrap(), "minima"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("Unexpected error: "));
    assert!(!out.exists());
}

#[test]
fn unsupported_extension_writes_nothing() {
    let tmp_dir = tempfile::TempDir::new().expect("could not create a tmp dir");
    let linkage = write_linkage(tmp_dir.path());
    let out = tmp_dir.path().join("dendrogram.unknown");

    let output = dendroplot(&[&linkage, "A,B,C", out.to_str().unwrap(), "minima"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!out.exists());
}

#[test]
fn identical_inputs_give_identical_images() {
    let tmp_dir = tempfile::TempDir::new().expect("could not create a tmp dir");
    let linkage = tmp_dir.path().join("enlace.txt");
    // root joins the cluster of row 2 with the one of row 3, so drawing order differs from row order
    fs::write(&linkage, "2 3 0.8 2\n0 1 1.1 2\n5 4 2.4 3\n6 7 3.0 5\n").unwrap();
    let first = tmp_dir.path().join("a.png");
    let second = tmp_dir.path().join("b.png");

    for out in [&first, &second] {
        let output = dendroplot(&[linkage.to_str().unwrap(), "S1,S2,S3,S4,S5", out.to_str().unwrap(), "maxima"]);
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stdout));
    }
    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn extreme_distances_still_render() {
    let tmp_dir = tempfile::TempDir::new().expect("could not create a tmp dir");
    for (name, row) in [("tiny", "0 1 5e-324 2\n"), ("huge", "0 1 1.75e308 2\n")] {
        let linkage = tmp_dir.path().join(format!("{}.txt", name));
        fs::write(&linkage, row).unwrap();
        let out = tmp_dir.path().join(format!("{}.svg", name));

        let output = dendroplot(&[linkage.to_str().unwrap(), "A,B", out.to_str().unwrap(), "minima"]);
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stdout));

        let svg = fs::read_to_string(&out).unwrap();
        assert!(!svg.contains("NaN") && !svg.contains("inf"), "{}", name);
        assert_eq!(svg.matches("<circle").count(), 1);
    }
}

#[test]
fn binary_linkage_file_is_malformed() {
    let tmp_dir = tempfile::TempDir::new().expect("could not create a tmp dir");
    let linkage = tmp_dir.path().join("enlace.bin");
    fs::write(&linkage, b"\xff\xfe\x00\x01").unwrap();
    let out = tmp_dir.path().join("never.png");

    let output = dendroplot(&[linkage.to_str().unwrap(), "A,B", out.to_str().unwrap(), "minima"]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Unexpected error: "), "{}", stdout);
    assert!(!out.exists());
}
