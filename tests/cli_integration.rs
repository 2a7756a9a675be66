//! CLI Integration Tests
//!
//! Tests for the CLI interface using assert_cmd

use assert_cmd::Command;
use image::{Rgb, RgbImage};
use lopdf::{Document, Object};
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn label_print_cmd() -> Command {
    // Use CARGO_BIN_EXE_<name> environment variable set by cargo test
    Command::new(env!("CARGO_BIN_EXE_label-print"))
}

/// White label with a 6px black frame starting 4px from the edge
fn write_label_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let in_frame = x >= 4 && x < width - 4 && y >= 4 && y < height - 4;
        let in_hole = x >= 10 && x < width - 10 && y >= 10 && y < height - 10;
        if in_frame && !in_hole {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    });
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}

fn number(obj: &Object) -> f64 {
    match obj {
        Object::Integer(i) => *i as f64,
        Object::Real(r) => *r as f64,
        other => panic!("not a number: {:?}", other),
    }
}

/// (page count, page size in points, embedded image sizes)
fn inspect_pdf(path: &Path) -> (usize, (f64, f64), Vec<(f64, f64)>) {
    let doc = Document::load(path).unwrap();
    let pages = doc.get_pages();

    let (_, page_id) = pages.iter().next().unwrap();
    let page = doc.get_dictionary(*page_id).unwrap();
    let mb: Vec<f64> = page
        .get(b"MediaBox")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(number)
        .collect();

    let images = doc
        .objects
        .values()
        .filter_map(|obj| match obj {
            Object::Stream(stream) => Some(&stream.dict),
            _ => None,
        })
        .filter(|dict| {
            matches!(dict.get(b"Subtype"), Ok(Object::Name(name)) if name.as_slice() == b"Image")
        })
        .map(|dict| {
            (
                number(dict.get(b"Width").unwrap()),
                number(dict.get(b"Height").unwrap()),
            )
        })
        .collect();

    (pages.len(), (mb[2] - mb[0], mb[3] - mb[1]), images)
}

#[test]
fn test_help_command() {
    label_print_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("label-print"))
        .stdout(predicate::str::contains("convert"))
        .stdout(predicate::str::contains("info"));
}

#[test]
fn test_version_command() {
    label_print_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_info_command() {
    label_print_cmd()
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("label-print"))
        .stdout(predicate::str::contains(
            ".bmp, .jpeg, .jpg, .pdf, .png, .tif, .tiff, .webp",
        ))
        .stdout(predicate::str::contains("letter"))
        .stdout(predicate::str::contains("DPI: 300"))
        .stdout(predicate::str::contains("Fit mode: fit"));
}

#[test]
fn test_convert_no_input_argument() {
    label_print_cmd()
        .args(["convert"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_convert_missing_input() {
    label_print_cmd()
        .args(["convert", "/nonexistent/label.png"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_convert_missing_second_input() {
    let dir = TempDir::new().unwrap();
    let first = write_label_png(dir.path(), "first.png", 40, 60);

    label_print_cmd()
        .arg("convert")
        .arg(&first)
        .arg(dir.path().join("second.png"))
        .arg("--dry-run")
        .assert()
        .code(3);
}

#[test]
fn test_convert_rejects_gif() {
    let dir = TempDir::new().unwrap();
    let gif = dir.path().join("label.gif");
    std::fs::write(&gif, b"GIF89a").unwrap();

    label_print_cmd()
        .arg("convert")
        .arg(&gif)
        .assert()
        .code(6)
        .stderr(predicate::str::contains("'.gif'"))
        .stderr(predicate::str::contains(
            ".bmp, .jpeg, .jpg, .pdf, .png, .tif, .tiff, .webp",
        ));
}

#[test]
fn test_convert_dry_run_defaults() {
    let dir = TempDir::new().unwrap();
    let input = write_label_png(dir.path(), "ship.png", 100, 150);

    label_print_cmd()
        .arg("convert")
        .arg(&input)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry Run"))
        .stdout(predicate::str::contains("Execution Plan"))
        .stdout(predicate::str::contains("ship_label.pdf"))
        .stdout(predicate::str::contains("1200x1800 px (fit)"))
        .stdout(predicate::str::contains("Border Crop: ENABLED"))
        .stdout(predicate::str::contains("100x150 px (0.33x0.50 in at 300 dpi)"));

    assert!(!dir.path().join("ship_label.pdf").exists());
}

#[test]
fn test_convert_dry_run_with_options() {
    let dir = TempDir::new().unwrap();
    let input = write_label_png(dir.path(), "ship.png", 100, 150);

    label_print_cmd()
        .arg("convert")
        .arg(&input)
        .args([
            "--dry-run",
            "--dpi",
            "203",
            "--fit",
            "fill",
            "--size",
            "4x8",
            "--no-crop",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("DPI: 203"))
        .stdout(predicate::str::contains("4x8 in -> 812x1624 px (fill)"))
        .stdout(predicate::str::contains("Border Crop: DISABLED"));
}

#[test]
fn test_convert_invalid_dpi() {
    label_print_cmd()
        .args(["convert", "label.png", "--dpi", "0"])
        .assert()
        .code(2);
}

#[test]
fn test_convert_with_config_file() {
    let dir = TempDir::new().unwrap();
    let input = write_label_png(dir.path(), "ship.png", 100, 150);
    let config = dir.path().join("custom.toml");
    std::fs::write(&config, "[general]\ndpi = 50\n\n[label]\nfit = \"stretch\"\n").unwrap();

    label_print_cmd()
        .arg("convert")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("200x300 px (stretch)"));

    // CLI wins over the file
    label_print_cmd()
        .arg("convert")
        .arg(&input)
        .arg("-c")
        .arg(&config)
        .args(["--dry-run", "--dpi", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("400x600 px (stretch)"));
}

#[test]
fn test_convert_verbosity_from_config_file() {
    let dir = TempDir::new().unwrap();
    let input = write_label_png(dir.path(), "ship.png", 100, 150);
    let config = dir.path().join("verbose.toml");
    std::fs::write(&config, "[general]\nverbose = 1\n").unwrap();

    label_print_cmd()
        .env_remove("RUST_LOG")
        .arg("convert")
        .arg(&input)
        .arg("-c")
        .arg(&config)
        .args(["-d", "50", "-o"])
        .arg(dir.path().join("verbose.pdf"))
        .assert()
        .success()
        .stderr(predicate::str::contains("Prepared label"));

    // Without the file the default level hides info logs
    label_print_cmd()
        .env_remove("RUST_LOG")
        .current_dir(dir.path())
        .arg("convert")
        .arg(&input)
        .args(["-d", "50", "-o"])
        .arg(dir.path().join("quiet.pdf"))
        .assert()
        .success()
        .stderr(predicate::str::contains("Prepared label").not());
}

#[test]
fn test_convert_dry_run_pdf_geometry() {
    let dir = TempDir::new().unwrap();
    let png = write_label_png(dir.path(), "ship.png", 200, 300);
    let pdf = dir.path().join("sheet.pdf");

    label_print_cmd()
        .arg("convert")
        .arg(&png)
        .arg("-o")
        .arg(&pdf)
        .args(["-d", "50", "-q"])
        .assert()
        .success();

    // Page tree is read without rendering, so no ImageMagick needed
    label_print_cmd()
        .arg("convert")
        .arg(&pdf)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("PDF, 1 page, 11.00x8.50 in"))
        .stdout(predicate::str::contains("renders to 3300x2550 px"));
}

#[test]
fn test_convert_invalid_config_file() {
    let dir = TempDir::new().unwrap();
    let input = write_label_png(dir.path(), "ship.png", 40, 60);
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, "[label]\nfit = \"zoom\"\n").unwrap();

    label_print_cmd()
        .arg("convert")
        .arg(&input)
        .arg("-c")
        .arg(&config)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("label.fit"));
}

#[test]
fn test_convert_single_label_to_pdf() {
    let dir = TempDir::new().unwrap();
    let input = write_label_png(dir.path(), "ship.png", 200, 300);

    label_print_cmd()
        .arg("convert")
        .arg(&input)
        .args(["--dpi", "100", "--quiet"])
        .assert()
        .success();

    let output = dir.path().join("ship_label.pdf");
    assert!(output.exists());

    let (pages, (w, h), images) = inspect_pdf(&output);
    assert_eq!(pages, 1);
    assert!((w - 792.0).abs() < 0.01, "page width {}", w);
    assert!((h - 612.0).abs() < 0.01, "page height {}", h);
    assert_eq!(images, vec![(400.0, 600.0)]);
}

#[test]
fn test_convert_two_labels_explicit_output() {
    let dir = TempDir::new().unwrap();
    let first = write_label_png(dir.path(), "a.png", 200, 300);
    let second = write_label_png(dir.path(), "b.png", 300, 200);
    let output = dir.path().join("out").join("both.pdf");

    label_print_cmd()
        .arg("convert")
        .arg(&first)
        .arg(&second)
        .arg("-o")
        .arg(&output)
        .args(["-d", "50", "-s", "2x7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 labels"));

    let (pages, _, images) = inspect_pdf(&output);
    assert_eq!(pages, 1);
    assert_eq!(images, vec![(100.0, 350.0), (100.0, 350.0)]);
}

#[test]
fn test_convert_corrupt_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("broken.png");
    std::fs::write(&input, b"definitely not a png").unwrap();

    label_print_cmd()
        .arg("convert")
        .arg(&input)
        .arg("-q")
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Unreadable input"));
}

#[test]
#[ignore = "requires ImageMagick"]
fn test_convert_pdf_label() {
    let dir = TempDir::new().unwrap();
    let png = write_label_png(dir.path(), "ship.png", 200, 300);
    let first = dir.path().join("first.pdf");

    // Produce a PDF label with the tool itself, then feed it back in
    label_print_cmd()
        .arg("convert")
        .arg(&png)
        .arg("-o")
        .arg(&first)
        .args(["-d", "50", "-q"])
        .assert()
        .success();

    let second = dir.path().join("second.pdf");
    label_print_cmd()
        .arg("convert")
        .arg(&first)
        .arg("-o")
        .arg(&second)
        .args(["-d", "50", "-q"])
        .assert()
        .success();

    let (pages, _, images) = inspect_pdf(&second);
    assert_eq!(pages, 1);
    assert_eq!(images, vec![(200.0, 300.0)]);
}
