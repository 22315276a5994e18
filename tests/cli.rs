//! Command-line tests against the built binary.
//!
//! Run with: `cargo test --test cli`

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn mosaic_gal(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mosaic-gal"))
        .args(args)
        .output()
        .expect("failed to run mosaic-gal")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn write_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    image::RgbImage::from_pixel(width, height, image::Rgb([90, 140, 200]))
        .save(path)
        .unwrap();
}

fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_jpeg(&tmp.path().join("images/!a.jpg"), 800, 400);
    write_jpeg(&tmp.path().join("images/trips/img2.jpg"), 200, 300);
    write_jpeg(&tmp.path().join("images/trips/img10.jpg"), 200, 300);
    tmp
}

#[test]
fn gen_config_prints_every_section() {
    let out = mosaic_gal(&["gen-config"]);
    assert!(out.status.success());
    let text = stdout(&out);
    for section in ["[thumbnails]", "[metadata]", "[watch]", "[processing]"] {
        assert!(text.contains(section), "missing {section}");
    }
}

#[test]
fn generated_config_loads_back() {
    let tmp = TempDir::new().unwrap();
    let out = mosaic_gal(&["gen-config"]);
    std::fs::write(tmp.path().join("gallery.toml"), &out.stdout).unwrap();
    let root = tmp.path().to_str().unwrap();
    assert!(mosaic_gal(&["--root", root, "check"]).status.success());
}

#[test]
fn check_lists_in_natural_order() {
    let tmp = project();
    let out = mosaic_gal(&["--root", tmp.path().to_str().unwrap(), "check"]);
    assert!(out.status.success());
    let text = stdout(&out);
    let a = text.find("a.jpg").unwrap();
    let img2 = text.find("img2.jpg").unwrap();
    let img10 = text.find("img10.jpg").unwrap();
    assert!(a < img2 && img2 < img10, "{text}");
    assert!(text.contains("Found 3 images (1 featured)"));
    assert!(!tmp.path().join("public").exists(), "check must not write");
}

#[test]
fn sync_then_catalog() {
    let tmp = project();
    let root = tmp.path().to_str().unwrap();

    let out = mosaic_gal(&["--root", root, "sync"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let text = stdout(&out);
    assert!(text.contains("Synced 3 images (1 featured)"), "{text}");
    assert!(tmp.path().join("public/images-manifest.json").is_file());
    assert!(tmp.path().join("images/thumbnails/trips/img2.jpg").is_file());

    let out = mosaic_gal(&["--root", root, "catalog"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("Id: trips%2Fimg10.jpg"), "{text}");

    let out = mosaic_gal(&["--root", root, "catalog", "--id", "nope.jpg"]);
    assert!(!out.status.success());
}

#[test]
fn sync_without_thumbnails_warns() {
    let tmp = project();
    let out = mosaic_gal(&["--root", tmp.path().to_str().unwrap(), "sync", "--no-thumbs"]);
    assert!(out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("warning: no thumbnail for !a.jpg"), "{stderr}");
    assert!(!tmp.path().join("images/thumbnails").exists());
}

#[test]
fn frame_writes_bordered_copy() {
    let tmp = project();
    let output = tmp.path().join("framed.jpg");
    let out = mosaic_gal(&[
        "frame",
        tmp.path().join("images/!a.jpg").to_str().unwrap(),
        "--border",
        "20",
        "--output",
        output.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(image::image_dimensions(&output).unwrap(), (840, 440));
}

#[test]
fn invalid_config_is_rejected() {
    let tmp = project();
    std::fs::write(tmp.path().join("gallery.toml"), "colour = \"red\"\n").unwrap();
    let out = mosaic_gal(&["--root", tmp.path().to_str().unwrap(), "sync"]);
    assert!(!out.status.success());
}
