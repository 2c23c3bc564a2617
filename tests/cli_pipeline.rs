//! End-to-end runs of the `canvas-engine` binary.

use std::path::{Path, PathBuf};
use std::process::Command;

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_canvas-engine"))
}

fn workdir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join(format!("canvas-engine-cli-{}", std::process::id()))
        .join(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write(path: &Path, contents: &str) {
    std::fs::write(path, contents).unwrap();
}

#[test]
fn new_canvas_with_script_writes_png() {
    let dir = workdir("new_canvas");
    let script = dir.join("ops.json");
    write(
        &script,
        r#"[
            {"op": "fill", "x": 0, "y": 0, "brush": {"color": [0, 0, 255]}},
            {"op": "stroke", "points": [[2, 4], [13, 4]],
             "brush": {"radius": 1.5, "softness": 0, "opacity": 1, "color": [255, 255, 0]}},
            {"op": "filter", "kind": "invert", "intensity": 1.0}
        ]"#,
    );
    let out = dir.join("sketch.png");

    let status = bin()
        .args(["--new", "16x8", "--script"])
        .arg(&script)
        .arg("-o")
        .arg(&out)
        .arg("--log")
        .arg(dir.join("session.log"))
        .status()
        .unwrap();
    assert!(status.success());

    let img = image::open(&out).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (16, 8));
    // blue background inverted to yellow, yellow stroke inverted to blue
    assert_eq!(img.get_pixel(0, 0).0, [255, 255, 0, 255]);
    assert_eq!(img.get_pixel(8, 4).0, [0, 0, 255, 255]);

    let log = std::fs::read_to_string(dir.join("session.log")).unwrap();
    assert!(log.contains("session started"));
}

#[test]
fn converting_in_place_does_not_overwrite_input() {
    let dir = workdir("convert");
    let input = dir.join("photo.png");
    image::RgbaImage::from_pixel(3, 3, image::Rgba([1, 2, 3, 4]))
        .save(&input)
        .unwrap();

    let status = bin()
        .arg("-i")
        .arg(&input)
        .arg("--log")
        .arg(dir.join("session.log"))
        .status()
        .unwrap();
    assert!(status.success());

    let copy = image::open(dir.join("photo_out.png")).unwrap().to_rgba8();
    assert!(copy.pixels().all(|p| p.0 == [1, 2, 3, 4]));
}

#[test]
fn batch_with_config_and_bad_file_fails_overall() {
    let dir = workdir("batch");
    let out_dir = dir.join("out");
    for name in ["a.png", "b.png"] {
        image::RgbaImage::from_pixel(4, 4, image::Rgba([100, 100, 100, 255]))
            .save(dir.join(name))
            .unwrap();
    }
    write(&dir.join("broken.png"), "not an image");
    write(&dir.join("engine.toml"), "fill_tolerance = 0\n");
    write(
        &dir.join("ops.json"),
        r#"[{"op": "filter", "kind": "grayscale"}]"#,
    );

    let status = bin()
        .arg("-i")
        .arg(dir.join("*.png"))
        .arg("--output-dir")
        .arg(&out_dir)
        .arg("--format")
        .arg("bmp")
        .arg("--config")
        .arg(dir.join("engine.toml"))
        .arg("--script")
        .arg(dir.join("ops.json"))
        .arg("--log")
        .arg(dir.join("session.log"))
        .status()
        .unwrap();
    assert!(!status.success());

    for name in ["a.bmp", "b.bmp"] {
        let img = image::open(out_dir.join(name)).unwrap().to_rgba8();
        assert_eq!(img.get_pixel(1, 1).0, [100, 100, 100, 255]);
    }
    assert!(!out_dir.join("broken.bmp").exists());
}

#[test]
fn invalid_script_is_rejected_before_any_output() {
    let dir = workdir("bad_script");
    write(&dir.join("ops.json"), r#"[{"op": "smudge"}]"#);
    let out = dir.join("never.png");

    let status = bin()
        .args(["--new", "4x4"])
        .arg("--script")
        .arg(dir.join("ops.json"))
        .arg("-o")
        .arg(&out)
        .arg("--log")
        .arg(dir.join("session.log"))
        .status()
        .unwrap();
    assert!(!status.success());
    assert!(!out.exists());
}
