use std::path::{Path, PathBuf};

use clap::Parser;
use degrid_cli::{run, Cli};
use image::{ImageBuffer, Rgb, RgbImage};

fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let img: RgbImage = ImageBuffer::from_fn(width, height, |x, y| {
        let line = if x % 4 == 0 || y % 4 == 0 { 50 } else { 0 };
        Rgb([(40 + x + line) as u8, (60 + y) as u8, (100 + line) as u8])
    });
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("degrid").chain(args.iter().copied())).unwrap()
}

#[test]
fn defaults_follow_the_original_tool() {
    let cli = parse(&["--in-path", "img.png"]);

    assert_eq!(cli.out_dir, PathBuf::from("peak_removed"));
    assert_eq!(cli.mask_radius, 10);
    assert_eq!(cli.grid_step, 8);
    assert!(!cli.allow_non_square);
    assert!(!cli.save_spectrum);
    assert_eq!(cli.output_path().unwrap(), PathBuf::from("peak_removed/step-8/img.png"));
}

#[test]
fn underscore_spellings_are_accepted() {
    let cli = parse(&[
        "--in_path",
        "dir/photo.jpg",
        "--out_dir",
        "out",
        "--grid_step",
        "4",
        "--mask_radius",
        "3",
    ]);

    assert_eq!(cli.config().grid_step, 4);
    assert_eq!(cli.config().mask_radius, 3);
    assert_eq!(cli.output_path().unwrap(), PathBuf::from("out/step-4/photo.jpg"));
}

#[test]
fn in_path_is_required() {
    assert!(Cli::try_parse_from(["degrid"]).is_err());
}

#[test]
fn writes_output_under_step_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_png(tmp.path(), "grid.png", 64, 64);
    let out_dir = tmp.path().join("out");

    let cli = parse(&[
        "--in-path",
        input.to_str().unwrap(),
        "--out-dir",
        out_dir.to_str().unwrap(),
    ]);
    let written = run(&cli).unwrap();

    assert_eq!(written, out_dir.join("step-8").join("grid.png"));
    let output = image::open(&written).unwrap().to_rgb8();
    assert_eq!(output.dimensions(), (64, 64));
}

#[test]
fn save_spectrum_dumps_mask_and_channel_spectra() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_png(tmp.path(), "grid.png", 32, 32);

    let cli = parse(&[
        "--in-path",
        input.to_str().unwrap(),
        "--out-dir",
        tmp.path().to_str().unwrap(),
        "--grid-step",
        "4",
        "--save-spectrum",
    ]);
    run(&cli).unwrap();

    let step_dir = tmp.path().join("step-4");
    assert!(step_dir.join("grid.mask.png").is_file());
    for channel in ["r", "g", "b"] {
        for label in ["before", "after"] {
            let path = step_dir.join(format!("grid.spectrum-{channel}.{label}.png"));
            assert!(path.is_file(), "missing {}", path.display());
        }
    }
}

#[test]
fn missing_input_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("nope.png");

    let cli = parse(&["--in-path", missing.to_str().unwrap()]);
    let err = run(&cli).unwrap_err();

    assert!(format!("{err:#}").contains("nope.png"), "{err:#}");
}

#[test]
fn non_square_input_needs_flag() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_png(tmp.path(), "wide.png", 64, 32);
    let out_dir = tmp.path().join("out");
    let args = [
        "--in-path",
        input.to_str().unwrap(),
        "--out-dir",
        out_dir.to_str().unwrap(),
    ];

    let err = run(&parse(&args)).unwrap_err();
    assert!(format!("{err:#}").contains("square"), "{err:#}");
    assert!(!out_dir.join("step-8").exists());

    let mut cli = parse(&args);
    cli.allow_non_square = true;
    let written = run(&cli).unwrap();
    assert_eq!(image::open(written).unwrap().to_rgb8().dimensions(), (64, 32));
}

#[test]
fn rejected_config_leaves_no_output_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_png(tmp.path(), "grid.png", 32, 32);
    let out_dir = tmp.path().join("out");

    let cli = parse(&[
        "--in-path",
        input.to_str().unwrap(),
        "--out-dir",
        out_dir.to_str().unwrap(),
        "--grid-step",
        "0",
    ]);
    let err = run(&cli).unwrap_err();

    assert!(format!("{err:#}").contains("invalid grid step"), "{err:#}");
    assert!(!out_dir.exists());
}
