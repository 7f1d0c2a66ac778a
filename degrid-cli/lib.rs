use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use degrid::{degrid, DegridConfig, FourierPlan, Mask, RgbArray};
use image::RgbImage;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const CHANNEL_COLORS: [(&str, [u8; 3]); 3] = [
    ("r", [255, 0, 0]),
    ("g", [0, 255, 0]),
    ("b", [0, 0, 255]),
];

#[derive(Parser, Debug)]
#[command(name = "degrid")]
#[command(
    version,
    about = "Remove periodic grid artifacts by suppressing their peaks in the Fourier spectrum"
)]
pub struct Cli {
    /// Path of the input image
    #[arg(long, alias = "in_path", value_name = "FILE")]
    pub in_path: PathBuf,

    /// Output data dir, results go to <OUT_DIR>/step-<GRID_STEP>/
    #[arg(
        long,
        alias = "out_dir",
        value_name = "DIR",
        default_value = "peak_removed"
    )]
    pub out_dir: PathBuf,

    /// Radius of the disks masking the peaks (calibrated for 1024 x 1024 images)
    #[arg(long, alias = "mask_radius", default_value_t = degrid::pipeline::DEFAULT_MASK_RADIUS)]
    pub mask_radius: usize,

    /// Periodicity of the grid built to remove the peaks
    #[arg(long, alias = "grid_step", default_value_t = degrid::pipeline::DEFAULT_GRID_STEP)]
    pub grid_step: usize,

    /// Process non-square images instead of rejecting them
    #[arg(long)]
    pub allow_non_square: bool,

    /// Also write the mask and log-magnitude spectra before and after
    #[arg(long)]
    pub save_spectrum: bool,

    /// More logging (-v debug, -vv trace). RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn config(&self) -> DegridConfig {
        DegridConfig {
            grid_step: self.grid_step,
            mask_radius: self.mask_radius,
            allow_non_square: self.allow_non_square,
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.out_dir.join(format!("step-{}", self.grid_step))
    }

    /// Same file name as the input, inside [`Cli::output_dir`].
    pub fn output_path(&self) -> Result<PathBuf> {
        let name = self
            .in_path
            .file_name()
            .ok_or_else(|| anyhow!("input path {} has no file name", self.in_path.display()))?;
        Ok(self.output_dir().join(name))
    }
}

pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // a subscriber may already be installed when embedded or under test
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn read_rgb(path: &Path) -> Result<RgbImage> {
    let img = image::open(path)
        .with_context(|| format!("failed to open image {}", path.display()))?;
    Ok(img.to_rgb8())
}

/// Run the whole tool and return the path of the written image.
pub fn run(cli: &Cli) -> Result<PathBuf> {
    let input = read_rgb(&cli.in_path)?;
    let out_path = cli.output_path()?;

    let result = degrid(&input, &cli.config())
        .with_context(|| format!("failed to remove the grid from {}", cli.in_path.display()))?;

    let out_dir = cli.output_dir();
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

    result
        .image
        .save(&out_path)
        .with_context(|| format!("failed to save {}", out_path.display()))?;
    info!(path = %out_path.display(), "saved output image");

    if cli.save_spectrum {
        save_spectra(&out_path, &input, &result.image, &result.mask)?;
    }

    Ok(out_path)
}

/// Writes `<stem>.mask.png` and `<stem>.spectrum-<c>.{before,after}.png` next to `out_path`.
pub fn save_spectra(
    out_path: &Path,
    input: &RgbImage,
    output: &RgbImage,
    mask: &Mask,
) -> Result<Vec<PathBuf>> {
    let stem = out_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("output path {} has no usable file stem", out_path.display()))?;
    let dir = out_path.parent().unwrap_or_else(|| Path::new("."));
    let mut written = Vec::new();

    let mask_path = dir.join(format!("{stem}.mask.png"));
    mask.to_luma_image()
        .save(&mask_path)
        .with_context(|| format!("failed to save {}", mask_path.display()))?;
    written.push(mask_path);

    let (height, width) = mask.dim();
    let plan = FourierPlan::new(height, width);

    for (label, img) in [("before", input), ("after", output)] {
        let arr = RgbArray::from_image(img);
        for (channel, (name, color)) in CHANNEL_COLORS.iter().enumerate() {
            let samples = arr.channel(channel).mapv(f64::from);
            let spectrum = plan.forward(samples.view())?;

            let path = dir.join(format!("{stem}.spectrum-{name}.{label}.png"));
            spectrum
                .log_magnitude_image(*color)
                .save(&path)
                .with_context(|| format!("failed to save {}", path.display()))?;
            debug!(path = %path.display(), "saved spectrum");
            written.push(path);
        }
    }

    Ok(written)
}
