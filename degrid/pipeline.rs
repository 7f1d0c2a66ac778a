use image::RgbImage;
use tracing::{info, warn};

use crate::{
    mask::{build_mask, Mask, MaskParams},
    remove::remove_pattern,
    types::RgbArray,
    DegridError,
};

pub const DEFAULT_GRID_STEP: usize = 8;
pub const DEFAULT_MASK_RADIUS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegridConfig {
    pub grid_step: usize,
    /// Suppression radius for 1024x1024 images, scaled for larger ones.
    pub mask_radius: usize,
    /// Process non-square images with a per-axis lattice instead of failing.
    pub allow_non_square: bool,
}

impl Default for DegridConfig {
    fn default() -> Self {
        Self {
            grid_step: DEFAULT_GRID_STEP,
            mask_radius: DEFAULT_MASK_RADIUS,
            allow_non_square: false,
        }
    }
}

impl DegridConfig {
    pub fn mask_params(&self) -> MaskParams {
        MaskParams {
            grid_step: self.grid_step,
            base_radius: self.mask_radius,
        }
    }

    pub fn validate(&self, height: usize, width: usize) -> Result<(), DegridError> {
        if height != width {
            if !self.allow_non_square {
                return Err(DegridError::NonSquare { height, width });
            }
            warn!(height, width, "non-square image, lattice spacing differs per axis");
        }

        self.mask_params().spacing(height, width).map(|_| ())
    }
}

#[derive(Debug, Clone)]
pub struct Degridded {
    pub image: RgbImage,
    pub mask: Mask,
}

/// Validate `config` against the image, build the mask and remove the grid.
pub fn degrid(image: &RgbImage, config: &DegridConfig) -> Result<Degridded, DegridError> {
    let (width, height) = image.dimensions();
    let (height, width) = (height as usize, width as usize);
    config.validate(height, width)?;

    let mask = build_mask(height, width, config.grid_step, config.mask_radius)?;
    info!(
        height,
        width,
        grid_step = config.grid_step,
        radius = mask.radius(),
        suppressed = mask.suppressed_count(),
        "removing grid pattern"
    );

    let output = remove_pattern(&RgbArray::from_image(image), &mask)?;

    Ok(Degridded {
        image: output.to_image(),
        mask,
    })
}
