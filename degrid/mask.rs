use image::{GrayImage, Luma};
use ndarray::Array2;

use crate::DegridError;

/// Image size the base radius is calibrated for.
pub const REFERENCE_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskParams {
    /// The lattice spacing in the centered spectrum is `size / grid_step`.
    pub grid_step: usize,
    /// Disk radius at [`REFERENCE_SIZE`].
    pub base_radius: usize,
}

impl MaskParams {
    /// Radius scales with whole multiples of the reference size, so anything
    /// smaller than 1024 rows ends up with a radius of 0.
    pub fn scaled_radius(&self, height: usize) -> usize {
        self.base_radius.saturating_mul(height / REFERENCE_SIZE)
    }

    /// [`MaskParams::scaled_radius`] capped at the image diagonal, past which
    /// every disk already covers the whole array.
    pub fn effective_radius(&self, height: usize, width: usize) -> usize {
        let diagonal = (height as f64).hypot(width as f64).ceil() as usize;
        self.scaled_radius(height).min(diagonal)
    }

    /// `(row spacing, column spacing)` of the peak lattice.
    pub fn spacing(&self, height: usize, width: usize) -> Result<(usize, usize), DegridError> {
        if height == 0 || width == 0 {
            return Err(DegridError::EmptyImage);
        }

        let invalid = DegridError::InvalidGridStep {
            grid_step: self.grid_step,
            height,
            width,
        };

        if self.grid_step == 0 {
            return Err(invalid);
        }

        match (height / self.grid_step, width / self.grid_step) {
            (0, _) | (_, 0) => Err(invalid),
            spacing => Ok(spacing),
        }
    }
}

/// Pass/suppress mask in the centered frequency domain. `true` keeps a bin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    pass: Array2<bool>,
    lattice: Vec<(usize, usize)>,
    radius: usize,
}

impl Mask {
    pub fn all_pass(height: usize, width: usize) -> Self {
        Self {
            pass: Array2::from_elem((height, width), true),
            lattice: Vec::new(),
            radius: 0,
        }
    }

    /// `(height, width)`
    pub fn dim(&self) -> (usize, usize) {
        self.pass.dim()
    }

    pub fn center(&self) -> (usize, usize) {
        let (height, width) = self.dim();
        (height / 2, width / 2)
    }

    pub fn is_pass(&self, y: usize, x: usize) -> bool {
        self.pass[[y, x]]
    }

    pub fn suppressed_count(&self) -> usize {
        self.pass.iter().filter(|pass| !**pass).count()
    }

    /// Predicted peak positions, before dilation. Never contains the center.
    pub fn lattice_points(&self) -> &[(usize, usize)] {
        &self.lattice
    }

    /// Disk radius actually used, after scaling to the image size.
    pub fn radius(&self) -> usize {
        self.radius
    }

    pub fn as_array(&self) -> &Array2<bool> {
        &self.pass
    }

    /// White where frequencies pass, black where they are suppressed.
    pub fn to_luma_image(&self) -> GrayImage {
        let (height, width) = self.dim();
        GrayImage::from_fn(width as u32, height as u32, |x, y| {
            Luma([if self.pass[[y as usize, x as usize]] { 255 } else { 0 }])
        })
    }
}

/// Offsets of a filled disk, every `(dy, dx)` with `dy² + dx² <= r²`.
/// Radius 0 is the single origin pixel. Allocates `(2r + 1)²` candidates, so
/// callers bound `radius` by the image size first.
pub fn disk(radius: usize) -> Vec<(isize, isize)> {
    let r = radius as isize;
    (-r..=r)
        .flat_map(|dy| (-r..=r).map(move |dx| (dy, dx)))
        .filter(|(dy, dx)| dy * dy + dx * dx <= r * r)
        .collect()
}

/// Build the keep mask for a grid whose peaks sit every `size / grid_step`
/// bins of the centered spectrum, starting one spacing away from the origin.
///
/// Every lattice point except the DC bin is dilated into a disk of
/// `base_radius * (height / 1024)` and suppressed; everything else passes.
/// The DC bin always passes, even when a neighbouring disk reaches it.
pub fn build_mask(
    height: usize,
    width: usize,
    grid_step: usize,
    base_radius: usize,
) -> Result<Mask, DegridError> {
    let params = MaskParams {
        grid_step,
        base_radius,
    };
    let (spacing_y, spacing_x) = params.spacing(height, width)?;
    let center = (height / 2, width / 2);

    let lattice: Vec<(usize, usize)> = (spacing_y..height)
        .step_by(spacing_y)
        .flat_map(|y| (spacing_x..width).step_by(spacing_x).map(move |x| (y, x)))
        .filter(|&point| point != center)
        .collect();

    let radius = params.effective_radius(height, width);
    let footprint = disk(radius);

    // dilation and inversion in one pass: stamp suppressed disks onto an all-pass grid
    let mut pass = Array2::from_elem((height, width), true);
    for &(y, x) in &lattice {
        for &(dy, dx) in &footprint {
            let (py, px) = (y as isize + dy, x as isize + dx);
            if py < 0 || px < 0 || py >= height as isize || px >= width as isize {
                continue;
            }
            pass[[py as usize, px as usize]] = false;
        }
    }

    pass[[center.0, center.1]] = true;

    tracing::debug!(
        height,
        width,
        grid_step,
        radius,
        peaks = lattice.len(),
        "built grid mask"
    );

    Ok(Mask {
        pass,
        lattice,
        radius,
    })
}
