use std::sync::Arc;

use image::{ImageBuffer, Rgb, RgbImage};
use ndarray::{Array2, ArrayView2, Zip};
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::{mask::Mask, DegridError};

/// Row and column transforms for one image size, planned once and shared by
/// every channel. Both directions are scaled by `1 / sqrt(height * width)`.
pub struct FourierPlan {
    height: usize,
    width: usize,
    rows_forward: Arc<dyn Fft<f64>>,
    rows_inverse: Arc<dyn Fft<f64>>,
    cols_forward: Arc<dyn Fft<f64>>,
    cols_inverse: Arc<dyn Fft<f64>>,
}

impl FourierPlan {
    pub fn new(height: usize, width: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            height,
            width,
            rows_forward: planner.plan_fft_forward(width),
            rows_inverse: planner.plan_fft_inverse(width),
            cols_forward: planner.plan_fft_forward(height),
            cols_inverse: planner.plan_fft_inverse(height),
        }
    }

    /// `(height, width)`
    pub fn dim(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Orthonormal 2D DFT of one channel, with DC moved to the center.
    pub fn forward(&self, channel: ArrayView2<'_, f64>) -> Result<Spectrum, DegridError> {
        self.check_dim(channel.dim())?;

        let mut bins = channel.mapv(|v| Complex::new(v, 0.0));
        self.transform(&mut bins, &*self.rows_forward, &*self.cols_forward);

        Ok(Spectrum {
            bins: fftshift(&bins),
        })
    }

    /// Undo the centering, transform back and keep the real part.
    pub fn inverse(&self, spectrum: Spectrum) -> Result<Array2<f64>, DegridError> {
        self.check_dim(spectrum.dim())?;

        let mut bins = ifftshift(&spectrum.bins);
        self.transform(&mut bins, &*self.rows_inverse, &*self.cols_inverse);

        Ok(bins.mapv(|c| c.re))
    }

    fn check_dim(&self, dim: (usize, usize)) -> Result<(), DegridError> {
        if dim != self.dim() {
            return Err(DegridError::InvalidShape(format!(
                "transform planned for {}x{}, got {}x{}",
                self.height, self.width, dim.0, dim.1
            )));
        }
        Ok(())
    }

    fn transform(
        &self,
        bins: &mut Array2<Complex<f64>>,
        rows: &dyn Fft<f64>,
        cols: &dyn Fft<f64>,
    ) {
        let mut buffer: Vec<Complex<f64>> = Vec::with_capacity(self.height.max(self.width));

        for mut row in bins.rows_mut() {
            buffer.clear();
            buffer.extend(row.iter().copied());
            rows.process(&mut buffer);
            row.iter_mut().zip(&buffer).for_each(|(dst, src)| *dst = *src);
        }

        for mut col in bins.columns_mut() {
            buffer.clear();
            buffer.extend(col.iter().copied());
            cols.process(&mut buffer);
            col.iter_mut().zip(&buffer).for_each(|(dst, src)| *dst = *src);
        }

        let scale = 1.0 / ((self.height * self.width) as f64).sqrt();
        bins.mapv_inplace(|c| c * scale);
    }
}

/// Centered spectrum of a single channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    bins: Array2<Complex<f64>>,
}

impl Spectrum {
    /// `(height, width)`
    pub fn dim(&self) -> (usize, usize) {
        self.bins.dim()
    }

    pub fn as_array(&self) -> &Array2<Complex<f64>> {
        &self.bins
    }

    /// The zero-frequency bin.
    pub fn dc(&self) -> Complex<f64> {
        let (height, width) = self.dim();
        self.bins[[height / 2, width / 2]]
    }

    pub fn energy(&self) -> f64 {
        self.bins.iter().map(|c| c.norm_sqr()).sum()
    }

    /// Energy in the bins `mask` would suppress.
    pub fn suppressed_energy(&self, mask: &Mask) -> Result<f64, DegridError> {
        self.check_mask(mask)?;

        let mut energy = 0.0;
        Zip::from(&self.bins)
            .and(mask.as_array())
            .for_each(|bin, &pass| {
                if !pass {
                    energy += bin.norm_sqr();
                }
            });
        Ok(energy)
    }

    /// Zero magnitude and phase of every suppressed bin and return the energy
    /// that was removed. Passing bins are left bit-for-bit untouched.
    pub fn apply_mask(&mut self, mask: &Mask) -> Result<f64, DegridError> {
        self.check_mask(mask)?;

        let mut removed = 0.0;
        Zip::from(&mut self.bins)
            .and(mask.as_array())
            .for_each(|bin, &pass| {
                if !pass {
                    removed += bin.norm_sqr();
                    *bin = Complex::new(0.0, 0.0);
                }
            });
        Ok(removed)
    }

    fn check_mask(&self, mask: &Mask) -> Result<(), DegridError> {
        if mask.dim() != self.dim() {
            return Err(DegridError::ShapeMismatch {
                image: self.dim(),
                mask: mask.dim(),
            });
        }
        Ok(())
    }

    /// Render `ln(1 + |X|)` normalized to 0..255 and tinted with `color`.
    pub fn log_magnitude_image(&self, color: [u8; 3]) -> RgbImage {
        let (height, width) = self.dim();
        let magnitudes = self.bins.mapv(|c| c.norm().ln_1p());
        let max_magnitude = magnitudes.fold(0.0_f64, |acc, m| acc.max(*m));

        ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
            let mag = magnitudes[[y as usize, x as usize]];
            let level = if max_magnitude > 0.0 {
                mag / max_magnitude
            } else {
                0.0
            };
            Rgb(color.map(|c| (c as f64 * level).round() as u8))
        })
    }
}

/// Move the zero-frequency bin to `(height / 2, width / 2)`.
pub fn fftshift<T: Clone>(data: &Array2<T>) -> Array2<T> {
    let (height, width) = data.dim();
    roll(data, height / 2, width / 2)
}

/// Inverse of [`fftshift`], also for odd lengths.
pub fn ifftshift<T: Clone>(data: &Array2<T>) -> Array2<T> {
    let (height, width) = data.dim();
    roll(data, height - height / 2, width - width / 2)
}

// out[(i + shift) % n] = in[i] along both axes
fn roll<T: Clone>(data: &Array2<T>, shift_y: usize, shift_x: usize) -> Array2<T> {
    let (height, width) = data.dim();
    Array2::from_shape_fn((height, width), |(y, x)| {
        data[[(y + height - shift_y) % height, (x + width - shift_x) % width]].clone()
    })
}
