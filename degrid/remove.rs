use ndarray::{Array3, Axis};
use tracing::{debug, warn};

use crate::{
    mask::Mask,
    spectrum::FourierPlan,
    types::{RgbArray, CHANNELS},
    DegridError,
};

/// Reconstructions whose value range is narrower than this are treated as flat.
pub const DEGENERATE_RANGE: f64 = 1e-9;

/// Suppress the masked frequencies in every channel and map the result back
/// onto the input's dynamic range.
///
/// All three channels go through the same orthonormal FFT and mask. The
/// reconstruction is rescaled as one block, so the global min and max of the
/// output match those of `image`.
pub fn remove_pattern(image: &RgbArray, mask: &Mask) -> Result<RgbArray, DegridError> {
    let (height, width) = image.dim();
    if mask.dim() != (height, width) {
        return Err(DegridError::ShapeMismatch {
            image: (height, width),
            mask: mask.dim(),
        });
    }
    if image.is_empty() {
        return Err(DegridError::EmptyImage);
    }

    let plan = FourierPlan::new(height, width);
    let mut reconstructed = Array3::<f64>::zeros((height, width, CHANNELS));

    for channel in 0..CHANNELS {
        let samples = image.channel(channel).mapv(f64::from);
        let mut spectrum = plan.forward(samples.view())?;

        let total = spectrum.energy();
        let removed = spectrum.apply_mask(mask)?;
        debug!(
            channel,
            removed_fraction = if total > 0.0 { removed / total } else { 0.0 },
            "masked channel spectrum"
        );

        reconstructed
            .index_axis_mut(Axis(2), channel)
            .assign(&plan.inverse(spectrum)?);
    }

    let (lo, hi) = image.min_max();
    RgbArray::new(rescale(&reconstructed, f64::from(lo), f64::from(hi)))
}

/// Linearly map the value range of `values` onto `target_min..=target_max`,
/// then round half to even and saturate into `u8`.
///
/// A flat input has no range to map, every sample becomes the midpoint of
/// the target range instead.
pub fn rescale(values: &Array3<f64>, target_min: f64, target_max: f64) -> Array3<u8> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    });
    let range = max - min;

    if range.is_nan() || range <= DEGENERATE_RANGE {
        let midpoint = quantize((target_min + target_max) / 2.0);
        if target_max > target_min {
            warn!(range, midpoint, "reconstruction is flat, filling with the midpoint");
        }
        return Array3::from_elem(values.dim(), midpoint);
    }

    let target_range = target_max - target_min;
    values.mapv(|v| quantize((v - min) / range * target_range + target_min))
}

fn quantize(value: f64) -> u8 {
    value.round_ties_even().clamp(0.0, 255.0) as u8
}
