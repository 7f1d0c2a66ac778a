use image::{ImageBuffer, Rgb, RgbImage};
use ndarray::{Array3, ArrayView2, Axis};

use crate::DegridError;

pub const CHANNELS: usize = 3;

/// An 8-bit RGB image laid out as `(height, width, channel)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbArray(Array3<u8>);

impl RgbArray {
    pub fn new(data: Array3<u8>) -> Result<Self, DegridError> {
        let (_, _, channels) = data.dim();
        if channels != CHANNELS {
            return Err(DegridError::InvalidShape(format!(
                "expected {CHANNELS} channels, got {channels}"
            )));
        }

        Ok(Self(data))
    }

    pub fn from_image(img: &RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self(Array3::from_shape_fn(
            (height as usize, width as usize, CHANNELS),
            |(y, x, c)| img.get_pixel(x as u32, y as u32)[c],
        ))
    }

    pub fn to_image(&self) -> RgbImage {
        let (height, width) = self.dim();
        ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
            let (x, y) = (x as usize, y as usize);
            Rgb([self.0[[y, x, 0]], self.0[[y, x, 1]], self.0[[y, x, 2]]])
        })
    }

    /// `(height, width)`
    pub fn dim(&self) -> (usize, usize) {
        let (height, width, _) = self.0.dim();
        (height, width)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn channel(&self, channel: usize) -> ArrayView2<'_, u8> {
        self.0.index_axis(Axis(2), channel)
    }

    /// Smallest and largest sample across all channels.
    pub fn min_max(&self) -> (u8, u8) {
        self.0
            .fold((u8::MAX, u8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }

    pub fn as_array(&self) -> &Array3<u8> {
        &self.0
    }
}
