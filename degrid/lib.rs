//! Removal of periodic grid artifacts from RGB images.
//!
//! A regular additive grid shows up as a lattice of sharp peaks in the
//! centered Fourier spectrum. [`mask::build_mask`] predicts where those peaks
//! are, [`remove::remove_pattern`] zeroes them in every channel and maps the
//! result back onto the input's dynamic range.

use thiserror::Error;

pub mod mask;
pub mod pipeline;
pub mod remove;
pub mod spectrum;
pub mod types;

pub use mask::{build_mask, Mask, MaskParams};
pub use pipeline::{degrid, DegridConfig, Degridded};
pub use remove::remove_pattern;
pub use spectrum::{FourierPlan, Spectrum};
pub use types::RgbArray;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DegridError {
    #[error("invalid grid step {grid_step} for a {height}x{width} image (needs 1 <= grid step <= min(height, width))")]
    InvalidGridStep {
        grid_step: usize,
        height: usize,
        width: usize,
    },

    #[error("image has no pixels")]
    EmptyImage,

    #[error("image is {height}x{width} but the grid mask assumes a square image")]
    NonSquare { height: usize, width: usize },

    #[error("mask is {}x{} but the image is {}x{}", .mask.0, .mask.1, .image.0, .image.1)]
    ShapeMismatch {
        image: (usize, usize),
        mask: (usize, usize),
    },

    #[error("invalid array shape: {0}")]
    InvalidShape(String),
}
