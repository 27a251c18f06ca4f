/// Region descriptors and input-contract validation.
///
/// A region is a 1-D interval in normalized source coordinates (unit:
/// fraction of `width - 1`) paired with a batch index into the source
/// buffer. Regions are independent of each other; nothing here orders them.

use serde::{Deserialize, Serialize};

/// Normalized 1-D interval selecting a strip of the source axis.
///
/// `x2 < x1` is allowed: the strip is then sampled right-to-left. Both
/// endpoints must keep every sampled coordinate inside `[0, width-1]`;
/// that is the caller's contract, not checked here.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x1: f32,
    pub x2: f32,
}

impl Region {
    pub fn new(x1: f32, x2: f32) -> Self {
        Region { x1, x2 }
    }
}

/// Shape of the source feature buffer: `[batch, depth, width]`, row-major.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageShape {
    pub batch: usize,
    pub depth: usize,
    pub width: usize,
}

impl ImageShape {
    pub fn new(batch: usize, depth: usize, width: usize) -> Self {
        ImageShape { batch, depth, width }
    }

    /// Total element count of a buffer with this shape.
    pub fn numel(&self) -> usize {
        self.batch * self.depth * self.width
    }

    /// Elements per batch slice.
    pub fn batch_elements(&self) -> usize {
        self.depth * self.width
    }

    /// Flat offset of row `[b, d, 0..width]`.
    pub fn row_offset(&self, b: usize, d: usize) -> usize {
        b * self.batch_elements() + d * self.width
    }
}

/// Error type for the resampling operations.
///
/// The reference behavior for a bad batch index was to print and abort the
/// whole process. Here it surfaces as a recoverable value so one bad region
/// cannot take down a serving or training loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CropResizeError {
    /// A region referenced a batch slice outside `[0, batch)`.
    BatchIndexOutOfRange { index: i32, batch_size: usize },
}

impl std::fmt::Display for CropResizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CropResizeError::BatchIndexOutOfRange { index, batch_size } => {
                write!(f, "batch_index {index} out of range [0, {batch_size})")
            }
        }
    }
}

impl std::error::Error for CropResizeError {}

/// Check every box index against `[0, batch_size)` before any buffer work.
///
/// Validating the whole array up front means a rejected call has written
/// nothing; there are no partial results to discard.
pub fn validate_box_index(
    box_index: &[i32],
    batch_size: usize,
) -> Result<(), CropResizeError> {
    for &b_in in box_index {
        if b_in < 0 || b_in as usize >= batch_size {
            return Err(CropResizeError::BatchIndexOutOfRange {
                index: b_in,
                batch_size,
            });
        }
    }
    Ok(())
}
