/// Shared coordinate mapping from output columns to source coordinates.
///
/// The backward pass is the adjoint of the forward sampling operator, so
/// both must derive identical interpolation geometry (same scale formula,
/// same floor/ceil rounding) from the same inputs. This module is the one
/// place that geometry lives; neither pass re-derives it.

use crate::region::Region;

/// Interpolation geometry for one output column: the two neighbor indices
/// and the fractional weight toward the right neighbor.
///
/// `left == right` (with `lerp == 0`) whenever the source coordinate lands
/// on an integer grid point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisSample {
    pub left: usize,
    pub right: usize,
    pub lerp: f32,
}

/// Mapping from the `crop_width` output columns of one region onto source
/// axis coordinates in `[0, image_width - 1]`.
#[derive(Clone, Copy, Debug)]
pub struct StripMap {
    x1: f32,
    x2: f32,
    image_width: usize,
    crop_width: usize,
    scale: f32,
}

impl StripMap {
    pub fn new(region: Region, image_width: usize, crop_width: usize) -> Self {
        // scale = (x2-x1)*(W_in-1)/(W_out-1); zero in the degenerate
        // single-column case where the midpoint rule applies instead.
        let scale = if crop_width > 1 {
            (region.x2 - region.x1) * (image_width - 1) as f32
                / (crop_width - 1) as f32
        } else {
            0.0
        };
        StripMap {
            x1: region.x1,
            x2: region.x2,
            image_width,
            crop_width,
            scale,
        }
    }

    /// Source coordinate for output column `x`.
    ///
    /// With a single output column the region collapses to its midpoint:
    /// `0.5*(x1+x2)*(W_in-1)`.
    #[inline]
    pub fn source_coord(&self, x: usize) -> f32 {
        if self.crop_width > 1 {
            self.x1 * (self.image_width - 1) as f32 + x as f32 * self.scale
        } else {
            0.5 * (self.x1 + self.x2) * (self.image_width - 1) as f32
        }
    }

    /// Neighbor indices and lerp weight for output column `x`.
    ///
    /// The caller contract keeps `source_coord` inside
    /// `[0, image_width - 1]`, but scale rounding can drift the last
    /// column a hair past the final cell; pinning the neighbor indices to
    /// the axis keeps the read in bounds without changing the weights.
    #[inline]
    pub fn sample(&self, x: usize) -> AxisSample {
        let in_x = self.source_coord(x);
        let left = in_x.floor();
        let last = self.image_width - 1;
        AxisSample {
            left: (left.max(0.0) as usize).min(last),
            right: (in_x.ceil().max(0.0) as usize).min(last),
            lerp: in_x - left,
        }
    }
}
