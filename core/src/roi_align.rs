/// RoI alignment over un-normalized pixel boxes.
///
/// Host-facing wrapper around the crop-and-resize kernels: callers hand in
/// boxes in source pixel coordinates and the wrapper converts them into the
/// normalized regions the kernels expect. With `transform_fpcoor` the
/// conversion uses the half-pixel ("floating-point coordinate") convention:
/// output column centers land on evenly spaced sample points inside the box
/// instead of stretching the box endpoints onto the output grid.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::backward::crop_and_resize_backward;
use crate::forward::crop_and_resize_forward;
use crate::region::{CropResizeError, ImageShape, Region};

/// Crop-and-resize operator configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoiAlign {
    /// Number of output columns per region.
    pub crop_width: usize,
    /// Reserved for out-of-bounds fill; accepted but never applied by the
    /// sampling kernel.
    pub extrapolation_value: f32,
    /// Use the half-pixel coordinate transform when normalizing boxes.
    pub transform_fpcoor: bool,
}

/// Normalized regions saved by [`RoiAlign::forward`] so the backward call
/// reuses byte-identical geometry.
#[derive(Clone, Debug)]
pub struct RoiAlignCache {
    pub boxes: Vec<Region>,
}

impl RoiAlign {
    pub fn new(crop_width: usize) -> Self {
        RoiAlign {
            crop_width,
            extrapolation_value: 0.0,
            transform_fpcoor: true,
        }
    }

    /// Convert pixel-coordinate boxes into normalized regions.
    ///
    /// fpcoor: `spacing = (x2-x1)/crop_width`; the first sample point sits
    /// half a spacing into the box, shifted by the half-pixel origin, and
    /// the remaining `crop_width-1` points follow at `spacing` intervals.
    /// Plain mode divides both endpoints by `width-1`.
    pub fn normalize_boxes(&self, boxes: &[Region], image_width: usize) -> Vec<Region> {
        let norm = (image_width - 1) as f32;
        boxes
            .iter()
            .map(|b| {
                if self.transform_fpcoor {
                    let spacing = (b.x2 - b.x1) / self.crop_width as f32;
                    let nx0 = (b.x1 + spacing / 2.0 - 0.5) / norm;
                    let nw = spacing * (self.crop_width - 1) as f32 / norm;
                    Region::new(nx0, nx0 + nw)
                } else {
                    Region::new(b.x1 / norm, b.x2 / norm)
                }
            })
            .collect()
    }

    /// Crop and resample each box out of the feature map.
    ///
    /// `boxes` are un-normalized `(x1, x2)` pixel coordinates. Returns the
    /// `[num_boxes, depth, crop_width]` output and a cache of the
    /// normalized regions for the backward call.
    pub fn forward(
        &self,
        featuremap: &[f32],
        shape: ImageShape,
        boxes: &[Region],
        box_index: &[i32],
    ) -> Result<(Vec<f32>, RoiAlignCache), CropResizeError> {
        debug!(
            "roi_align forward: {} boxes, crop_width={}, fpcoor={}",
            boxes.len(),
            self.crop_width,
            self.transform_fpcoor
        );
        let normalized = self.normalize_boxes(boxes, shape.width);
        let crops = crop_and_resize_forward(
            featuremap,
            shape,
            &normalized,
            box_index,
            self.crop_width,
            self.extrapolation_value,
        )?;
        Ok((crops, RoiAlignCache { boxes: normalized }))
    }

    /// Scatter output gradients back through the geometry cached by
    /// [`RoiAlign::forward`].
    pub fn backward(
        &self,
        grad_crops: &[f32],
        cache: &RoiAlignCache,
        box_index: &[i32],
        shape: ImageShape,
    ) -> Result<Vec<f32>, CropResizeError> {
        debug!(
            "roi_align backward: {} boxes, crop_width={}",
            cache.boxes.len(),
            self.crop_width
        );
        crop_and_resize_backward(grad_crops, &cache.boxes, box_index, shape, self.crop_width)
    }
}
