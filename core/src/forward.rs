/// Forward resampler: per-region bilinear crop-and-resize along the width
/// axis.
///
/// Each region reads from one batch slice of the source buffer and writes a
/// `[depth, crop_width]` strip into its own slice of the output. Regions
/// never share output memory, so the region loop runs on the rayon pool
/// with no synchronization beyond the implicit join.

use rayon::prelude::*;

use crate::geometry::StripMap;
use crate::region::{validate_box_index, CropResizeError, ImageShape, Region};

/// Crop and resample every region into a fresh `[num_boxes, depth,
/// crop_width]` buffer.
///
/// `image`: `[batch, depth, width]`, row-major. `boxes` and `box_index` are
/// parallel arrays, one entry per output region. Every box index is checked
/// against `[0, batch)` before anything is allocated; a bad index rejects
/// the whole call with no partial output.
///
/// `_extrapolation_value` is reserved for out-of-bounds handling and never
/// consulted: the caller contract keeps every sampled coordinate inside
/// `[0, width-1]`, so no code path can reach it.
pub fn crop_and_resize_forward(
    image: &[f32],
    shape: ImageShape,
    boxes: &[Region],
    box_index: &[i32],
    crop_width: usize,
    _extrapolation_value: f32,
) -> Result<Vec<f32>, CropResizeError> {
    debug_assert_eq!(image.len(), shape.numel());
    debug_assert_eq!(boxes.len(), box_index.len());

    validate_box_index(box_index, shape.batch)?;

    let crop_elements = shape.depth * crop_width;
    if crop_elements == 0 {
        return Ok(Vec::new());
    }

    let mut crops = vec![0.0f32; boxes.len() * crop_elements];
    crops
        .par_chunks_mut(crop_elements)
        .zip(boxes.par_iter().zip(box_index.par_iter()))
        .for_each(|(out, (&region, &b_in))| {
            resample_region(image, shape, region, b_in as usize, crop_width, out);
        });

    Ok(crops)
}

/// Resample one region into its `[depth, crop_width]` output slice.
///
/// `b_in` must already be validated against `shape.batch`.
fn resample_region(
    image: &[f32],
    shape: ImageShape,
    region: Region,
    b_in: usize,
    crop_width: usize,
    out: &mut [f32],
) {
    debug_assert_eq!(out.len(), shape.depth * crop_width);

    let map = StripMap::new(region, shape.width, crop_width);
    for x in 0..crop_width {
        let s = map.sample(x);
        for d in 0..shape.depth {
            let row_start = shape.row_offset(b_in, d);
            let row = &image[row_start..row_start + shape.width];
            let top_left = row[s.left];
            let top_right = row[s.right];
            out[d * crop_width + x] = top_left + (top_right - top_left) * s.lerp;
        }
    }
}
