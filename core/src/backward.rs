/// Backward gradient scatter: the adjoint of the forward resampler.
///
/// Each output gradient value is split between the two source cells its
/// forward sample read from, weighted `(1-lerp)` / `lerp`, and accumulated
/// by addition. Destinations overlap across regions, and across output
/// columns when downsampling, so the shared accumulator is only written
/// sequentially. The parallel variant gives every worker a private
/// accumulator and sums them at the end; it never does the naive shared
/// increment.

use rayon::prelude::*;

use crate::geometry::StripMap;
use crate::region::{validate_box_index, CropResizeError, ImageShape, Region};

/// Scatter output gradients back into a zero-initialized source-shaped
/// buffer, one region at a time.
///
/// `grad_crops`: `[num_boxes, depth, crop_width]`, the gradient of a
/// matching forward call's output. `shape` describes the original source
/// buffer. Box indices are validated up front; a bad index rejects the call
/// before any allocation.
pub fn crop_and_resize_backward(
    grad_crops: &[f32],
    boxes: &[Region],
    box_index: &[i32],
    shape: ImageShape,
    crop_width: usize,
) -> Result<Vec<f32>, CropResizeError> {
    debug_assert_eq!(grad_crops.len(), boxes.len() * shape.depth * crop_width);
    debug_assert_eq!(boxes.len(), box_index.len());

    validate_box_index(box_index, shape.batch)?;

    let crop_elements = shape.depth * crop_width;
    let mut grad_image = vec![0.0f32; shape.numel()];
    for (b, (&region, &b_in)) in boxes.iter().zip(box_index.iter()).enumerate() {
        let grads = &grad_crops[b * crop_elements..(b + 1) * crop_elements];
        scatter_region(grads, shape, region, b_in as usize, crop_width, &mut grad_image);
    }

    Ok(grad_image)
}

/// Parallel-by-region variant: rayon fold with one private source-shaped
/// accumulator per worker, reduced by element-wise summation.
///
/// Produces the same accumulated sums as [`crop_and_resize_backward`] up to
/// floating-point reassociation.
pub fn crop_and_resize_backward_parallel(
    grad_crops: &[f32],
    boxes: &[Region],
    box_index: &[i32],
    shape: ImageShape,
    crop_width: usize,
) -> Result<Vec<f32>, CropResizeError> {
    debug_assert_eq!(grad_crops.len(), boxes.len() * shape.depth * crop_width);
    debug_assert_eq!(boxes.len(), box_index.len());

    validate_box_index(box_index, shape.batch)?;

    let crop_elements = shape.depth * crop_width;
    let n = shape.numel();
    let grad_image = (0..boxes.len())
        .into_par_iter()
        .fold(
            || vec![0.0f32; n],
            |mut acc, b| {
                let grads = &grad_crops[b * crop_elements..(b + 1) * crop_elements];
                scatter_region(
                    grads,
                    shape,
                    boxes[b],
                    box_index[b] as usize,
                    crop_width,
                    &mut acc,
                );
                acc
            },
        )
        .reduce(
            || vec![0.0f32; n],
            |mut a, b| {
                for (dst, src) in a.iter_mut().zip(b.iter()) {
                    *dst += src;
                }
                a
            },
        );

    Ok(grad_image)
}

/// Scatter one region's `[depth, crop_width]` gradient slice into the
/// source-shaped accumulator.
///
/// Recomputes the forward pass's geometry through the same [`StripMap`], so
/// every gradient contribution flows back along exactly the weighted paths
/// the forward sample used.
fn scatter_region(
    grads: &[f32],
    shape: ImageShape,
    region: Region,
    b_in: usize,
    crop_width: usize,
    grad_image: &mut [f32],
) {
    debug_assert_eq!(grads.len(), shape.depth * crop_width);
    debug_assert_eq!(grad_image.len(), shape.numel());

    let map = StripMap::new(region, shape.width, crop_width);
    for x in 0..crop_width {
        let s = map.sample(x);
        for d in 0..shape.depth {
            let row_start = shape.row_offset(b_in, d);
            let grad_val = grads[d * crop_width + x];
            grad_image[row_start + s.left] += (1.0 - s.lerp) * grad_val;
            grad_image[row_start + s.right] += s.lerp * grad_val;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_region_scatter() {
        // Pass-through geometry: left == right, lerp == 0, so the gradient
        // lands exactly where the forward sample read.
        let shape = ImageShape::new(1, 1, 4);
        let grads = [1.0f32, 2.0, 3.0, 4.0];
        let grad_image = crop_and_resize_backward(
            &grads,
            &[Region::new(0.0, 1.0)],
            &[0],
            shape,
            4,
        )
        .unwrap();
        assert_eq!(grad_image, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_fractional_split() {
        // Single column at in_x = 1.5: the gradient splits evenly between
        // cells 1 and 2.
        let shape = ImageShape::new(1, 1, 4);
        let grad_image = crop_and_resize_backward(
            &[2.0f32],
            &[Region::new(0.0, 1.0)],
            &[0],
            shape,
            1,
        )
        .unwrap();
        assert_eq!(grad_image.len(), 4);
        assert!((grad_image[1] - 1.0).abs() < 1e-6, "left share = {}", grad_image[1]);
        assert!((grad_image[2] - 1.0).abs() < 1e-6, "right share = {}", grad_image[2]);
        assert_eq!(grad_image[0], 0.0);
        assert_eq!(grad_image[3], 0.0);
    }

    #[test]
    fn test_overlapping_regions_accumulate() {
        // Two identical regions: contributions add, not overwrite.
        let shape = ImageShape::new(1, 1, 3);
        let grads = [1.0f32, 1.0, 1.0, 1.0, 1.0, 1.0];
        let grad_image = crop_and_resize_backward(
            &grads,
            &[Region::new(0.0, 1.0), Region::new(0.0, 1.0)],
            &[0, 0],
            shape,
            3,
        )
        .unwrap();
        assert_eq!(grad_image, vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_mass_conservation() {
        // Every scatter splits grad_val into shares summing to 1, so the
        // total gradient mass is conserved.
        let shape = ImageShape::new(2, 2, 5);
        let boxes = [
            Region::new(0.1, 0.9),
            Region::new(0.5, 0.2),
            Region::new(0.0, 1.0),
        ];
        let box_index = [1, 0, 1];
        let crop_width = 3;
        let grads: Vec<f32> = (0..boxes.len() * 2 * crop_width)
            .map(|i| (i as f32) * 0.37 - 1.0)
            .collect();
        let grad_image =
            crop_and_resize_backward(&grads, &boxes, &box_index, shape, crop_width)
                .unwrap();
        let in_sum: f32 = grads.iter().sum();
        let out_sum: f32 = grad_image.iter().sum();
        assert!(
            (in_sum - out_sum).abs() < 1e-4,
            "gradient mass not conserved: in={in_sum}, out={out_sum}"
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let shape = ImageShape::new(2, 3, 8);
        let boxes: Vec<Region> = (0..16)
            .map(|i| {
                let a = (i as f32 * 0.05) % 1.0;
                Region::new(a, 1.0 - a * 0.5)
            })
            .collect();
        let box_index: Vec<i32> = (0..16).map(|i| i % 2).collect();
        let crop_width = 4;
        let grads: Vec<f32> = (0..boxes.len() * 3 * crop_width)
            .map(|i| ((i * 7919) % 100) as f32 * 0.01 - 0.5)
            .collect();

        let seq = crop_and_resize_backward(&grads, &boxes, &box_index, shape, crop_width)
            .unwrap();
        let par = crop_and_resize_backward_parallel(
            &grads, &boxes, &box_index, shape, crop_width,
        )
        .unwrap();
        assert_eq!(seq.len(), par.len());
        for i in 0..seq.len() {
            assert!(
                (seq[i] - par[i]).abs() < 1e-4,
                "mismatch at {i}: seq={}, par={}",
                seq[i],
                par[i]
            );
        }
    }

    #[test]
    fn test_bad_index_rejects() {
        let shape = ImageShape::new(2, 1, 3);
        let err = crop_and_resize_backward(
            &[1.0f32, 1.0],
            &[Region::new(0.0, 1.0)],
            &[-1],
            shape,
            2,
        )
        .unwrap_err();
        assert_eq!(
            err,
            CropResizeError::BatchIndexOutOfRange { index: -1, batch_size: 2 }
        );
    }
}
