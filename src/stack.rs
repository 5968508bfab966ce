//! Parallel dispatch of per-slice operations across an image stack.
//!
//! Every slice is an independent, stateless task: one rayon task per slice
//! index, a full join, then reassembly strictly by original index. Output
//! order never depends on completion order. A failure in any slice aborts
//! the whole operation; in-flight siblings are not cancelled but their
//! results are discarded.

use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3, Axis};
use rayon::prelude::*;
use tracing::debug;

use crate::contrast::{enhance_contrast_slice, ContrastConfig};
use crate::destripe::{destripe_slice, DestripeConfig};
use crate::dtype::Sample;
use crate::error::DecurtainError;

/// Fan a per-slice operation out across the depth axis and reassemble the
/// results in input order.
fn dispatch<S, F>(stack: ArrayView3<S>, op: F) -> Result<Array3<S>, DecurtainError>
where
    S: Sample,
    F: Fn(ArrayView2<S>) -> Result<Array2<S>, DecurtainError> + Sync,
{
    let (n, rows, cols) = stack.dim();

    let results: Result<Vec<Array2<S>>, DecurtainError> = (0..n)
        .into_par_iter()
        .map(|i| {
            op(stack.index_axis(Axis(0), i)).map_err(|e| DecurtainError::TaskFailure {
                slice: i,
                source: Box::new(e),
            })
        })
        .collect();
    let results = results?;

    // Consolidate by index, not completion order.
    let mut output = Array3::<S>::zeros((n, rows, cols));
    for (i, res) in results.into_iter().enumerate() {
        output.slice_mut(s![i, .., ..]).assign(&res);
    }
    Ok(output)
}

/// Suppress vertical streaks in every slice of a stack.
///
/// Slices are processed in parallel; the output stack preserves input
/// order, shape, and element type. For a single 2D image use
/// [`destripe_slice`] directly, which runs synchronously on the calling
/// thread.
///
/// # Errors
///
/// Returns [`DecurtainError::InvalidParameter`] before dispatch for bad
/// parameters, or [`DecurtainError::TaskFailure`] wrapping the first
/// per-slice error. No partial results are returned.
pub fn destripe_stack<S: Sample>(
    stack: ArrayView3<S>,
    config: &DestripeConfig,
) -> Result<Array3<S>, DecurtainError> {
    config.validate()?;
    debug!(slices = stack.dim().0, label = %config.label(), "destriping stack");
    dispatch(stack, |slice| destripe_slice(slice, config))
}

/// Enhance local contrast in every slice of a stack.
///
/// Same dispatch, ordering, and failure semantics as [`destripe_stack`];
/// the single-slice entry point is [`enhance_contrast_slice`].
///
/// # Errors
///
/// Returns [`DecurtainError::InvalidParameter`] before dispatch for bad
/// parameters, or [`DecurtainError::TaskFailure`] wrapping the first
/// per-slice error.
pub fn enhance_contrast_stack<S: Sample>(
    stack: ArrayView3<S>,
    config: &ContrastConfig,
) -> Result<Array3<S>, DecurtainError> {
    config.validate()?;
    debug!(slices = stack.dim().0, label = %config.label(), "equalizing stack");
    dispatch(stack, |slice| enhance_contrast_slice(slice, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wavelet::Wavelet;
    use ndarray::Array3;

    fn blob_stack(n: usize, size: usize) -> Array3<f64> {
        // slice i carries a bright horizontal band at a row unique to i,
        // so misordered output is detectable
        Array3::from_shape_fn((n, size, size), |(i, r, c)| {
            let band = 4 + 6 * i;
            let base = (c as f64 * 0.2).sin();
            if r >= band && r < band + 3 {
                base + 10.0
            } else {
                base
            }
        })
    }

    fn fast_config() -> DestripeConfig {
        DestripeConfig {
            levels: 1,
            sigma: 4.0,
            wavelet: Wavelet::Haar,
        }
    }

    #[test]
    fn stack_output_matches_per_slice_results_in_order() {
        let stack = blob_stack(4, 32);
        let config = fast_config();
        let out = destripe_stack(stack.view(), &config).unwrap();
        assert_eq!(out.dim(), (4, 32, 32));

        for i in 0..4 {
            let expected = destripe_slice(stack.index_axis(Axis(0), i), &config).unwrap();
            assert_eq!(
                out.index_axis(Axis(0), i),
                expected.view(),
                "slice {i} out of order or modified"
            );
        }
    }

    #[test]
    fn slice_features_stay_at_their_depth() {
        let stack = blob_stack(4, 32);
        let out = destripe_stack(stack.view(), &fast_config()).unwrap();

        for i in 0..4 {
            let slice = out.index_axis(Axis(0), i);
            let band = 4 + 6 * i;
            let band_mean: f64 = slice.row(band + 1).mean().unwrap();
            let off_mean: f64 = slice.row(28).mean().unwrap();
            assert!(
                band_mean > off_mean,
                "slice {i} lost its band: band row mean {band_mean}, off row mean {off_mean}"
            );
        }
    }

    #[test]
    fn single_slice_stack() {
        let stack = blob_stack(1, 32);
        let out = destripe_stack(stack.view(), &fast_config()).unwrap();
        assert_eq!(out.dim(), (1, 32, 32));
    }

    #[test]
    fn dtype_preserved_through_stack() {
        let stack = Array3::from_shape_fn((3, 24, 24), |(i, r, c)| ((i * 50 + r * 2 + c) % 255) as u8);
        let out = destripe_stack(stack.view(), &fast_config()).unwrap();
        assert_eq!(out.dim(), (3, 24, 24));
        // u8 in, u8 out, spanning the native range per slice
        for i in 0..3 {
            let slice = out.index_axis(Axis(0), i);
            assert_eq!(*slice.iter().min().unwrap(), 0);
            assert_eq!(*slice.iter().max().unwrap(), 255);
        }
    }

    #[test]
    fn invalid_parameters_fail_before_dispatch() {
        let stack = blob_stack(2, 16);
        let config = DestripeConfig {
            levels: 0,
            ..Default::default()
        };
        let err = destripe_stack(stack.view(), &config).unwrap_err();
        // config errors surface directly, not wrapped as task failures
        assert!(matches!(err, DecurtainError::InvalidParameter(_)));
    }

    #[test]
    fn per_slice_failure_aborts_with_task_failure() {
        let stack = Array3::<u8>::zeros((3, 16, 16));
        let config = ContrastConfig {
            tile_rows: 64, // exceeds every slice's height
            tile_cols: 4,
            ..Default::default()
        };
        let err = enhance_contrast_stack(stack.view(), &config).unwrap_err();
        match err {
            DecurtainError::TaskFailure { slice, source } => {
                assert!(slice < 3);
                assert!(matches!(*source, DecurtainError::InvalidParameter(_)));
            }
            other => panic!("expected TaskFailure, got {other:?}"),
        }
    }

    #[test]
    fn contrast_stack_preserves_order_and_shape() {
        let stack = Array3::from_shape_fn((3, 20, 20), |(i, r, c)| ((r * c) as u16) << i);
        let config = ContrastConfig {
            clip_limit: 0.01,
            tile_rows: 2,
            tile_cols: 2,
        };
        let out = enhance_contrast_stack(stack.view(), &config).unwrap();
        assert_eq!(out.dim(), (3, 20, 20));

        for i in 0..3 {
            let expected = enhance_contrast_slice(stack.index_axis(Axis(0), i), &config).unwrap();
            assert_eq!(out.index_axis(Axis(0), i), expected.view());
        }
    }
}
