//! FFT helpers for spectral filtering of wavelet bands.

use ndarray::{Array2, ArrayView2};
use rustfft::{num_complex::Complex, Fft};
use std::sync::Arc;

/// Compute the 2D FFT of a real band using pre-computed plans.
/// Returns the unnormalized spectrum.
pub fn fft2d(
    input: ArrayView2<f64>,
    row_plan: &Arc<dyn Fft<f64>>,
    col_plan: &Arc<dyn Fft<f64>>,
) -> Array2<Complex<f64>> {
    let (rows, cols) = input.dim();

    // 1. Transform rows
    let mut intermediate = Array2::<Complex<f64>>::zeros((rows, cols));
    let mut row_vec = vec![Complex::new(0.0, 0.0); cols];

    for r in 0..rows {
        for (c, &v) in input.row(r).iter().enumerate() {
            row_vec[c] = Complex::new(v, 0.0);
        }
        row_plan.process(&mut row_vec);
        for c in 0..cols {
            intermediate[[r, c]] = row_vec[c];
        }
    }

    // 2. Transform columns
    let mut col_vec = vec![Complex::new(0.0, 0.0); rows];

    for c in 0..cols {
        for r in 0..rows {
            col_vec[r] = intermediate[[r, c]];
        }
        col_plan.process(&mut col_vec);
        for r in 0..rows {
            intermediate[[r, c]] = col_vec[r];
        }
    }

    intermediate
}

/// Compute the 2D inverse FFT, normalized by `1/(rows*cols)`.
///
/// The result stays complex: after asymmetric spectral damping the spectrum
/// is no longer Hermitian, so the imaginary part carries genuine signal
/// until the final magnitude step.
pub fn ifft2d(
    input: &Array2<Complex<f64>>,
    row_plan: &Arc<dyn Fft<f64>>,
    col_plan: &Arc<dyn Fft<f64>>,
) -> Array2<Complex<f64>> {
    let (rows, cols) = input.dim();

    // 1. Transform columns
    let mut intermediate = input.clone();
    let mut col_vec = vec![Complex::new(0.0, 0.0); rows];

    for c in 0..cols {
        for r in 0..rows {
            col_vec[r] = intermediate[[r, c]];
        }
        col_plan.process(&mut col_vec);
        for r in 0..rows {
            intermediate[[r, c]] = col_vec[r];
        }
    }

    // 2. Transform rows
    let norm_factor = 1.0 / (rows * cols) as f64;
    let mut row_vec = vec![Complex::new(0.0, 0.0); cols];

    for r in 0..rows {
        for c in 0..cols {
            row_vec[c] = intermediate[[r, c]];
        }
        row_plan.process(&mut row_vec);
        for c in 0..cols {
            intermediate[[r, c]] = row_vec[c] * norm_factor;
        }
    }

    intermediate
}

/// Cyclically roll a spectrum so the zero-frequency bin moves to the center
/// (`rows / 2`, `cols / 2`).
pub fn fftshift(input: &Array2<Complex<f64>>) -> Array2<Complex<f64>> {
    let (rows, cols) = input.dim();
    roll(input, rows / 2, cols / 2)
}

/// Undo [`fftshift`]. The two differ on odd-sized axes, where the forward
/// and backward roll distances are not equal.
pub fn ifftshift(input: &Array2<Complex<f64>>) -> Array2<Complex<f64>> {
    let (rows, cols) = input.dim();
    roll(input, rows - rows / 2, cols - cols / 2)
}

fn roll(input: &Array2<Complex<f64>>, by_rows: usize, by_cols: usize) -> Array2<Complex<f64>> {
    let (rows, cols) = input.dim();
    let mut output = Array2::<Complex<f64>>::zeros((rows, cols));
    for r in 0..rows {
        let shifted_r = (r + by_rows) % rows;
        for c in 0..cols {
            output[[shifted_r, (c + by_cols) % cols]] = input[[r, c]];
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use rustfft::FftPlanner;

    // Helper: Simple Linear Congruential Generator for deterministic
    // "random" test data without adding rand as a dependency.
    struct SimpleLcg {
        state: u64,
    }

    impl SimpleLcg {
        fn new(seed: u64) -> Self {
            Self { state: seed }
        }

        fn next_f64(&mut self) -> f64 {
            self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((self.state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
        }
    }

    #[allow(clippy::type_complexity)]
    fn create_fft_plans(
        rows: usize,
        cols: usize,
    ) -> (
        Arc<dyn Fft<f64>>,
        Arc<dyn Fft<f64>>,
        Arc<dyn Fft<f64>>,
        Arc<dyn Fft<f64>>,
    ) {
        let mut planner = FftPlanner::<f64>::new();
        let fft_row = planner.plan_fft_forward(cols);
        let fft_col = planner.plan_fft_forward(rows);
        let ifft_row = planner.plan_fft_inverse(cols);
        let ifft_col = planner.plan_fft_inverse(rows);
        (fft_row, fft_col, ifft_row, ifft_col)
    }

    fn random_matrix(rows: usize, cols: usize, seed: u64) -> Array2<f64> {
        let mut rng = SimpleLcg::new(seed);
        Array2::from_shape_fn((rows, cols), |_| rng.next_f64())
    }

    #[test]
    fn test_fft2d_roundtrip_various_sizes() {
        let sizes = [(8, 8), (16, 16), (32, 32), (9, 13), (4, 8), (46, 31)];

        for (rows, cols) in sizes {
            let input = random_matrix(rows, cols, (rows * 1000 + cols) as u64);
            let (fft_row, fft_col, ifft_row, ifft_col) = create_fft_plans(rows, cols);

            let freq = fft2d(input.view(), &fft_row, &fft_col);
            let output = ifft2d(&freq, &ifft_row, &ifft_col);

            let max_diff = input
                .iter()
                .zip(output.iter())
                .map(|(a, b)| (a - b.re).abs().max(b.im.abs()))
                .fold(0.0f64, f64::max);

            assert!(
                max_diff < 1e-12,
                "FFT roundtrip failed for {}x{}: max diff = {}",
                rows,
                cols,
                max_diff
            );
        }
    }

    #[test]
    fn test_fft2d_dc_is_sum() {
        let input = random_matrix(8, 12, 42);
        let (fft_row, fft_col, _, _) = create_fft_plans(8, 12);

        let freq = fft2d(input.view(), &fft_row, &fft_col);
        let sum: f64 = input.iter().sum();

        assert!(
            (freq[[0, 0]].re - sum).abs() < 1e-10 && freq[[0, 0]].im.abs() < 1e-10,
            "DC component should equal input sum, got {:?} vs {}",
            freq[[0, 0]],
            sum
        );
    }

    #[test]
    fn test_fft2d_constant() {
        // All ones: DC carries everything, the rest vanishes
        let input = Array2::<f64>::ones((8, 8));
        let (fft_row, fft_col, _, _) = create_fft_plans(8, 8);

        let output = fft2d(input.view(), &fft_row, &fft_col);

        assert!((output[[0, 0]].re - 64.0).abs() < 1e-10);
        for r in 0..8 {
            for c in 0..8 {
                if r != 0 || c != 0 {
                    assert!(
                        output[[r, c]].norm() < 1e-10,
                        "Non-DC component [{},{}] should be ~0, got magnitude {}",
                        r,
                        c,
                        output[[r, c]].norm()
                    );
                }
            }
        }
    }

    #[test]
    fn test_fftshift_moves_dc_to_center() {
        let input = Array2::<f64>::ones((8, 6));
        let (fft_row, fft_col, _, _) = create_fft_plans(8, 6);

        let freq = fft2d(input.view(), &fft_row, &fft_col);
        let shifted = fftshift(&freq);

        assert!((shifted[[4, 3]].re - 48.0).abs() < 1e-10);
        assert!(shifted[[0, 0]].norm() < 1e-10);
    }

    #[test]
    fn test_ifftshift_inverts_fftshift() {
        // even and odd axes behave differently, check both
        for (rows, cols) in [(8, 8), (7, 5), (6, 9), (1, 4)] {
            let mut rng = SimpleLcg::new((rows * 31 + cols) as u64);
            let input = Array2::from_shape_fn((rows, cols), |_| {
                Complex::new(rng.next_f64(), rng.next_f64())
            });

            let round = ifftshift(&fftshift(&input));
            assert_eq!(round, input, "shift roundtrip failed for {rows}x{cols}");

            let round = fftshift(&ifftshift(&input));
            assert_eq!(round, input, "unshift-first roundtrip failed for {rows}x{cols}");
        }
    }

    #[test]
    fn test_fftshift_odd_axis_layout() {
        // length-5 axis: shifted order is [3 4 0 1 2], so bin 0 lands at 2
        let input = Array2::from_shape_fn((5, 1), |(r, _)| Complex::new(r as f64, 0.0));
        let shifted = fftshift(&input);
        let order: Vec<f64> = shifted.column(0).iter().map(|v| v.re).collect();
        assert_eq!(order, vec![3.0, 4.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_ifft2d_keeps_imaginary_part() {
        // A spectrum without Hermitian symmetry must come back complex.
        let mut spectrum = Array2::<Complex<f64>>::zeros((4, 4));
        spectrum[[1, 0]] = Complex::new(8.0, 0.0);
        let (_, _, ifft_row, ifft_col) = create_fft_plans(4, 4);

        let spatial = ifft2d(&spectrum, &ifft_row, &ifft_col);
        let max_im = spatial.iter().map(|v| v.im.abs()).fold(0.0f64, f64::max);
        assert!(
            max_im > 0.4,
            "single-bin spectrum should produce a complex signal, max |im| = {max_im}"
        );
    }
}
