//! Discrete wavelet filter bank and separable 2D transform.
//!
//! Filters follow the standard orthogonal convention: the highpass analysis
//! filter is derived from the scaling filter through the quadrature mirror
//! relationship `g[k] = (-1)^(k+1) h[L-1-k]`, and the synthesis filters are
//! the time-reversed analysis filters. Boundary handling uses half-point
//! symmetric extension, so a length-`n` signal analyzed with a length-`f`
//! filter produces `(n + f - 1) / 2` coefficients per band; synthesis of
//! `m` coefficients produces `2m - f + 2` samples, one more than the
//! analyzed length when that length was odd.

use ndarray::{Array2, ArrayView2};
use num_traits::Zero;
use rustfft::num_complex::Complex;
use std::ops::{AddAssign, Mul};

use crate::error::DecurtainError;

// =============================================================================
// Scaling filter tables (lowpass analysis coefficients)
// =============================================================================

const HAAR: [f64; 2] = [std::f64::consts::FRAC_1_SQRT_2, std::f64::consts::FRAC_1_SQRT_2];

const DB2: [f64; 4] = [
    -0.12940952255092145,
    0.22414386804185735,
    0.8365163037378079,
    0.48296291314469025,
];

const DB4: [f64; 8] = [
    -0.010597401784997278,
    0.032883011666982945,
    0.030841381835986965,
    -0.18703481171888106,
    -0.027983769416983849,
    0.63088076792959038,
    0.71484657055254160,
    0.23037781330885514,
];

const DB8: [f64; 16] = [
    -0.00011747678400228192,
    0.0006754494059985568,
    -0.0003917403729959771,
    -0.00487035299301066,
    0.008746094047015655,
    0.013981027917015516,
    -0.04408825393106472,
    -0.01736930100202211,
    0.128747426620186,
    0.00047248457399797254,
    -0.2840155429624281,
    -0.015829105256023893,
    0.5853546836548691,
    0.6756307362980128,
    0.3128715909144659,
    0.05441584224308161,
];

const SYM4: [f64; 8] = [
    -0.07576571478927333,
    -0.02963552764599848,
    0.49761866763256304,
    0.80373875180591622,
    0.29785779560560520,
    -0.09921954357684722,
    -0.012603967262037833,
    0.03222310060407127,
];

const COIF1: [f64; 6] = [
    -0.0156557281354645,
    -0.0727326195128539,
    0.3848648468642029,
    0.8525720202122554,
    0.3378976624578092,
    -0.0727326195128539,
];

const COIF2: [f64; 12] = [
    -0.0007205494453645122,
    -0.0018232088707029932,
    0.0056114348193944995,
    0.023680171946334084,
    -0.0594344186464569,
    -0.0764885990783064,
    0.41700518442169254,
    0.8127236354455423,
    0.3861100668211622,
    -0.06737255472196302,
    -0.04146493678175915,
    0.016387336463522112,
];

const COIF3: [f64; 18] = [
    -3.459977283621256e-5,
    -7.098330313814125e-5,
    0.0004662169601128863,
    0.0011175187708906016,
    -0.0025745176887502236,
    -0.00900797613666158,
    0.015880544863615904,
    0.03455502757306163,
    -0.08230192710688598,
    -0.07179982161931202,
    0.42848347637761874,
    0.7937772226256206,
    0.4051769024096169,
    -0.06112339000267287,
    -0.0657719112818555,
    0.023452696141836267,
    0.007782596427325418,
    -0.003793512864491014,
];

const COIF4: [f64; 24] = [
    -1.7849850030882614e-6,
    -3.2596802368833675e-6,
    3.1229875865345646e-5,
    6.233903446100713e-5,
    -0.00025997455248771324,
    -0.0005890207562443383,
    0.0012665619292989445,
    0.003751436157278457,
    -0.00565828668661072,
    -0.015211731527946259,
    0.025082261844864097,
    0.03933442712333749,
    -0.09622044203398798,
    -0.06662747426342504,
    0.4343860564914685,
    0.782238930920499,
    0.41530840703043026,
    -0.05607731331675481,
    -0.08126669968087875,
    0.02668230015605307,
    0.016068943964776348,
    -0.0073461663276420935,
    -0.0016294920126017326,
    0.0008923136685823146,
];

const COIF5: [f64; 30] = [
    -9.517657273819165e-8,
    -1.6744288576823017e-7,
    2.0637618513646814e-6,
    3.7346551751414047e-6,
    -2.1315026809955787e-5,
    -4.134043227251251e-5,
    0.00014054114970203437,
    0.00030225958181306315,
    -0.0006381313430451114,
    -0.0016628637020130838,
    0.0024333732126576722,
    0.006764185448053083,
    -0.009164231162481846,
    -0.01976177894257264,
    0.03268357426711183,
    0.0412892087501817,
    -0.10557420870333893,
    -0.06203596396290357,
    0.4379916261718371,
    0.7742896036529562,
    0.4215662066908515,
    -0.05204316317624377,
    -0.09192001055969624,
    0.02816802897093635,
    0.023408156785839195,
    -0.010131117519849788,
    -0.004159358781386048,
    0.0021782363581090178,
    0.00035858968789573785,
    -0.00021208083980379827,
];

/// Supported wavelet families for decomposition and reconstruction.
///
/// # Example
///
/// ```
/// use decurtain::Wavelet;
///
/// let w = Wavelet::Coif5;
/// assert_eq!(w.length(), 30);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Wavelet {
    /// Haar wavelet (length 2).
    Haar,
    /// Daubechies 2 wavelet (length 4).
    Db2,
    /// Daubechies 4 wavelet (length 8).
    Db4,
    /// Daubechies 8 wavelet (length 16).
    Db8,
    /// Symlet 4 wavelet (length 8).
    Sym4,
    /// Coiflet 1 wavelet (length 6).
    Coif1,
    /// Coiflet 2 wavelet (length 12).
    Coif2,
    /// Coiflet 3 wavelet (length 18).
    Coif3,
    /// Coiflet 4 wavelet (length 24).
    Coif4,
    /// Coiflet 5 wavelet (length 30).
    Coif5,
}

impl Default for Wavelet {
    /// Returns `Wavelet::Coif5`, the filter best suited to streak isolation.
    fn default() -> Self {
        Self::Coif5
    }
}

impl Wavelet {
    /// Returns the filter length (number of coefficients).
    pub fn length(&self) -> usize {
        self.dec_lo().len()
    }

    /// Canonical lowercase name of this wavelet.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Haar => "haar",
            Self::Db2 => "db2",
            Self::Db4 => "db4",
            Self::Db8 => "db8",
            Self::Sym4 => "sym4",
            Self::Coif1 => "coif1",
            Self::Coif2 => "coif2",
            Self::Coif3 => "coif3",
            Self::Coif4 => "coif4",
            Self::Coif5 => "coif5",
        }
    }

    /// Returns the scaling (lowpass analysis) filter.
    pub fn dec_lo(&self) -> &'static [f64] {
        match self {
            Self::Haar => &HAAR,
            Self::Db2 => &DB2,
            Self::Db4 => &DB4,
            Self::Db8 => &DB8,
            Self::Sym4 => &SYM4,
            Self::Coif1 => &COIF1,
            Self::Coif2 => &COIF2,
            Self::Coif3 => &COIF3,
            Self::Coif4 => &COIF4,
            Self::Coif5 => &COIF5,
        }
    }

    /// Returns the wavelet (highpass analysis) filter, derived from the
    /// scaling filter via the quadrature mirror relationship.
    pub fn dec_hi(&self) -> Vec<f64> {
        let h = self.dec_lo();
        let n = h.len();
        (0..n)
            .map(|k| {
                let v = h[n - 1 - k];
                if k % 2 == 0 { -v } else { v }
            })
            .collect()
    }

    /// Returns the lowpass synthesis filter (time-reversed scaling filter).
    pub fn rec_lo(&self) -> Vec<f64> {
        self.dec_lo().iter().rev().copied().collect()
    }

    /// Returns the highpass synthesis filter (time-reversed wavelet filter).
    pub fn rec_hi(&self) -> Vec<f64> {
        let mut g = self.dec_hi();
        g.reverse();
        g
    }

    /// Parses a wavelet from a case-insensitive name string.
    ///
    /// # Errors
    ///
    /// Returns [`DecurtainError::InvalidParameter`] if the name is not one
    /// of the supported families.
    pub fn from_name(name: &str) -> Result<Self, DecurtainError> {
        match name.to_lowercase().as_str() {
            "haar" => Ok(Self::Haar),
            "db2" => Ok(Self::Db2),
            "db4" => Ok(Self::Db4),
            "db8" => Ok(Self::Db8),
            "sym4" => Ok(Self::Sym4),
            "coif1" => Ok(Self::Coif1),
            "coif2" => Ok(Self::Coif2),
            "coif3" => Ok(Self::Coif3),
            "coif4" => Ok(Self::Coif4),
            "coif5" => Ok(Self::Coif5),
            _ => Err(DecurtainError::InvalidParameter(format!(
                "unknown wavelet '{name}'"
            ))),
        }
    }
}

/// Coefficient count per band when analyzing a length-`n` signal with a
/// length-`filter_len` filter under half-point symmetric extension.
pub fn dwt_len(n: usize, filter_len: usize) -> usize {
    (n + filter_len - 1) / 2
}

/// Resolve an out-of-range index against a half-point symmetric extension
/// of a length-`n` signal (`... x1 x0 | x0 x1 ... x{n-1} | x{n-1} ...`).
fn sym_index(mut i: isize, n: usize) -> usize {
    let n = n as isize;
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= n {
            i = 2 * n - 1 - i;
        } else {
            return i as usize;
        }
    }
}

/// One band of a single-axis analysis pass: correlate the extended signal
/// with `filter` and downsample by two. `out` must have `dwt_len` elements.
fn analyze_1d(signal: &[f64], filter: &[f64], out: &mut [f64]) {
    let n = signal.len();
    for (k, slot) in out.iter_mut().enumerate() {
        let base = 2 * k as isize + 1;
        let mut acc = 0.0;
        for (m, &c) in filter.iter().enumerate() {
            acc += c * signal[sym_index(base - m as isize, n)];
        }
        *slot = acc;
    }
}

/// Single-axis synthesis: upsample both coefficient streams by two, convolve
/// with the synthesis filters, and sum. `out` must have `2m - f + 2`
/// elements for `m` coefficients and filter length `f`.
///
/// Generic over the element type so reconstruction can run in complex
/// arithmetic while the filters stay real.
fn synthesize_1d<T>(approx: &[T], detail: &[T], rec_lo: &[f64], rec_hi: &[f64], out: &mut [T])
where
    T: Copy + Zero + AddAssign + Mul<f64, Output = T>,
{
    let f = rec_lo.len() as isize;
    let m = approx.len() as isize;
    for (i, slot) in out.iter_mut().enumerate() {
        // position in the full convolution, offset past the boundary taps
        let t = i as isize + f - 2;
        let k_lo = (t - f + 2).div_euclid(2).max(0);
        let k_hi = (t / 2).min(m - 1);
        let mut acc = T::zero();
        let mut k = k_lo;
        while k <= k_hi {
            let tap = (t - 2 * k) as usize;
            acc += approx[k as usize] * rec_lo[tap];
            acc += detail[k as usize] * rec_hi[tap];
            k += 1;
        }
        *slot = acc;
    }
}

/// Detail bands produced by one analysis level.
#[derive(Clone, Debug)]
pub struct DetailBands {
    /// Lowpass along rows, highpass along columns: features varying down
    /// the image, i.e. horizontal edges.
    pub horizontal: Array2<f64>,
    /// Highpass along rows, lowpass along columns: features varying across
    /// the image while staying nearly constant down it — where vertical
    /// streaks concentrate.
    pub vertical: Array2<f64>,
    /// Highpass along both axes.
    pub diagonal: Array2<f64>,
}

/// One level of separable 2D analysis: rows are filtered first, then
/// columns. Returns the approximation band and the three detail bands, each
/// of shape `(dwt_len(rows, f), dwt_len(cols, f))`.
pub fn dwt2(input: ArrayView2<f64>, wavelet: Wavelet) -> (Array2<f64>, DetailBands) {
    let (rows, cols) = input.dim();
    let dec_lo = wavelet.dec_lo();
    let dec_hi = wavelet.dec_hi();
    let f = dec_lo.len();
    let half_rows = dwt_len(rows, f);
    let half_cols = dwt_len(cols, f);

    // Row pass: split every row into its low and high band.
    let mut row_lo = Array2::<f64>::zeros((rows, half_cols));
    let mut row_hi = Array2::<f64>::zeros((rows, half_cols));
    let mut signal = vec![0.0; cols];
    let mut lo_buf = vec![0.0; half_cols];
    let mut hi_buf = vec![0.0; half_cols];
    for r in 0..rows {
        for (c, &v) in input.row(r).iter().enumerate() {
            signal[c] = v;
        }
        analyze_1d(&signal, dec_lo, &mut lo_buf);
        analyze_1d(&signal, &dec_hi, &mut hi_buf);
        for c in 0..half_cols {
            row_lo[[r, c]] = lo_buf[c];
            row_hi[[r, c]] = hi_buf[c];
        }
    }

    // Column pass over both planes.
    let mut approx = Array2::<f64>::zeros((half_rows, half_cols));
    let mut horizontal = Array2::<f64>::zeros((half_rows, half_cols));
    let mut vertical = Array2::<f64>::zeros((half_rows, half_cols));
    let mut diagonal = Array2::<f64>::zeros((half_rows, half_cols));
    let mut column = vec![0.0; rows];
    let mut a_buf = vec![0.0; half_rows];
    let mut d_buf = vec![0.0; half_rows];
    for c in 0..half_cols {
        for r in 0..rows {
            column[r] = row_lo[[r, c]];
        }
        analyze_1d(&column, dec_lo, &mut a_buf);
        analyze_1d(&column, &dec_hi, &mut d_buf);
        for r in 0..half_rows {
            approx[[r, c]] = a_buf[r];
            horizontal[[r, c]] = d_buf[r];
        }

        for r in 0..rows {
            column[r] = row_hi[[r, c]];
        }
        analyze_1d(&column, dec_lo, &mut a_buf);
        analyze_1d(&column, &dec_hi, &mut d_buf);
        for r in 0..half_rows {
            vertical[[r, c]] = a_buf[r];
            diagonal[[r, c]] = d_buf[r];
        }
    }

    (
        approx,
        DetailBands {
            horizontal,
            vertical,
            diagonal,
        },
    )
}

/// One level of separable 2D synthesis: columns first, then rows.
///
/// The approximation and vertical inputs are complex because spectral
/// damping of the vertical band is not Hermitian-symmetric, so its inverse
/// transform carries a genuine imaginary part that must survive until the
/// final magnitude step. Horizontal and diagonal bands stay real. All four
/// inputs must share one shape `(m_r, m_c)`; the output has shape
/// `(2 m_r - f + 2, 2 m_c - f + 2)`.
pub fn idwt2(
    approx: &Array2<Complex<f64>>,
    horizontal: &Array2<f64>,
    vertical: &Array2<Complex<f64>>,
    diagonal: &Array2<f64>,
    wavelet: Wavelet,
) -> Array2<Complex<f64>> {
    debug_assert_eq!(approx.dim(), horizontal.dim());
    debug_assert_eq!(approx.dim(), vertical.dim());
    debug_assert_eq!(approx.dim(), diagonal.dim());

    let (band_rows, band_cols) = approx.dim();
    let rec_lo = wavelet.rec_lo();
    let rec_hi = wavelet.rec_hi();
    let f = rec_lo.len();
    let out_rows = 2 * band_rows + 2 - f;
    let out_cols = 2 * band_cols + 2 - f;
    let zero = Complex::new(0.0, 0.0);

    // Column pass: merge (approx, horizontal) into the row-lowpass plane
    // and (vertical, diagonal) into the row-highpass plane.
    let mut plane_lo = Array2::<Complex<f64>>::zeros((out_rows, band_cols));
    let mut plane_hi = Array2::<Complex<f64>>::zeros((out_rows, band_cols));
    let mut a_col = vec![zero; band_rows];
    let mut d_col = vec![zero; band_rows];
    let mut merged = vec![zero; out_rows];
    for c in 0..band_cols {
        for r in 0..band_rows {
            a_col[r] = approx[[r, c]];
            d_col[r] = Complex::new(horizontal[[r, c]], 0.0);
        }
        synthesize_1d(&a_col, &d_col, &rec_lo, &rec_hi, &mut merged);
        for r in 0..out_rows {
            plane_lo[[r, c]] = merged[r];
        }

        for r in 0..band_rows {
            a_col[r] = vertical[[r, c]];
            d_col[r] = Complex::new(diagonal[[r, c]], 0.0);
        }
        synthesize_1d(&a_col, &d_col, &rec_lo, &rec_hi, &mut merged);
        for r in 0..out_rows {
            plane_hi[[r, c]] = merged[r];
        }
    }

    // Row pass.
    let mut output = Array2::<Complex<f64>>::zeros((out_rows, out_cols));
    let mut a_row = vec![zero; band_cols];
    let mut d_row = vec![zero; band_cols];
    let mut merged = vec![zero; out_cols];
    for r in 0..out_rows {
        for c in 0..band_cols {
            a_row[c] = plane_lo[[r, c]];
            d_row[c] = plane_hi[[r, c]];
        }
        synthesize_1d(&a_row, &d_row, &rec_lo, &rec_hi, &mut merged);
        for c in 0..out_cols {
            output[[r, c]] = merged[c];
        }
    }

    output
}
