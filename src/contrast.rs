//! Contrast-limited adaptive histogram equalization (CLAHE).
//!
//! The slice is divided into a balanced grid of tiles, each tile equalized
//! through a clipped 256-bin histogram, and every pixel mapped through
//! bilinear interpolation between the four nearest tile mappings, which
//! avoids visible tile seams. Clipping the histogram bounds how much any
//! single intensity can be stretched, limiting noise amplification in flat
//! regions.

use ndarray::{Array2, ArrayView2};

use crate::dtype::{restore_original_type, Sample};
use crate::error::DecurtainError;

/// Histogram resolution used for tile equalization.
const NBINS: usize = 256;

// =============================================================================
// Defaults
// =============================================================================

/// Default contrast clip limit.
pub const DEFAULT_CLIP_LIMIT: f64 = 0.007;

/// Default tile grid rows.
pub const DEFAULT_TILE_ROWS: usize = 50;

/// Default tile grid columns.
pub const DEFAULT_TILE_COLS: usize = 50;

/// Parameters for adaptive contrast enhancement.
#[derive(Clone, Debug)]
pub struct ContrastConfig {
    /// Fraction of a tile's pixel count at which histogram bins are
    /// clipped; higher values allow stronger local contrast changes.
    pub clip_limit: f64,
    /// Number of tile rows the slice is divided into.
    pub tile_rows: usize,
    /// Number of tile columns the slice is divided into.
    pub tile_cols: usize,
}

impl Default for ContrastConfig {
    fn default() -> Self {
        Self {
            clip_limit: DEFAULT_CLIP_LIMIT,
            tile_rows: DEFAULT_TILE_ROWS,
            tile_cols: DEFAULT_TILE_COLS,
        }
    }
}

impl ContrastConfig {
    /// Checks parameter ranges. Runs before any pixel is touched.
    ///
    /// # Errors
    ///
    /// Returns [`DecurtainError::InvalidParameter`] when the clip limit is
    /// outside `(0, 1]` or a tile count is zero.
    pub fn validate(&self) -> Result<(), DecurtainError> {
        if !self.clip_limit.is_finite() || self.clip_limit <= 0.0 || self.clip_limit > 1.0 {
            return Err(DecurtainError::InvalidParameter(format!(
                "clip limit must be in (0, 1], got {}",
                self.clip_limit
            )));
        }
        if self.tile_rows == 0 || self.tile_cols == 0 {
            return Err(DecurtainError::InvalidParameter(
                "tile grid must have at least one row and one column".into(),
            ));
        }
        Ok(())
    }

    /// Deterministic tag encoding the parameter set, used by callers to
    /// name results.
    pub fn label(&self) -> String {
        format!(
            "CoEn_clip{}_row{}_col{}",
            self.clip_limit, self.tile_rows, self.tile_cols
        )
    }
}

/// Locate a position between tile centers along one axis. Returns the two
/// bracketing tile indices and the blend weight toward the second; outside
/// the first or last center the nearest tile is used alone.
fn axis_blend(pos: f64, centers: &[f64]) -> (usize, usize, f64) {
    if pos <= centers[0] {
        return (0, 0, 0.0);
    }
    let last = centers.len() - 1;
    if pos >= centers[last] {
        return (last, last, 0.0);
    }
    let mut i = 0;
    while centers[i + 1] < pos {
        i += 1;
    }
    let w = (pos - centers[i]) / (centers[i + 1] - centers[i]);
    (i, i + 1, w)
}

/// Equalization mapping for one tile: clipped histogram, uniform excess
/// redistribution, cumulative distribution scaled to `[0, 1]`.
fn tile_mapping(
    norm: &Array2<f64>,
    row_range: (usize, usize),
    col_range: (usize, usize),
    clip_limit: f64,
) -> [f64; NBINS] {
    let (r0, r1) = row_range;
    let (c0, c1) = col_range;
    let npix = (r1 - r0) * (c1 - c0);

    let mut hist = [0usize; NBINS];
    for r in r0..r1 {
        for c in c0..c1 {
            let bin = ((norm[[r, c]] * (NBINS - 1) as f64).round() as usize).min(NBINS - 1);
            hist[bin] += 1;
        }
    }

    let limit = ((clip_limit * npix as f64).ceil() as usize).max(1);
    let mut excess = 0usize;
    for h in hist.iter_mut() {
        if *h > limit {
            excess += *h - limit;
            *h = limit;
        }
    }
    let add = excess / NBINS;
    let mut remainder = excess % NBINS;
    for h in hist.iter_mut() {
        *h += add;
        if remainder > 0 {
            *h += 1;
            remainder -= 1;
        }
    }

    let mut map = [0f64; NBINS];
    let mut cum = 0usize;
    for (m, &h) in map.iter_mut().zip(hist.iter()) {
        cum += h;
        *m = cum as f64 / npix as f64;
    }
    map
}

/// Enhance local contrast in one 2D slice.
///
/// The slice is min-max normalized, equalized tile-wise with bilinear
/// blending, and remapped onto the native range of `S`. A constant slice
/// has no contrast to redistribute and maps to the midpoint of the target
/// range. The output shape and element type always equal the input's.
///
/// # Errors
///
/// Returns [`DecurtainError::InvalidParameter`] for out-of-range parameters
/// or a tile grid larger than the slice, and
/// [`DecurtainError::UnsupportedDtype`] if `S` has no normalization range.
pub fn enhance_contrast_slice<S: Sample>(
    slice: ArrayView2<S>,
    config: &ContrastConfig,
) -> Result<Array2<S>, DecurtainError> {
    config.validate()?;

    let (rows, cols) = slice.dim();
    if config.tile_rows > rows || config.tile_cols > cols {
        return Err(DecurtainError::InvalidParameter(format!(
            "tile grid {}x{} exceeds slice shape {}x{}",
            config.tile_rows, config.tile_cols, rows, cols
        )));
    }

    let floats = slice.mapv(|v| v.to_f64());
    let min = floats.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = floats.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !(max > min) {
        return restore_original_type(floats.view());
    }
    let norm = floats.mapv(|v| (v - min) / (max - min));

    // Balanced tile partition; trailing tiles are never empty.
    let row_edges: Vec<usize> = (0..=config.tile_rows)
        .map(|t| t * rows / config.tile_rows)
        .collect();
    let col_edges: Vec<usize> = (0..=config.tile_cols)
        .map(|t| t * cols / config.tile_cols)
        .collect();
    let row_centers: Vec<f64> = (0..config.tile_rows)
        .map(|t| (row_edges[t] + row_edges[t + 1]) as f64 / 2.0 - 0.5)
        .collect();
    let col_centers: Vec<f64> = (0..config.tile_cols)
        .map(|t| (col_edges[t] + col_edges[t + 1]) as f64 / 2.0 - 0.5)
        .collect();

    let mut mappings = Vec::with_capacity(config.tile_rows * config.tile_cols);
    for tr in 0..config.tile_rows {
        for tc in 0..config.tile_cols {
            mappings.push(tile_mapping(
                &norm,
                (row_edges[tr], row_edges[tr + 1]),
                (col_edges[tc], col_edges[tc + 1]),
                config.clip_limit,
            ));
        }
    }
    let map_at = |tr: usize, tc: usize| &mappings[tr * config.tile_cols + tc];

    let mut equalized = Array2::<f64>::zeros((rows, cols));
    for r in 0..rows {
        let (tr0, tr1, wr) = axis_blend(r as f64, &row_centers);
        for c in 0..cols {
            let (tc0, tc1, wc) = axis_blend(c as f64, &col_centers);
            let bin = ((norm[[r, c]] * (NBINS - 1) as f64).round() as usize).min(NBINS - 1);
            let top = map_at(tr0, tc0)[bin] * (1.0 - wc) + map_at(tr0, tc1)[bin] * wc;
            let bottom = map_at(tr1, tc0)[bin] * (1.0 - wc) + map_at(tr1, tc1)[bin] * wc;
            equalized[[r, c]] = top * (1.0 - wr) + bottom * wr;
        }
    }

    restore_original_type(equalized.view())
}
