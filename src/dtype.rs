//! Sample type descriptors and output range normalization.
//!
//! The pipeline works in `f64` internally and converts back to the caller's
//! element type at the very end. Rather than inspecting types at runtime,
//! each supported element type carries a [`DType`] tag whose target range is
//! a pure lookup.

use ndarray::{Array2, ArrayView2};
use num_traits::Zero;
use std::fmt;

use crate::error::DecurtainError;

/// Identifies the element type of an image buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 8-bit integer.
    I8,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 16-bit integer.
    I16,
    /// Signed 32-bit integer.
    I32,
    /// Half-precision float. Recognized as a descriptor but carries no
    /// normalization range, since Rust has no stable f16 primitive.
    F16,
    /// Single-precision float.
    F32,
    /// Double-precision float.
    F64,
}

impl DType {
    /// NumPy-style name of this element type.
    pub fn name(&self) -> &'static str {
        match self {
            Self::U8 => "uint8",
            Self::I8 => "int8",
            Self::U16 => "uint16",
            Self::I16 => "int16",
            Self::I32 => "int32",
            Self::F16 => "float16",
            Self::F32 => "float32",
            Self::F64 => "float64",
        }
    }

    /// Returns true for the integer kinds.
    pub fn is_integral(self) -> bool {
        matches!(self, Self::U8 | Self::I8 | Self::U16 | Self::I16 | Self::I32)
    }

    /// Target range for output normalization.
    ///
    /// Integer kinds use their full native range. Floating kinds use
    /// `[-0.99, 0.99]`, a conservative margin below saturation.
    ///
    /// # Errors
    ///
    /// Returns [`DecurtainError::UnsupportedDtype`] for [`DType::F16`].
    pub fn normalization_range(self) -> Result<(f64, f64), DecurtainError> {
        match self {
            Self::U8 => Ok((0.0, 255.0)),
            Self::I8 => Ok((-128.0, 127.0)),
            Self::U16 => Ok((0.0, 65535.0)),
            Self::I16 => Ok((-32768.0, 32767.0)),
            Self::I32 => Ok((i32::MIN as f64, i32::MAX as f64)),
            Self::F32 | Self::F64 => Ok((-0.99, 0.99)),
            Self::F16 => Err(DecurtainError::UnsupportedDtype(self)),
        }
    }

    /// Full representable bounds of the type, used for clipping.
    ///
    /// # Errors
    ///
    /// Returns [`DecurtainError::UnsupportedDtype`] for [`DType::F16`].
    pub fn native_bounds(self) -> Result<(f64, f64), DecurtainError> {
        match self {
            Self::U8 => Ok((0.0, 255.0)),
            Self::I8 => Ok((-128.0, 127.0)),
            Self::U16 => Ok((0.0, 65535.0)),
            Self::I16 => Ok((-32768.0, 32767.0)),
            Self::I32 => Ok((i32::MIN as f64, i32::MAX as f64)),
            Self::F32 => Ok((f32::MIN as f64, f32::MAX as f64)),
            Self::F64 => Ok((f64::MIN, f64::MAX)),
            Self::F16 => Err(DecurtainError::UnsupportedDtype(self)),
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Element types that slices and stacks may carry through the pipeline.
///
/// Combines the bounds the engines need (copyable, zero-constructible for
/// stack assembly, thread-safe for parallel dispatch) with conversion to and
/// from the `f64` working domain.
pub trait Sample: Copy + Zero + PartialOrd + Send + Sync + 'static {
    /// Tag describing this element type.
    const DTYPE: DType;

    /// Widen into the f64 working domain.
    fn to_f64(self) -> f64;

    /// Cast back from the f64 working domain. Integer kinds round to
    /// nearest; out-of-range values saturate at the type bounds.
    fn from_f64(v: f64) -> Self;
}

macro_rules! impl_sample_integral {
    ($($ty:ty => $dtype:expr),* $(,)?) => {$(
        impl Sample for $ty {
            const DTYPE: DType = $dtype;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v.round() as $ty
            }
        }
    )*};
}

impl_sample_integral!(
    u8 => DType::U8,
    i8 => DType::I8,
    u16 => DType::U16,
    i16 => DType::I16,
    i32 => DType::I32,
);

impl Sample for f32 {
    const DTYPE: DType = DType::F32;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }
}

impl Sample for f64 {
    const DTYPE: DType = DType::F64;

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }
}

/// Remap a float intermediate onto the target range of sample type `S`.
///
/// The actual minimum and maximum of `img` are stretched linearly onto the
/// range from [`DType::normalization_range`], so relative intensities
/// survive the cast even when the float working values drift far outside the
/// native bounds. A constant input has no defined scaling and fills with the
/// midpoint of the target range.
///
/// This is normalize-to-range, not clamp: absolute intensity calibration is
/// not preserved across independently processed slices.
pub fn restore_original_type<S: Sample>(img: ArrayView2<f64>) -> Result<Array2<S>, DecurtainError> {
    let (lo, hi) = S::DTYPE.normalization_range()?;

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in img.iter() {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }

    if !(max > min) {
        return Ok(Array2::from_elem(img.dim(), S::from_f64(0.5 * (lo + hi))));
    }

    let scale = (hi - lo) / (max - min);
    Ok(img.mapv(|v| S::from_f64(lo + (v - min) * scale)))
}

/// Clamp a float intermediate into the native bounds of sample type `S` and
/// cast. Unlike [`restore_original_type`] this does not rescale; values
/// already in range pass through unchanged.
pub fn clip_to_dtype<S: Sample>(img: ArrayView2<f64>) -> Result<Array2<S>, DecurtainError> {
    let (lo, hi) = S::DTYPE.native_bounds()?;
    Ok(img.mapv(|v| S::from_f64(v.clamp(lo, hi))))
}
