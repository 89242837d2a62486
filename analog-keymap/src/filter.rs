//! Sample filters.
//!
//! A filter turns a raw 16-bit sample into the quantized value that handlers
//! compare against their thresholds. The default filter drops the low
//! [`DEFAULT_SHIFT`] bits. Any filter can be inverted for sensors whose output
//! falls as the key travels down; inversion reflects the value around the
//! filter's own output range, not the raw ADC range.

use core::fmt;

use crate::config::InvertRow;
use crate::error::RejectReason;

/// Highest raw sample a channel can report.
pub const MAX_RAW: u16 = u16::MAX;

/// Bits dropped by the default quantization filter.
pub const DEFAULT_SHIFT: u8 = 8;

/// The base transform of a filter, before any inversion.
#[derive(Copy, Clone, Debug)]
enum Transform {
    /// `raw >> n`
    Shift(u8),
    /// Caller supplied pure function. Trusted to be total over `0..=MAX_RAW`.
    Custom(fn(u16) -> i32),
}

impl Transform {
    fn eval(self, raw: u16) -> i32 {
        match self {
            Transform::Shift(bits) => i32::from(raw.checked_shr(u32::from(bits)).unwrap_or(0)),
            Transform::Custom(f) => f(raw),
        }
    }
}

/// A quantization filter, optionally inverted.
///
/// The inverted form caches `base(MAX_RAW) + 1` when it is built so the
/// per-sample cost stays one transform plus one add.
#[derive(Copy, Clone, Debug)]
pub struct Filter {
    base: Transform,
    /// Output range of `base`, present only when inverted.
    range: Option<i32>,
}

impl Filter {
    /// Right-shift quantization filter.
    pub const fn shift(bits: u8) -> Self {
        Self {
            base: Transform::Shift(bits),
            range: None,
        }
    }

    /// Filter backed by a custom function.
    pub const fn custom(f: fn(u16) -> i32) -> Self {
        Self {
            base: Transform::Custom(f),
            range: None,
        }
    }

    /// Apply the filter to a raw sample.
    #[inline]
    pub fn apply(&self, raw: u16) -> i32 {
        let value = self.base.eval(raw);
        match self.range {
            Some(range) => !value + range,
            None => value,
        }
    }

    /// The polarity-inverted version of this filter.
    ///
    /// Inverting an inverted filter gives back the plain one.
    pub fn inverted(self) -> Self {
        match self.range {
            Some(_) => Self {
                base: self.base,
                range: None,
            },
            None => Self {
                base: self.base,
                range: Some(self.base.eval(MAX_RAW) + 1),
            },
        }
    }

    /// Output of the base transform at [`MAX_RAW`].
    pub fn max_output(&self) -> i32 {
        self.base.eval(MAX_RAW)
    }

    pub fn is_inverted(&self) -> bool {
        self.range.is_some()
    }
}

impl Default for Filter {
    fn default() -> Self {
        Filter::shift(DEFAULT_SHIFT)
    }
}

impl From<u8> for Filter {
    fn from(bits: u8) -> Self {
        Filter::shift(bits)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.base {
            Transform::Shift(bits) => write!(f, ">>{bits}")?,
            Transform::Custom(_) => f.write_str("fn")?,
        }
        if self.is_inverted() {
            f.write_str("~")?;
        }
        Ok(())
    }
}

/// Apply an invert setting to one row of filters.
///
/// [`InvertRow::All`] inverts every filter or none; [`InvertRow::Each`]
/// selects per index and must be exactly as wide as the row.
pub fn invert_row<const N: usize>(
    filters: &[Filter; N],
    invert: &InvertRow<'_>,
) -> Result<[Filter; N], RejectReason> {
    match *invert {
        InvertRow::All(false) => Ok(*filters),
        InvertRow::All(true) => Ok(filters.map(Filter::inverted)),
        InvertRow::Each(flags) => {
            if flags.len() != N {
                return Err(RejectReason::InvertShape {
                    expected: N,
                    found: flags.len(),
                });
            }
            let mut out = *filters;
            for (filter, &flip) in out.iter_mut().zip(flags) {
                if flip {
                    *filter = filter.inverted();
                }
            }
            Ok(out)
        }
    }
}
