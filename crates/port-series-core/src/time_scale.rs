//! Affine rescaling of elapsed time.
//!
//! A [`TimeScale`] stretches or compresses the time elapsed since a pivot
//! instant `t0`: every timestamp `t` becomes `t0 + (t - t0) * factor`. The
//! pivot itself never moves, and since factors are strictly positive the
//! relative order of timestamps is preserved.
//!
//! Integral factors are applied with exact integer arithmetic. Fractional
//! factors scale the offset from `t0` in `f64` and round to the nearest
//! nanosecond; offsets are small compared to absolute epoch nanoseconds, so
//! the precision loss stays well below a nanosecond for typical captures.

use std::{fmt, num::ParseFloatError, str::FromStr};

use arrow::array::{Array, TimestampNanosecondArray};
use snafu::prelude::*;

/// Errors raised by time scale parsing or application.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TimeScaleError {
    /// Factor is zero, negative, NaN or infinite.
    #[snafu(display("Invalid time scale {factor}: expected a finite factor greater than 0"))]
    InvalidFactor {
        /// The rejected factor.
        factor: f64,
    },

    /// Factor text is not a number.
    #[snafu(display("Invalid time scale '{input}': {source}"))]
    ParseFactor {
        /// The text that failed to parse.
        input: String,
        /// Underlying parse error.
        source: ParseFloatError,
    },

    /// A rescaled timestamp falls outside the representable `i64` nanosecond range.
    #[snafu(display(
        "Rescaling timestamp {ts} around {t0} by {factor} overflows the nanosecond range"
    ))]
    Overflow {
        /// Original timestamp in nanoseconds.
        ts: i64,
        /// Pivot timestamp in nanoseconds.
        t0: i64,
        /// Scale factor being applied.
        factor: f64,
    },
}

/// A validated, strictly positive time scale factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeScale(f64);

impl TimeScale {
    /// The factor that leaves timestamps untouched.
    pub const IDENTITY: TimeScale = TimeScale(1.0);

    /// Validate `factor`.
    pub fn new(factor: f64) -> Result<Self, TimeScaleError> {
        ensure!(
            factor.is_finite() && factor > 0.0,
            InvalidFactorSnafu { factor }
        );
        Ok(TimeScale(factor))
    }

    /// The raw factor.
    pub fn factor(self) -> f64 {
        self.0
    }

    /// True when applying this scale is a no-op.
    pub fn is_identity(self) -> bool {
        self.0 == 1.0
    }

    /// Map `ts` to `t0 + (ts - t0) * factor`.
    pub fn apply(self, t0: i64, ts: i64) -> Result<i64, TimeScaleError> {
        let overflow = || OverflowSnafu {
            ts,
            t0,
            factor: self.0,
        };
        let offset = i128::from(ts) - i128::from(t0);

        let scaled = if self.0.fract() == 0.0 && self.0 <= i64::MAX as f64 {
            offset.checked_mul(self.0 as i128).context(overflow())?
        } else {
            let scaled = (offset as f64 * self.0).round();
            ensure!(scaled.abs() <= i64::MAX as f64 * 2.0, overflow());
            scaled as i128
        };

        i64::try_from(i128::from(t0) + scaled)
            .ok()
            .context(overflow())
    }
}

impl Default for TimeScale {
    fn default() -> Self {
        TimeScale::IDENTITY
    }
}

impl TryFrom<f64> for TimeScale {
    type Error = TimeScaleError;

    fn try_from(factor: f64) -> Result<Self, Self::Error> {
        TimeScale::new(factor)
    }
}

impl FromStr for TimeScale {
    type Err = TimeScaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let factor = s
            .trim()
            .parse::<f64>()
            .context(ParseFactorSnafu { input: s })?;
        TimeScale::new(factor)
    }
}

impl fmt::Display for TimeScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rescale a sorted timestamp column around its first value.
///
/// An empty column is returned as-is. The output carries the input's
/// timezone metadata.
pub fn rescale_ts(
    ts: &TimestampNanosecondArray,
    scale: TimeScale,
) -> Result<TimestampNanosecondArray, TimeScaleError> {
    let values = ts.values();
    let Some(&t0) = values.first() else {
        return Ok(ts.clone());
    };
    if scale.is_identity() {
        return Ok(ts.clone());
    }

    let scaled = values
        .iter()
        .map(|&t| scale.apply(t0, t))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TimestampNanosecondArray::new(scaled.into(), ts.nulls().cloned())
        .with_timezone_opt(ts.timezone().map(|tz| tz.to_string())))
}
