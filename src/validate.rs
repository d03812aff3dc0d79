//! Shared series validation.
//!
//! Checks run in a fixed priority order for every indicator: empty input,
//! length mismatch, insufficient data for the period, non-finite values,
//! out-of-range parameters, OHLC consistency. The first violated
//! precondition is reported and computation never starts.

use error_stack::{Report, bail};

use crate::error::ComputeError;

/// Reject empty or absent arrays. A required array that was not supplied
/// deserializes as empty and fails here.
pub fn require_non_empty(arrays: &[(&str, &[f64])]) -> Result<(), Report<ComputeError>> {
    for (name, values) in arrays {
        if values.is_empty() {
            bail!(ComputeError::EmptyInput {
                series: (*name).into(),
            });
        }
    }
    Ok(())
}

/// All arrays supplied for one call must have equal length.
pub fn require_equal_len(arrays: &[(&str, &[f64])]) -> Result<(), Report<ComputeError>> {
    let Some(&(first_name, first)) = arrays.first() else {
        return Ok(());
    };
    for (name, values) in &arrays[1..] {
        if values.len() != first.len() {
            bail!(ComputeError::LengthMismatch {
                left: first_name.into(),
                left_len: first.len(),
                right: (*name).into(),
                right_len: values.len(),
            });
        }
    }
    Ok(())
}

/// A series shorter than `required` cannot produce a single valid value
/// for the given parameters. Also covers the uniform `period >= length`
/// rule: callers pass `period + 1` (or the indicator's own larger
/// minimum) as `required`.
pub fn require_min_len(available: usize, required: usize) -> Result<(), Report<ComputeError>> {
    if available < required {
        bail!(ComputeError::InsufficientData {
            required,
            available,
        });
    }
    Ok(())
}

/// Every value must be finite. All indicators in this engine carry
/// front-of-series state (a smoothing recurrence or a cumulative sum), so a
/// NaN or infinity at any index would poison the rest of the output.
pub fn require_finite(arrays: &[(&str, &[f64])]) -> Result<(), Report<ComputeError>> {
    for (name, values) in arrays {
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            bail!(ComputeError::NonFiniteInput {
                series: (*name).into(),
                index,
            });
        }
    }
    Ok(())
}

pub fn require_positive_period(name: &str, period: usize) -> Result<(), Report<ComputeError>> {
    if period == 0 {
        bail!(ComputeError::InvalidParameter {
            name: format!("{name} must be > 0"),
        });
    }
    Ok(())
}

pub fn require_positive(name: &str, value: f64) -> Result<(), Report<ComputeError>> {
    if !value.is_finite() || value <= 0.0 {
        bail!(ComputeError::InvalidParameter {
            name: format!("{name} must be a finite value > 0"),
        });
    }
    Ok(())
}

pub fn require_fast_below_slow(
    fast_name: &str,
    fast: usize,
    slow_name: &str,
    slow: usize,
) -> Result<(), Report<ComputeError>> {
    if fast >= slow {
        bail!(ComputeError::InvalidParameter {
            name: format!("{fast_name} must be < {slow_name}"),
        });
    }
    Ok(())
}

/// Per-sample OHLC invariant for indicators that read more than one price
/// component: high >= low >= 0, high >= open, high >= close, open/close >= 0.
/// Arrays the indicator does not consume are passed as empty and skipped.
pub fn require_consistent_ohlc(
    open: &[f64],
    high: &[f64],
    low: &[f64],
    close: &[f64],
) -> Result<(), Report<ComputeError>> {
    let n = high.len().max(low.len()).max(open.len()).max(close.len());
    for i in 0..n {
        let h = high.get(i).copied();
        let l = low.get(i).copied();
        let o = open.get(i).copied();
        let c = close.get(i).copied();

        if let (Some(h), Some(l)) = (h, l) {
            if h < l {
                bail!(ComputeError::InconsistentOhlc {
                    index: i,
                    reason: format!("high {h} < low {l}"),
                });
            }
        }
        if let Some(l) = l {
            if l < 0.0 {
                bail!(ComputeError::InconsistentOhlc {
                    index: i,
                    reason: format!("low {l} < 0"),
                });
            }
        }
        if let (Some(h), Some(o)) = (h, o) {
            if h < o {
                bail!(ComputeError::InconsistentOhlc {
                    index: i,
                    reason: format!("high {h} < open {o}"),
                });
            }
        }
        if let (Some(h), Some(c)) = (h, c) {
            if h < c {
                bail!(ComputeError::InconsistentOhlc {
                    index: i,
                    reason: format!("high {h} < close {c}"),
                });
            }
        }
        for (name, v) in [("open", o), ("close", c)] {
            if let Some(v) = v {
                if v < 0.0 {
                    bail!(ComputeError::InconsistentOhlc {
                        index: i,
                        reason: format!("{name} {v} < 0"),
                    });
                }
            }
        }
    }
    Ok(())
}
