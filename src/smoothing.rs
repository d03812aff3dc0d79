//! Reusable smoothing recurrences shared by the indicator families.
//!
//! All functions take a raw slice and return a compact output vector whose
//! first element corresponds to the input index noted per function (the
//! "first valid" index). Callers are responsible for length validation and
//! for padding the output back to input length.

/// Trailing-window arithmetic mean. First valid index: `period - 1`.
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len() - period + 1);
    let mut sum: f64 = values[..period].iter().sum();
    out.push(sum / period as f64);
    for i in period..values.len() {
        sum += values[i] - values[i - period];
        out.push(sum / period as f64);
    }
    out
}

/// Exponential smoothing, alpha = 2/(period+1), seeded with the simple
/// average of the first `period` values. First valid index: `period - 1`.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    smooth(values, period, 2.0 / (period as f64 + 1.0))
}

/// Wilder smoothing, alpha = 1/period, seeded like `ema`. Used by the
/// RSI/ADX/ATR family. First valid index: `period - 1`.
pub fn wilder(values: &[f64], period: usize) -> Vec<f64> {
    smooth(values, period, 1.0 / period as f64)
}

fn smooth(values: &[f64], period: usize, alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len() - period + 1);
    let mut current: f64 = values[..period].iter().sum::<f64>() / period as f64;
    out.push(current);
    for &value in &values[period..] {
        current += alpha * (value - current);
        out.push(current);
    }
    out
}

/// Double exponential composition: `2*EMA1 - EMA2` where EMA2 is the EMA of
/// EMA1. The second stage adds another `period - 1` of warm-up, so the
/// first valid index is `2*(period - 1)`.
pub fn dema(values: &[f64], period: usize) -> Vec<f64> {
    let e1 = ema(values, period);
    let e2 = ema(&e1, period);
    let offset = e1.len() - e2.len();
    e2.iter()
        .zip(&e1[offset..])
        .map(|(&second, &first)| 2.0 * first - second)
        .collect()
}

/// Triple exponential composition: `3*EMA1 - 3*EMA2 + EMA3`. Warm-up
/// accumulates across the three stages; first valid index `3*(period - 1)`.
pub fn tema(values: &[f64], period: usize) -> Vec<f64> {
    let e1 = ema(values, period);
    let e2 = ema(&e1, period);
    let e3 = ema(&e2, period);
    let off1 = e1.len() - e3.len();
    let off2 = e2.len() - e3.len();
    e3.iter()
        .enumerate()
        .map(|(i, &third)| 3.0 * e1[off1 + i] - 3.0 * e2[off2 + i] + third)
        .collect()
}

/// Adaptive (efficiency-ratio driven) smoothing, Kaufman style. The
/// smoothing constant is recomputed per step from
/// `er = |net movement| / total movement` over the trailing `period`
/// window, scaled between the fast (2-period) and slow (30-period)
/// exponential constants and squared. A flat window (total movement 0)
/// yields er = 0, i.e. the slowest constant. First valid index: `period`.
pub fn kama(values: &[f64], period: usize) -> Vec<f64> {
    const FAST_SC: f64 = 2.0 / 3.0;
    const SLOW_SC: f64 = 2.0 / 31.0;

    let mut out = Vec::with_capacity(values.len() - period);
    let mut current = values[period - 1];
    for i in period..values.len() {
        let net = (values[i] - values[i - period]).abs();
        let total: f64 = (i - period + 1..=i)
            .map(|j| (values[j] - values[j - 1]).abs())
            .sum();
        let er = if total == 0.0 { 0.0 } else { net / total };
        let sc = (er * (FAST_SC - SLOW_SC) + SLOW_SC).powi(2);
        current += sc * (values[i] - current);
        out.push(current);
    }
    out
}
