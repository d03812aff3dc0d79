use crate::indicator::{ValueSeries, pad, true_range};
use crate::smoothing;

/// Simple moving average over close. Warm-up: period - 1.
pub fn sma(close: &[f64], period: usize) -> ValueSeries {
    pad(close.len(), period - 1, smoothing::sma(close, period))
}

/// Exponential moving average over close. Warm-up: period - 1.
pub fn ema(close: &[f64], period: usize) -> ValueSeries {
    pad(close.len(), period - 1, smoothing::ema(close, period))
}

/// Double exponential moving average. Warm-up: 2 * (period - 1).
pub fn dema(close: &[f64], period: usize) -> ValueSeries {
    pad(close.len(), 2 * (period - 1), smoothing::dema(close, period))
}

/// Triple exponential moving average. Warm-up: 3 * (period - 1).
pub fn tema(close: &[f64], period: usize) -> ValueSeries {
    pad(close.len(), 3 * (period - 1), smoothing::tema(close, period))
}

/// Kaufman adaptive moving average. Warm-up: period.
pub fn kama(close: &[f64], period: usize) -> ValueSeries {
    pad(close.len(), period, smoothing::kama(close, period))
}

pub struct DirectionalOutput {
    pub plus_di: ValueSeries,
    pub minus_di: ValueSeries,
    pub adx: ValueSeries,
}

/// Directional movement pipeline: +DM/-DM and true range per bar, Wilder
/// smoothing, +DI/-DI, DX, and ADX as the Wilder-smoothed DX.
///
/// DI lines become valid at index `period`; ADX smooths an already-smoothed
/// series and becomes valid at `2*period - 1`. A bar where +DI + -DI = 0
/// produces DX = 0, not an undefined value.
pub fn adx(high: &[f64], low: &[f64], close: &[f64], period: usize) -> DirectionalOutput {
    let n = high.len();
    let period_f = period as f64;

    // Per-transition raw directional movement and true range (index k is
    // the move from bar k to bar k+1).
    let tr = true_range(high, low, close);
    let transitions = n - 1;
    let mut plus_dm = Vec::with_capacity(transitions);
    let mut minus_dm = Vec::with_capacity(transitions);
    for i in 1..n {
        let up_move = high[i] - high[i - 1];
        let down_move = low[i - 1] - low[i];
        plus_dm.push(if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        });
        minus_dm.push(if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        });
    }

    // Wilder running sums, seeded over the first `period` transitions.
    let mut smooth_plus: f64 = plus_dm[..period].iter().sum();
    let mut smooth_minus: f64 = minus_dm[..period].iter().sum();
    let mut smooth_tr: f64 = tr[..period].iter().sum();

    let di_count = n - period;
    let mut plus_di = Vec::with_capacity(di_count);
    let mut minus_di = Vec::with_capacity(di_count);
    let mut dx = Vec::with_capacity(di_count);

    fn step(sp: f64, sm: f64, st: f64) -> (f64, f64, f64) {
        let (p, m) = if st == 0.0 {
            (0.0, 0.0)
        } else {
            (100.0 * sp / st, 100.0 * sm / st)
        };
        let sum = p + m;
        let dx = if sum == 0.0 {
            0.0
        } else {
            100.0 * (p - m).abs() / sum
        };
        (p, m, dx)
    }

    let (p, m, d) = step(smooth_plus, smooth_minus, smooth_tr);
    plus_di.push(p);
    minus_di.push(m);
    dx.push(d);
    for k in period..transitions {
        smooth_plus = smooth_plus - smooth_plus / period_f + plus_dm[k];
        smooth_minus = smooth_minus - smooth_minus / period_f + minus_dm[k];
        smooth_tr = smooth_tr - smooth_tr / period_f + tr[k];
        let (p, m, d) = step(smooth_plus, smooth_minus, smooth_tr);
        plus_di.push(p);
        minus_di.push(m);
        dx.push(d);
    }

    // ADX: seeded with the mean of the first `period` DX values, then
    // Wilder-smoothed over the rest.
    let mut adx_values = Vec::with_capacity(dx.len() - period + 1);
    let mut current: f64 = dx[..period].iter().sum::<f64>() / period_f;
    adx_values.push(current);
    for &value in &dx[period..] {
        current = (current * (period_f - 1.0) + value) / period_f;
        adx_values.push(current);
    }

    DirectionalOutput {
        plus_di: pad(n, period, plus_di),
        minus_di: pad(n, period, minus_di),
        adx: pad(n, 2 * period - 1, adx_values),
    }
}
