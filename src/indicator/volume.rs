use crate::indicator::{ValueSeries, pad, typical_price};
use crate::smoothing;

/// On-balance volume: cumulative volume signed by the close-to-close
/// direction, unchanged on equal closes. Seeded at 0, so the whole output
/// is valid and there is no warm-up gap.
pub fn obv(close: &[f64], volume: &[f64]) -> ValueSeries {
    let mut total = 0.0;
    let mut out = Vec::with_capacity(close.len());
    out.push(total);
    for i in 1..close.len() {
        if close[i] > close[i - 1] {
            total += volume[i];
        } else if close[i] < close[i - 1] {
            total -= volume[i];
        }
        out.push(total);
    }
    pad(close.len(), 0, out)
}

/// Per-bar money-flow multiplier: where the close sits within the bar's
/// range, in [-1, 1]. A zero-range bar contributes 0.
fn money_flow_multiplier(high: f64, low: f64, close: f64) -> f64 {
    let range = high - low;
    if range == 0.0 {
        0.0
    } else {
        ((close - low) - (high - close)) / range
    }
}

fn ad_compact(high: &[f64], low: &[f64], close: &[f64], volume: &[f64]) -> Vec<f64> {
    let mut total = 0.0;
    (0..close.len())
        .map(|i| {
            total += money_flow_multiplier(high[i], low[i], close[i]) * volume[i];
            total
        })
        .collect()
}

/// Accumulation/Distribution line: cumulative money-flow-multiplier times
/// volume. Valid from index 0.
pub fn ad(high: &[f64], low: &[f64], close: &[f64], volume: &[f64]) -> ValueSeries {
    pad(close.len(), 0, ad_compact(high, low, close, volume))
}

/// Chaikin A/D oscillator: fast EMA minus slow EMA of the A/D line.
/// Warm-up: slow - 1.
pub fn adosc(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    volume: &[f64],
    fast: usize,
    slow: usize,
) -> ValueSeries {
    let line = ad_compact(high, low, close, volume);
    let fast_ema = smoothing::ema(&line, fast);
    let slow_ema = smoothing::ema(&line, slow);
    let offset = slow - fast;
    let values: Vec<f64> = slow_ema
        .iter()
        .zip(&fast_ema[offset..])
        .map(|(&s, &f)| f - s)
        .collect();
    pad(close.len(), slow - 1, values)
}

/// Money Flow Index: ratio of positive to negative typical-price * volume
/// flow over the trailing period, mapped through the RSI form. A window
/// with zero negative flow reads 100. Warm-up: period.
pub fn mfi(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    volume: &[f64],
    period: usize,
) -> ValueSeries {
    let tp = typical_price(high, low, close);
    let n = close.len();

    // Signed raw flow per transition (index k is the flow into bar k+1).
    let mut positive = Vec::with_capacity(n - 1);
    let mut negative = Vec::with_capacity(n - 1);
    for i in 1..n {
        let flow = tp[i] * volume[i];
        if tp[i] > tp[i - 1] {
            positive.push(flow);
            negative.push(0.0);
        } else if tp[i] < tp[i - 1] {
            positive.push(0.0);
            negative.push(flow);
        } else {
            positive.push(0.0);
            negative.push(0.0);
        }
    }

    let values: Vec<f64> = (period - 1..n - 1)
        .map(|k| {
            let window = k + 1 - period..=k;
            let pos: f64 = window.clone().map(|j| positive[j]).sum();
            let neg: f64 = window.map(|j| negative[j]).sum();
            if neg == 0.0 {
                100.0
            } else {
                100.0 - 100.0 / (1.0 + pos / neg)
            }
        })
        .collect();
    pad(n, period, values)
}
