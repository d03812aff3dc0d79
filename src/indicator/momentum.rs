use crate::indicator::{ValueSeries, pad, typical_price};
use crate::smoothing;

/// Relative Strength Index via Wilder smoothing of close-to-close gains and
/// losses. A period with zero average loss reads 100, not NaN. Warm-up:
/// period.
pub fn rsi(close: &[f64], period: usize) -> ValueSeries {
    pad(close.len(), period, rsi_compact(close, period))
}

/// Compact RSI, first valid at input index `period`. Shared with the
/// stochastic RSI, which runs a range oscillator over this output.
fn rsi_compact(close: &[f64], period: usize) -> Vec<f64> {
    let deltas: Vec<f64> = close.windows(2).map(|w| w[1] - w[0]).collect();
    let period_f = period as f64;

    let mut avg_gain: f64 =
        deltas[..period].iter().map(|&d| d.max(0.0)).sum::<f64>() / period_f;
    let mut avg_loss: f64 =
        deltas[..period].iter().map(|&d| (-d).max(0.0)).sum::<f64>() / period_f;

    let mut out = Vec::with_capacity(deltas.len() - period + 1);
    out.push(rsi_value(avg_gain, avg_loss));
    for &delta in &deltas[period..] {
        avg_gain = (avg_gain * (period_f - 1.0) + delta.max(0.0)) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + (-delta).max(0.0)) / period_f;
        out.push(rsi_value(avg_gain, avg_loss));
    }
    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}

pub struct MacdOutput {
    pub macd: ValueSeries,
    pub signal: ValueSeries,
    pub histogram: ValueSeries,
}

/// MACD line (fast EMA - slow EMA of close), its signal EMA, and the
/// histogram. The line becomes valid at `slow - 1`, signal and histogram at
/// `slow + signal - 2`.
pub fn macd(close: &[f64], fast: usize, slow: usize, signal: usize) -> MacdOutput {
    let n = close.len();
    let fast_ema = smoothing::ema(close, fast);
    let slow_ema = smoothing::ema(close, slow);

    let offset = slow - fast;
    let line: Vec<f64> = slow_ema
        .iter()
        .zip(&fast_ema[offset..])
        .map(|(&s, &f)| f - s)
        .collect();

    let signal_line = smoothing::ema(&line, signal);
    let histogram: Vec<f64> = signal_line
        .iter()
        .zip(&line[signal - 1..])
        .map(|(&s, &m)| m - s)
        .collect();

    MacdOutput {
        macd: pad(n, slow - 1, line),
        signal: pad(n, slow + signal - 2, signal_line),
        histogram: pad(n, slow + signal - 2, histogram),
    }
}

pub struct StochOutput {
    pub slow_k: ValueSeries,
    pub slow_d: ValueSeries,
}

/// Stochastic oscillator: raw %K over the fast lookback, smoothed into
/// slow %K and slow %D by simple moving averages. A bar whose lookback
/// range is zero reads 0.
pub fn stoch(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    fastk_period: usize,
    slowk_period: usize,
    slowd_period: usize,
) -> StochOutput {
    let n = close.len();
    let fast_k = raw_stoch(high, low, close, fastk_period);
    let slow_k = smoothing::sma(&fast_k, slowk_period);
    let slow_d = smoothing::sma(&slow_k, slowd_period);

    let k_start = fastk_period + slowk_period - 2;
    StochOutput {
        slow_k: pad(n, k_start, slow_k),
        slow_d: pad(n, k_start + slowd_period - 1, slow_d),
    }
}

/// Raw %K: 100 * (close - lowest low) / (highest high - lowest low) over
/// the trailing window. Compact, first valid at `period - 1`.
fn raw_stoch(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    (period - 1..close.len())
        .map(|i| {
            let window = i + 1 - period..=i;
            let hh = window.clone().map(|j| high[j]).fold(f64::MIN, f64::max);
            let ll = window.map(|j| low[j]).fold(f64::MAX, f64::min);
            percent_of_range(close[i], ll, hh)
        })
        .collect()
}

fn percent_of_range(value: f64, lowest: f64, highest: f64) -> f64 {
    let range = highest - lowest;
    if range == 0.0 {
        0.0
    } else {
        100.0 * (value - lowest) / range
    }
}

pub struct StochRsiOutput {
    pub fast_k: ValueSeries,
    pub fast_d: ValueSeries,
}

/// Stochastic RSI: the range oscillator applied to the RSI series itself,
/// with %D as a simple moving average of %K.
pub fn stoch_rsi(
    close: &[f64],
    period: usize,
    fastk_period: usize,
    fastd_period: usize,
) -> StochRsiOutput {
    let n = close.len();
    let r = rsi_compact(close, period);

    let fast_k: Vec<f64> = (fastk_period - 1..r.len())
        .map(|i| {
            let window = i + 1 - fastk_period..=i;
            let hh = window.clone().map(|j| r[j]).fold(f64::MIN, f64::max);
            let ll = window.map(|j| r[j]).fold(f64::MAX, f64::min);
            percent_of_range(r[i], ll, hh)
        })
        .collect();
    let fast_d = smoothing::sma(&fast_k, fastd_period);

    let k_start = period + fastk_period - 1;
    StochRsiOutput {
        fast_k: pad(n, k_start, fast_k),
        fast_d: pad(n, k_start + fastd_period - 1, fast_d),
    }
}

/// Williams %R: the stochastic %K with an inverted sign convention,
/// bounded to [-100, 0]. Zero-range bars read 0. Warm-up: period - 1.
pub fn willr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> ValueSeries {
    let values: Vec<f64> = (period - 1..close.len())
        .map(|i| {
            let window = i + 1 - period..=i;
            let hh = window.clone().map(|j| high[j]).fold(f64::MIN, f64::max);
            let ll = window.map(|j| low[j]).fold(f64::MAX, f64::min);
            let range = hh - ll;
            if range == 0.0 {
                0.0
            } else {
                -100.0 * (hh - close[i]) / range
            }
        })
        .collect();
    pad(close.len(), period - 1, values)
}

/// Commodity Channel Index: typical price normalized by its mean absolute
/// deviation over the window, scaled by 0.015. A window with zero
/// deviation reads 0. Warm-up: period - 1.
pub fn cci(high: &[f64], low: &[f64], close: &[f64], period: usize) -> ValueSeries {
    let tp = typical_price(high, low, close);
    let period_f = period as f64;
    let values: Vec<f64> = tp
        .windows(period)
        .map(|w| {
            let mean = w.iter().sum::<f64>() / period_f;
            let mad = w.iter().map(|v| (v - mean).abs()).sum::<f64>() / period_f;
            if mad == 0.0 {
                0.0
            } else {
                (w[period - 1] - mean) / (0.015 * mad)
            }
        })
        .collect();
    pad(close.len(), period - 1, values)
}

/// Momentum: absolute change from `period` bars ago. Warm-up: period.
pub fn mom(close: &[f64], period: usize) -> ValueSeries {
    let values: Vec<f64> = (period..close.len())
        .map(|i| close[i] - close[i - period])
        .collect();
    pad(close.len(), period, values)
}

/// Rate of change: percentage change from `period` bars ago, 0 when the
/// reference close is 0. Warm-up: period.
pub fn roc(close: &[f64], period: usize) -> ValueSeries {
    let values: Vec<f64> = (period..close.len())
        .map(|i| {
            let reference = close[i - period];
            if reference == 0.0 {
                0.0
            } else {
                100.0 * (close[i] / reference - 1.0)
            }
        })
        .collect();
    pad(close.len(), period, values)
}

/// Percentage price oscillator: the MACD line expressed as a percentage of
/// the slow EMA, 0 when the slow EMA is 0. Warm-up: slow - 1.
pub fn ppo(close: &[f64], fast: usize, slow: usize) -> ValueSeries {
    let fast_ema = smoothing::ema(close, fast);
    let slow_ema = smoothing::ema(close, slow);
    let offset = slow - fast;
    let values: Vec<f64> = slow_ema
        .iter()
        .zip(&fast_ema[offset..])
        .map(|(&s, &f)| if s == 0.0 { 0.0 } else { 100.0 * (f - s) / s })
        .collect();
    pad(close.len(), slow - 1, values)
}

/// TRIX: one-bar rate of change of a triple-smoothed EMA, in percent.
/// Warm-up: 3 * (period - 1) + 1.
pub fn trix(close: &[f64], period: usize) -> ValueSeries {
    let e1 = smoothing::ema(close, period);
    let e2 = smoothing::ema(&e1, period);
    let e3 = smoothing::ema(&e2, period);
    let values: Vec<f64> = e3
        .windows(2)
        .map(|w| if w[0] == 0.0 { 0.0 } else { 100.0 * (w[1] - w[0]) / w[0] })
        .collect();
    pad(close.len(), 3 * (period - 1) + 1, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn rsi_all_gains_reads_100() {
        let close: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        let out = rsi(&close, 3);
        for v in out.iter().flatten() {
            assert!((v - 100.0).abs() < EPS);
        }
    }

    #[test]
    fn rsi_all_losses_reads_0() {
        let close: Vec<f64> = (1..=10).rev().map(|i| i as f64).collect();
        let out = rsi(&close, 3);
        for v in out.iter().flatten() {
            assert!(v.abs() < EPS);
        }
    }

    #[test]
    fn rsi_bounded_and_warmup() {
        let close: Vec<f64> = (0..50)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0)
            .collect();
        let out = rsi(&close, 14);
        assert_eq!(out.len(), 50);
        assert_eq!(out.iter().filter(|v| v.is_none()).count(), 14);
        for v in out.iter().flatten() {
            assert!((0.0..=100.0).contains(v), "RSI {v} out of bounds");
        }
    }

    #[test]
    fn macd_flat_input_is_zero() {
        let close = [42.0; 40];
        let out = macd(&close, 3, 6, 4);
        for v in out.macd.iter().chain(&out.signal).chain(&out.histogram).flatten() {
            assert!(v.abs() < EPS);
        }
    }

    #[test]
    fn macd_warmups() {
        let close: Vec<f64> = (0..60).map(|i| (i as f64).sin() + 50.0).collect();
        let out = macd(&close, 12, 26, 9);
        let undefined = |s: &ValueSeries| s.iter().filter(|v| v.is_none()).count();
        assert_eq!(undefined(&out.macd), 25);
        assert_eq!(undefined(&out.signal), 33);
        assert_eq!(undefined(&out.histogram), 33);
        // histogram = macd - signal wherever both are valid
        for i in 33..60 {
            let expected = out.macd[i].unwrap() - out.signal[i].unwrap();
            assert!((out.histogram[i].unwrap() - expected).abs() < EPS);
        }
    }

    #[test]
    fn stoch_bounded_and_zero_range_defined() {
        let high = vec![10.0; 20];
        let low = vec![10.0; 20];
        let close = vec![10.0; 20];
        let out = stoch(&high, &low, &close, 5, 3, 3);
        for v in out.slow_k.iter().chain(&out.slow_d).flatten() {
            assert!(v.abs() < EPS, "zero-range %K must be 0, got {v}");
        }
    }

    #[test]
    fn stoch_close_at_high_reads_100() {
        let n = 30;
        let high: Vec<f64> = (0..n).map(|i| 10.0 + i as f64).collect();
        let low: Vec<f64> = (0..n).map(|i| 9.0 + i as f64).collect();
        // close pinned at the high of a rising series stays at the top of
        // every lookback window
        let out = stoch(&high, &low, &high, 5, 3, 3);
        let last = out.slow_k.last().unwrap().unwrap();
        assert!((last - 100.0).abs() < EPS);
    }

    #[test]
    fn stoch_warmups() {
        let high: Vec<f64> = (0..30).map(|i| 11.0 + (i as f64).sin()).collect();
        let low: Vec<f64> = high.iter().map(|h| h - 2.0).collect();
        let close: Vec<f64> = high.iter().map(|h| h - 1.0).collect();
        let out = stoch(&high, &low, &close, 5, 3, 3);
        assert_eq!(out.slow_k.iter().filter(|v| v.is_none()).count(), 6);
        assert_eq!(out.slow_d.iter().filter(|v| v.is_none()).count(), 8);
    }

    #[test]
    fn stoch_rsi_bounded() {
        let close: Vec<f64> = (0..60)
            .map(|i| 100.0 + (i as f64 * 0.9).sin() * 8.0)
            .collect();
        let out = stoch_rsi(&close, 14, 5, 3);
        assert_eq!(out.fast_k.iter().filter(|v| v.is_none()).count(), 18);
        assert_eq!(out.fast_d.iter().filter(|v| v.is_none()).count(), 20);
        for v in out.fast_k.iter().chain(&out.fast_d).flatten() {
            assert!((0.0..=100.0).contains(v));
        }
    }

    #[test]
    fn willr_inverted_bounds() {
        let high: Vec<f64> = (0..30).map(|i| 11.0 + (i as f64).cos()).collect();
        let low: Vec<f64> = high.iter().map(|h| h - 2.0).collect();
        let close: Vec<f64> = high.iter().map(|h| h - 0.5).collect();
        let out = willr(&high, &low, &close, 14);
        assert_eq!(out.iter().filter(|v| v.is_none()).count(), 13);
        for v in out.iter().flatten() {
            assert!((-100.0..=0.0).contains(v), "%R {v} out of bounds");
        }
    }

    #[test]
    fn cci_flat_window_reads_zero() {
        let high = vec![11.0; 20];
        let low = vec![9.0; 20];
        let close = vec![10.0; 20];
        let out = cci(&high, &low, &close, 5);
        for v in out.iter().flatten() {
            assert!(v.abs() < EPS);
        }
    }

    #[test]
    fn cci_typical_price_above_mean_is_positive() {
        let n = 20;
        let close: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        let high: Vec<f64> = close.iter().map(|c| c + 1.0).collect();
        let low: Vec<f64> = close.iter().map(|c| c - 1.0).collect();
        let out = cci(&high, &low, &close, 5);
        // Rising series keeps the latest typical price above the window mean.
        assert!(out.last().unwrap().unwrap() > 0.0);
    }

    #[test]
    fn mom_and_roc_known_values() {
        let close = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0];
        let m = mom(&close, 2);
        let r = roc(&close, 2);
        assert_eq!(m.iter().filter(|v| v.is_none()).count(), 2);
        assert!((m[2].unwrap() - 2.0).abs() < EPS);
        assert!((r[2].unwrap() - 20.0).abs() < EPS);
    }

    #[test]
    fn roc_zero_reference_defined() {
        let close = [0.0, 1.0, 2.0, 3.0];
        let r = roc(&close, 2);
        assert!(r[2].unwrap().abs() < EPS);
    }

    #[test]
    fn ppo_flat_input_is_zero() {
        let close = [5.0; 40];
        let out = ppo(&close, 12, 26);
        assert_eq!(out.iter().filter(|v| v.is_none()).count(), 25);
        for v in out.iter().flatten() {
            assert!(v.abs() < EPS);
        }
    }

    #[test]
    fn trix_warmup_and_flat_zero() {
        let close = [8.0; 30];
        let p = 5;
        let out = trix(&close, p);
        assert_eq!(out.iter().filter(|v| v.is_none()).count(), 3 * (p - 1) + 1);
        for v in out.iter().flatten() {
            assert!(v.abs() < EPS);
        }
    }

    #[test]
    fn trix_positive_on_rising_series() {
        let close: Vec<f64> = (1..=40).map(|i| i as f64).collect();
        let out = trix(&close, 5);
        assert!(out.last().unwrap().unwrap() > 0.0);
    }
}
