use crate::indicator::{ValueSeries, pad, true_range};
use crate::smoothing;

/// Average true range: Wilder-smoothed true range. The first true range
/// needs a previous close, so warm-up is `period` (not period - 1).
pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> ValueSeries {
    pad(close.len(), period, atr_compact(high, low, close, period))
}

fn atr_compact(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    let tr = true_range(high, low, close);
    smoothing::wilder(&tr, period)
}

/// Normalized ATR: ATR as a percentage of close, 0 where close is 0.
/// Warm-up: period.
pub fn natr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> ValueSeries {
    let values: Vec<f64> = atr_compact(high, low, close, period)
        .into_iter()
        .zip(&close[period..])
        .map(|(a, &c)| if c == 0.0 { 0.0 } else { 100.0 * a / c })
        .collect();
    pad(close.len(), period, values)
}

/// Rolling population standard deviation, compact, first valid at
/// `period - 1`. Shared by the stddev operation and the Bollinger bands so
/// the two stay mutually consistent.
fn rolling_std(values: &[f64], period: usize) -> Vec<f64> {
    let period_f = period as f64;
    values
        .windows(period)
        .map(|w| {
            let mean = w.iter().sum::<f64>() / period_f;
            let variance = w.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period_f;
            variance.sqrt()
        })
        .collect()
}

/// Rolling population standard deviation scaled by `deviations`.
/// Warm-up: period - 1.
pub fn stddev(close: &[f64], period: usize, deviations: f64) -> ValueSeries {
    let values: Vec<f64> = rolling_std(close, period)
        .into_iter()
        .map(|s| s * deviations)
        .collect();
    pad(close.len(), period - 1, values)
}

pub struct BandsOutput {
    pub upper: ValueSeries,
    pub middle: ValueSeries,
    pub lower: ValueSeries,
}

/// Bollinger bands: SMA middle band, upper/lower offset by the deviation
/// multipliers times the rolling standard deviation of the same window.
/// With positive multipliers, upper >= middle >= lower holds at every valid
/// index. Warm-up: period - 1.
pub fn bollinger(
    close: &[f64],
    period: usize,
    upper_deviation: f64,
    lower_deviation: f64,
) -> BandsOutput {
    let n = close.len();
    let middle = smoothing::sma(close, period);
    let std = rolling_std(close, period);

    let upper: Vec<f64> = middle
        .iter()
        .zip(&std)
        .map(|(&m, &s)| m + upper_deviation * s)
        .collect();
    let lower: Vec<f64> = middle
        .iter()
        .zip(&std)
        .map(|(&m, &s)| m - lower_deviation * s)
        .collect();

    BandsOutput {
        upper: pad(n, period - 1, upper),
        middle: pad(n, period - 1, middle),
        lower: pad(n, period - 1, lower),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn atr_constant_range_converges_to_range() {
        // Bars with a constant 2.0 high-low range and no gaps: every TR is
        // 2.0, so ATR is exactly 2.0 from the seed onward.
        let n = 30;
        let high: Vec<f64> = (0..n).map(|_| 12.0).collect();
        let low: Vec<f64> = (0..n).map(|_| 10.0).collect();
        let close: Vec<f64> = (0..n).map(|_| 11.0).collect();
        let out = atr(&high, &low, &close, 5);
        assert_eq!(out.iter().filter(|v| v.is_none()).count(), 5);
        for v in out.iter().flatten() {
            assert!((v - 2.0).abs() < EPS);
        }
    }

    #[test]
    fn atr_counts_gaps_through_previous_close() {
        // A large overnight gap must widen TR beyond the bar's own range.
        let high = [10.0, 20.5, 21.0];
        let low = [9.0, 20.0, 20.2];
        let close = [9.5, 20.3, 20.8];
        let out = atr(&high, &low, &close, 2);
        // TR[1] = max(0.5, |20.5-9.5|, |20.0-9.5|) = 11.0, TR[2] = 0.8
        let first = out[2].unwrap();
        assert!((first - (11.0 + 0.8) / 2.0).abs() < EPS);
    }

    #[test]
    fn natr_scales_by_close() {
        let n = 30;
        let high = vec![102.0; n];
        let low = vec![98.0; n];
        let close = vec![100.0; n];
        let out = natr(&high, &low, &close, 5);
        for v in out.iter().flatten() {
            assert!((v - 4.0).abs() < EPS, "expected 4%, got {v}");
        }
    }

    #[test]
    fn stddev_known_window() {
        let close = [1.0, 2.0, 3.0, 4.0];
        let out = stddev(&close, 3, 1.0);
        // population std of [1,2,3] = sqrt(2/3)
        assert!((out[2].unwrap() - (2.0f64 / 3.0).sqrt()).abs() < EPS);
        assert_eq!(out.iter().filter(|v| v.is_none()).count(), 2);
    }

    #[test]
    fn stddev_multiplier_applied() {
        let close = [1.0, 2.0, 3.0, 4.0];
        let single = stddev(&close, 3, 1.0);
        let double = stddev(&close, 3, 2.0);
        assert!((double[2].unwrap() - 2.0 * single[2].unwrap()).abs() < EPS);
    }

    #[test]
    fn bands_ordering_invariant() {
        let close: Vec<f64> = (0..50)
            .map(|i| 100.0 + (i as f64 * 1.3).sin() * 7.0)
            .collect();
        let out = bollinger(&close, 20, 2.0, 2.0);
        for i in 0..close.len() {
            match (out.upper[i], out.middle[i], out.lower[i]) {
                (Some(u), Some(m), Some(l)) => {
                    assert!(u >= m && m >= l, "band order broken at {i}");
                }
                (None, None, None) => {}
                other => panic!("bands disagree on warm-up at {i}: {other:?}"),
            }
        }
    }

    #[test]
    fn bands_flat_input_collapse_to_middle() {
        let close = [10.0; 10];
        let out = bollinger(&close, 5, 2.0, 2.0);
        for i in 4..10 {
            assert!((out.upper[i].unwrap() - 10.0).abs() < EPS);
            assert!((out.lower[i].unwrap() - 10.0).abs() < EPS);
        }
    }

    #[test]
    fn bands_asymmetric_deviations() {
        let close = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let out = bollinger(&close, 3, 3.0, 1.0);
        for i in 2..6 {
            let u = out.upper[i].unwrap();
            let m = out.middle[i].unwrap();
            let l = out.lower[i].unwrap();
            // upper offset is 3x the lower offset
            assert!(((u - m) - 3.0 * (m - l)).abs() < EPS);
        }
    }
}
