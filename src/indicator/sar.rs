use crate::indicator::{ValueSeries, pad};

#[derive(Clone, Copy, PartialEq)]
enum Trend {
    Long,
    Short,
}

/// Parabolic stop-and-reverse.
///
/// The one indicator that carries state across the series: the current
/// trend, the extreme price of that trend, and an acceleration factor that
/// grows by `acceleration` each time a new extreme is set, capped at
/// `maximum`. A close of price through the SAR flips the trend, resets the
/// SAR to the prior extreme, and resets the acceleration factor. Samples
/// must be processed strictly in order.
///
/// The whole output is valid; index 0 is the seed (the first bar's low for
/// an opening long trend, its high for a short one).
pub fn sar(high: &[f64], low: &[f64], acceleration: f64, maximum: f64) -> ValueSeries {
    let n = high.len();
    let mut out = Vec::with_capacity(n);

    // Opening trend from the direction of the first two highs.
    let mut trend = if high[1] > high[0] {
        Trend::Long
    } else {
        Trend::Short
    };
    let mut af = acceleration;
    let (mut current, mut extreme) = match trend {
        Trend::Long => (low[0], high[0]),
        Trend::Short => (high[0], low[0]),
    };
    out.push(current);

    for i in 1..n {
        current += af * (extreme - current);

        match trend {
            Trend::Long => {
                // Never place the SAR above the prior two lows.
                current = current.min(low[i - 1]);
                if i >= 2 {
                    current = current.min(low[i - 2]);
                }
                if low[i] < current {
                    trend = Trend::Short;
                    current = extreme;
                    extreme = low[i];
                    af = acceleration;
                } else if high[i] > extreme {
                    extreme = high[i];
                    af = (af + acceleration).min(maximum);
                }
            }
            Trend::Short => {
                current = current.max(high[i - 1]);
                if i >= 2 {
                    current = current.max(high[i - 2]);
                }
                if high[i] > current {
                    trend = Trend::Long;
                    current = extreme;
                    extreme = high[i];
                    af = acceleration;
                } else if low[i] < extreme {
                    extreme = low[i];
                    af = (af + acceleration).min(maximum);
                }
            }
        }
        out.push(current);
    }

    pad(n, 0, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rising_series_never_flips() {
        // Monotonically rising bars: the trend stays long, so the SAR must
        // trail below each bar's low after the opening few bars.
        let n = 30;
        let high: Vec<f64> = (0..n).map(|i| 101.0 + i as f64).collect();
        let low: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        let out = sar(&high, &low, 0.02, 0.2);
        assert_eq!(out.len(), n);
        for i in 3..n {
            let v = out[i].unwrap();
            assert!(v < low[i], "SAR {v} not below low {} at {i}", low[i]);
        }
        // No flip: SAR never jumps above the highs.
        for i in 0..n {
            assert!(out[i].unwrap() < high[i]);
        }
    }

    #[test]
    fn falling_series_trails_above_highs() {
        let n = 30;
        let high: Vec<f64> = (0..n).map(|i| 200.0 - i as f64).collect();
        let low: Vec<f64> = (0..n).map(|i| 199.0 - i as f64).collect();
        let out = sar(&high, &low, 0.02, 0.2);
        for i in 3..n {
            let v = out[i].unwrap();
            assert!(v > high[i], "SAR {v} not above high {} at {i}", high[i]);
        }
    }

    #[test]
    fn reversal_flips_to_prior_extreme() {
        // Rise for 10 bars then collapse far below the trailing SAR.
        let mut high: Vec<f64> = (0..10).map(|i| 101.0 + i as f64).collect();
        let mut low: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        high.push(95.0);
        low.push(94.0);
        let out = sar(&high, &low, 0.02, 0.2);
        // After the flip the SAR sits at the prior extreme high, above price.
        let flipped = out[10].unwrap();
        assert!((flipped - 110.0).abs() < 1e-9);
        assert!(flipped > high[10]);
    }

    #[test]
    fn acceleration_capped_at_maximum() {
        // A long strictly-rising run sets a new extreme every bar; with the
        // factor capped, SAR must still trail below the lows at the end.
        let n = 100;
        let high: Vec<f64> = (0..n).map(|i| 101.0 + i as f64 * 2.0).collect();
        let low: Vec<f64> = (0..n).map(|i| 100.0 + i as f64 * 2.0).collect();
        let out = sar(&high, &low, 0.02, 0.2);
        let last = out[n - 1].unwrap();
        assert!(last < low[n - 1]);
        // With af capped at 0.2 the SAR cannot fully catch up to the
        // extreme in one step.
        assert!(last < high[n - 1] - 1.0);
    }

    #[test]
    fn seed_is_first_bar_extreme() {
        let high = [10.0, 11.0, 12.0];
        let low = [9.0, 10.0, 11.0];
        let out = sar(&high, &low, 0.02, 0.2);
        // Rising opening -> long trend seeded at the first low.
        assert_eq!(out[0], Some(9.0));

        let high = [10.0, 9.0, 8.0];
        let low = [9.0, 8.0, 7.0];
        let out = sar(&high, &low, 0.02, 0.2);
        // Falling opening -> short trend seeded at the first high.
        assert_eq!(out[0], Some(10.0));
    }

    #[test]
    fn identical_runs_are_bit_identical() {
        let high: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64 * 0.7).sin() * 10.0).collect();
        let low: Vec<f64> = high.iter().map(|h| h - 2.0).collect();
        let a = sar(&high, &low, 0.02, 0.2);
        let b = sar(&high, &low, 0.02, 0.2);
        assert_eq!(a, b);
    }
}
