pub mod momentum;
pub mod pattern;
pub mod sar;
pub mod trend;
pub mod volatility;
pub mod volume;

/// One output series in the uniform result contract: always the same length
/// as the input, with `None` marking warm-up positions that cannot be
/// computed yet. `None` serializes as JSON `null`, distinguishable from a
/// computed 0.0.
pub type ValueSeries = Vec<Option<f64>>;

/// Pad a compact computation result back to input length: `first_valid`
/// leading `None`s followed by the computed values.
///
/// Family functions produce compact vectors (cheaper to compose); the
/// packaging into the uniform contract happens exactly once, here.
pub fn pad(len: usize, first_valid: usize, values: Vec<f64>) -> ValueSeries {
    debug_assert_eq!(first_valid + values.len(), len);
    let mut out: ValueSeries = Vec::with_capacity(len);
    out.resize(first_valid, None);
    out.extend(values.into_iter().map(Some));
    out
}

/// (high + low + close) / 3, one representative price per period.
pub fn typical_price(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    high.iter()
        .zip(low)
        .zip(close)
        .map(|((&h, &l), &c)| (h + l + c) / 3.0)
        .collect()
}

/// Per-bar true range: max of (high-low), |high-prevClose|, |low-prevClose|.
/// Defined from index 1; the returned vector has length `n - 1`.
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    (1..high.len())
        .map(|i| {
            let prev_close = close[i - 1];
            (high[i] - low[i])
                .max((high[i] - prev_close).abs())
                .max((low[i] - prev_close).abs())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_preserves_length_and_marks_warmup() {
        let out = pad(5, 2, vec![1.0, 2.0, 3.0]);
        assert_eq!(out.len(), 5);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_eq!(out[2], Some(1.0));
        assert_eq!(out[4], Some(3.0));
    }

    #[test]
    fn pad_with_no_warmup() {
        let out = pad(2, 0, vec![7.0, 8.0]);
        assert_eq!(out, vec![Some(7.0), Some(8.0)]);
    }

    #[test]
    fn typical_price_averages_components() {
        let tp = typical_price(&[3.0], &[1.0], &[2.0]);
        assert!((tp[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn true_range_takes_largest_of_three() {
        // Gap up: prev close far below today's range.
        let high = [10.0, 15.0];
        let low = [9.0, 14.0];
        let close = [9.5, 14.5];
        let tr = true_range(&high, &low, &close);
        assert_eq!(tr.len(), 1);
        // high - prev_close = 5.5 dominates high - low = 1.0
        assert!((tr[0] - 5.5).abs() < 1e-9);
    }
}
