//! Candlestick shape classifiers over 1-3 bar windows.
//!
//! Each recognizer returns, per index, a signed strength: positive for a
//! bullish signal, negative for bearish, 0 for no pattern. The magnitude is
//! 100 scaled by a confidence ratio of the defining body/shadow sizes, so
//! a textbook-perfect shape reads +/-100 and a marginal one reads closer
//! to 0. Recognizers are independent; they share only the predicates below.

use crate::indicator::{ValueSeries, pad};

/// Maximum body-to-range ratio for a bar to count as a doji.
const DOJI_BODY_FRACTION: f64 = 0.1;
/// A star's middle bar must have a body at most this fraction of the first
/// bar's body.
const STAR_MIDDLE_FRACTION: f64 = 0.5;

#[derive(Clone, Copy)]
struct Bar {
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

impl Bar {
    fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    fn range(&self) -> f64 {
        self.high - self.low
    }

    fn upper_shadow(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    fn lower_shadow(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    fn body_top(&self) -> f64 {
        self.open.max(self.close)
    }

    fn body_bottom(&self) -> f64 {
        self.open.min(self.close)
    }
}

fn bars(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<Bar> {
    (0..close.len())
        .map(|i| Bar {
            open: open[i],
            high: high[i],
            low: low[i],
            close: close[i],
        })
        .collect()
}

fn recognize<F>(open: &[f64], high: &[f64], low: &[f64], close: &[f64], window: usize, f: F) -> ValueSeries
where
    F: Fn(&[Bar]) -> f64,
{
    let bars = bars(open, high, low, close);
    let values: Vec<f64> = bars.windows(window).map(|w| f(w)).collect();
    pad(close.len(), window - 1, values)
}

/// Doji: open and close nearly equal within the bar's range. Indecision is
/// flagged with a positive strength; a zero-range bar is a perfect doji.
pub fn doji(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> ValueSeries {
    recognize(open, high, low, close, 1, |w| {
        let bar = w[0];
        let range = bar.range();
        if range == 0.0 {
            return 100.0;
        }
        let ratio = bar.body() / range;
        if ratio <= DOJI_BODY_FRACTION {
            100.0 * (1.0 - ratio / DOJI_BODY_FRACTION)
        } else {
            0.0
        }
    })
}

/// Hammer: after a bearish bar, a small body at the top of the range with
/// a lower shadow at least twice the body. Strength is the lower shadow's
/// share of the full range.
pub fn hammer(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> ValueSeries {
    recognize(open, high, low, close, 2, |w| {
        let (prev, bar) = (w[0], w[1]);
        let range = bar.range();
        if range == 0.0 || !prev.is_bearish() {
            return 0.0;
        }
        let body = bar.body();
        if bar.lower_shadow() >= 2.0 * body && bar.upper_shadow() <= body {
            100.0 * bar.lower_shadow() / range
        } else {
            0.0
        }
    })
}

/// Shooting star: the hammer mirrored. After a bullish bar, a small body
/// at the bottom of the range with a long upper shadow. Bearish.
pub fn shooting_star(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> ValueSeries {
    recognize(open, high, low, close, 2, |w| {
        let (prev, bar) = (w[0], w[1]);
        let range = bar.range();
        if range == 0.0 || !prev.is_bullish() {
            return 0.0;
        }
        let body = bar.body();
        if bar.upper_shadow() >= 2.0 * body && bar.lower_shadow() <= body {
            -100.0 * bar.upper_shadow() / range
        } else {
            0.0
        }
    })
}

/// Engulfing: the current body strictly contains the prior body with the
/// opposite color. Signed by the engulfing bar's direction; strength grows
/// with the size ratio of the two bodies, saturating at 100 when the
/// engulfing body is at least twice the engulfed one.
pub fn engulfing(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> ValueSeries {
    recognize(open, high, low, close, 2, |w| {
        let (prev, bar) = (w[0], w[1]);
        let opposite = (bar.is_bullish() && prev.is_bearish())
            || (bar.is_bearish() && prev.is_bullish());
        let engulfs =
            bar.body_top() > prev.body_top() && bar.body_bottom() < prev.body_bottom();
        if !(opposite && engulfs) {
            return 0.0;
        }
        let prev_body = prev.body();
        let confidence = if prev_body == 0.0 {
            1.0
        } else {
            (bar.body() / (2.0 * prev_body)).min(1.0)
        };
        let sign = if bar.is_bullish() { 1.0 } else { -1.0 };
        sign * 100.0 * confidence
    })
}

/// Harami: the current body strictly inside the prior body with the
/// opposite color. The smaller the inside body relative to the prior one,
/// the stronger the signal.
pub fn harami(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> ValueSeries {
    recognize(open, high, low, close, 2, |w| {
        let (prev, bar) = (w[0], w[1]);
        let opposite = (bar.is_bullish() && prev.is_bearish())
            || (bar.is_bearish() && prev.is_bullish());
        let inside =
            bar.body_top() < prev.body_top() && bar.body_bottom() > prev.body_bottom();
        if !(opposite && inside) {
            return 0.0;
        }
        // Strict containment implies prev.body() > 0.
        let confidence = 1.0 - bar.body() / prev.body();
        let sign = if bar.is_bullish() { 1.0 } else { -1.0 };
        sign * 100.0 * confidence
    })
}

/// Morning star: a long bearish bar, a small-bodied middle bar, then a
/// bullish bar closing at least `penetration` of the way back up the first
/// body. Strength is the fraction of the first body recovered.
pub fn morning_star(
    open: &[f64],
    high: &[f64],
    low: &[f64],
    close: &[f64],
    penetration: f64,
) -> ValueSeries {
    recognize(open, high, low, close, 3, |w| {
        let (first, middle, last) = (w[0], w[1], w[2]);
        let body1 = first.body();
        if body1 == 0.0 || !first.is_bearish() || !last.is_bullish() {
            return 0.0;
        }
        if middle.body() > STAR_MIDDLE_FRACTION * body1 {
            return 0.0;
        }
        let recovered = (last.close - first.close) / body1;
        if recovered >= penetration {
            100.0 * recovered.min(1.0)
        } else {
            0.0
        }
    })
}

/// Evening star: the morning star mirrored. A long bullish bar, a small
/// middle bar, then a bearish bar giving back at least `penetration` of
/// the first body. Bearish.
pub fn evening_star(
    open: &[f64],
    high: &[f64],
    low: &[f64],
    close: &[f64],
    penetration: f64,
) -> ValueSeries {
    recognize(open, high, low, close, 3, |w| {
        let (first, middle, last) = (w[0], w[1], w[2]);
        let body1 = first.body();
        if body1 == 0.0 || !first.is_bullish() || !last.is_bearish() {
            return 0.0;
        }
        if middle.body() > STAR_MIDDLE_FRACTION * body1 {
            return 0.0;
        }
        let surrendered = (first.close - last.close) / body1;
        if surrendered >= penetration {
            -100.0 * surrendered.min(1.0)
        } else {
            0.0
        }
    })
}
