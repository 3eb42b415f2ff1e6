//! Indicator math shared by the technical evaluators.
//!
//! All functions take close series oldest first and return `None` (or an
//! empty series) when history is too short, which callers treat as an
//! abstention.

/// Simple moving average of the last `period` values.
#[must_use]
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let tail = &values[values.len() - period..];
    Some(tail.iter().sum::<f64>() / period as f64)
}

/// Sample standard deviation of the last `period` values.
#[must_use]
pub fn stddev(values: &[f64], period: usize) -> Option<f64> {
    if period < 2 || values.len() < period {
        return None;
    }
    let tail = &values[values.len() - period..];
    let mean = tail.iter().sum::<f64>() / period as f64;
    let variance = tail.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (period as f64 - 1.0);
    Some(variance.sqrt())
}

/// Exponential moving average series seeded with the SMA of the first
/// `period` values. Output index `i` corresponds to input index
/// `period - 1 + i`.
#[must_use]
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;
    let mut out = Vec::with_capacity(values.len() - period + 1);
    out.push(seed);
    let mut prev = seed;
    for v in &values[period..] {
        prev = alpha * v + (1.0 - alpha) * prev;
        out.push(prev);
    }
    out
}

/// Wilder-smoothed relative strength index over the full series.
///
/// Needs at least `period + 1` values. A flat series resolves to 50.
#[must_use]
pub fn rsi(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period + 1 {
        return None;
    }
    let mut gains = 0.0;
    let mut losses = 0.0;
    for w in values[..=period].windows(2) {
        let d = w[1] - w[0];
        if d > 0.0 {
            gains += d;
        } else {
            losses -= d;
        }
    }
    let mut avg_gain = gains / period as f64;
    let mut avg_loss = losses / period as f64;
    for w in values[period..].windows(2) {
        let d = w[1] - w[0];
        let (g, l) = if d > 0.0 { (d, 0.0) } else { (0.0, -d) };
        avg_gain = (avg_gain * (period as f64 - 1.0) + g) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + l) / period as f64;
    }
    if avg_loss == 0.0 && avg_gain == 0.0 {
        return Some(50.0);
    }
    if avg_loss == 0.0 {
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// One bar of MACD output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD series: fast EMA minus slow EMA, with a signal EMA over the
/// difference. Returns one point per bar for which the signal line exists.
#[must_use]
pub fn macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> Vec<MacdPoint> {
    if fast == 0 || fast >= slow || signal == 0 {
        return Vec::new();
    }
    let fast_ema = ema_series(values, fast);
    let slow_ema = ema_series(values, slow);
    if slow_ema.is_empty() {
        return Vec::new();
    }
    let offset = fast_ema.len() - slow_ema.len();
    let line: Vec<f64> = slow_ema
        .iter()
        .zip(&fast_ema[offset..])
        .map(|(s, f)| f - s)
        .collect();
    let sig = ema_series(&line, signal);
    if sig.is_empty() {
        return Vec::new();
    }
    let off = line.len() - sig.len();
    sig.iter()
        .zip(&line[off..])
        .map(|(s, m)| MacdPoint {
            macd: *m,
            signal: *s,
            histogram: m - s,
        })
        .collect()
}

/// One bar of Bollinger band output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBand {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBand {
    /// Position of `close` within the band, 0 at the lower band and 1 at
    /// the upper. None when the band has zero width.
    #[must_use]
    pub fn percent_b(&self, close: f64) -> Option<f64> {
        let width = self.upper - self.lower;
        if width <= 0.0 {
            return None;
        }
        Some((close - self.lower) / width)
    }

    /// Band width relative to the middle band.
    #[must_use]
    pub fn bandwidth(&self) -> f64 {
        if self.middle == 0.0 {
            return 0.0;
        }
        (self.upper - self.lower) / self.middle
    }
}

/// Bollinger bands over the last `period` values with `k` standard
/// deviations.
#[must_use]
pub fn bollinger(values: &[f64], period: usize, k: f64) -> Option<BollingerBand> {
    let middle = sma(values, period)?;
    let sigma = stddev(values, period)?;
    Some(BollingerBand {
        upper: middle + k * sigma,
        middle,
        lower: middle - k * sigma,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_uses_trailing_window() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(sma(&values, 3), Some(4.0));
        assert_eq!(sma(&values, 5), Some(3.0));
        assert_eq!(sma(&values, 6), None);
    }

    #[test]
    fn stddev_is_sample_not_population() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        // Sample variance 4.571..., sqrt ~ 2.138
        let sd = stddev(&values, 8).unwrap();
        assert!((sd - 2.138).abs() < 0.001);
    }

    #[test]
    fn ema_series_aligns_to_tail() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let ema = ema_series(&values, 3);
        assert_eq!(ema.len(), 8);
        // Seed is the SMA of the first three values.
        assert_eq!(ema[0], 2.0);
        // EMA of a rising series tracks below the last value.
        assert!(*ema.last().unwrap() < 10.0);
        assert!(*ema.last().unwrap() > 8.0);
    }

    #[test]
    fn rsi_extremes() {
        let rising: Vec<f64> = (1..=20).map(f64::from).collect();
        assert_eq!(rsi(&rising, 14), Some(100.0));

        let falling: Vec<f64> = (1..=20).rev().map(f64::from).collect();
        assert_eq!(rsi(&falling, 14), Some(0.0));

        let flat = vec![5.0; 20];
        assert_eq!(rsi(&flat, 14), Some(50.0));
    }

    #[test]
    fn rsi_needs_period_plus_one_values() {
        let values = vec![1.0; 14];
        assert_eq!(rsi(&values, 14), None);
    }

    #[test]
    fn macd_positive_in_uptrend() {
        let values: Vec<f64> = (0..60).map(|i| 100.0 + f64::from(i) * 0.5).collect();
        let pts = macd(&values, 12, 26, 9);
        assert!(!pts.is_empty());
        let last = pts.last().unwrap();
        // Fast EMA leads slow EMA in a steady uptrend.
        assert!(last.macd > 0.0);
        assert!((last.histogram - (last.macd - last.signal)).abs() < 1e-12);
    }

    #[test]
    fn macd_empty_when_history_short() {
        let values = vec![100.0; 30];
        assert!(macd(&values, 12, 26, 9).is_empty());
    }

    #[test]
    fn bollinger_brackets_the_mean() {
        let values: Vec<f64> = (0..20).map(|i| 100.0 + f64::from(i % 4)).collect();
        let band = bollinger(&values, 20, 2.0).unwrap();
        assert!(band.lower < band.middle);
        assert!(band.middle < band.upper);
        let pb = band.percent_b(band.middle).unwrap();
        assert!((pb - 0.5).abs() < 1e-12);
    }

    #[test]
    fn bollinger_zero_width_percent_b_is_none() {
        let values = vec![100.0; 20];
        let band = bollinger(&values, 20, 2.0).unwrap();
        assert_eq!(band.percent_b(100.0), None);
    }
}
