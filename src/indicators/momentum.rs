use serde::{Deserialize, Serialize};

use super::moving_average::ema_series;
use super::{require, require_period, IndicatorResult};

/// Wilder RSI over `period` price changes. Needs `period + 1` values.
///
/// A window with zero average loss reports 100.
pub fn rsi(values: &[f64], period: usize) -> IndicatorResult<f64> {
    require_period("rsi", period)?;
    require("rsi", period + 1, values.len())?;

    let p = period as f64;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for w in values[..=period].windows(2) {
        let delta = w[1] - w[0];
        if delta > 0.0 {
            avg_gain += delta;
        } else {
            avg_loss -= delta;
        }
    }
    avg_gain /= p;
    avg_loss /= p;

    for w in values[period..].windows(2) {
        let delta = w[1] - w[0];
        let (gain, loss) = if delta > 0.0 { (delta, 0.0) } else { (0.0, -delta) };
        avg_gain = (avg_gain * (p - 1.0) + gain) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss) / p;
    }

    if avg_loss == 0.0 {
        return Ok(100.0);
    }
    let rs = avg_gain / avg_loss;
    Ok((100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0))
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Macd {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD line, signal and histogram for every bar where all three exist.
/// Needs `max(fast, slow) + signal - 1` values.
pub fn macd_series(values: &[f64], fast: usize, slow: usize, signal: usize) -> IndicatorResult<Vec<Macd>> {
    require_period("macd", fast)?;
    require_period("macd", signal)?;
    let long = slow.max(fast);
    require_period("macd", long)?;
    require("macd", long + signal - 1, values.len())?;

    let fast_ema = ema_series(values, fast)?;
    let slow_ema = ema_series(values, slow)?;

    // Align both series on the last value
    let n = fast_ema.len().min(slow_ema.len());
    let line: Vec<f64> = fast_ema[fast_ema.len() - n..]
        .iter()
        .zip(&slow_ema[slow_ema.len() - n..])
        .map(|(f, s)| f - s)
        .collect();

    let signal_line = ema_series(&line, signal)?;
    let offset = line.len() - signal_line.len();
    Ok(signal_line
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let m = line[offset + i];
            Macd {
                macd: m,
                signal: *s,
                histogram: m - s,
            }
        })
        .collect())
}

pub fn macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> IndicatorResult<Macd> {
    let series = macd_series(values, fast, slow, signal)?;
    series
        .last()
        .copied()
        .ok_or_else(|| crate::error::IndicatorError::insufficient("macd", slow.max(fast) + signal - 1, values.len()))
}
