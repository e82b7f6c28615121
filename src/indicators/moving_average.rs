use serde::{Deserialize, Serialize};

use super::{mean, require, require_period, IndicatorResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaType {
    #[default]
    Sma,
    Ema,
}

/// Which way the fast average has to cross the slow one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossDirection {
    /// Fast crosses above slow (golden cross)
    #[default]
    Bullish,
    /// Fast crosses below slow (death cross)
    Bearish,
}

/// Simple moving average of the last `period` values.
pub fn sma(values: &[f64], period: usize) -> IndicatorResult<f64> {
    require_period("sma", period)?;
    require("sma", period, values.len())?;
    Ok(mean(&values[values.len() - period..]))
}

/// EMA series seeded with the SMA of the first `period` values.
///
/// Element `i` of the result is the EMA after `values[period - 1 + i]`.
pub fn ema_series(values: &[f64], period: usize) -> IndicatorResult<Vec<f64>> {
    require_period("ema", period)?;
    require("ema", period, values.len())?;

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len() - period + 1);
    let mut current = mean(&values[..period]);
    out.push(current);
    for v in &values[period..] {
        current = v * k + current * (1.0 - k);
        out.push(current);
    }
    Ok(out)
}

pub fn ema(values: &[f64], period: usize) -> IndicatorResult<f64> {
    let series = ema_series(values, period)?;
    // ema_series always yields at least the seed
    Ok(series.last().copied().unwrap_or_default())
}

pub fn moving_average(values: &[f64], period: usize, ma_type: MaType) -> IndicatorResult<f64> {
    match ma_type {
        MaType::Sma => sma(values, period),
        MaType::Ema => ema(values, period),
    }
}

/// True only on the bar where the relation flips: fast vs slow is on the
/// requested side now and was not one bar earlier.
pub fn moving_average_cross(
    values: &[f64],
    fast: usize,
    slow: usize,
    ma_type: MaType,
    direction: CrossDirection,
) -> IndicatorResult<bool> {
    require("moving_average_cross", slow.max(fast) + 1, values.len())?;

    let now_fast = moving_average(values, fast, ma_type)?;
    let now_slow = moving_average(values, slow, ma_type)?;
    let prior = &values[..values.len() - 1];
    let prev_fast = moving_average(prior, fast, ma_type)?;
    let prev_slow = moving_average(prior, slow, ma_type)?;

    Ok(is_cross(prev_fast, prev_slow, now_fast, now_slow, direction))
}

pub(crate) fn is_cross(prev_fast: f64, prev_slow: f64, now_fast: f64, now_slow: f64, direction: CrossDirection) -> bool {
    match direction {
        CrossDirection::Bullish => now_fast > now_slow && prev_fast <= prev_slow,
        CrossDirection::Bearish => now_fast < now_slow && prev_fast >= prev_slow,
    }
}
