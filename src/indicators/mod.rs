//! Technical indicator library
//!
//! Pure functions over close/volume slices or bar slices. Every function
//! checks its minimum history up front and returns
//! `IndicatorError::InsufficientHistory` instead of a partial value.

pub mod levels;
pub mod momentum;
pub mod moving_average;
pub mod rolling;
pub mod volatility;
pub mod volume;

#[cfg(test)]
mod indicators_tests;

pub use levels::{consolidation_breakout, resistance_level, support_level, week_52_high, week_52_low};
pub use momentum::{macd, macd_series, rsi, Macd};
pub use moving_average::{ema, ema_series, moving_average, moving_average_cross, sma, CrossDirection, MaType};
pub use rolling::{RollingEma, RollingMa, RollingSma};
pub use volatility::{atr, bollinger, population_std_dev, supertrend, Bands, Supertrend, TrendDirection};
pub use volume::{average_volume, max_volume, volume_spike, vwap};

use crate::error::IndicatorError;

pub type IndicatorResult<T> = Result<T, IndicatorError>;

pub(crate) fn require(indicator: &'static str, required: usize, available: usize) -> IndicatorResult<()> {
    if available < required {
        return Err(IndicatorError::insufficient(indicator, required, available));
    }
    Ok(())
}

pub(crate) fn require_period(indicator: &'static str, period: usize) -> IndicatorResult<()> {
    if period == 0 {
        return Err(IndicatorError::InvalidParameter {
            indicator,
            reason: "period must be > 0".to_string(),
        });
    }
    Ok(())
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
