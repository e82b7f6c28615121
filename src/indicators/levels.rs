use super::{require, require_period, IndicatorResult};
use crate::constants::indicators::WEEK_52_BARS;
use crate::data::PriceBar;

fn trailing(bars: &[PriceBar], n: usize) -> &[PriceBar] {
    &bars[bars.len().saturating_sub(n)..]
}

/// Highest high over the trailing 252 bars, or every bar if fewer.
pub fn week_52_high(bars: &[PriceBar]) -> IndicatorResult<f64> {
    require("week_52_high", 1, bars.len())?;
    Ok(trailing(bars, WEEK_52_BARS).iter().map(|b| b.high).fold(f64::MIN, f64::max))
}

/// Lowest low over the trailing 252 bars, or every bar if fewer.
pub fn week_52_low(bars: &[PriceBar]) -> IndicatorResult<f64> {
    require("week_52_low", 1, bars.len())?;
    Ok(trailing(bars, WEEK_52_BARS).iter().map(|b| b.low).fold(f64::MAX, f64::min))
}

pub fn resistance_level(bars: &[PriceBar], lookback: usize) -> IndicatorResult<f64> {
    require_period("resistance", lookback)?;
    require("resistance", lookback, bars.len())?;
    Ok(trailing(bars, lookback).iter().map(|b| b.high).fold(f64::MIN, f64::max))
}

pub fn support_level(bars: &[PriceBar], lookback: usize) -> IndicatorResult<f64> {
    require_period("support", lookback)?;
    require("support", lookback, bars.len())?;
    Ok(trailing(bars, lookback).iter().map(|b| b.low).fold(f64::MAX, f64::min))
}

/// Tight range followed by a push through the top of it.
///
/// The range of the last `period` bars, `(high - low) / low`, must be at most
/// `range_threshold`, and `price` must exceed the period high by at least
/// `breakout_margin` (a fraction of the high).
pub fn consolidation_breakout(
    bars: &[PriceBar],
    price: f64,
    period: usize,
    range_threshold: f64,
    breakout_margin: f64,
) -> IndicatorResult<bool> {
    require_period("consolidation_breakout", period)?;
    require("consolidation_breakout", period, bars.len())?;

    let window = trailing(bars, period);
    let high = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let low = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    if low <= 0.0 {
        return Ok(false);
    }

    let range = (high - low) / low;
    let tight = range <= range_threshold;
    let broke_out = price > high && price >= high * (1.0 + breakout_margin);
    Ok(tight && broke_out)
}
