use super::{mean, require, require_period, IndicatorResult};
use crate::data::PriceBar;
use crate::error::IndicatorError;

/// Mean of the last `lookback` volumes.
pub fn average_volume(volumes: &[f64], lookback: usize) -> IndicatorResult<f64> {
    require_period("average_volume", lookback)?;
    require("average_volume", lookback, volumes.len())?;
    Ok(mean(&volumes[volumes.len() - lookback..]))
}

/// Max of the last `lookback` volumes.
pub fn max_volume(volumes: &[f64], lookback: usize) -> IndicatorResult<f64> {
    require_period("max_volume", lookback)?;
    require("max_volume", lookback, volumes.len())?;
    Ok(volumes[volumes.len() - lookback..]
        .iter()
        .copied()
        .fold(f64::MIN, f64::max))
}

/// `current > multiplier * mean(trailing[-lookback..])`. `trailing` must not
/// contain the current volume.
pub fn volume_spike(current: f64, trailing: &[f64], multiplier: f64, lookback: usize) -> IndicatorResult<bool> {
    let avg = average_volume(trailing, lookback)?;
    Ok(current > multiplier * avg)
}

/// Volume-weighted typical price `(high + low + close) / 3` over the last
/// `lookback` bars. A window without traded volume has no VWAP yet.
pub fn vwap(bars: &[PriceBar], lookback: usize) -> IndicatorResult<f64> {
    require_period("vwap", lookback)?;
    require("vwap", lookback, bars.len())?;

    let (weighted, volume) = bars[bars.len() - lookback..]
        .iter()
        .fold((0.0, 0.0), |(pv, v), b| (pv + (b.high + b.low + b.close) / 3.0 * b.volume, v + b.volume));
    if volume <= 0.0 {
        return Err(IndicatorError::insufficient("vwap", 1, 0));
    }
    Ok(weighted / volume)
}
