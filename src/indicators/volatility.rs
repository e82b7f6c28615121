use serde::{Deserialize, Serialize};

use super::{mean, require, require_period, IndicatorResult};
use crate::error::IndicatorError;
use crate::data::PriceBar;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Bollinger bands: SMA(period) +/- k * population stddev over the same window.
pub fn bollinger(values: &[f64], period: usize, k: f64) -> IndicatorResult<Bands> {
    require_period("bollinger", period)?;
    require("bollinger", period, values.len())?;

    let window = &values[values.len() - period..];
    let middle = mean(window);
    let sd = population_std_dev(window);
    Ok(Bands {
        upper: middle + k * sd,
        middle,
        lower: middle - k * sd,
    })
}

fn true_range(bar: &PriceBar, prev_close: f64) -> f64 {
    (bar.high - bar.low)
        .max((bar.high - prev_close).abs())
        .max((bar.low - prev_close).abs())
}

/// Wilder-smoothed ATR. Needs `period + 1` bars (each TR uses the prior close).
pub fn atr(bars: &[PriceBar], period: usize) -> IndicatorResult<f64> {
    require_period("atr", period)?;
    require("atr", period + 1, bars.len())?;

    let ranges: Vec<f64> = bars.windows(2).map(|w| true_range(&w[1], w[0].close)).collect();
    let p = period as f64;
    let mut value = mean(&ranges[..period]);
    for tr in &ranges[period..] {
        value = (value * (p - 1.0) + tr) / p;
    }
    Ok(value)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Buy,
    Sell,
    /// Price has not yet closed outside the bands
    #[default]
    Neutral,
}

/// Final Supertrend bands and the trend they imply on the last bar.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Supertrend {
    pub upper: f64,
    pub lower: f64,
    pub direction: TrendDirection,
}

/// Supertrend over `bars` (last bar = the one being judged).
///
/// Basic bands are `(high + low) / 2 +/- multiplier * ATR(period)` with Wilder
/// smoothing. The final upper band only moves down and the final lower band
/// only moves up, unless the previous close broke through them. The trend
/// turns up on a close above the final upper band and down on a close below
/// the final lower band. Needs `period + 1` bars.
pub fn supertrend(bars: &[PriceBar], period: usize, multiplier: f64) -> IndicatorResult<Supertrend> {
    require_period("supertrend", period)?;
    require("supertrend", period + 1, bars.len())?;

    let ranges: Vec<f64> = bars.windows(2).map(|w| true_range(&w[1], w[0].close)).collect();
    let p = period as f64;
    let mut atr = mean(&ranges[..period]);
    let mut state: Option<Supertrend> = None;

    for i in period..bars.len() {
        if i > period {
            atr = (atr * (p - 1.0) + ranges[i - 1]) / p;
        }
        let bar = &bars[i];
        let hl2 = (bar.high + bar.low) / 2.0;
        let basic_upper = hl2 + multiplier * atr;
        let basic_lower = hl2 - multiplier * atr;

        let next = match state {
            None => Supertrend {
                upper: basic_upper,
                lower: basic_lower,
                direction: if bar.close > basic_upper {
                    TrendDirection::Buy
                } else if bar.close < basic_lower {
                    TrendDirection::Sell
                } else {
                    TrendDirection::Neutral
                },
            },
            Some(prev) => {
                let prev_close = bars[i - 1].close;
                let upper = if basic_upper < prev.upper || prev_close > prev.upper {
                    basic_upper
                } else {
                    prev.upper
                };
                let lower = if basic_lower > prev.lower || prev_close < prev.lower {
                    basic_lower
                } else {
                    prev.lower
                };
                let direction = match prev.direction {
                    TrendDirection::Buy if bar.close < lower => TrendDirection::Sell,
                    TrendDirection::Sell if bar.close > upper => TrendDirection::Buy,
                    TrendDirection::Neutral if bar.close > upper => TrendDirection::Buy,
                    TrendDirection::Neutral if bar.close < lower => TrendDirection::Sell,
                    unchanged => unchanged,
                };
                Supertrend { upper, lower, direction }
            }
        };
        state = Some(next);
    }

    state.ok_or_else(|| IndicatorError::insufficient("supertrend", period + 1, bars.len()))
}
