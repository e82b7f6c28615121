use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::condition::{Condition, LevelKind, Pattern};
use super::config::AlertConfiguration;
use super::evaluator::MarketFrame;
use crate::constants::indicators::{CONTEXT_ATR_PERIOD, CONTEXT_VOLUME_LOOKBACK};
use crate::indicators::{self, IndicatorResult, MaType};

/// Point-in-time indicator values handed to the explanation collaborator.
/// Values that could not be computed are simply absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorContext {
    pub values: BTreeMap<String, f64>,
}

impl IndicatorContext {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    fn put(&mut self, key: impl Into<String>, value: IndicatorResult<f64>) {
        if let Ok(v) = value {
            if v.is_finite() {
                self.values.insert(key.into(), v);
            }
        }
    }
}

fn ma_label(ma_type: MaType) -> &'static str {
    match ma_type {
        MaType::Sma => "sma",
        MaType::Ema => "ema",
    }
}

pub fn build_context(config: &AlertConfiguration, frame: &MarketFrame<'_>) -> IndicatorContext {
    let mut ctx = IndicatorContext::default();
    let tick = frame.tick;

    ctx.put("last_price", Ok(tick.last_price));
    ctx.put("volume", Ok(tick.volume));
    ctx.put("week_52_high", indicators::week_52_high(frame.prior));
    ctx.put("week_52_low", indicators::week_52_low(frame.prior));
    ctx.put(
        "avg_volume_20",
        indicators::average_volume(&frame.prior_volumes, CONTEXT_VOLUME_LOOKBACK),
    );
    let mut bars = frame.prior.to_vec();
    bars.push(tick.as_bar());
    ctx.put("atr_14", indicators::atr(&bars, CONTEXT_ATR_PERIOD));
    if let Some(prev) = frame.prior.last() {
        ctx.put("prev_close", Ok(prev.close));
        if prev.close > 0.0 {
            ctx.put("change_pct", Ok((tick.last_price - prev.close) / prev.close * 100.0));
        }
    }

    for condition in &config.conditions {
        add_condition_values(&mut ctx, condition, frame);
    }
    ctx
}

fn add_condition_values(ctx: &mut IndicatorContext, condition: &Condition, frame: &MarketFrame<'_>) {
    let closes = &frame.closes;
    match condition {
        Condition::PriceCross { .. } => {}
        Condition::DailyClose { .. } => {
            ctx.put("close_so_far", Ok(frame.tick.close_so_far()));
        }
        Condition::VolumeComparison { lookback_period, .. } => {
            ctx.put(
                format!("avg_volume_{}", lookback_period),
                indicators::average_volume(&frame.prior_volumes, *lookback_period),
            );
            ctx.put(
                format!("max_volume_{}", lookback_period),
                indicators::max_volume(&frame.prior_volumes, *lookback_period),
            );
        }
        Condition::Rsi { period, .. } => {
            ctx.put(format!("rsi_{}", period), indicators::rsi(closes, *period));
        }
        Condition::Macd {
            fast_period,
            slow_period,
            signal_period,
            ..
        } => {
            if let Ok(m) = indicators::macd(closes, *fast_period, *slow_period, *signal_period) {
                let key = format!("macd_{}_{}_{}", fast_period, slow_period, signal_period);
                ctx.put(format!("{}.line", key), Ok(m.macd));
                ctx.put(format!("{}.signal", key), Ok(m.signal));
                ctx.put(format!("{}.histogram", key), Ok(m.histogram));
            }
        }
        Condition::MovingAverageCross {
            fast_period,
            slow_period,
            ma_type,
            ..
        } => {
            let label = ma_label(*ma_type);
            ctx.put(
                format!("{}_{}", label, fast_period),
                indicators::moving_average(closes, *fast_period, *ma_type),
            );
            ctx.put(
                format!("{}_{}", label, slow_period),
                indicators::moving_average(closes, *slow_period, *ma_type),
            );
        }
        Condition::Pattern { pattern } => match pattern {
            Pattern::ConsolidationBreakout { period, .. } => {
                ctx.put(
                    format!("range_high_{}", period),
                    indicators::resistance_level(frame.prior, *period),
                );
                ctx.put(
                    format!("range_low_{}", period),
                    indicators::support_level(frame.prior, *period),
                );
            }
            Pattern::Week52High | Pattern::Week52Low => {}
            Pattern::VolumeSpike { lookback_period, .. } => {
                ctx.put(
                    format!("avg_volume_{}", lookback_period),
                    indicators::average_volume(&frame.prior_volumes, *lookback_period),
                );
            }
            Pattern::BollingerBreakout { period, std_dev, .. } => {
                if let Ok(b) = indicators::bollinger(closes, *period, *std_dev) {
                    ctx.put(format!("bollinger_{}.upper", period), Ok(b.upper));
                    ctx.put(format!("bollinger_{}.middle", period), Ok(b.middle));
                    ctx.put(format!("bollinger_{}.lower", period), Ok(b.lower));
                }
            }
            Pattern::Supertrend { period, multiplier, .. } => {
                if let Ok(st) = indicators::supertrend(&frame.bars_with_live(), *period, *multiplier) {
                    ctx.put(format!("supertrend_{}.upper", period), Ok(st.upper));
                    ctx.put(format!("supertrend_{}.lower", period), Ok(st.lower));
                }
            }
            Pattern::Vwap { lookback_period, .. } => {
                ctx.put(
                    format!("vwap_{}", lookback_period),
                    indicators::vwap(frame.prior, *lookback_period),
                );
            }
        },
        Condition::SupportResistance {
            level,
            lookback_period,
            value,
        } => {
            let derived = match level {
                LevelKind::Support => indicators::support_level(frame.prior, *lookback_period),
                LevelKind::Resistance => indicators::resistance_level(frame.prior, *lookback_period),
            };
            let name = match level {
                LevelKind::Support => "support",
                LevelKind::Resistance => "resistance",
            };
            ctx.put(name, value.map(Ok).unwrap_or(derived));
        }
    }
}
