//! Structured condition schema shared with the translation collaborator.
//!
//! Each condition is a JSON object tagged by `type`; parameters carry the
//! defaults the collaborator is allowed to omit.

use serde::{Deserialize, Serialize};

use crate::constants::schema::*;
use crate::indicators::{CrossDirection, MaType, TrendDirection};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    #[serde(alias = "gt", alias = ">")]
    Above,
    #[serde(alias = "lt", alias = "<")]
    Below,
}

impl Comparison {
    /// Strict on both sides: equality never passes.
    pub fn holds(self, actual: f64, threshold: f64) -> bool {
        match self {
            Comparison::Above => actual > threshold,
            Comparison::Below => actual < threshold,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Comparison::Above => "above",
            Comparison::Below => "below",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeMode {
    Average,
    Max,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdSignal {
    BullishCrossover,
    BearishCrossover,
    AboveZero,
    BelowZero,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Upper,
    Lower,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelKind {
    Support,
    Resistance,
}

fn one() -> usize {
    1
}
fn volume_lookback() -> usize {
    DEFAULT_VOLUME_LOOKBACK
}
fn rsi_period() -> usize {
    DEFAULT_RSI_PERIOD
}
fn macd_fast() -> usize {
    DEFAULT_MACD_FAST
}
fn macd_slow() -> usize {
    DEFAULT_MACD_SLOW
}
fn macd_signal() -> usize {
    DEFAULT_MACD_SIGNAL
}
fn ma_fast() -> usize {
    DEFAULT_MA_FAST
}
fn ma_slow() -> usize {
    DEFAULT_MA_SLOW
}
fn pattern_period() -> usize {
    DEFAULT_PATTERN_PERIOD
}
fn range_threshold() -> f64 {
    DEFAULT_RANGE_THRESHOLD
}
fn spike_multiplier() -> f64 {
    DEFAULT_SPIKE_MULTIPLIER
}
fn bollinger_std_dev() -> f64 {
    DEFAULT_BOLLINGER_STD_DEV
}
fn supertrend_period() -> usize {
    DEFAULT_SUPERTREND_PERIOD
}
fn supertrend_multiplier() -> f64 {
    DEFAULT_SUPERTREND_MULTIPLIER
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pattern {
    ConsolidationBreakout {
        #[serde(default = "pattern_period")]
        period: usize,
        #[serde(default = "range_threshold")]
        range_threshold: f64,
        #[serde(default)]
        breakout_margin: f64,
    },
    #[serde(rename = "week_52_high", alias = "52_week_high")]
    Week52High,
    #[serde(rename = "week_52_low", alias = "52_week_low")]
    Week52Low,
    VolumeSpike {
        #[serde(default = "spike_multiplier")]
        multiplier: f64,
        #[serde(default = "volume_lookback")]
        lookback_period: usize,
    },
    BollingerBreakout {
        #[serde(default = "pattern_period")]
        period: usize,
        #[serde(default = "bollinger_std_dev")]
        std_dev: f64,
        band: Band,
    },
    /// Live trend of the Supertrend indicator is `direction`
    Supertrend {
        #[serde(default = "supertrend_period")]
        period: usize,
        #[serde(default = "supertrend_multiplier")]
        multiplier: f64,
        direction: TrendDirection,
    },
    /// Price above/below the VWAP of the trailing bars
    #[serde(alias = "vwap_cross")]
    Vwap {
        operator: Comparison,
        #[serde(default = "volume_lookback")]
        lookback_period: usize,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    PriceCross {
        operator: Comparison,
        value: f64,
    },
    DailyClose {
        operator: Comparison,
        value: f64,
        #[serde(default = "one")]
        consecutive_days: usize,
    },
    VolumeComparison {
        comparison: VolumeMode,
        #[serde(default = "volume_lookback")]
        lookback_period: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        multiplier: Option<f64>,
    },
    Rsi {
        operator: Comparison,
        value: f64,
        #[serde(default = "rsi_period")]
        period: usize,
    },
    Macd {
        #[serde(default = "macd_fast")]
        fast_period: usize,
        #[serde(default = "macd_slow")]
        slow_period: usize,
        #[serde(default = "macd_signal")]
        signal_period: usize,
        signal: MacdSignal,
    },
    MovingAverageCross {
        #[serde(default = "ma_fast")]
        fast_period: usize,
        #[serde(default = "ma_slow")]
        slow_period: usize,
        #[serde(default)]
        ma_type: MaType,
        #[serde(default)]
        direction: CrossDirection,
    },
    Pattern {
        pattern: Pattern,
    },
    SupportResistance {
        level: LevelKind,
        #[serde(default = "volume_lookback")]
        lookback_period: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<f64>,
    },
}

impl Condition {
    pub fn kind(&self) -> &'static str {
        match self {
            Condition::PriceCross { .. } => "price_cross",
            Condition::DailyClose { .. } => "daily_close",
            Condition::VolumeComparison { .. } => "volume_comparison",
            Condition::Rsi { .. } => "rsi",
            Condition::Macd { .. } => "macd",
            Condition::MovingAverageCross { .. } => "moving_average_cross",
            Condition::Pattern { .. } => "pattern",
            Condition::SupportResistance { .. } => "support_resistance",
        }
    }

    /// Parameter checks beyond what the schema types enforce.
    pub fn validate(&self) -> Result<(), String> {
        fn positive(name: &str, v: usize) -> Result<(), String> {
            if v == 0 {
                return Err(format!("{} must be > 0", name));
            }
            Ok(())
        }
        fn finite(name: &str, v: f64) -> Result<(), String> {
            if !v.is_finite() {
                return Err(format!("{} must be a finite number", name));
            }
            Ok(())
        }

        match self {
            Condition::PriceCross { value, .. } => finite("value", *value),
            Condition::DailyClose {
                value,
                consecutive_days,
                ..
            } => {
                finite("value", *value)?;
                positive("consecutive_days", *consecutive_days)?;
                if *consecutive_days > MAX_STREAK_DAYS {
                    return Err(format!("consecutive_days must be <= {}", MAX_STREAK_DAYS));
                }
                Ok(())
            }
            Condition::VolumeComparison {
                comparison,
                lookback_period,
                multiplier,
            } => {
                positive("lookback_period", *lookback_period)?;
                match (comparison, multiplier) {
                    (VolumeMode::Max, Some(_)) => {
                        Err("multiplier is not allowed when comparison is 'max'".to_string())
                    }
                    (VolumeMode::Average, Some(m)) if !(m.is_finite() && *m > 0.0) => {
                        Err("multiplier must be > 0".to_string())
                    }
                    _ => Ok(()),
                }
            }
            Condition::Rsi { value, period, .. } => {
                positive("period", *period)?;
                if !(0.0..=100.0).contains(value) {
                    return Err("rsi value must be within 0..=100".to_string());
                }
                Ok(())
            }
            Condition::Macd {
                fast_period,
                slow_period,
                signal_period,
                ..
            } => {
                positive("fast_period", *fast_period)?;
                positive("signal_period", *signal_period)?;
                if fast_period >= slow_period {
                    return Err("fast_period must be < slow_period".to_string());
                }
                Ok(())
            }
            Condition::MovingAverageCross {
                fast_period,
                slow_period,
                ..
            } => {
                positive("fast_period", *fast_period)?;
                if fast_period >= slow_period {
                    return Err("fast_period must be < slow_period".to_string());
                }
                Ok(())
            }
            Condition::Pattern { pattern } => match pattern {
                Pattern::ConsolidationBreakout {
                    period,
                    range_threshold,
                    breakout_margin,
                } => {
                    positive("period", *period)?;
                    if !(*range_threshold >= 0.0 && *breakout_margin >= 0.0) {
                        return Err("range_threshold and breakout_margin must be >= 0".to_string());
                    }
                    Ok(())
                }
                Pattern::VolumeSpike {
                    multiplier,
                    lookback_period,
                } => {
                    positive("lookback_period", *lookback_period)?;
                    if !(multiplier.is_finite() && *multiplier > 0.0) {
                        return Err("multiplier must be > 0".to_string());
                    }
                    Ok(())
                }
                Pattern::BollingerBreakout { period, std_dev, .. } => {
                    positive("period", *period)?;
                    if !(std_dev.is_finite() && *std_dev > 0.0) {
                        return Err("std_dev must be > 0".to_string());
                    }
                    Ok(())
                }
                Pattern::Supertrend {
                    period,
                    multiplier,
                    direction,
                } => {
                    positive("period", *period)?;
                    if !(multiplier.is_finite() && *multiplier > 0.0) {
                        return Err("multiplier must be > 0".to_string());
                    }
                    if *direction == TrendDirection::Neutral {
                        return Err("supertrend direction must be 'buy' or 'sell'".to_string());
                    }
                    Ok(())
                }
                Pattern::Vwap { lookback_period, .. } => positive("lookback_period", *lookback_period),
                Pattern::Week52High | Pattern::Week52Low => Ok(()),
            },
            Condition::SupportResistance {
                lookback_period,
                value,
                ..
            } => {
                positive("lookback_period", *lookback_period)?;
                if let Some(v) = value {
                    finite("value", *v)?;
                }
                Ok(())
            }
        }
    }
}
