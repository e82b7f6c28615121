//! Condition evaluation against one tick plus its prior history.
//!
//! Evaluation never fails: insufficient history and out-of-window checks come
//! back as `Outcome::Undecidable` and are folded into the combinator result.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use super::condition::{Band, Condition, LevelKind, MacdSignal, Pattern, VolumeMode};
use super::config::{AlertConfiguration, Combinator};
use super::streak::StreakWindow;
use crate::data::{HistorySeries, PriceBar, SessionClock};
use crate::error::IndicatorError;
use crate::events::Tick;
use crate::indicators::{self, moving_average::is_cross, CrossDirection, MaType, RollingMa};

/// Why a condition cannot be decided yet.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Undecidable {
    InsufficientHistory {
        indicator: String,
        required: usize,
        available: usize,
    },
    OutsideCloseWindow,
    StreakIncomplete {
        required: usize,
        available: usize,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail,
    Undecidable(Undecidable),
}

impl Outcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }

    fn from_bool(b: bool) -> Self {
        if b {
            Outcome::Pass
        } else {
            Outcome::Fail
        }
    }
}

impl From<IndicatorError> for Outcome {
    fn from(err: IndicatorError) -> Self {
        match err {
            IndicatorError::InsufficientHistory {
                indicator,
                required,
                available,
            } => Outcome::Undecidable(Undecidable::InsufficientHistory {
                indicator: indicator.to_string(),
                required,
                available,
            }),
            // validated configurations never reach here
            IndicatorError::InvalidParameter { .. } => Outcome::Fail,
        }
    }
}

fn decide(result: Result<bool, IndicatorError>) -> Outcome {
    match result {
        Ok(b) => Outcome::from_bool(b),
        Err(e) => e.into(),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConditionResult {
    pub index: usize,
    pub kind: &'static str,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Read-only view of one symbol at one tick, shared by every alert on it.
pub struct MarketFrame<'a> {
    pub tick: &'a Tick,
    /// Bars from sessions before the tick's session
    pub prior: &'a [PriceBar],
    /// Prior closes followed by the tick's last price
    pub closes: Vec<f64>,
    pub prior_volumes: Vec<f64>,
    pub session_date: NaiveDate,
    pub in_close_window: bool,
}

impl<'a> MarketFrame<'a> {
    pub fn new(tick: &'a Tick, history: &'a HistorySeries, clock: &SessionClock) -> Self {
        let session_date = clock.session_date(tick.timestamp);
        let prior = history.prior_to(session_date, clock);
        let mut closes: Vec<f64> = prior.iter().map(|b| b.close).collect();
        closes.push(tick.last_price);
        let prior_volumes = prior.iter().map(|b| b.volume).collect();

        Self {
            tick,
            prior,
            closes,
            prior_volumes,
            session_date,
            in_close_window: clock.in_close_window(tick.timestamp),
        }
    }

    pub fn prior_closes(&self) -> &[f64] {
        &self.closes[..self.closes.len() - 1]
    }

    /// Prior bars followed by the live session built from the tick.
    pub fn bars_with_live(&self) -> Vec<PriceBar> {
        let mut bars = Vec::with_capacity(self.prior.len() + 1);
        bars.extend_from_slice(self.prior);
        bars.push(self.tick.as_bar());
        bars
    }
}

/// Incremental fast/slow averages over completed bars plus the crossing latch.
#[derive(Clone, Debug)]
pub struct MaCrossState {
    ma_type: MaType,
    fast_period: usize,
    slow_period: usize,
    fast: RollingMa,
    slow: RollingMa,
    synced_through: Option<DateTime<Utc>>,
    /// Prior bar of the last crossing that was reported
    latched_on: Option<DateTime<Utc>>,
    /// Prior bar of a crossing seen in the current pass, not yet reported
    candidate: Option<DateTime<Utc>>,
}

impl MaCrossState {
    pub fn new(ma_type: MaType, fast_period: usize, slow_period: usize) -> Self {
        Self {
            ma_type,
            fast_period,
            slow_period,
            fast: RollingMa::new(ma_type, fast_period),
            slow: RollingMa::new(ma_type, slow_period),
            synced_through: None,
            latched_on: None,
            candidate: None,
        }
    }

    fn reset(&mut self) {
        self.fast = RollingMa::new(self.ma_type, self.fast_period);
        self.slow = RollingMa::new(self.ma_type, self.slow_period);
        self.synced_through = None;
    }

    fn feed(&mut self, bars: &[PriceBar]) {
        for bar in bars {
            self.fast.push(bar.close);
            self.slow.push(bar.close);
            self.synced_through = Some(bar.timestamp);
        }
    }

    /// Bring the averages up to the last prior bar; appends are O(new bars),
    /// anything else rebuilds.
    fn sync(&mut self, prior: &[PriceBar]) {
        let last = prior.last().map(|b| b.timestamp);
        if last == self.synced_through {
            return;
        }
        if let Some(through) = self.synced_through {
            let idx = prior.partition_point(|b| b.timestamp <= through);
            if idx > 0 && prior[idx - 1].timestamp == through {
                self.feed(&prior[idx..]);
                return;
            }
        }
        self.reset();
        self.feed(prior);
    }

    /// Only the rolling averages advance here; the latch moves in `commit`,
    /// once the whole alert has fired.
    fn evaluate(&mut self, frame: &MarketFrame<'_>, direction: CrossDirection) -> Outcome {
        self.candidate = None;
        self.sync(frame.prior);

        let available = frame.closes.len();
        let required = self.slow_period.max(self.fast_period) + 1;
        let (Some(prev_fast), Some(prev_slow)) = (self.fast.value(), self.slow.value()) else {
            return IndicatorError::insufficient("moving_average_cross", required, available).into();
        };
        let price = frame.tick.last_price;
        let (Some(now_fast), Some(now_slow)) = (self.fast.preview(price), self.slow.preview(price)) else {
            return IndicatorError::insufficient("moving_average_cross", required, available).into();
        };

        if !is_cross(prev_fast, prev_slow, now_fast, now_slow, direction) {
            return Outcome::Fail;
        }
        // One report per crossing: the cross is anchored on the prior bar
        if self.latched_on.is_some() && self.latched_on == self.synced_through {
            return Outcome::Fail;
        }
        self.candidate = self.synced_through;
        Outcome::Pass
    }

    fn commit(&mut self) {
        if let Some(anchor) = self.candidate.take() {
            self.latched_on = Some(anchor);
        }
    }

    fn clear_candidate(&mut self) {
        self.candidate = None;
    }
}

#[derive(Clone, Debug)]
pub enum ConditionState {
    Stateless,
    MaCross(MaCrossState),
}

impl ConditionState {
    pub fn for_condition(condition: &Condition) -> Self {
        match condition {
            Condition::MovingAverageCross {
                fast_period,
                slow_period,
                ma_type,
                ..
            } => ConditionState::MaCross(MaCrossState::new(*ma_type, *fast_period, *slow_period)),
            _ => ConditionState::Stateless,
        }
    }

    /// Latch whatever this condition passed on in the current pass.
    pub fn commit(&mut self) {
        if let ConditionState::MaCross(ma) = self {
            ma.commit();
        }
    }

    fn clear_candidate(&mut self) {
        if let ConditionState::MaCross(ma) = self {
            ma.clear_candidate();
        }
    }
}

/// Per-alert evaluation state owned by the symbol worker.
#[derive(Clone, Debug)]
pub struct AlertRuntime {
    states: Vec<ConditionState>,
}

impl AlertRuntime {
    pub fn for_config(config: &AlertConfiguration) -> Self {
        Self {
            states: config.conditions.iter().map(ConditionState::for_condition).collect(),
        }
    }

    /// Call after the alert fired on the last `evaluate_alert` pass.
    pub fn commit_firing(&mut self) {
        for state in &mut self.states {
            state.commit();
        }
    }
}

pub fn evaluate_condition(condition: &Condition, frame: &MarketFrame<'_>, state: &mut ConditionState) -> Outcome {
    let tick = frame.tick;
    let price = tick.last_price;

    match condition {
        Condition::PriceCross { operator, value } => Outcome::from_bool(operator.holds(price, *value)),

        Condition::DailyClose {
            operator,
            value,
            consecutive_days,
        } => {
            if !frame.in_close_window {
                return Outcome::Undecidable(Undecidable::OutsideCloseWindow);
            }
            let today = operator.holds(tick.close_so_far(), *value);
            if *consecutive_days <= 1 {
                return Outcome::from_bool(today);
            }

            let earlier = consecutive_days - 1;
            let prior = frame.prior_closes();
            if prior.len() < earlier {
                return Outcome::Undecidable(Undecidable::StreakIncomplete {
                    required: *consecutive_days,
                    available: prior.len() + 1,
                });
            }
            let mut window = StreakWindow::new(*consecutive_days);
            for close in &prior[prior.len() - earlier..] {
                window.record(operator.holds(*close, *value));
            }
            window.record(today);
            Outcome::from_bool(window.is_satisfied())
        }

        Condition::VolumeComparison {
            comparison,
            lookback_period,
            multiplier,
        } => match comparison {
            VolumeMode::Average => decide(indicators::volume_spike(
                tick.volume,
                &frame.prior_volumes,
                multiplier.unwrap_or(1.0),
                *lookback_period,
            )),
            VolumeMode::Max => decide(
                indicators::max_volume(&frame.prior_volumes, *lookback_period).map(|max| tick.volume > max),
            ),
        },

        Condition::Rsi {
            operator,
            value,
            period,
        } => decide(indicators::rsi(&frame.closes, *period).map(|rsi| operator.holds(rsi, *value))),

        Condition::Macd {
            fast_period,
            slow_period,
            signal_period,
            signal,
        } => {
            let now = match indicators::macd(&frame.closes, *fast_period, *slow_period, *signal_period) {
                Ok(m) => m,
                Err(e) => return e.into(),
            };
            match signal {
                MacdSignal::AboveZero => Outcome::from_bool(now.macd > 0.0),
                MacdSignal::BelowZero => Outcome::from_bool(now.macd < 0.0),
                MacdSignal::BullishCrossover | MacdSignal::BearishCrossover => {
                    let prev =
                        match indicators::macd(frame.prior_closes(), *fast_period, *slow_period, *signal_period) {
                            Ok(m) => m,
                            Err(e) => return e.into(),
                        };
                    let crossed = if *signal == MacdSignal::BullishCrossover {
                        now.histogram > 0.0 && prev.histogram <= 0.0
                    } else {
                        now.histogram < 0.0 && prev.histogram >= 0.0
                    };
                    Outcome::from_bool(crossed)
                }
            }
        }

        Condition::MovingAverageCross {
            fast_period,
            slow_period,
            ma_type,
            direction,
        } => match state {
            ConditionState::MaCross(ma) => ma.evaluate(frame, *direction),
            ConditionState::Stateless => decide(indicators::moving_average_cross(
                &frame.closes,
                *fast_period,
                *slow_period,
                *ma_type,
                *direction,
            )),
        },

        Condition::Pattern { pattern } => match pattern {
            Pattern::ConsolidationBreakout {
                period,
                range_threshold,
                breakout_margin,
            } => decide(indicators::consolidation_breakout(
                frame.prior,
                price,
                *period,
                *range_threshold,
                *breakout_margin,
            )),
            Pattern::Week52High => decide(indicators::week_52_high(frame.prior).map(|high| price > high)),
            Pattern::Week52Low => decide(indicators::week_52_low(frame.prior).map(|low| price < low)),
            Pattern::VolumeSpike {
                multiplier,
                lookback_period,
            } => decide(indicators::volume_spike(
                tick.volume,
                &frame.prior_volumes,
                *multiplier,
                *lookback_period,
            )),
            Pattern::BollingerBreakout { period, std_dev, band } => {
                decide(indicators::bollinger(&frame.closes, *period, *std_dev).map(|b| match band {
                    Band::Upper => price > b.upper,
                    Band::Lower => price < b.lower,
                }))
            }
            Pattern::Supertrend {
                period,
                multiplier,
                direction,
            } => decide(
                indicators::supertrend(&frame.bars_with_live(), *period, *multiplier)
                    .map(|st| st.direction == *direction),
            ),
            Pattern::Vwap {
                operator,
                lookback_period,
            } => decide(indicators::vwap(frame.prior, *lookback_period).map(|v| operator.holds(price, v))),
        },

        Condition::SupportResistance {
            level,
            lookback_period,
            value,
        } => {
            let resolved = match value {
                Some(v) => Ok(*v),
                None => match level {
                    LevelKind::Support => indicators::support_level(frame.prior, *lookback_period),
                    LevelKind::Resistance => indicators::resistance_level(frame.prior, *lookback_period),
                },
            };
            decide(resolved.map(|lvl| match level {
                LevelKind::Support => price < lvl,
                LevelKind::Resistance => price > lvl,
            }))
        }
    }
}

#[derive(Clone, Debug)]
pub struct Evaluation {
    pub outcome: Outcome,
    /// Results of the conditions actually evaluated, in declared order
    pub results: Vec<ConditionResult>,
}

impl Evaluation {
    pub fn fired(&self) -> bool {
        self.outcome.is_pass()
    }
}

/// Evaluate an alert's conditions in declared order under its combinator.
///
/// AND stops at the first condition that is not a pass; an undecidable
/// condition makes the group false. OR stops at the first pass and ignores
/// undecidable conditions; if nothing was decidable the group is undecidable.
pub fn evaluate_alert(config: &AlertConfiguration, frame: &MarketFrame<'_>, runtime: &mut AlertRuntime) -> Evaluation {
    if runtime.states.len() != config.conditions.len() {
        *runtime = AlertRuntime::for_config(config);
    }

    // conditions skipped by a short-circuit must not keep an older candidate
    for state in &mut runtime.states {
        state.clear_candidate();
    }

    let mut results = Vec::with_capacity(config.conditions.len());
    let mut decided = false;

    for (index, (condition, state)) in config.conditions.iter().zip(runtime.states.iter_mut()).enumerate() {
        let outcome = evaluate_condition(condition, frame, state);
        if let Outcome::Undecidable(reason) = &outcome {
            debug!(
                "[EVAL] {} {} condition {} ({}) not yet decidable: {:?}",
                config.symbol,
                config.id,
                index,
                condition.kind(),
                reason
            );
        }
        let kind = condition.kind();
        let stop = match (config.combinator, &outcome) {
            (Combinator::And, Outcome::Pass) => false,
            (Combinator::And, _) => true,
            (Combinator::Or, Outcome::Pass) => true,
            (Combinator::Or, Outcome::Fail) => {
                decided = true;
                false
            }
            (Combinator::Or, Outcome::Undecidable(_)) => false,
        };
        results.push(ConditionResult { index, kind, outcome });

        if stop {
            let outcome = match config.combinator {
                Combinator::And => Outcome::Fail,
                Combinator::Or => Outcome::Pass,
            };
            return Evaluation { outcome, results };
        }
    }

    let outcome = match config.combinator {
        Combinator::And => Outcome::Pass,
        Combinator::Or if decided => Outcome::Fail,
        Combinator::Or => results
            .iter()
            .rev()
            .find_map(|r| match &r.outcome {
                Outcome::Undecidable(u) => Some(Outcome::Undecidable(u.clone())),
                _ => None,
            })
            .unwrap_or(Outcome::Fail),
    };
    Evaluation { outcome, results }
}
