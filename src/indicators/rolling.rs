//! Incremental moving averages: O(1) per appended bar, plus a non-mutating
//! `preview` that answers "what would the average be with this price as the
//! next value" for the live tick.

use std::collections::VecDeque;

use super::moving_average::MaType;

#[derive(Clone, Debug)]
pub struct RollingSma {
    period: usize,
    window: VecDeque<f64>,
    sum: f64,
}

impl RollingSma {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            window: VecDeque::with_capacity(period.max(1)),
            sum: 0.0,
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.window.len() == self.period {
            if let Some(old) = self.window.pop_front() {
                self.sum -= old;
            }
        }
        self.window.push_back(value);
        self.sum += value;
    }

    pub fn value(&self) -> Option<f64> {
        (self.window.len() == self.period).then(|| self.sum / self.period as f64)
    }

    pub fn preview(&self, next: f64) -> Option<f64> {
        if self.window.len() + 1 < self.period {
            return None;
        }
        let dropped = if self.window.len() == self.period {
            self.window.front().copied().unwrap_or_default()
        } else {
            0.0
        };
        Some((self.sum - dropped + next) / self.period as f64)
    }
}

#[derive(Clone, Debug)]
pub struct RollingEma {
    period: usize,
    k: f64,
    seed_sum: f64,
    count: usize,
    value: Option<f64>,
}

impl RollingEma {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            k: 2.0 / (period as f64 + 1.0),
            seed_sum: 0.0,
            count: 0,
            value: None,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.count += 1;
        match self.value {
            Some(prev) => self.value = Some(value * self.k + prev * (1.0 - self.k)),
            None => {
                self.seed_sum += value;
                if self.count == self.period {
                    self.value = Some(self.seed_sum / self.period as f64);
                }
            }
        }
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn preview(&self, next: f64) -> Option<f64> {
        match self.value {
            Some(prev) => Some(next * self.k + prev * (1.0 - self.k)),
            None if self.count + 1 == self.period => Some((self.seed_sum + next) / self.period as f64),
            None => None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum RollingMa {
    Sma(RollingSma),
    Ema(RollingEma),
}

impl RollingMa {
    pub fn new(ma_type: MaType, period: usize) -> Self {
        match ma_type {
            MaType::Sma => RollingMa::Sma(RollingSma::new(period)),
            MaType::Ema => RollingMa::Ema(RollingEma::new(period)),
        }
    }

    pub fn push(&mut self, value: f64) {
        match self {
            RollingMa::Sma(s) => s.push(value),
            RollingMa::Ema(e) => e.push(value),
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            RollingMa::Sma(s) => s.value(),
            RollingMa::Ema(e) => e.value(),
        }
    }

    pub fn preview(&self, next: f64) -> Option<f64> {
        match self {
            RollingMa::Sma(s) => s.preview(next),
            RollingMa::Ema(e) => e.preview(next),
        }
    }
}
