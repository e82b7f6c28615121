use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};

use crate::config::SessionConfig;
use crate::constants::session::MAX_CLOSE_WINDOW_MINUTES;
use crate::error::ConfigError;

/// Exchange session timing: local offset plus the end-of-session window in
/// which `daily_close` conditions become decidable.
#[derive(Clone, Debug)]
pub struct SessionClock {
    offset: FixedOffset,
    close_time: NaiveTime,
    window: Duration,
}

impl SessionClock {
    pub fn new(utc_offset_minutes: i32, close_time: NaiveTime, window_minutes: i64) -> Result<Self, ConfigError> {
        let offset = utc_offset_minutes.checked_mul(60).and_then(FixedOffset::east_opt).ok_or_else(|| {
            ConfigError::Invalid(format!("utc_offset_minutes out of range: {}", utc_offset_minutes))
        })?;
        if !(0..=MAX_CLOSE_WINDOW_MINUTES).contains(&window_minutes) {
            return Err(ConfigError::Invalid(format!(
                "close_window_minutes must be within 0..={}, got {}",
                MAX_CLOSE_WINDOW_MINUTES, window_minutes
            )));
        }
        let window = Duration::try_minutes(window_minutes)
            .ok_or_else(|| ConfigError::Invalid(format!("close_window_minutes out of range: {}", window_minutes)))?;
        Ok(Self {
            offset,
            close_time,
            window,
        })
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self, ConfigError> {
        let close_time = NaiveTime::parse_from_str(&config.close_time, "%H:%M")
            .map_err(|e| ConfigError::Invalid(format!("close_time '{}': {}", config.close_time, e)))?;
        Self::new(config.utc_offset_minutes, close_time, config.close_window_minutes)
    }

    pub fn session_date(&self, ts: DateTime<Utc>) -> NaiveDate {
        ts.with_timezone(&self.offset).date_naive()
    }

    /// Official close of the session containing `ts`, in UTC.
    pub fn close_of(&self, ts: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.session_date(ts)
            .and_time(self.close_time)
            .and_local_timezone(self.offset)
            .single()
            .map(|local| local.with_timezone(&Utc))
    }

    pub fn in_close_window(&self, ts: DateTime<Utc>) -> bool {
        match self.close_of(ts) {
            Some(close) => match (close.checked_sub_signed(self.window), close.checked_add_signed(self.window)) {
                (Some(start), Some(end)) => ts >= start && ts <= end,
                _ => false,
            },
            None => false,
        }
    }
}
