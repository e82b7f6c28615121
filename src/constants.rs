//! Application-wide constants and defaults
//!
//! This module centralizes the hardcoded values so the wire defaults and
//! indicator windows live in one place.

/// Wire-level defaults shared with the translation collaborator
pub mod schema {
    /// Exchange assumed when the payload omits one
    pub const DEFAULT_EXCHANGE: &str = "NSE";

    /// Default trailing window for volume comparisons
    pub const DEFAULT_VOLUME_LOOKBACK: usize = 20;

    pub const DEFAULT_RSI_PERIOD: usize = 14;

    pub const DEFAULT_MACD_FAST: usize = 12;
    pub const DEFAULT_MACD_SLOW: usize = 26;
    pub const DEFAULT_MACD_SIGNAL: usize = 9;

    pub const DEFAULT_MA_FAST: usize = 50;
    pub const DEFAULT_MA_SLOW: usize = 200;

    pub const DEFAULT_PATTERN_PERIOD: usize = 20;
    pub const DEFAULT_RANGE_THRESHOLD: f64 = 0.05;
    pub const DEFAULT_SPIKE_MULTIPLIER: f64 = 2.0;
    pub const DEFAULT_BOLLINGER_STD_DEV: f64 = 2.0;

    pub const DEFAULT_SUPERTREND_PERIOD: usize = 7;
    pub const DEFAULT_SUPERTREND_MULTIPLIER: f64 = 3.0;

    /// Upper bound for `daily_close.consecutive_days`
    pub const MAX_STREAK_DAYS: usize = 30;
}

/// Indicator library constants
pub mod indicators {
    /// Trading days in a 52-week window
    pub const WEEK_52_BARS: usize = 252;

    /// ATR period used for context snapshots
    pub const CONTEXT_ATR_PERIOD: usize = 14;

    /// Volume window used for context snapshots
    pub const CONTEXT_VOLUME_LOOKBACK: usize = 20;
}

/// Session timing defaults (NSE)
pub mod session {
    pub const DEFAULT_CLOSE_TIME: &str = "15:30";

    /// IST = UTC+05:30
    pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 330;

    pub const DEFAULT_CLOSE_WINDOW_MINUTES: i64 = 5;

    /// Half a day either side of the close
    pub const MAX_CLOSE_WINDOW_MINUTES: i64 = 720;
}

/// Dispatcher and notification tuning
pub mod runtime {
    pub const DEFAULT_BUS_CAPACITY: usize = 1024;
    pub const DEFAULT_SYMBOL_QUEUE_SIZE: usize = 256;
    pub const DEFAULT_HISTORY_LOOKBACK: usize = 252;
    pub const DEFAULT_HISTORY_LIMIT: usize = 500;

    pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
    pub const DEFAULT_LLM_MAX_CONCURRENT: usize = 4;
    pub const DEFAULT_LLM_QUEUE_SIZE: usize = 100;

    pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

    /// Per-owner, per-symbol notification cooldown
    pub const DEFAULT_NOTIFY_COOLDOWN_SECS: u64 = 1800;

    /// One week
    pub const MAX_NOTIFY_COOLDOWN_SECS: u64 = 7 * 24 * 3600;

    pub const TELEGRAM_TIMEOUT_SECS: u64 = 5;
}
