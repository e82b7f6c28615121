//! Unit tests for the indicator library.

#[cfg(test)]
mod indicators_tests {
    use crate::data::PriceBar;
    use crate::error::IndicatorError;
    use crate::indicators::*;
    use chrono::{Duration, TimeZone, Utc};

    const EPS: f64 = 1e-9;

    fn bars_from(closes: &[f64]) -> Vec<PriceBar> {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| PriceBar {
                timestamp: start + Duration::days(i as i64),
                open: *c,
                high: c + 2.0,
                low: c - 2.0,
                close: *c,
                volume: 1000.0,
            })
            .collect()
    }

    /// Deterministic pseudo-random walk
    fn walk(n: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        let mut price = 100.0;
        (0..n)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let step = ((state >> 33) % 1000) as f64 / 100.0 - 5.0;
                price = (price + step).max(1.0);
                price
            })
            .collect()
    }

    // ============= Moving averages =============

    #[test]
    fn test_sma_last_window() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((sma(&values, 3).unwrap() - 4.0).abs() < EPS);
        assert!((sma(&values, 5).unwrap() - 3.0).abs() < EPS);
    }

    #[test]
    fn test_sma_insufficient_history() {
        let err = sma(&[1.0, 2.0], 3).unwrap_err();
        assert_eq!(
            err,
            IndicatorError::InsufficientHistory {
                indicator: "sma",
                required: 3,
                available: 2
            }
        );
    }

    #[test]
    fn test_zero_period_is_invalid() {
        assert!(matches!(sma(&[1.0], 0), Err(IndicatorError::InvalidParameter { .. })));
        assert!(matches!(rsi(&[1.0, 2.0], 0), Err(IndicatorError::InvalidParameter { .. })));
    }

    #[test]
    fn test_ema_seeded_with_sma() {
        // seed = mean(1,2,3) = 2, k = 0.5
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let series = ema_series(&values, 3).unwrap();
        assert_eq!(series.len(), 3);
        assert!((series[0] - 2.0).abs() < EPS);
        assert!((series[1] - 3.0).abs() < EPS);
        assert!((series[2] - 4.0).abs() < EPS);
        assert!((ema(&values, 3).unwrap() - 4.0).abs() < EPS);
    }

    #[test]
    fn test_ema_equals_sma_at_exact_period() {
        let values = [10.0, 20.0, 30.0];
        assert!((ema(&values, 3).unwrap() - sma(&values, 3).unwrap()).abs() < EPS);
    }

    #[test]
    fn test_ma_cross_fires_only_on_flip() {
        // fast(2) below slow(4) until the last bar jumps
        let values = [10.0, 10.0, 10.0, 10.0, 9.0, 9.0, 14.0];
        assert!(moving_average_cross(&values, 2, 4, MaType::Sma, CrossDirection::Bullish).unwrap());

        // one more bar up: fast still above slow, but no fresh cross
        let sustained = [10.0, 10.0, 10.0, 10.0, 9.0, 9.0, 14.0, 15.0];
        assert!(!moving_average_cross(&sustained, 2, 4, MaType::Sma, CrossDirection::Bullish).unwrap());
    }

    #[test]
    fn test_ma_cross_bearish_symmetry() {
        let values = [10.0, 10.0, 10.0, 10.0, 11.0, 11.0, 6.0];
        assert!(moving_average_cross(&values, 2, 4, MaType::Sma, CrossDirection::Bearish).unwrap());
        assert!(!moving_average_cross(&values, 2, 4, MaType::Sma, CrossDirection::Bullish).unwrap());
    }

    #[test]
    fn test_ma_cross_firing_implies_opposite_previous_relation() {
        let values = walk(400, 7);
        for end in 7..values.len() {
            let window = &values[..end];
            if moving_average_cross(window, 3, 6, MaType::Ema, CrossDirection::Bullish).unwrap() {
                let prior = &window[..end - 1];
                let prev_fast = ema(prior, 3).unwrap();
                let prev_slow = ema(prior, 6).unwrap();
                assert!(prev_fast <= prev_slow);
            }
        }
    }

    #[test]
    fn test_ma_cross_needs_prior_bar() {
        let err = moving_average_cross(&[1.0; 4], 2, 4, MaType::Sma, CrossDirection::Bullish).unwrap_err();
        assert!(matches!(err, IndicatorError::InsufficientHistory { required: 5, .. }));
    }

    // ============= RSI =============

    #[test]
    fn test_rsi_all_gains_is_100() {
        let values: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        assert_eq!(rsi(&values, 14).unwrap(), 100.0);
    }

    #[test]
    fn test_rsi_flat_series_is_100() {
        // zero average loss, never divide by zero
        assert_eq!(rsi(&[50.0; 15], 14).unwrap(), 100.0);
    }

    #[test]
    fn test_rsi_all_losses_is_0() {
        let values: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        assert!(rsi(&values, 14).unwrap().abs() < EPS);
    }

    #[test]
    fn test_rsi_wilder_smoothing() {
        // period 2: deltas +2, -1 -> gain 1.0, loss 0.5; next +1 -> gain 1.0, loss 0.25
        let values = [10.0, 12.0, 11.0, 12.0];
        let expected = 100.0 - 100.0 / (1.0 + 1.0 / 0.25);
        assert!((rsi(&values, 2).unwrap() - expected).abs() < EPS);
    }

    #[test]
    fn test_rsi_bounded_for_random_walks() {
        for seed in 1..40 {
            let values = walk(120, seed);
            for end in 15..values.len() {
                let v = rsi(&values[..end], 14).unwrap();
                assert!((0.0..=100.0).contains(&v), "rsi {} out of range", v);
            }
        }
    }

    #[test]
    fn test_rsi_requires_period_plus_one() {
        assert!(rsi(&[1.0; 14], 14).is_err());
        assert!(rsi(&[1.0; 15], 14).is_ok());
    }

    // ============= MACD =============

    #[test]
    fn test_macd_histogram_is_line_minus_signal() {
        let values = walk(80, 3);
        let m = macd(&values, 12, 26, 9).unwrap();
        assert!((m.histogram - (m.macd - m.signal)).abs() < EPS);

        let line = ema(&values, 12).unwrap() - ema(&values, 26).unwrap();
        assert!((m.macd - line).abs() < 1e-6);
    }

    #[test]
    fn test_macd_minimum_history() {
        let values = walk(33, 5);
        assert!(macd(&values, 12, 26, 9).is_err());
        let values = walk(34, 5);
        assert!(macd(&values, 12, 26, 9).is_ok());
    }

    #[test]
    fn test_macd_flat_series_is_zero() {
        let m = macd(&[100.0; 40], 12, 26, 9).unwrap();
        assert!(m.macd.abs() < EPS);
        assert!(m.signal.abs() < EPS);
    }

    // ============= Volatility =============

    #[test]
    fn test_bollinger_population_std_dev() {
        // mean 5, population sd 2
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let b = bollinger(&values, 8, 2.0).unwrap();
        assert!((b.middle - 5.0).abs() < EPS);
        assert!((b.upper - 9.0).abs() < EPS);
        assert!((b.lower - 1.0).abs() < EPS);
    }

    #[test]
    fn test_atr_constant_range() {
        // every bar spans 4.0 with unchanged closes
        let bars = bars_from(&[100.0; 20]);
        assert!((atr(&bars, 14).unwrap() - 4.0).abs() < EPS);
    }

    #[test]
    fn test_atr_uses_gap_from_previous_close() {
        let mut bars = bars_from(&[100.0, 100.0, 100.0]);
        // gap up: high-low = 4 but |high - prev_close| = 12
        bars[2].high = 112.0;
        bars[2].low = 108.0;
        bars[2].close = 110.0;
        let v = atr(&bars, 2).unwrap();
        assert!((v - (4.0 + 12.0) / 2.0).abs() < EPS);
    }

    #[test]
    fn test_atr_requires_period_plus_one() {
        let bars = bars_from(&[100.0; 14]);
        assert!(atr(&bars, 14).is_err());
    }

    // ============= Volume =============

    #[test]
    fn test_volume_spike_three_times_mean() {
        let trailing = vec![1000.0; 20];
        assert!(volume_spike(3000.0, &trailing, 1.5, 20).unwrap());
        assert!(!volume_spike(1500.0, &trailing, 1.5, 20).unwrap());
    }

    #[test]
    fn test_max_volume_over_lookback() {
        let volumes = [5.0, 90.0, 10.0, 20.0, 30.0];
        assert_eq!(max_volume(&volumes, 3).unwrap(), 30.0);
        assert_eq!(max_volume(&volumes, 5).unwrap(), 90.0);
        assert!(average_volume(&volumes, 6).is_err());
    }

    // ============= Levels =============

    #[test]
    fn test_week_52_uses_all_bars_when_fewer() {
        let bars = bars_from(&[100.0, 120.0, 90.0]);
        assert_eq!(week_52_high(&bars).unwrap(), 122.0);
        assert_eq!(week_52_low(&bars).unwrap(), 88.0);
    }

    #[test]
    fn test_week_52_trailing_window() {
        let mut closes = vec![500.0];
        closes.extend(std::iter::repeat(100.0).take(252));
        let bars = bars_from(&closes);
        // the 500 bar is 253 bars back and falls out of the window
        assert_eq!(week_52_high(&bars).unwrap(), 102.0);
        assert!(week_52_high(&[]).is_err());
    }

    #[test]
    fn test_consolidation_breakout() {
        // range (102-98)/98 ~ 4.1%
        let bars = bars_from(&[100.0; 20]);
        assert!(consolidation_breakout(&bars, 103.0, 20, 0.05, 0.0).unwrap());
        // inside the range
        assert!(!consolidation_breakout(&bars, 101.0, 20, 0.05, 0.0).unwrap());
        // margin of 2% over 102 needs >= 104.04
        assert!(!consolidation_breakout(&bars, 104.0, 20, 0.05, 0.02).unwrap());
        assert!(consolidation_breakout(&bars, 104.1, 20, 0.05, 0.02).unwrap());
        // range too wide
        assert!(!consolidation_breakout(&bars, 103.0, 20, 0.03, 0.0).unwrap());
    }

    #[test]
    fn test_support_resistance_levels() {
        let bars = bars_from(&[100.0, 110.0, 105.0]);
        assert_eq!(resistance_level(&bars, 2).unwrap(), 112.0);
        assert_eq!(support_level(&bars, 2).unwrap(), 103.0);
        assert!(support_level(&bars, 4).is_err());
    }

    // ============= Rolling =============

    #[test]
    fn test_rolling_sma_matches_batch() {
        let values = walk(60, 11);
        let mut rolling = RollingSma::new(10);
        for (i, v) in values.iter().enumerate() {
            let preview = rolling.preview(*v);
            rolling.push(*v);
            assert_eq!(preview, rolling.value());
            if i + 1 >= 10 {
                let batch = sma(&values[..=i], 10).unwrap();
                assert!((rolling.value().unwrap() - batch).abs() < 1e-6);
            } else {
                assert!(rolling.value().is_none());
            }
        }
    }

    #[test]
    fn test_rolling_ema_matches_batch() {
        let values = walk(60, 13);
        let mut rolling = RollingEma::new(8);
        for (i, v) in values.iter().enumerate() {
            let preview = rolling.preview(*v);
            rolling.push(*v);
            assert_eq!(preview, rolling.value());
            if i + 1 >= 8 {
                let batch = ema(&values[..=i], 8).unwrap();
                assert!((rolling.value().unwrap() - batch).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_rolling_ma_dispatch() {
        let mut ma = RollingMa::new(MaType::Sma, 2);
        ma.push(1.0);
        assert_eq!(ma.value(), None);
        assert_eq!(ma.preview(3.0), Some(2.0));
        ma.push(3.0);
        assert_eq!(ma.value(), Some(2.0));
    }

    // ============= Supertrend / VWAP =============

    fn ohlcv(i: i64, high: f64, low: f64, close: f64, volume: f64) -> PriceBar {
        PriceBar {
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap() + Duration::days(i),
            open: close,
            high,
            low,
            close,
            volume,
        }
    }

    #[test]
    fn test_supertrend_flips_with_the_trend() {
        let mut bars: Vec<PriceBar> = (0..8).map(|i| ohlcv(i, 101.0, 99.0, 100.0, 1.0)).collect();
        let flat = supertrend(&bars, 3, 1.0).unwrap();
        assert_eq!(flat.direction, TrendDirection::Neutral);
        assert!((flat.upper - 102.0).abs() < EPS);
        assert!((flat.lower - 98.0).abs() < EPS);

        // ATR 14/3; the upper band holds at 102, the lower band rises
        bars.push(ohlcv(8, 110.0, 104.0, 109.0, 1.0));
        let up = supertrend(&bars, 3, 1.0).unwrap();
        assert_eq!(up.direction, TrendDirection::Buy);
        assert!((up.upper - 102.0).abs() < EPS);
        assert!((up.lower - (107.0 - 14.0 / 3.0)).abs() < EPS);

        // ATR 85/9; close breaks the held lower band
        bars.push(ohlcv(9, 100.0, 90.0, 91.0, 1.0));
        let down = supertrend(&bars, 3, 1.0).unwrap();
        assert_eq!(down.direction, TrendDirection::Sell);
        assert!((down.upper - (95.0 + 85.0 / 9.0)).abs() < 1e-6);
        assert!((down.lower - up.lower).abs() < EPS);
    }

    #[test]
    fn test_supertrend_insufficient_history() {
        let bars: Vec<PriceBar> = (0..3).map(|i| ohlcv(i, 101.0, 99.0, 100.0, 1.0)).collect();
        assert_eq!(
            supertrend(&bars, 3, 3.0).unwrap_err(),
            IndicatorError::insufficient("supertrend", 4, 3)
        );
    }

    #[test]
    fn test_vwap_weights_typical_price() {
        let bars = vec![ohlcv(0, 12.0, 8.0, 10.0, 100.0), ohlcv(1, 23.0, 19.0, 21.0, 300.0)];
        assert!((vwap(&bars, 2).unwrap() - 18.25).abs() < EPS);
        assert!((vwap(&bars, 1).unwrap() - 21.0).abs() < EPS);
        assert!(matches!(vwap(&bars, 3), Err(IndicatorError::InsufficientHistory { .. })));

        let idle = vec![ohlcv(0, 12.0, 8.0, 10.0, 0.0)];
        assert!(matches!(vwap(&idle, 1), Err(IndicatorError::InsufficientHistory { .. })));
    }
}
