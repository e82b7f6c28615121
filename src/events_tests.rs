//! Unit tests for Events - ticks and trigger events.

#[cfg(test)]
mod events_tests {
    use crate::alerts::{ConditionResult, IndicatorContext, Outcome, Undecidable};
    use crate::events::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_tick_deserialize_minimal() {
        let tick: Tick = serde_json::from_value(json!({
            "symbol": "TCS",
            "timestamp": "2025-01-02T06:00:00Z",
            "last_price": 4000.01,
            "volume": 12345
        }))
        .unwrap();
        assert_eq!(tick.symbol, "TCS");
        assert_eq!(tick.volume, 12345.0);
        assert!(tick.open.is_none());
        assert_eq!(tick.close_so_far(), 4000.01);
    }

    #[test]
    fn test_tick_close_so_far_prefers_published_close() {
        let mut tick = Tick::new("TCS", Utc::now(), 4000.0, 1.0);
        tick.close = Some(3995.0);
        assert_eq!(tick.close_so_far(), 3995.0);
    }

    #[test]
    fn test_tick_as_bar() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 2, 6, 0, 0).unwrap();
        let mut tick = Tick::new("TCS", ts, 105.0, 500.0);
        tick.open = Some(100.0);
        tick.high = Some(104.0);
        tick.low = Some(99.0);

        let bar = tick.as_bar();
        assert_eq!(bar.timestamp, ts);
        assert_eq!(bar.open, 100.0);
        // the last trade extends the session high
        assert_eq!(bar.high, 105.0);
        assert_eq!(bar.low, 99.0);
        assert_eq!(bar.close, 105.0);
        assert_eq!(bar.volume, 500.0);
    }

    #[test]
    fn test_tick_as_bar_without_ohlc() {
        let bar = Tick::new("TCS", Utc::now(), 50.0, 1.0).as_bar();
        assert_eq!((bar.open, bar.high, bar.low, bar.close), (50.0, 50.0, 50.0, 50.0));
    }

    #[test]
    fn test_trigger_event_serialize() {
        let mut context = IndicatorContext::default();
        context.values.insert("rsi_14".to_string(), 28.5);
        let trigger = TriggerEvent {
            alert_id: Uuid::nil(),
            owner: "42".to_string(),
            symbol: "TCS".to_string(),
            exchange: "NSE".to_string(),
            one_shot: false,
            tick: Tick::new("TCS", Utc::now(), 4000.01, 1.0),
            results: vec![
                ConditionResult {
                    index: 0,
                    kind: "rsi",
                    outcome: Outcome::Pass,
                },
                ConditionResult {
                    index: 1,
                    kind: "daily_close",
                    outcome: Outcome::Undecidable(Undecidable::OutsideCloseWindow),
                },
            ],
            context,
            fired_at: Utc::now(),
        };

        let value = serde_json::to_value(&trigger).unwrap();
        assert_eq!(value["symbol"], "TCS");
        assert_eq!(value["context"]["values"]["rsi_14"], 28.5);
        assert_eq!(value["results"][0]["kind"], "rsi");
        assert_eq!(value["results"][0]["outcome"], "pass");
        assert_eq!(value["results"][1]["outcome"], "undecidable");
        assert_eq!(value["results"][1]["reason"], "outside_close_window");
        // optional tick fields are omitted
        assert!(value["tick"].get("open").is_none());
    }
}
