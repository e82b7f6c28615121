//! Unit tests for translation parsing and trigger message rendering.

#[cfg(test)]
mod agents_tests {
    use crate::agents::*;
    use crate::alerts::{Combinator, Condition, ConditionResult, IndicatorContext, Outcome, Pattern};
    use crate::error::AlertError;
    use crate::events::{Tick, TriggerEvent};
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_parse_confirmed() {
        let raw = r#"{"status":"CONFIRMED","config":{"symbol":"TCS","conditions":[{"type":"price_cross","operator":"above","value":4000}]}}"#;
        match parse_translation(raw).unwrap() {
            TranslationResult::Confirmed { config } => {
                assert_eq!(config.symbol, "TCS");
                assert_eq!(config.exchange, "NSE");
                assert_eq!(config.combinator, Combinator::And);
                assert_eq!(config.conditions.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_fenced_reply() {
        let raw = "Sure! Here is the alert:\n```json\n{\"status\": \"CONFIRMED\", \"config\": {\"symbol\": \"RELIANCE\", \"combinator\": \"AND\", \"conditions\": [{\"type\": \"pattern\", \"pattern\": {\"kind\": \"week_52_high\"}}, {\"type\": \"volume_comparison\", \"comparison\": \"average\", \"multiplier\": 1.5}]}}\n```";
        let TranslationResult::Confirmed { config } = parse_translation(raw).unwrap() else {
            panic!("expected confirmed");
        };
        assert_eq!(config.conditions[0], Condition::Pattern { pattern: Pattern::Week52High });
        assert_eq!(config.conditions[1].kind(), "volume_comparison");
    }

    #[test]
    fn test_parse_needs_clarification() {
        let raw = r#"{"status":"NEEDS_CLARIFICATION","missing_info":["symbol"],"clarification_question":"Which stock?"}"#;
        assert_eq!(
            parse_translation(raw).unwrap(),
            TranslationResult::NeedsClarification {
                missing_info: vec!["symbol".to_string()],
                clarification_question: "Which stock?".to_string()
            }
        );

        // short form without missing_info
        let raw = r#"{"status":"NEEDS_CLARIFICATION","question":"Which stock?"}"#;
        let TranslationResult::NeedsClarification { missing_info, .. } = parse_translation(raw).unwrap() else {
            panic!("expected clarification");
        };
        assert!(missing_info.is_empty());
    }

    #[test]
    fn test_parse_rejected() {
        let raw = r#"{"status":"REJECTED","message":"I cannot provide investment advice."}"#;
        assert!(matches!(
            parse_translation(raw).unwrap(),
            TranslationResult::Rejected { .. }
        ));
    }

    #[test]
    fn test_malformed_replies() {
        for raw in [
            "I am not sure what you mean",
            r#"{"status":"MAYBE"}"#,
            r#"{"status":"CONFIRMED","config":{"symbol":"TCS","conditions":[{"type":"telepathy"}]}}"#,
            "{ broken",
        ] {
            assert!(
                matches!(parse_translation(raw), Err(AlertError::MalformedTranslation(_))),
                "{} should be malformed",
                raw
            );
        }
    }

    fn trigger(one_shot: bool) -> TriggerEvent {
        let mut context = IndicatorContext::default();
        context.values.insert("change_pct".to_string(), 2.5);
        context.values.insert("avg_volume_20".to_string(), 1000.0);
        context.values.insert("rsi_14".to_string(), 72.345);
        TriggerEvent {
            alert_id: Uuid::new_v4(),
            owner: "42".to_string(),
            symbol: "TCS".to_string(),
            exchange: "NSE".to_string(),
            one_shot,
            tick: Tick::new("TCS", Utc::now(), 4000.01, 3000.0),
            results: vec![
                ConditionResult {
                    index: 0,
                    kind: "price_cross",
                    outcome: Outcome::Pass,
                },
                ConditionResult {
                    index: 1,
                    kind: "rsi",
                    outcome: Outcome::Pass,
                },
            ],
            context,
            fired_at: Utc::now(),
        }
    }

    #[test]
    fn test_render_trigger_message() {
        let msg = render_trigger_message(&trigger(true));
        assert!(msg.contains("<b>TCS</b> (NSE)"));
        assert!(msg.contains("₹4000.01"));
        assert!(msg.contains("+2.50%"));
        assert!(msg.contains("3.0x 20-day avg"));
        assert!(msg.contains("price_cross, rsi"));
        assert!(msg.contains("rsi_14: 72.35") || msg.contains("rsi_14: 72.34"));
        assert!(msg.contains("deactivated"));

        let recurring = render_trigger_message(&trigger(false));
        assert!(!recurring.contains("deactivated"));
    }
}
