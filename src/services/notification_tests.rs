//! Unit tests for the notification service.

#[cfg(test)]
mod notification_tests {
    use crate::agents::Explainer;
    use crate::alerts::{ConditionResult, IndicatorContext, Outcome};
    use crate::bus::EventBus;
    use crate::error::NotifyError;
    use crate::events::{Tick, TriggerEvent};
    use crate::services::notification::{NotificationService, Notifier};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
        attempts: Mutex<usize>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn deliver(&self, owner: &str, message: &str) -> Result<(), NotifyError> {
            *self.attempts.lock() += 1;
            if self.fail {
                return Err(NotifyError::Http {
                    status: 403,
                    body: "bot was blocked by the user".to_string(),
                });
            }
            self.sent.lock().push((owner.to_string(), message.to_string()));
            Ok(())
        }
    }

    struct FixedExplainer(Result<String, String>);

    #[async_trait]
    impl Explainer for FixedExplainer {
        async fn explain(&self, _trigger: &TriggerEvent) -> Result<String, NotifyError> {
            self.0.clone().map_err(NotifyError::Explain)
        }
    }

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 2, 5, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn trigger(owner: &str, symbol: &str, fired_at: DateTime<Utc>) -> TriggerEvent {
        TriggerEvent {
            alert_id: Uuid::new_v4(),
            owner: owner.to_string(),
            symbol: symbol.to_string(),
            exchange: "NSE".to_string(),
            one_shot: false,
            tick: Tick::new(symbol, fired_at, 4000.01, 100.0),
            results: vec![ConditionResult {
                index: 0,
                kind: "price_cross",
                outcome: Outcome::Pass,
            }],
            context: IndicatorContext::default(),
            fired_at,
        }
    }

    #[test]
    fn test_cooldown_per_owner_and_symbol() {
        let service = NotificationService::new(None, Arc::new(RecordingNotifier::default()), 1800);
        assert!(service.try_claim("1", "TCS", at(0)));
        assert!(!service.try_claim("1", "TCS", at(29)));
        assert!(service.try_claim("1", "INFY", at(29)));
        assert!(service.try_claim("2", "TCS", at(29)));
        assert!(service.try_claim("1", "TCS", at(30)));
    }

    #[tokio::test]
    async fn test_handle_uses_explainer() {
        let notifier = Arc::new(RecordingNotifier::default());
        let explainer: Arc<dyn Explainer> = Arc::new(FixedExplainer(Ok("<b>TCS</b> crossed 4000".to_string())));
        let service = NotificationService::new(Some(explainer), notifier.clone(), 1800);

        assert!(service.handle(&trigger("1", "TCS", at(0))).await.unwrap());
        let sent = notifier.sent.lock().clone();
        assert_eq!(sent, vec![("1".to_string(), "<b>TCS</b> crossed 4000".to_string())]);
    }

    #[tokio::test]
    async fn test_explainer_failure_falls_back_to_template() {
        let notifier = Arc::new(RecordingNotifier::default());
        let explainer: Arc<dyn Explainer> = Arc::new(FixedExplainer(Err("model down".to_string())));
        let service = NotificationService::new(Some(explainer), notifier.clone(), 1800);

        assert!(service.handle(&trigger("1", "TCS", at(0))).await.unwrap());
        let sent = notifier.sent.lock();
        assert!(sent[0].1.contains("<b>TCS</b>"));
        assert!(sent[0].1.contains("price_cross"));
    }

    #[test]
    fn test_huge_cooldown_saturates() {
        let service = NotificationService::new(None, Arc::new(RecordingNotifier::default()), u64::MAX);
        assert!(service.try_claim("1", "TCS", at(0)));
        assert!(!service.try_claim("1", "TCS", at(60 * 24 * 365)));
    }

    #[tokio::test]
    async fn test_handle_respects_cooldown() {
        let notifier = Arc::new(RecordingNotifier::default());
        let service = NotificationService::new(None, notifier.clone(), 1800);

        assert!(service.handle(&trigger("1", "TCS", at(0))).await.unwrap());
        assert!(!service.handle(&trigger("1", "TCS", at(5))).await.unwrap());
        assert_eq!(notifier.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_delivery_failure_is_reported() {
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        let service = NotificationService::new(None, notifier.clone(), 1800);
        let err = service.handle(&trigger("1", "TCS", at(0))).await.unwrap_err();
        assert!(matches!(err, NotifyError::Http { status: 403, .. }));

        // a failed send does not start the cooldown
        assert!(service.handle(&trigger("1", "TCS", at(1))).await.is_err());
        assert_eq!(*notifier.attempts.lock(), 2);
        assert!(service.try_claim("1", "TCS", at(2)));
    }

    #[tokio::test]
    async fn test_service_consumes_triggers_from_bus() {
        let bus = EventBus::new(16);
        let notifier = Arc::new(RecordingNotifier::default());
        let service = Arc::new(NotificationService::new(None, notifier.clone(), 1800));
        let _handle = service.start(&bus);

        bus.publish_trigger(trigger("7", "SBIN", Utc::now())).unwrap();

        for _ in 0..50 {
            if !notifier.sent.lock().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        let sent = notifier.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "7");
    }
}
