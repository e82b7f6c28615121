//! Alert lifecycle orchestration: free text in, active alert (or a question)
//! out. The only place the translation collaborator is called.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::agents::{TranslationResult, Translator};
use crate::alerts::{AlertId, AlertRecord, AlertRegistry, ClarificationState};
use crate::error::AlertError;

#[derive(Clone, Debug)]
pub enum SubmitOutcome {
    Activated(AlertRecord),
    NeedsClarification(AlertRecord),
}

impl SubmitOutcome {
    pub fn record(&self) -> &AlertRecord {
        match self {
            SubmitOutcome::Activated(r) | SubmitOutcome::NeedsClarification(r) => r,
        }
    }
}

pub struct AlertService {
    registry: Arc<AlertRegistry>,
    translator: Arc<dyn Translator>,
}

impl AlertService {
    pub fn new(registry: Arc<AlertRegistry>, translator: Arc<dyn Translator>) -> Self {
        Self { registry, translator }
    }

    pub fn registry(&self) -> &Arc<AlertRegistry> {
        &self.registry
    }

    /// New alert from free text. A rejected request deletes its draft; a
    /// malformed or invalid translation leaves it in Draft.
    pub async fn submit(&self, owner: &str, text: &str) -> Result<SubmitOutcome, AlertError> {
        let id = self.registry.create_draft(owner, text);
        info!("📝 [ALERTS] Draft {} created for {}", id, owner);
        self.translate_draft(id, text).await
    }

    /// Answer an open clarification; the whole accumulated request is
    /// translated again.
    pub async fn clarify(&self, id: AlertId, text: &str) -> Result<SubmitOutcome, AlertError> {
        let request = self.registry.supply_clarification(id, text)?;
        self.translate_draft(id, &request).await
    }

    async fn translate_draft(&self, id: AlertId, text: &str) -> Result<SubmitOutcome, AlertError> {
        let result = match self.translator.translate(text).await {
            Ok(result) => result,
            Err(e) => {
                warn!("⚠️ [ALERTS] Translation failed for {}: {}", id, e);
                return Err(e);
            }
        };

        match result {
            TranslationResult::Confirmed { config } => {
                self.registry.activate(id, config)?;
                Ok(SubmitOutcome::Activated(self.record(id)?))
            }
            TranslationResult::NeedsClarification {
                missing_info,
                clarification_question,
            } => {
                info!("❓ [ALERTS] {} needs clarification: {}", id, clarification_question);
                self.registry.request_clarification(
                    id,
                    ClarificationState {
                        missing_info: missing_info.into_iter().collect::<BTreeSet<_>>(),
                        question: clarification_question,
                    },
                )?;
                Ok(SubmitOutcome::NeedsClarification(self.record(id)?))
            }
            TranslationResult::Rejected { message } => {
                info!("🚫 [ALERTS] {} rejected: {}", id, message);
                self.registry.delete(id)?;
                Err(AlertError::TranslationRejected(message))
            }
        }
    }

    fn record(&self, id: AlertId) -> Result<AlertRecord, AlertError> {
        self.registry
            .get(id)
            .ok_or_else(|| AlertError::AlertNotFound { id: id.to_string() })
    }

    pub fn delete(&self, id: AlertId) -> Result<(), AlertError> {
        self.registry.delete(id)
    }

    pub fn get(&self, id: AlertId) -> Option<AlertRecord> {
        self.registry.get(id)
    }

    pub fn list(&self, owner: &str) -> Vec<AlertRecord> {
        self.registry.list_for_owner(owner)
    }
}
