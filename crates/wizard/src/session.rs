//! Wizard session: cross-step state for one promo being configured.
//!
//! Lifecycle: started (or resumed from a saved draft) when the operator
//! opens the wizard, mutated per step, destroyed when the rewards are
//! submitted or the operator chooses "complete later".

use crate::storage::DraftStorage;
use chrono::{DateTime, Utc};
use promo_core::payload::ApiIncentivePayload;
use promo_core::PromoResult;
use promo_rewards::partner::PartnerRewardForm;
use promo_rewards::IncentiveForm;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardStep {
    #[default]
    Details,
    Incentives,
    PartnerRewards,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardSession {
    pub id: Uuid,
    pub promo_id: String,
    pub business_id: String,
    #[serde(default)]
    pub step: WizardStep,
    #[serde(default)]
    pub incentive_form: Option<IncentiveForm>,
    /// Partner rows kept after a rejected submit.
    #[serde(default)]
    pub partner_form: Option<PartnerRewardForm>,
    /// Incentive payload accepted by the API on submit.
    #[serde(default)]
    pub rewards: Option<ApiIncentivePayload>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WizardSession {
    pub fn start(promo_id: impl Into<String>, business_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            promo_id: promo_id.into(),
            business_id: business_id.into(),
            step: WizardStep::Details,
            incentive_form: None,
            partner_form: None,
            rewards: None,
            started_at: now,
            updated_at: now,
        }
    }

    /// The form to show: the saved draft, or one blank Fee card.
    pub fn incentive_form(&self) -> IncentiveForm {
        self.incentive_form.clone().unwrap_or_default()
    }

    pub fn partner_form(&self) -> PartnerRewardForm {
        self.partner_form.clone().unwrap_or_default()
    }

    pub fn touch(&mut self, step: WizardStep) {
        self.step = step;
        self.updated_at = Utc::now();
    }

    pub fn is_completed(&self) -> bool {
        self.step == WizardStep::Completed
    }
}

/// Persists sessions through a `DraftStorage`, one entry per promo.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn DraftStorage>,
    base_key: String,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn DraftStorage>, base_key: impl Into<String>) -> Self {
        Self {
            storage,
            base_key: base_key.into(),
        }
    }

    /// Storage key for a promo's draft, e.g. `promo-wizard-data:PR-1`.
    pub fn key_for(&self, promo_id: &str) -> String {
        format!("{}:{}", self.base_key, promo_id)
    }

    /// The saved draft for `promo_id`. An unreadable draft is logged and
    /// treated as absent.
    pub fn load(&self, promo_id: &str) -> Option<WizardSession> {
        let key = self.key_for(promo_id);
        let raw = match self.storage.get(&key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read wizard draft");
                return None;
            }
        };
        match serde_json::from_str::<WizardSession>(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding unreadable wizard draft");
                None
            }
        }
    }

    pub fn save(&self, session: &WizardSession) -> PromoResult<()> {
        let json = serde_json::to_string(session)?;
        self.storage.set(&self.key_for(&session.promo_id), &json)?;
        debug!(promo_id = %session.promo_id, step = ?session.step, "Wizard draft saved");
        Ok(())
    }

    pub fn clear(&self, promo_id: &str) -> PromoResult<()> {
        self.storage.clear(&self.key_for(promo_id))?;
        debug!(promo_id = %promo_id, "Wizard draft cleared");
        Ok(())
    }

    /// Resume the saved draft for `promo_id`, or start a fresh session.
    pub fn start_or_resume(&self, promo_id: &str, business_id: &str) -> WizardSession {
        match self.load(promo_id) {
            Some(session) if session.business_id == business_id && !session.is_completed() => {
                debug!(promo_id = %promo_id, session_id = %session.id, "Wizard session resumed");
                session
            }
            _ => {
                let session = WizardSession::start(promo_id, business_id);
                info!(promo_id = %promo_id, session_id = %session.id, "Wizard session started");
                session
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryDraftStorage;
    use promo_core::catalog::IncentiveType;

    fn store() -> (Arc<MemoryDraftStorage>, SessionStore) {
        let storage = Arc::new(MemoryDraftStorage::new());
        let sessions = SessionStore::new(storage.clone(), "promo-wizard-data");
        (storage, sessions)
    }

    #[test]
    fn test_new_session_defaults_to_blank_fee_card() {
        let session = WizardSession::start("PR-1", "biz-1");
        let form = session.incentive_form();
        assert_eq!(form.items.len(), 1);
        assert_eq!(form.items[0].incentive_type, IncentiveType::Fee);
    }

    #[test]
    fn test_save_and_resume() {
        let (_, sessions) = store();
        let mut session = sessions.start_or_resume("PR-1", "biz-1");
        let mut form = session.incentive_form();
        form.add_card();
        session.incentive_form = Some(form);
        session.touch(WizardStep::Incentives);
        sessions.save(&session).unwrap();

        let resumed = sessions.start_or_resume("PR-1", "biz-1");
        assert_eq!(resumed, session);
        assert_eq!(resumed.incentive_form().items.len(), 2);
    }

    #[test]
    fn test_drafts_are_scoped_per_promo() {
        let (storage, sessions) = store();
        sessions.save(&WizardSession::start("PR-1", "biz-1")).unwrap();
        sessions.save(&WizardSession::start("PR-2", "biz-1")).unwrap();
        assert_eq!(storage.len(), 2);

        sessions.clear("PR-1").unwrap();
        assert!(sessions.load("PR-1").is_none());
        assert!(sessions.load("PR-2").is_some());
    }

    #[test]
    fn test_corrupt_draft_treated_as_absent() {
        let (storage, sessions) = store();
        storage.set("promo-wizard-data:PR-9", "{not json").unwrap();
        assert!(sessions.load("PR-9").is_none());
        let session = sessions.start_or_resume("PR-9", "biz-1");
        assert_eq!(session.step, WizardStep::Details);
    }

    #[test]
    fn test_other_business_draft_not_resumed() {
        let (_, sessions) = store();
        let saved = WizardSession::start("PR-1", "biz-1");
        sessions.save(&saved).unwrap();
        let session = sessions.start_or_resume("PR-1", "biz-2");
        assert_ne!(session.id, saved.id);
        assert_eq!(session.business_id, "biz-2");
    }
}
