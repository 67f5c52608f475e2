//! Incentive step controller.
//!
//! Owns the per-promo session for the incentives and partner-rewards steps:
//! loads the subscription state to build the audience gate, keeps the draft
//! reconciled against it, and submits validated payloads to the reward API.

use crate::backend::{BackendError, RewardsBackend};
use crate::session::{SessionStore, WizardSession, WizardStep};
use promo_core::catalog::{CatalogOption, TargetAudienceType};
use promo_core::config::WizardConfig;
use promo_core::payload::{ApiIncentivePayload, PartnerRewardsPayload};
use promo_core::PromoError;
use promo_rewards::gating::Reconciliation;
use promo_rewards::partner::PartnerRewardForm;
use promo_rewards::transform::hydrate_form;
use promo_rewards::{
    validate_form, AudienceGate, GateBlock, IncentiveEngine, IncentiveForm, Rejection, SaveGate,
    ValidationReport,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub const INCENTIVES_SAVED_NOTIFICATION: &str = "Incentives saved successfully";
pub const PARTNER_REWARDS_SAVED_NOTIFICATION: &str = "Partner rewards saved successfully";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{0}")]
    Invalid(ValidationReport),

    #[error("save disabled: {}", .0.tooltip())]
    Gated(GateBlock),

    #[error("reward API rejected the submission ({status:?}): {message}")]
    Api { status: Option<u16>, message: String },

    #[error("draft storage error: {0}")]
    Storage(#[from] PromoError),
}

impl From<Rejection> for SubmitError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Invalid(report) => SubmitError::Invalid(report),
            Rejection::Gated(block) => SubmitError::Gated(block),
        }
    }
}

impl From<BackendError> for SubmitError {
    fn from(err: BackendError) -> Self {
        SubmitError::Api {
            status: err.status(),
            message: err.user_message(),
        }
    }
}

/// What the incentives page renders on open.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepView {
    pub session_id: uuid::Uuid,
    pub form: IncentiveForm,
    pub audience_options: Vec<CatalogOption<TargetAudienceType>>,
    pub reconciliation: Reconciliation,
    pub save_gate: SaveGate,
}

/// Result of saving a draft: the repaired form plus everything the page
/// needs to render errors and the save control.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftStatus {
    pub form: IncentiveForm,
    pub reconciliation: Reconciliation,
    pub validation: ValidationReport,
    pub save_gate: SaveGate,
}

impl DraftStatus {
    pub fn can_submit(&self) -> bool {
        self.validation.is_valid() && self.save_gate.can_save()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome<P> {
    pub notification: String,
    pub redirect_to: String,
    pub redirect_after_ms: u64,
    pub payload: P,
}

pub struct IncentiveStep {
    backend: Arc<dyn RewardsBackend>,
    sessions: SessionStore,
    engine: Arc<IncentiveEngine>,
    language: String,
    dashboard_path: String,
    redirect_delay_ms: u64,
}

impl IncentiveStep {
    pub fn new(
        backend: Arc<dyn RewardsBackend>,
        sessions: SessionStore,
        engine: Arc<IncentiveEngine>,
        language: impl Into<String>,
        config: &WizardConfig,
    ) -> Self {
        Self {
            backend,
            sessions,
            engine,
            language: language.into(),
            dashboard_path: config.dashboard_path.clone(),
            redirect_delay_ms: config.redirect_delay_ms,
        }
    }

    pub fn engine(&self) -> &IncentiveEngine {
        &self.engine
    }

    /// Fetch plans and subscriptions concurrently and build the gate. When
    /// either call fails the gate applies no restriction.
    pub async fn load_audience_gate(&self) -> AudienceGate {
        let business_id = self.engine.business_id();
        let (plans, subscriptions) = tokio::join!(
            self.backend.subscription_plans(business_id, &self.language),
            self.backend.subscriptions(business_id, &self.language),
        );
        match (plans, subscriptions) {
            (Ok(plans), Ok(subscriptions)) => self.engine.audience_gate(&plans, &subscriptions),
            (Err(e), _) | (_, Err(e)) => {
                warn!(
                    business_id = %business_id,
                    error = %e,
                    "Subscription state unavailable, audience options unrestricted"
                );
                metrics::counter!("wizard.catalog.load_failures").increment(1);
                AudienceGate::unrestricted()
            }
        }
    }

    pub async fn audience_options(&self) -> Vec<CatalogOption<TargetAudienceType>> {
        options_of(&self.load_audience_gate().await)
    }

    /// Resume or start the session for `promo_id` and move it to the
    /// incentives step. A previously submitted payload is hydrated back into
    /// an editable form.
    pub async fn open(&self, promo_id: &str) -> Result<StepView, SubmitError> {
        let gate = self.load_audience_gate().await;
        let mut session = self
            .sessions
            .start_or_resume(promo_id, self.engine.business_id());

        let mut form = match (&session.incentive_form, &session.rewards) {
            (Some(form), _) => form.clone(),
            (None, Some(payload)) => hydrate_form(payload),
            (None, None) => IncentiveForm::default(),
        };
        let reconciliation = gate.reconcile(&mut form);
        let save_gate = gate.check(&form);

        session.incentive_form = Some(form.clone());
        session.touch(WizardStep::Incentives);
        self.sessions.save(&session)?;

        Ok(StepView {
            session_id: session.id,
            form,
            audience_options: options_of(&gate),
            reconciliation,
            save_gate,
        })
    }

    /// Persist an edited draft. Validation runs but never blocks the save.
    pub async fn save_draft(
        &self,
        promo_id: &str,
        mut form: IncentiveForm,
    ) -> Result<DraftStatus, SubmitError> {
        let gate = self.load_audience_gate().await;
        let reconciliation = gate.reconcile(&mut form);
        let validation = validate_form(&form).err().unwrap_or_default();
        let save_gate = gate.check(&form);

        let mut session = self
            .sessions
            .start_or_resume(promo_id, self.engine.business_id());
        session.incentive_form = Some(form.clone());
        session.touch(WizardStep::Incentives);
        self.sessions.save(&session)?;

        Ok(DraftStatus {
            form,
            reconciliation,
            validation,
            save_gate,
        })
    }

    /// Validate, gate and transform without submitting.
    pub async fn preview(&self, form: &IncentiveForm) -> Result<ApiIncentivePayload, SubmitError> {
        let gate = self.load_audience_gate().await;
        Ok(self.engine.prepare(form, &gate)?)
    }

    /// Submit the incentive form. With no form given, the saved draft is
    /// submitted. On success the draft gives way to the accepted payload and
    /// the session moves on to partner rewards; on failure it is left as it
    /// was.
    pub async fn submit(
        &self,
        promo_id: &str,
        form: Option<IncentiveForm>,
    ) -> Result<SubmitOutcome<ApiIncentivePayload>, SubmitError> {
        let mut session = self
            .sessions
            .start_or_resume(promo_id, self.engine.business_id());
        let form = form.unwrap_or_else(|| session.incentive_form());

        let gate = self.load_audience_gate().await;
        let payload = self.engine.prepare(&form, &gate)?;

        if let Err(e) = self.backend.update_promo_rewards(promo_id, &payload).await {
            warn!(promo_id = %promo_id, error = %e, "Incentive submission failed");
            metrics::counter!("wizard.submissions.failed", "kind" => "incentives").increment(1);
            return Err(e.into());
        }

        // The accepted payload replaces the incentive draft.
        session.incentive_form = None;
        session.rewards = Some(payload.clone());
        session.touch(WizardStep::PartnerRewards);
        self.sessions.save(&session)?;

        info!(
            promo_id = %promo_id,
            audiences = payload.rewards.len(),
            "Incentives submitted"
        );
        metrics::counter!("wizard.submissions.succeeded", "kind" => "incentives").increment(1);
        Ok(self.outcome(INCENTIVES_SAVED_NOTIFICATION, payload))
    }

    pub async fn submit_partner(
        &self,
        promo_id: &str,
        form: PartnerRewardForm,
    ) -> Result<SubmitOutcome<PartnerRewardsPayload>, SubmitError> {
        let payload = form.to_payload().map_err(SubmitError::Invalid)?;

        if let Err(e) = self
            .backend
            .update_partner_promo_rewards(promo_id, &payload)
            .await
        {
            warn!(promo_id = %promo_id, error = %e, "Partner reward submission failed");
            metrics::counter!("wizard.submissions.failed", "kind" => "partner").increment(1);
            // Keep the rejected rows for resubmission.
            let mut session = self
                .sessions
                .start_or_resume(promo_id, self.engine.business_id());
            session.partner_form = Some(form);
            session.touch(WizardStep::PartnerRewards);
            self.sessions.save(&session)?;
            return Err(e.into());
        }

        // Partner rewards are the last step: the session ends here.
        self.sessions.clear(promo_id)?;

        info!(promo_id = %promo_id, rows = payload.rewards.len(), "Partner rewards submitted");
        metrics::counter!("wizard.submissions.succeeded", "kind" => "partner").increment(1);
        Ok(self.outcome(PARTNER_REWARDS_SAVED_NOTIFICATION, payload))
    }

    /// "Complete later": drop the draft without validating.
    pub fn complete_later(&self, promo_id: &str) -> Result<(), SubmitError> {
        self.sessions.clear(promo_id)?;
        info!(promo_id = %promo_id, "Wizard draft discarded");
        Ok(())
    }

    pub fn session(&self, promo_id: &str) -> Option<WizardSession> {
        self.sessions.load(promo_id)
    }

    fn outcome<P>(&self, notification: &str, payload: P) -> SubmitOutcome<P> {
        SubmitOutcome {
            notification: notification.to_string(),
            redirect_to: self.dashboard_path.clone(),
            redirect_after_ms: self.redirect_delay_ms,
            payload,
        }
    }
}

fn options_of(gate: &AudienceGate) -> Vec<CatalogOption<TargetAudienceType>> {
    gate.options().iter().copied().map(CatalogOption::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryRewardsBackend;
    use crate::storage::MemoryDraftStorage;
    use promo_core::config::{AppConfig, SubscriptionGateConfig};
    use promo_core::subscription::{BusinessSubscription, SubscriptionPlan};
    use promo_rewards::validation::ErrorKind;
    use serde_json::json;

    const BUSINESS: &str = "biz-1";

    fn subscribed_backend() -> MemoryRewardsBackend {
        MemoryRewardsBackend::new().with_subscription_state(
            BUSINESS,
            vec![SubscriptionPlan {
                id: "plan-ta".to_string(),
                name: "Travel Agency / Travel Agent".to_string(),
                description: None,
            }],
            vec![BusinessSubscription {
                id: "sub-1".to_string(),
                plan_id: "plan-ta".to_string(),
                start_date: Some("2026-01-01".to_string()),
                end_date: Some("2027-01-01".to_string()),
            }],
        )
    }

    fn step_with(backend: Arc<MemoryRewardsBackend>) -> (IncentiveStep, SessionStore) {
        let config = AppConfig::default();
        let sessions = SessionStore::new(Arc::new(MemoryDraftStorage::new()), "promo-wizard-data");
        let engine = Arc::new(IncentiveEngine::new(BUSINESS, &SubscriptionGateConfig::default()));
        let step = IncentiveStep::new(backend, sessions.clone(), engine, "en", &config.wizard);
        (step, sessions)
    }

    fn fee_form() -> IncentiveForm {
        serde_json::from_value(json!({
            "items": [{
                "targetAudienceType": "TravelAgency",
                "incentiveType": "Fee",
                "rewards": [{
                    "type": "Fee",
                    "paidPer": "Booking",
                    "lines": [{"segment": "PerEconomyClassSegment", "value": 10, "unit": "Fixed"}]
                }]
            }]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_submit_success_stores_payload_and_clears_draft() {
        let backend = Arc::new(subscribed_backend());
        let (step, sessions) = step_with(backend.clone());

        step.save_draft("PR-1", fee_form()).await.unwrap();
        assert!(sessions.load("PR-1").is_some());

        let outcome = step.submit("PR-1", None).await.unwrap();
        assert_eq!(outcome.notification, INCENTIVES_SAVED_NOTIFICATION);
        assert_eq!(outcome.redirect_to, "/dashboard");
        assert_eq!(outcome.redirect_after_ms, 1500);
        assert_eq!(backend.submitted_rewards("PR-1"), Some(outcome.payload.clone()));
        assert_eq!(
            serde_json::to_value(&outcome.payload).unwrap()["rewards"][0]["feeRewards"][0]
                ["feeRewardElements"][0]["value"],
            json!(10)
        );
        let session = sessions.load("PR-1").unwrap();
        assert!(session.incentive_form.is_none());
        assert_eq!(session.rewards, Some(outcome.payload.clone()));
        assert_eq!(session.step, WizardStep::PartnerRewards);

        let reopened = step.open("PR-1").await.unwrap();
        assert_eq!(reopened.form, fee_form());
    }

    #[tokio::test]
    async fn test_submit_failure_surfaces_first_error_and_keeps_draft() {
        let backend = Arc::new(subscribed_backend());
        backend.fail_submissions(
            "PR-1",
            422,
            json!({"errors": {"rewards": ["Rewards overlap"]}, "message": "Invalid"}),
        );
        let (step, sessions) = step_with(backend.clone());
        step.save_draft("PR-1", fee_form()).await.unwrap();

        let err = step.submit("PR-1", None).await.unwrap_err();
        match err {
            SubmitError::Api { status, message } => {
                assert_eq!(status, Some(422));
                assert_eq!(message, "Rewards overlap");
            }
            other => panic!("expected API error, got {other:?}"),
        }
        let draft = sessions.load("PR-1").unwrap();
        assert_eq!(draft.incentive_form, Some(fee_form()));
        assert!(draft.rewards.is_none());
    }

    #[tokio::test]
    async fn test_unsubscribed_business_cannot_submit() {
        let backend = Arc::new(MemoryRewardsBackend::new());
        let (step, _) = step_with(backend.clone());

        assert!(step.audience_options().await.is_empty());
        let status = step.save_draft("PR-1", fee_form()).await.unwrap();
        assert!(!status.save_gate.can_save());
        assert!(!status.can_submit());

        let err = step.submit("PR-1", Some(fee_form())).await.unwrap_err();
        assert!(matches!(err, SubmitError::Gated(GateBlock::NoAudienceAvailable)));
        assert!(backend.submitted_rewards("PR-1").is_none());
    }

    #[tokio::test]
    async fn test_catalog_failure_leaves_options_unrestricted() {
        let backend = Arc::new(MemoryRewardsBackend::new());
        backend.set_catalog_unavailable(true);
        let (step, _) = step_with(backend);
        assert_eq!(step.audience_options().await.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_form_never_reaches_backend() {
        let backend = Arc::new(subscribed_backend());
        let (step, _) = step_with(backend.clone());
        let mut form = fee_form();
        form.items[0].rewards[0].as_fee_mut().unwrap().lines.clear();

        let err = step.submit("PR-1", Some(form)).await.unwrap_err();
        match err {
            SubmitError::Invalid(report) => assert_eq!(
                report.error_for("items[0].rewards[0].lines").unwrap().kind,
                ErrorKind::Required
            ),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(backend.submitted_rewards("PR-1").is_none());
    }

    #[tokio::test]
    async fn test_open_fills_blank_audience_and_resumes() {
        let backend = Arc::new(subscribed_backend());
        let (step, _) = step_with(backend);

        let view = step.open("PR-1").await.unwrap();
        assert_eq!(view.audience_options.len(), 2);
        assert_eq!(view.reconciliation.replaced, 1);
        assert_eq!(
            view.form.items[0].target_audience_type,
            Some(TargetAudienceType::TravelAgency)
        );

        let again = step.open("PR-1").await.unwrap();
        assert_eq!(again.session_id, view.session_id);
        assert!(!again.reconciliation.changed());
    }

    #[tokio::test]
    async fn test_partner_submit_and_complete_later() {
        let backend = Arc::new(subscribed_backend());
        let (step, sessions) = step_with(backend.clone());
        let form: PartnerRewardForm = serde_json::from_value(json!({
            "rewards": [{"status": "Gold", "value": 15, "valueType": "Percentage"}]
        }))
        .unwrap();

        let outcome = step.submit_partner("PR-2", form).await.unwrap();
        assert_eq!(outcome.notification, PARTNER_REWARDS_SAVED_NOTIFICATION);
        assert_eq!(backend.submitted_partner_rewards("PR-2"), Some(outcome.payload));

        step.save_draft("PR-3", fee_form()).await.unwrap();
        step.complete_later("PR-3").unwrap();
        assert!(sessions.load("PR-3").is_none());
    }

    #[tokio::test]
    async fn test_partner_submit_ends_session_and_failure_keeps_rows() {
        let backend = Arc::new(subscribed_backend());
        let (step, sessions) = step_with(backend.clone());
        let form: PartnerRewardForm = serde_json::from_value(json!({
            "rewards": [{"status": "Basic", "value": 2, "valueType": "Fixed"}]
        }))
        .unwrap();

        step.submit("PR-4", Some(fee_form())).await.unwrap();
        assert!(sessions.load("PR-4").is_some());
        step.submit_partner("PR-4", form.clone()).await.unwrap();
        assert!(sessions.load("PR-4").is_none());

        backend.fail_submissions("PR-6", 500, json!({}));
        let err = step.submit_partner("PR-6", form.clone()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Api { status: Some(500), .. }));
        let session = sessions.load("PR-6").unwrap();
        assert_eq!(session.partner_form(), form);
        assert_eq!(session.step, WizardStep::PartnerRewards);
    }
}
