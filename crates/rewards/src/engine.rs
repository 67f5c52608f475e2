//! Incentive engine: ties validation, the subscription gate and the
//! transformer together for one business.

use crate::form::IncentiveForm;
use crate::gating::{AudienceGate, GateBlock, SaveGate};
use crate::transform::transform;
use crate::validation::{validate_form, ValidationReport};
use promo_core::config::SubscriptionGateConfig;
use promo_core::payload::ApiIncentivePayload;
use promo_core::subscription::{BusinessSubscription, SubscriptionPlan};
use thiserror::Error;
use tracing::{debug, info};

/// Why a form was not turned into a payload.
#[derive(Debug, Clone, Error)]
pub enum Rejection {
    #[error("{0}")]
    Invalid(ValidationReport),

    #[error("save disabled: {}", .0.tooltip())]
    Gated(GateBlock),
}

/// Stateless computation over incentive forms for the current business.
pub struct IncentiveEngine {
    business_id: String,
    gate_config: SubscriptionGateConfig,
}

impl IncentiveEngine {
    pub fn new(business_id: impl Into<String>, gate_config: &SubscriptionGateConfig) -> Self {
        let business_id = business_id.into();
        info!(
            business_id = %business_id,
            plan_id = ?gate_config.travel_agency_plan_id,
            "Incentive engine initialized"
        );
        Self {
            business_id,
            gate_config: gate_config.clone(),
        }
    }

    pub fn business_id(&self) -> &str {
        &self.business_id
    }

    pub fn audience_gate(
        &self,
        plans: &[SubscriptionPlan],
        subscriptions: &[BusinessSubscription],
    ) -> AudienceGate {
        AudienceGate::from_subscriptions(plans, subscriptions, &self.gate_config)
    }

    /// Validate, gate and transform. Schema errors are reported before the
    /// gate is consulted.
    pub fn prepare(
        &self,
        form: &IncentiveForm,
        gate: &AudienceGate,
    ) -> Result<ApiIncentivePayload, Rejection> {
        let rules = validate_form(form).map_err(|report| {
            debug!(errors = report.len(), "Incentive form rejected by schema");
            Rejection::Invalid(report)
        })?;

        if let SaveGate::Blocked { block, .. } = gate.check(form) {
            debug!(block = ?block, "Incentive form rejected by subscription gate");
            return Err(Rejection::Gated(block));
        }

        let payload = transform(&rules, &self.business_id);
        debug!(
            business_id = %self.business_id,
            audiences = payload.rewards.len(),
            "Incentive payload prepared"
        );
        Ok(payload)
    }
}
