//! Subscription gate over audience options.
//!
//! Travel agency / travel agent audiences are only offered to businesses with
//! an active travel agency subscription. The gate filters the audience
//! catalog, repairs stale selections in a form, and decides whether the form
//! may be saved.

use crate::form::IncentiveForm;
use promo_core::catalog::{filtered_audience_options, TargetAudienceType};
use promo_core::config::SubscriptionGateConfig;
use promo_core::subscription::{BusinessSubscription, SubscriptionPlan};
use serde::Serialize;
use tracing::debug;

/// Whether `plan` is the travel agency / travel agent plan.
///
/// A configured plan id wins. Otherwise every configured keyword must occur
/// in the plan name, case-insensitively.
pub fn is_travel_agency_plan(plan: &SubscriptionPlan, config: &SubscriptionGateConfig) -> bool {
    if let Some(id) = &config.travel_agency_plan_id {
        return plan.id == *id;
    }
    if config.plan_name_keywords.is_empty() {
        return false;
    }
    let name = plan.name.to_lowercase();
    config
        .plan_name_keywords
        .iter()
        .all(|keyword| name.contains(&keyword.to_lowercase()))
}

pub fn has_active_travel_agency_subscription(
    plans: &[SubscriptionPlan],
    subscriptions: &[BusinessSubscription],
    config: &SubscriptionGateConfig,
) -> bool {
    let Some(plan) = plans.iter().find(|p| is_travel_agency_plan(p, config)) else {
        return false;
    };
    subscriptions
        .iter()
        .any(|s| s.plan_id == plan.id && s.is_active())
}

// ─── Save Gate ─────────────────────────────────────────────────────────────

/// Why saving is disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum GateBlock {
    /// The subscription allows no audience at all.
    NoAudienceAvailable,
    /// A card still selects an audience the subscription no longer allows.
    AudienceUnavailable {
        index: usize,
        audience: TargetAudienceType,
    },
}

impl GateBlock {
    /// Tooltip text for the disabled save control.
    pub fn tooltip(&self) -> String {
        match self {
            GateBlock::NoAudienceAvailable => {
                "An active travel agency subscription is required to configure incentives"
                    .to_string()
            }
            GateBlock::AudienceUnavailable { audience, .. } => format!(
                "{} is not available under your current subscription",
                audience.label()
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveGate {
    Open,
    Blocked { block: GateBlock, tooltip: String },
}

impl SaveGate {
    pub fn can_save(&self) -> bool {
        matches!(self, SaveGate::Open)
    }

    fn blocked(block: GateBlock) -> Self {
        let tooltip = block.tooltip();
        SaveGate::Blocked { block, tooltip }
    }
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub replaced: usize,
    pub dropped: usize,
}

impl Reconciliation {
    pub fn changed(&self) -> bool {
        self.replaced > 0 || self.dropped > 0
    }
}

// ─── Audience Gate ─────────────────────────────────────────────────────────

/// Audience options available to the current business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudienceGate {
    options: Vec<TargetAudienceType>,
}

impl AudienceGate {
    pub fn new(has_active_travel_agency_subscription: bool) -> Self {
        Self {
            options: filtered_audience_options(has_active_travel_agency_subscription),
        }
    }

    pub fn from_subscriptions(
        plans: &[SubscriptionPlan],
        subscriptions: &[BusinessSubscription],
        config: &SubscriptionGateConfig,
    ) -> Self {
        let active = has_active_travel_agency_subscription(plans, subscriptions, config);
        debug!(
            plans = plans.len(),
            subscriptions = subscriptions.len(),
            active,
            "Audience gate computed"
        );
        Self::new(active)
    }

    /// Gate used when plans or subscriptions could not be loaded: no
    /// subscription restriction is applied.
    pub fn unrestricted() -> Self {
        Self::new(true)
    }

    pub fn options(&self) -> &[TargetAudienceType] {
        &self.options
    }

    pub fn allows(&self, audience: TargetAudienceType) -> bool {
        self.options.contains(&audience)
    }

    /// Repair audience selections against the current options.
    ///
    /// Unavailable or blank selections become the first available option.
    /// With no options at all, cards holding a stale selection are dropped.
    /// Running it again on the same options changes nothing.
    pub fn reconcile(&self, form: &mut IncentiveForm) -> Reconciliation {
        let mut outcome = Reconciliation::default();
        let first = self.options.first().copied();

        form.items.retain_mut(|card| match (card.target_audience_type, first) {
            (Some(current), _) if self.allows(current) => true,
            (_, Some(first)) => {
                card.target_audience_type = Some(first);
                outcome.replaced += 1;
                true
            }
            (Some(_), None) => {
                outcome.dropped += 1;
                false
            }
            (None, None) => true,
        });

        if outcome.changed() {
            debug!(
                replaced = outcome.replaced,
                dropped = outcome.dropped,
                "Audience selections reconciled"
            );
        }
        outcome
    }

    /// Whether the form may be submitted under the current subscription.
    pub fn check(&self, form: &IncentiveForm) -> SaveGate {
        if self.options.is_empty() {
            return SaveGate::blocked(GateBlock::NoAudienceAvailable);
        }
        for (index, card) in form.items.iter().enumerate() {
            if let Some(audience) = card.target_audience_type {
                if !self.allows(audience) {
                    return SaveGate::blocked(GateBlock::AudienceUnavailable { index, audience });
                }
            }
        }
        SaveGate::Open
    }
}
