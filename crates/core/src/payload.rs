//! Wire payloads accepted by the reward API.
//!
//! These mirror the backend contract field for field; building them from a
//! form is the transformer's job in `promo-rewards`.

use crate::catalog::{
    BookingClassSegment, IncentiveType, LoyaltyStatus, TargetAudienceType, TriggerType, ValueUnit,
};
use serde::{Deserialize, Serialize};

/// Integer the API uses for an unbounded threshold upper edge.
pub const UNBOUNDED_STEP_LIMIT: f64 = 999_999.0;

/// `triggerValue` sent on every fee element. The API accepts an empty
/// string; nothing in the form captures a value for it yet.
pub const UNSET_TRIGGER_VALUE: &str = "";

// ─── Promo Rewards ─────────────────────────────────────────────────────────

/// Body of `POST /promos/{promoId}/rewards`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiIncentivePayload {
    pub rewards: Vec<ApiReward>,
}

/// One audience card on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReward {
    pub target_audience_type: TargetAudienceType,
    pub reward_type: IncentiveType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_rewards: Option<Vec<ApiFeeReward>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_reward: Option<ApiThresholdReward>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFeeReward {
    pub trigger: TriggerType,
    pub fee_reward_elements: Vec<ApiFeeRewardElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFeeRewardElement {
    pub booking_class_segment_type: BookingClassSegment,
    pub trigger_value: String,
    #[serde(with = "number")]
    pub value: f64,
    pub value_type: ValueUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiThresholdReward {
    pub target_business_id: String,
    #[serde(with = "number")]
    pub baseline: f64,
    #[serde(with = "number")]
    pub value: f64,
    pub value_type: ValueUnit,
    pub steps: Vec<ApiThresholdStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiThresholdStep {
    #[serde(with = "number")]
    pub from: f64,
    #[serde(with = "number")]
    pub to: f64,
    #[serde(with = "number")]
    pub value: f64,
    pub value_type: ValueUnit,
}

// ─── Partner Rewards ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartnerRewardKind {
    #[default]
    Partner,
}

/// Body of `POST /promos/{promoId}/partner-rewards`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerRewardsPayload {
    #[serde(rename = "type")]
    pub kind: PartnerRewardKind,
    pub rewards: Vec<ApiPartnerReward>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPartnerReward {
    pub status: LoyaltyStatus,
    #[serde(with = "number")]
    pub value: f64,
    pub value_type: ValueUnit,
}

/// Whole numbers go out as JSON integers (`10`, not `10.0`), matching what
/// the API receives from the browser client.
pub mod number {
    use serde::{Deserialize, Deserializer, Serializer};

    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
            serializer.serialize_i64(*value as i64)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        f64::deserialize(deserializer)
    }
}
