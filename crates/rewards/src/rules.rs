//! Validated incentive rules. Every required field is present and every
//! number is finite and non-negative; only `validation::validate_form`
//! builds these.

use crate::form::UpperBound;
use promo_core::catalog::{
    BookingClassSegment, IncentiveType, TargetAudienceType, TriggerType, ValueUnit,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncentiveRules {
    pub items: Vec<AudienceRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudienceRule {
    pub target_audience_type: TargetAudienceType,
    pub incentive_type: IncentiveType,
    pub rewards: Vec<RewardRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum RewardRule {
    Fee(FeeRule),
    Threshold(ThresholdRule),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRule {
    pub paid_per: TriggerType,
    pub lines: Vec<FeeLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeeLine {
    pub segment: BookingClassSegment,
    pub value: f64,
    pub unit: ValueUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdRule {
    pub baseline: f64,
    pub value: f64,
    pub value_type: ValueUnit,
    pub steps: Vec<ThresholdRuleStep>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdRuleStep {
    pub from: f64,
    pub to: UpperBound,
    pub value: f64,
    pub unit: ValueUnit,
}

impl AudienceRule {
    pub fn fee_rules(&self) -> impl Iterator<Item = &FeeRule> {
        self.rewards.iter().filter_map(|r| match r {
            RewardRule::Fee(fee) => Some(fee),
            RewardRule::Threshold(_) => None,
        })
    }

    /// The threshold set this audience is paid by. Cards carry at most one.
    pub fn threshold_rule(&self) -> Option<&ThresholdRule> {
        self.rewards.iter().find_map(|r| match r {
            RewardRule::Threshold(threshold) => Some(threshold),
            RewardRule::Fee(_) => None,
        })
    }
}
