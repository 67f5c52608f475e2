//! Validated rules -> reward API payload, and back.

use crate::form::{
    AudienceCard, FeeRewardBlock, IncentiveForm, RewardBlock, RewardLine, ThresholdRewardBlock,
    ThresholdStep, UpperBound,
};
use crate::rules::{AudienceRule, IncentiveRules, ThresholdRule};
use promo_core::catalog::IncentiveType;
use promo_core::payload::*;

/// Wire value for a threshold upper edge.
pub fn step_limit(bound: UpperBound) -> f64 {
    match bound {
        UpperBound::AndMore => UNBOUNDED_STEP_LIMIT,
        UpperBound::Value(v) => v,
    }
}

/// Map one validated audience to its wire shape.
///
/// Fee cards send every fee block; threshold cards send their threshold set.
/// A card without a reward of its own type carries no reward payload.
pub fn transform_audience(rule: &AudienceRule, business_id: &str) -> ApiReward {
    let mut reward = ApiReward {
        target_audience_type: rule.target_audience_type,
        reward_type: rule.incentive_type,
        fee_rewards: None,
        threshold_reward: None,
    };

    match rule.incentive_type {
        IncentiveType::Fee => {
            reward.fee_rewards = Some(
                rule.fee_rules()
                    .map(|fee| ApiFeeReward {
                        trigger: fee.paid_per,
                        fee_reward_elements: fee
                            .lines
                            .iter()
                            .map(|line| ApiFeeRewardElement {
                                booking_class_segment_type: line.segment,
                                trigger_value: UNSET_TRIGGER_VALUE.to_string(),
                                value: line.value,
                                value_type: line.unit,
                            })
                            .collect(),
                    })
                    .collect(),
            );
        }
        IncentiveType::Threshold => {
            reward.threshold_reward = rule
                .threshold_rule()
                .map(|threshold| transform_threshold(threshold, business_id));
        }
    }
    reward
}

fn transform_threshold(threshold: &ThresholdRule, business_id: &str) -> ApiThresholdReward {
    ApiThresholdReward {
        target_business_id: business_id.to_string(),
        baseline: threshold.baseline,
        value: threshold.value,
        value_type: threshold.value_type,
        steps: threshold
            .steps
            .iter()
            .map(|step| ApiThresholdStep {
                from: step.from,
                to: step_limit(step.to),
                value: step.value,
                value_type: step.unit,
            })
            .collect(),
    }
}

/// Build the `POST /promos/{promoId}/rewards` body.
pub fn transform(rules: &IncentiveRules, business_id: &str) -> ApiIncentivePayload {
    let rewards: Vec<ApiReward> = rules
        .items
        .iter()
        .map(|rule| transform_audience(rule, business_id))
        .collect();
    metrics::counter!("rewards.payload.audiences").increment(rewards.len() as u64);
    ApiIncentivePayload { rewards }
}

// ─── Hydration ─────────────────────────────────────────────────────────────

/// Rebuild an editable card from a payload entry, e.g. when reopening a
/// promo whose rewards were already saved.
pub fn hydrate_audience(reward: &ApiReward) -> AudienceCard {
    let mut rewards = Vec::new();

    for fee in reward.fee_rewards.iter().flatten() {
        rewards.push(RewardBlock::Fee(FeeRewardBlock {
            paid_per: Some(fee.trigger),
            lines: fee
                .fee_reward_elements
                .iter()
                .map(|el| RewardLine {
                    segment: Some(el.booking_class_segment_type),
                    value: Some(el.value),
                    unit: Some(el.value_type),
                })
                .collect(),
        }));
    }

    if let Some(threshold) = &reward.threshold_reward {
        rewards.push(RewardBlock::Threshold(ThresholdRewardBlock {
            baseline: Some(threshold.baseline),
            value: Some(threshold.value),
            value_type: Some(threshold.value_type),
            thresholds: threshold
                .steps
                .iter()
                .map(|step| ThresholdStep {
                    from: Some(step.from),
                    to: Some(if step.to == UNBOUNDED_STEP_LIMIT {
                        UpperBound::AndMore
                    } else {
                        UpperBound::Value(step.to)
                    }),
                    value: Some(step.value),
                    unit: Some(step.value_type),
                })
                .collect(),
        }));
    }

    AudienceCard {
        target_audience_type: Some(reward.target_audience_type),
        incentive_type: reward.reward_type,
        rewards,
    }
}

pub fn hydrate_form(payload: &ApiIncentivePayload) -> IncentiveForm {
    IncentiveForm {
        items: payload.rewards.iter().map(hydrate_audience).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_form;
    use promo_core::catalog::*;
    use serde_json::json;

    const BUSINESS: &str = "biz-7";

    fn payload_for(form: serde_json::Value) -> serde_json::Value {
        let form: IncentiveForm = serde_json::from_value(form).unwrap();
        let rules = validate_form(&form).unwrap();
        serde_json::to_value(transform(&rules, BUSINESS)).unwrap()
    }

    #[test]
    fn test_fee_card_payload() {
        let payload = payload_for(json!({
            "items": [{
                "targetAudienceType": "TravelAgency",
                "incentiveType": "Fee",
                "rewards": [{
                    "type": "Fee",
                    "paidPer": "BookingClass",
                    "lines": [{"segment": "PerEconomyClassSegment", "value": 10, "unit": "Fixed"}]
                }]
            }]
        }));

        assert_eq!(
            payload,
            json!({
                "rewards": [{
                    "targetAudienceType": "TravelAgency",
                    "rewardType": "Fee",
                    "feeRewards": [{
                        "trigger": "BookingClass",
                        "feeRewardElements": [{
                            "bookingClassSegmentType": "PerEconomyClassSegment",
                            "triggerValue": "",
                            "value": 10,
                            "valueType": "Fixed"
                        }]
                    }]
                }]
            })
        );
    }

    #[test]
    fn test_threshold_card_payload_with_unbounded_top_step() {
        let payload = payload_for(json!({
            "items": [{
                "targetAudienceType": "TravelAgent",
                "incentiveType": "Threshold",
                "rewards": [{
                    "type": "Threshold",
                    "baseline": 50,
                    "value": 3,
                    "valueType": "Percentage",
                    "thresholds": [
                        {"from": 0, "to": 100, "value": 5, "unit": "Fixed"},
                        {"from": 100, "to": "AND_MORE", "value": 8, "unit": "Fixed"}
                    ]
                }]
            }]
        }));

        let threshold = &payload["rewards"][0]["thresholdReward"];
        assert_eq!(threshold["targetBusinessId"], json!(BUSINESS));
        assert_eq!(threshold["baseline"], json!(50));
        assert_eq!(threshold["valueType"], json!("Percentage"));
        assert_eq!(
            threshold["steps"],
            json!([
                {"from": 0, "to": 100, "value": 5, "valueType": "Fixed"},
                {"from": 100, "to": 999999, "value": 8, "valueType": "Fixed"}
            ])
        );
        assert!(payload["rewards"][0].get("feeRewards").is_none());
    }

    #[test]
    fn test_step_limit_passes_numbers_through() {
        assert_eq!(step_limit(UpperBound::AndMore), 999_999.0);
        assert_eq!(step_limit(UpperBound::Value(0.0)), 0.0);
        assert_eq!(step_limit(UpperBound::Value(42.5)), 42.5);
    }

    #[test]
    fn test_multiple_fee_blocks_each_emitted() {
        let payload = payload_for(json!({
            "items": [{
                "targetAudienceType": "TravelAgency",
                "incentiveType": "Fee",
                "rewards": [
                    {"type": "Fee", "paidPer": "Ticket",
                     "lines": [{"segment": "PerBusinessClassSegment", "value": 1.5, "unit": "Percentage"}]},
                    {"type": "Fee", "paidPer": "Segment",
                     "lines": [{"segment": "PerFirstClassSegment", "value": 20, "unit": "Fixed"}]}
                ]
            }]
        }));
        let fee = payload["rewards"][0]["feeRewards"].as_array().unwrap();
        assert_eq!(fee.len(), 2);
        assert_eq!(fee[0]["trigger"], json!("Ticket"));
        assert_eq!(fee[0]["feeRewardElements"][0]["value"], json!(1.5));
        assert_eq!(fee[1]["trigger"], json!("Segment"));
    }

    #[test]
    fn test_card_without_rewards_degrades_to_bare_entry() {
        let payload = payload_for(json!({
            "items": [{
                "targetAudienceType": "TravelAgent",
                "incentiveType": "Threshold",
                "rewards": []
            }]
        }));
        assert_eq!(
            payload,
            json!({"rewards": [{"targetAudienceType": "TravelAgent", "rewardType": "Threshold"}]})
        );
    }

    #[test]
    fn test_fee_lines_survive_round_trip() {
        let form: IncentiveForm = serde_json::from_value(json!({
            "items": [{
                "targetAudienceType": "TravelAgency",
                "incentiveType": "Fee",
                "rewards": [{
                    "type": "Fee",
                    "paidPer": "BookingClass",
                    "lines": [
                        {"segment": "PerFirstClassSegment", "value": 40, "unit": "Fixed"},
                        {"segment": "PerEconomyClassSegment", "value": 2.5, "unit": "Percentage"},
                        {"segment": "PerBusinessClassSegment", "value": 0, "unit": "Fixed"}
                    ]
                }]
            }]
        }))
        .unwrap();

        let rules = validate_form(&form).unwrap();
        let rebuilt = hydrate_form(&transform(&rules, BUSINESS));
        assert_eq!(rebuilt, form);
    }

    #[test]
    fn test_threshold_hydration_restores_sentinel() {
        let reward = ApiReward {
            target_audience_type: TargetAudienceType::TravelAgent,
            reward_type: IncentiveType::Threshold,
            fee_rewards: None,
            threshold_reward: Some(ApiThresholdReward {
                target_business_id: BUSINESS.to_string(),
                baseline: 0.0,
                value: 1.0,
                value_type: ValueUnit::Fixed,
                steps: vec![ApiThresholdStep {
                    from: 10.0,
                    to: UNBOUNDED_STEP_LIMIT,
                    value: 2.0,
                    value_type: ValueUnit::Fixed,
                }],
            }),
        };
        let card = hydrate_audience(&reward);
        match &card.rewards[0] {
            RewardBlock::Threshold(t) => {
                assert_eq!(t.thresholds[0].to, Some(UpperBound::AndMore))
            }
            other => panic!("expected threshold block, got {other:?}"),
        }
    }

    #[test]
    fn test_large_upper_edge_survives_round_trip() {
        let payload = payload_for(json!({
            "items": [{
                "targetAudienceType": "TravelAgency",
                "incentiveType": "Threshold",
                "rewards": [{
                    "type": "Threshold",
                    "baseline": 0,
                    "value": 1,
                    "valueType": "Fixed",
                    "thresholds": [
                        {"from": 0, "to": 2000000, "value": 1, "unit": "Fixed"},
                        {"from": 2000000, "to": "AND_MORE", "value": 2, "unit": "Fixed"}
                    ]
                }]
            }]
        }));
        let first: ApiIncentivePayload = serde_json::from_value(payload).unwrap();

        let form = hydrate_form(&first);
        match &form.items[0].rewards[0] {
            RewardBlock::Threshold(t) => {
                assert_eq!(t.thresholds[0].to, Some(UpperBound::Value(2_000_000.0)));
                assert_eq!(t.thresholds[1].to, Some(UpperBound::AndMore));
            }
            other => panic!("expected threshold block, got {other:?}"),
        }

        let second = transform(&validate_form(&form).unwrap(), BUSINESS);
        assert_eq!(second, first);
    }
}
