//! Editable incentive form: the state an operator mutates while configuring
//! a promo's rewards.
//!
//! Fields the schema marks as required are `Option`s here so a blank control
//! is representable; `validation::validate_form` turns a complete form into
//! `IncentiveRules`.

use promo_core::catalog::{
    BookingClassSegment, IncentiveType, TargetAudienceType, TriggerType, ValueUnit,
};
use promo_core::{PromoError, PromoResult};
use serde::{Deserialize, Serialize};

/// Wire/form spelling of an unbounded threshold upper edge.
pub const AND_MORE: &str = "AND_MORE";

// ─── Upper Bound ───────────────────────────────────────────────────────────

/// Upper edge of a threshold step: a number, or `"AND_MORE"` for no limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawUpperBound", into = "RawUpperBound")]
pub enum UpperBound {
    Value(f64),
    AndMore,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawUpperBound {
    Number(f64),
    Text(String),
}

impl TryFrom<RawUpperBound> for UpperBound {
    type Error = String;

    fn try_from(raw: RawUpperBound) -> Result<Self, Self::Error> {
        match raw {
            RawUpperBound::Number(n) => Ok(UpperBound::Value(n)),
            RawUpperBound::Text(s) if s == AND_MORE => Ok(UpperBound::AndMore),
            // Number inputs arrive as text from some clients.
            RawUpperBound::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(UpperBound::Value)
                .map_err(|_| format!("expected a number or \"{AND_MORE}\", got \"{s}\"")),
        }
    }
}

impl From<UpperBound> for RawUpperBound {
    fn from(bound: UpperBound) -> Self {
        match bound {
            UpperBound::Value(n) => RawUpperBound::Number(n),
            UpperBound::AndMore => RawUpperBound::Text(AND_MORE.to_string()),
        }
    }
}

// ─── Lines & Steps ─────────────────────────────────────────────────────────

/// One booking-class line of a fee reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardLine {
    #[serde(default)]
    pub segment: Option<BookingClassSegment>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub unit: Option<ValueUnit>,
}

impl RewardLine {
    pub fn blank() -> Self {
        Self {
            segment: Some(BookingClassSegment::default()),
            value: Some(0.0),
            unit: Some(ValueUnit::default()),
        }
    }
}

/// One step of a threshold reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdStep {
    #[serde(default)]
    pub from: Option<f64>,
    #[serde(default)]
    pub to: Option<UpperBound>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub unit: Option<ValueUnit>,
}

impl ThresholdStep {
    pub fn blank() -> Self {
        Self {
            from: Some(0.0),
            to: Some(UpperBound::Value(0.0)),
            value: Some(0.0),
            unit: Some(ValueUnit::default()),
        }
    }
}

// ─── Reward Blocks ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRewardBlock {
    #[serde(default)]
    pub paid_per: Option<TriggerType>,
    #[serde(default)]
    pub lines: Vec<RewardLine>,
}

impl FeeRewardBlock {
    pub fn blank() -> Self {
        Self {
            paid_per: None,
            lines: vec![RewardLine::blank()],
        }
    }

    pub fn add_line(&mut self) {
        self.lines.push(RewardLine::blank());
    }

    pub fn remove_line(&mut self, index: usize) -> PromoResult<RewardLine> {
        remove_at(&mut self.lines, index, "reward line")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdRewardBlock {
    #[serde(default)]
    pub baseline: Option<f64>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub value_type: Option<ValueUnit>,
    #[serde(default)]
    pub thresholds: Vec<ThresholdStep>,
}

impl ThresholdRewardBlock {
    pub fn blank() -> Self {
        Self {
            baseline: Some(0.0),
            value: Some(0.0),
            value_type: Some(ValueUnit::default()),
            thresholds: vec![ThresholdStep::blank()],
        }
    }

    pub fn add_step(&mut self) {
        self.thresholds.push(ThresholdStep::blank());
    }

    pub fn remove_step(&mut self, index: usize) -> PromoResult<ThresholdStep> {
        remove_at(&mut self.thresholds, index, "threshold step")
    }
}

/// A reward entry inside an audience card, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RewardBlock {
    Fee(FeeRewardBlock),
    Threshold(ThresholdRewardBlock),
}

impl RewardBlock {
    pub fn blank(kind: IncentiveType) -> Self {
        match kind {
            IncentiveType::Fee => RewardBlock::Fee(FeeRewardBlock::blank()),
            IncentiveType::Threshold => RewardBlock::Threshold(ThresholdRewardBlock::blank()),
        }
    }

    pub fn kind(&self) -> IncentiveType {
        match self {
            RewardBlock::Fee(_) => IncentiveType::Fee,
            RewardBlock::Threshold(_) => IncentiveType::Threshold,
        }
    }

    /// Re-shape this entry as `kind`. Entries already of that kind come back
    /// unchanged; converted entries keep the value and unit the operator
    /// entered (first fee line <-> threshold value/valueType).
    pub fn retag(self, kind: IncentiveType) -> Self {
        match (self, kind) {
            (block @ RewardBlock::Fee(_), IncentiveType::Fee)
            | (block @ RewardBlock::Threshold(_), IncentiveType::Threshold) => block,
            (RewardBlock::Fee(fee), IncentiveType::Threshold) => {
                let mut threshold = ThresholdRewardBlock::blank();
                if let Some(line) = fee.lines.first() {
                    threshold.value = line.value;
                    threshold.value_type = line.unit;
                }
                RewardBlock::Threshold(threshold)
            }
            (RewardBlock::Threshold(threshold), IncentiveType::Fee) => {
                RewardBlock::Fee(FeeRewardBlock {
                    paid_per: None,
                    lines: vec![RewardLine {
                        segment: Some(BookingClassSegment::default()),
                        value: threshold.value,
                        unit: threshold.value_type,
                    }],
                })
            }
        }
    }

    pub fn as_fee_mut(&mut self) -> Option<&mut FeeRewardBlock> {
        match self {
            RewardBlock::Fee(fee) => Some(fee),
            RewardBlock::Threshold(_) => None,
        }
    }

    pub fn as_threshold_mut(&mut self) -> Option<&mut ThresholdRewardBlock> {
        match self {
            RewardBlock::Threshold(threshold) => Some(threshold),
            RewardBlock::Fee(_) => None,
        }
    }
}

/// Rewrite every reward's discriminant to `kind`. The entry count never changes.
pub fn retag(rewards: Vec<RewardBlock>, kind: IncentiveType) -> Vec<RewardBlock> {
    rewards.into_iter().map(|r| r.retag(kind)).collect()
}

// ─── Audience Card ─────────────────────────────────────────────────────────

/// One (audience, incentive type, rewards) record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudienceCard {
    #[serde(default)]
    pub target_audience_type: Option<TargetAudienceType>,
    #[serde(default)]
    pub incentive_type: IncentiveType,
    #[serde(default)]
    pub rewards: Vec<RewardBlock>,
}

impl AudienceCard {
    pub fn blank(kind: IncentiveType) -> Self {
        Self {
            target_audience_type: None,
            incentive_type: kind,
            rewards: vec![RewardBlock::blank(kind)],
        }
    }

    /// Switch the card's incentive type, retagging every reward to match.
    /// The audience selection is kept.
    pub fn set_incentive_type(&mut self, kind: IncentiveType) {
        let rewards = std::mem::take(&mut self.rewards);
        self.rewards = retag(rewards, kind);
        self.incentive_type = kind;
    }

    /// Append a defaulted reward block of the card's type. A card holds at
    /// most one threshold set.
    pub fn add_reward(&mut self) -> PromoResult<()> {
        if self.incentive_type == IncentiveType::Threshold && self.threshold_sets() > 0 {
            return Err(PromoError::Edit(
                "only one threshold set is allowed per audience".to_string(),
            ));
        }
        self.rewards.push(RewardBlock::blank(self.incentive_type));
        Ok(())
    }

    pub fn remove_reward(&mut self, index: usize) -> PromoResult<RewardBlock> {
        remove_at(&mut self.rewards, index, "reward")
    }

    pub fn reward_mut(&mut self, index: usize) -> PromoResult<&mut RewardBlock> {
        self.rewards
            .get_mut(index)
            .ok_or_else(|| PromoError::Edit(format!("no reward at index {index}")))
    }

    pub fn threshold_sets(&self) -> usize {
        self.rewards
            .iter()
            .filter(|r| r.kind() == IncentiveType::Threshold)
            .count()
    }
}

// ─── Incentive Form ────────────────────────────────────────────────────────

/// All audience cards configured for one promo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncentiveForm {
    #[serde(default)]
    pub items: Vec<AudienceCard>,
}

impl Default for IncentiveForm {
    /// A fresh form starts with one blank Fee card.
    fn default() -> Self {
        Self {
            items: vec![AudienceCard::blank(IncentiveType::Fee)],
        }
    }
}

impl IncentiveForm {
    pub fn add_card(&mut self) {
        self.items.push(AudienceCard::blank(IncentiveType::Fee));
    }

    pub fn remove_card(&mut self, index: usize) -> PromoResult<AudienceCard> {
        remove_at(&mut self.items, index, "audience card")
    }

    pub fn card_mut(&mut self, index: usize) -> PromoResult<&mut AudienceCard> {
        self.items
            .get_mut(index)
            .ok_or_else(|| PromoError::Edit(format!("no audience card at index {index}")))
    }

    pub fn set_incentive_type(&mut self, index: usize, kind: IncentiveType) -> PromoResult<()> {
        self.card_mut(index)?.set_incentive_type(kind);
        Ok(())
    }
}

fn remove_at<T>(items: &mut Vec<T>, index: usize, what: &str) -> PromoResult<T> {
    if index >= items.len() {
        return Err(PromoError::Edit(format!(
            "no {what} at index {index} (have {})",
            items.len()
        )));
    }
    Ok(items.remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fee_line(value: f64, unit: ValueUnit) -> RewardLine {
        RewardLine {
            segment: Some(BookingClassSegment::PerBusinessClassSegment),
            value: Some(value),
            unit: Some(unit),
        }
    }

    #[test]
    fn test_default_form_has_one_blank_fee_card() {
        let form = IncentiveForm::default();
        assert_eq!(form.items.len(), 1);
        let card = &form.items[0];
        assert_eq!(card.incentive_type, IncentiveType::Fee);
        assert!(card.target_audience_type.is_none());
        assert_eq!(card.rewards.len(), 1);
        match &card.rewards[0] {
            RewardBlock::Fee(fee) => assert_eq!(fee.lines, vec![RewardLine::blank()]),
            other => panic!("expected fee block, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_line_seeds_safe_defaults() {
        let line = RewardLine::blank();
        assert_eq!(line.segment, Some(BookingClassSegment::PerEconomyClassSegment));
        assert_eq!(line.value, Some(0.0));
        assert_eq!(line.unit, Some(ValueUnit::Fixed));
    }

    #[test]
    fn test_retag_rewrites_every_entry_and_keeps_count() {
        let mut card = AudienceCard::blank(IncentiveType::Fee);
        card.target_audience_type = Some(TargetAudienceType::TravelAgent);
        card.add_reward().unwrap();
        card.add_reward().unwrap();

        card.set_incentive_type(IncentiveType::Threshold);
        assert_eq!(card.rewards.len(), 3);
        assert!(card.rewards.iter().all(|r| r.kind() == IncentiveType::Threshold));
        assert_eq!(card.target_audience_type, Some(TargetAudienceType::TravelAgent));

        card.set_incentive_type(IncentiveType::Fee);
        assert_eq!(card.rewards.len(), 3);
        assert!(card.rewards.iter().all(|r| r.kind() == IncentiveType::Fee));
    }

    #[test]
    fn test_retag_carries_entered_values() {
        let rewards = vec![RewardBlock::Fee(FeeRewardBlock {
            paid_per: Some(TriggerType::Ticket),
            lines: vec![fee_line(12.5, ValueUnit::Percentage)],
        })];
        let retagged = retag(rewards, IncentiveType::Threshold);
        match &retagged[0] {
            RewardBlock::Threshold(t) => {
                assert_eq!(t.value, Some(12.5));
                assert_eq!(t.value_type, Some(ValueUnit::Percentage));
                assert_eq!(t.thresholds.len(), 1);
            }
            other => panic!("expected threshold block, got {other:?}"),
        }

        let back = retag(retagged, IncentiveType::Fee);
        match &back[0] {
            RewardBlock::Fee(fee) => {
                assert_eq!(fee.lines[0].value, Some(12.5));
                assert_eq!(fee.lines[0].unit, Some(ValueUnit::Percentage));
            }
            other => panic!("expected fee block, got {other:?}"),
        }
    }

    #[test]
    fn test_retag_same_type_is_identity() {
        let block = RewardBlock::Fee(FeeRewardBlock {
            paid_per: Some(TriggerType::BookingClass),
            lines: vec![fee_line(3.0, ValueUnit::Fixed), fee_line(4.0, ValueUnit::Fixed)],
        });
        let out = retag(vec![block.clone()], IncentiveType::Fee);
        assert_eq!(out, vec![block]);
    }

    #[test]
    fn test_threshold_sets_capped_at_one() {
        let mut card = AudienceCard::blank(IncentiveType::Threshold);
        assert!(matches!(card.add_reward(), Err(PromoError::Edit(_))));
        assert_eq!(card.rewards.len(), 1);

        card.remove_reward(0).unwrap();
        card.add_reward().unwrap();
        assert_eq!(card.threshold_sets(), 1);
    }

    #[test]
    fn test_remove_out_of_range_is_error() {
        let mut form = IncentiveForm::default();
        assert!(form.remove_card(3).is_err());
        let fee = form.card_mut(0).unwrap().reward_mut(0).unwrap().as_fee_mut().unwrap();
        fee.add_line();
        assert_eq!(fee.lines.len(), 2);
        fee.remove_line(0).unwrap();
        assert!(fee.remove_line(1).is_err());
        assert_eq!(fee.lines.len(), 1);
    }

    #[test]
    fn test_form_json_shape() {
        let form: IncentiveForm = serde_json::from_value(json!({
            "items": [{
                "targetAudienceType": "TravelAgency",
                "incentiveType": "Threshold",
                "rewards": [{
                    "type": "Threshold",
                    "baseline": 0,
                    "value": 5,
                    "valueType": "Fixed",
                    "thresholds": [
                        {"from": 0, "to": 100, "value": 5, "unit": "Fixed"},
                        {"from": 100, "to": "AND_MORE", "value": 8, "unit": "Fixed"}
                    ]
                }]
            }]
        }))
        .unwrap();

        let card = &form.items[0];
        assert_eq!(card.incentive_type, IncentiveType::Threshold);
        match &card.rewards[0] {
            RewardBlock::Threshold(t) => {
                assert_eq!(t.thresholds[0].to, Some(UpperBound::Value(100.0)));
                assert_eq!(t.thresholds[1].to, Some(UpperBound::AndMore));
            }
            other => panic!("expected threshold block, got {other:?}"),
        }

        let out = serde_json::to_value(&form).unwrap();
        assert_eq!(out["items"][0]["rewards"][0]["thresholds"][1]["to"], json!("AND_MORE"));
        assert_eq!(out["items"][0]["rewards"][0]["type"], json!("Threshold"));
    }

    #[test]
    fn test_upper_bound_accepts_numeric_text() {
        let step: ThresholdStep =
            serde_json::from_value(json!({"from": 0, "to": "250", "value": 1, "unit": "Fixed"}))
                .unwrap();
        assert_eq!(step.to, Some(UpperBound::Value(250.0)));

        let bad = serde_json::from_value::<ThresholdStep>(json!({"to": "lots"}));
        assert!(bad.is_err());
    }
}
