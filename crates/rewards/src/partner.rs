//! Loyalty-status rewards for the partnership track: one value per status,
//! sent as `{type: "Partner", rewards: [...]}`.

use crate::validation::{Checker, ErrorKind, ValidationReport};
use promo_core::catalog::{LoyaltyStatus, ValueUnit};
use promo_core::payload::{ApiPartnerReward, PartnerRewardKind, PartnerRewardsPayload};
use promo_core::{PromoError, PromoResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerRewardRow {
    #[serde(default)]
    pub status: Option<LoyaltyStatus>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub value_type: Option<ValueUnit>,
}

impl PartnerRewardRow {
    pub fn blank() -> Self {
        Self {
            status: None,
            value: Some(0.0),
            value_type: Some(ValueUnit::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerRewardForm {
    #[serde(default)]
    pub rewards: Vec<PartnerRewardRow>,
}

impl Default for PartnerRewardForm {
    fn default() -> Self {
        Self {
            rewards: vec![PartnerRewardRow::blank()],
        }
    }
}

impl PartnerRewardForm {
    pub fn add_row(&mut self) {
        self.rewards.push(PartnerRewardRow::blank());
    }

    pub fn remove_row(&mut self, index: usize) -> PromoResult<PartnerRewardRow> {
        if index >= self.rewards.len() {
            return Err(PromoError::Edit(format!("no partner reward at index {index}")));
        }
        Ok(self.rewards.remove(index))
    }

    /// Validate and build the partner rewards body in one step.
    pub fn to_payload(&self) -> Result<PartnerRewardsPayload, ValidationReport> {
        let mut checker = Checker::default();
        checker.non_empty("rewards", &self.rewards);

        let mut seen = HashSet::new();
        let rows: Vec<Option<ApiPartnerReward>> = self
            .rewards
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let path = format!("rewards[{i}]");
                let status = checker.required(&format!("{path}.status"), row.status);
                if let Some(status) = status {
                    if !seen.insert(status) {
                        checker.push(&format!("{path}.status"), ErrorKind::Duplicate);
                    }
                }
                let value = checker.amount(&format!("{path}.value"), row.value);
                let value_type = checker.required(&format!("{path}.valueType"), row.value_type);
                Some(ApiPartnerReward {
                    status: status?,
                    value: value?,
                    value_type: value_type?,
                })
            })
            .collect();

        let rewards = rows.into_iter().collect::<Option<Vec<_>>>();
        checker.finish(rewards.map(|rewards| PartnerRewardsPayload {
            kind: PartnerRewardKind::Partner,
            rewards,
        }))
    }
}
