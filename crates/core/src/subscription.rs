//! Business subscription records as returned by the plans/subscriptions endpoints.

use serde::{Deserialize, Serialize};

/// A plan a business can subscribe to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPlan {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A business's subscription to a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSubscription {
    pub id: String,
    pub plan_id: String,
    #[serde(default)]
    pub start_date: Option<String>,
    /// Set once the subscription has been activated with a paid period.
    #[serde(default)]
    pub end_date: Option<String>,
}

impl BusinessSubscription {
    pub fn is_active(&self) -> bool {
        self.end_date.is_some()
    }
}
