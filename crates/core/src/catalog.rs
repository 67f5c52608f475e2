//! Option catalogs: the static enumerations every incentive selector draws from.
//!
//! Wire values are the exact strings the reward API expects (`TravelAgency`,
//! `PerEconomyClassSegment`, ...). Labels are the English display text shown
//! in the dashboards.

use serde::{Deserialize, Serialize};

// ─── Target Audience ───────────────────────────────────────────────────────

/// Who receives the incentive configured on an audience card.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetAudienceType {
    TravelAgency,
    TravelAgent,
}

impl TargetAudienceType {
    /// Every audience, in selector order.
    pub fn options() -> &'static [TargetAudienceType] {
        &[TargetAudienceType::TravelAgency, TargetAudienceType::TravelAgent]
    }

    pub fn label(&self) -> &'static str {
        match self {
            TargetAudienceType::TravelAgency => "Travel agency",
            TargetAudienceType::TravelAgent => "Travel agent",
        }
    }

    /// Whether this audience is only offered to businesses holding the
    /// travel agency / travel agent subscription.
    pub fn requires_travel_agency_subscription(&self) -> bool {
        matches!(
            self,
            TargetAudienceType::TravelAgency | TargetAudienceType::TravelAgent
        )
    }
}

/// Audience options available under the business's subscription state.
pub fn filtered_audience_options(
    has_active_travel_agency_subscription: bool,
) -> Vec<TargetAudienceType> {
    TargetAudienceType::options()
        .iter()
        .copied()
        .filter(|a| has_active_travel_agency_subscription || !a.requires_travel_agency_subscription())
        .collect()
}

// ─── Incentive Type ────────────────────────────────────────────────────────

/// Shape of the rewards inside an audience card.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum IncentiveType {
    /// Flat or percentage fee per trigger, broken down by booking class.
    #[default]
    Fee,
    /// Stepped reward once volume passes a baseline.
    Threshold,
}

impl IncentiveType {
    pub fn options() -> &'static [IncentiveType] {
        &[IncentiveType::Fee, IncentiveType::Threshold]
    }

    pub fn label(&self) -> &'static str {
        match self {
            IncentiveType::Fee => "Fee",
            IncentiveType::Threshold => "Threshold",
        }
    }
}

// ─── Paid-per Trigger ──────────────────────────────────────────────────────

/// What a fee reward is paid per.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TriggerType {
    BookingClass,
    Ticket,
    Segment,
    Booking,
}

impl TriggerType {
    pub fn options() -> &'static [TriggerType] {
        &[
            TriggerType::BookingClass,
            TriggerType::Ticket,
            TriggerType::Segment,
            TriggerType::Booking,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            TriggerType::BookingClass => "Booking class",
            TriggerType::Ticket => "Ticket",
            TriggerType::Segment => "Flight segment",
            TriggerType::Booking => "Booking",
        }
    }
}

// ─── Value Unit ────────────────────────────────────────────────────────────

/// How a reward value is interpreted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ValueUnit {
    /// Absolute amount in the promo's currency.
    #[default]
    Fixed,
    Percentage,
}

impl ValueUnit {
    pub fn options() -> &'static [ValueUnit] {
        &[ValueUnit::Fixed, ValueUnit::Percentage]
    }

    pub fn label(&self) -> &'static str {
        match self {
            ValueUnit::Fixed => "Fixed amount",
            ValueUnit::Percentage => "Percentage",
        }
    }
}

// ─── Booking Class Segment ─────────────────────────────────────────────────

/// Cabin segment a fee line applies to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BookingClassSegment {
    /// Seed value for freshly appended lines.
    #[default]
    PerEconomyClassSegment,
    PerPremiumEconomyClassSegment,
    PerBusinessClassSegment,
    PerFirstClassSegment,
}

impl BookingClassSegment {
    pub fn options() -> &'static [BookingClassSegment] {
        &[
            BookingClassSegment::PerEconomyClassSegment,
            BookingClassSegment::PerPremiumEconomyClassSegment,
            BookingClassSegment::PerBusinessClassSegment,
            BookingClassSegment::PerFirstClassSegment,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            BookingClassSegment::PerEconomyClassSegment => "Economy class",
            BookingClassSegment::PerPremiumEconomyClassSegment => "Premium economy class",
            BookingClassSegment::PerBusinessClassSegment => "Business class",
            BookingClassSegment::PerFirstClassSegment => "First class",
        }
    }
}

// ─── Loyalty Status (partner track) ────────────────────────────────────────

/// Loyalty status a partnership reward is granted for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LoyaltyStatus {
    Basic,
    Silver,
    Gold,
    Platinum,
}

impl LoyaltyStatus {
    pub fn options() -> &'static [LoyaltyStatus] {
        &[
            LoyaltyStatus::Basic,
            LoyaltyStatus::Silver,
            LoyaltyStatus::Gold,
            LoyaltyStatus::Platinum,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoyaltyStatus::Basic => "Basic",
            LoyaltyStatus::Silver => "Silver",
            LoyaltyStatus::Gold => "Gold",
            LoyaltyStatus::Platinum => "Platinum",
        }
    }
}

/// A selector entry as rendered by the dashboards.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CatalogOption<T> {
    pub value: T,
    pub label: &'static str,
}

impl From<TargetAudienceType> for CatalogOption<TargetAudienceType> {
    fn from(value: TargetAudienceType) -> Self {
        Self {
            value,
            label: value.label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filtered_options_with_subscription() {
        let options = filtered_audience_options(true);
        assert_eq!(
            options,
            vec![TargetAudienceType::TravelAgency, TargetAudienceType::TravelAgent]
        );
    }

    #[test]
    fn test_filtered_options_without_subscription() {
        assert!(filtered_audience_options(false).is_empty());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_value(BookingClassSegment::PerEconomyClassSegment).unwrap(),
            serde_json::json!("PerEconomyClassSegment")
        );
        assert_eq!(
            serde_json::to_value(TargetAudienceType::TravelAgent).unwrap(),
            serde_json::json!("TravelAgent")
        );
        let unit: ValueUnit = serde_json::from_str("\"Percentage\"").unwrap();
        assert_eq!(unit, ValueUnit::Percentage);
    }

    #[test]
    fn test_defaults_are_seed_values() {
        assert_eq!(BookingClassSegment::default(), BookingClassSegment::PerEconomyClassSegment);
        assert_eq!(ValueUnit::default(), ValueUnit::Fixed);
        assert_eq!(IncentiveType::default(), IncentiveType::Fee);
    }
}
