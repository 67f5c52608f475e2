//! Incentive rule builder: the editable reward form, its validation schema,
//! the subscription gate over audience options, and the transformer that
//! turns a validated form into the reward API payload.

pub mod engine;
pub mod form;
pub mod gating;
pub mod partner;
pub mod rules;
pub mod transform;
pub mod validation;

pub use engine::{IncentiveEngine, Rejection};
pub use form::{AudienceCard, IncentiveForm, RewardBlock};
pub use gating::{AudienceGate, GateBlock, SaveGate};
pub use rules::IncentiveRules;
pub use validation::{validate_form, ValidationReport};
