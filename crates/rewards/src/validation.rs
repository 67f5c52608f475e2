//! Validation schema for the incentive form.
//!
//! `validate_form` is pure and collects every error in one pass, each keyed
//! by the field path the dashboards bind controls to
//! (`items[0].rewards[1].lines[2].value`). Callers run it on every change so
//! messages can sit next to the offending control.

use crate::form::{
    AudienceCard, FeeRewardBlock, IncentiveForm, RewardBlock, ThresholdRewardBlock, UpperBound,
};
use crate::rules::*;
use serde::Serialize;
use std::fmt;

// ─── Report Types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing value or empty list.
    Required,
    /// Number below zero.
    Min,
    /// NaN or infinite.
    InvalidNumber,
    /// Reward entry tagged differently from its card.
    TypeMismatch,
    /// More entries than the field allows.
    TooMany,
    /// The same option chosen twice in one list.
    Duplicate,
}

impl ErrorKind {
    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::Required => "This field is required",
            ErrorKind::Min => "Must be 0 or greater",
            ErrorKind::InvalidNumber => "Must be a valid number",
            ErrorKind::TypeMismatch => "Reward type must match the incentive type",
            ErrorKind::TooMany => "Only one threshold set is allowed per audience",
            ErrorKind::Duplicate => "Each option can only be used once",
        }
    }
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub path: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Every validation failure found in a form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The error to show under the control bound to `path`, if any.
    pub fn error_for(&self, path: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.path == path)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.first() {
            None => write!(f, "no validation errors"),
            Some(first) => write!(
                f,
                "{} validation error(s), first at {}: {}",
                self.errors.len(),
                first.path,
                first.message
            ),
        }
    }
}

impl std::error::Error for ValidationReport {}

// ─── Checker ───────────────────────────────────────────────────────────────

/// Accumulates field errors while walking a form.
#[derive(Default)]
pub(crate) struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    pub(crate) fn push(&mut self, path: &str, kind: ErrorKind) {
        self.errors.push(FieldError {
            path: path.to_string(),
            kind,
            message: kind.message().to_string(),
        });
    }

    pub(crate) fn required<T: Copy>(&mut self, path: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.push(path, ErrorKind::Required);
        }
        value
    }

    pub(crate) fn amount(&mut self, path: &str, value: Option<f64>) -> Option<f64> {
        let value = self.required(path, value)?;
        self.finite_non_negative(path, value)
    }

    pub(crate) fn finite_non_negative(&mut self, path: &str, value: f64) -> Option<f64> {
        if !value.is_finite() {
            self.push(path, ErrorKind::InvalidNumber);
            None
        } else if value < 0.0 {
            self.push(path, ErrorKind::Min);
            None
        } else {
            Some(value)
        }
    }

    pub(crate) fn non_empty<T>(&mut self, path: &str, items: &[T]) -> bool {
        if items.is_empty() {
            self.push(path, ErrorKind::Required);
            false
        } else {
            true
        }
    }

    pub(crate) fn finish<T>(self, value: Option<T>) -> Result<T, ValidationReport> {
        match value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(ValidationReport {
                errors: self.errors,
            }),
        }
    }
}

// ─── Schema ────────────────────────────────────────────────────────────────

/// Validate the whole form. On success every card is returned as a fully
/// typed rule; on failure the report lists every problem found.
pub fn validate_form(form: &IncentiveForm) -> Result<IncentiveRules, ValidationReport> {
    let mut checker = Checker::default();
    checker.non_empty("items", &form.items);

    let items: Vec<Option<AudienceRule>> = form
        .items
        .iter()
        .enumerate()
        .map(|(i, card)| check_card(&mut checker, &format!("items[{i}]"), card))
        .collect();

    let items = items.into_iter().collect::<Option<Vec<_>>>();
    checker.finish(items.map(|items| IncentiveRules { items }))
}

fn check_card(checker: &mut Checker, path: &str, card: &AudienceCard) -> Option<AudienceRule> {
    let audience = checker.required(
        &format!("{path}.targetAudienceType"),
        card.target_audience_type,
    );

    if card.threshold_sets() > 1 {
        checker.push(&format!("{path}.rewards"), ErrorKind::TooMany);
    }

    let mut rewards = Vec::with_capacity(card.rewards.len());
    let mut complete = true;
    for (j, reward) in card.rewards.iter().enumerate() {
        let reward_path = format!("{path}.rewards[{j}]");
        if reward.kind() != card.incentive_type {
            checker.push(&format!("{reward_path}.type"), ErrorKind::TypeMismatch);
        }
        let rule = match reward {
            RewardBlock::Fee(fee) => check_fee(checker, &reward_path, fee).map(RewardRule::Fee),
            RewardBlock::Threshold(threshold) => {
                check_threshold(checker, &reward_path, threshold).map(RewardRule::Threshold)
            }
        };
        match rule {
            Some(rule) => rewards.push(rule),
            None => complete = false,
        }
    }

    if !complete {
        return None;
    }
    Some(AudienceRule {
        target_audience_type: audience?,
        incentive_type: card.incentive_type,
        rewards,
    })
}

fn check_fee(checker: &mut Checker, path: &str, fee: &FeeRewardBlock) -> Option<FeeRule> {
    let paid_per = checker.required(&format!("{path}.paidPer"), fee.paid_per);
    let has_lines = checker.non_empty(&format!("{path}.lines"), &fee.lines);

    let lines: Vec<Option<FeeLine>> = fee
        .lines
        .iter()
        .enumerate()
        .map(|(k, line)| {
            let line_path = format!("{path}.lines[{k}]");
            let segment = checker.required(&format!("{line_path}.segment"), line.segment);
            let value = checker.amount(&format!("{line_path}.value"), line.value);
            let unit = checker.required(&format!("{line_path}.unit"), line.unit);
            Some(FeeLine {
                segment: segment?,
                value: value?,
                unit: unit?,
            })
        })
        .collect();

    let lines = lines.into_iter().collect::<Option<Vec<_>>>()?;
    if !has_lines {
        return None;
    }
    Some(FeeRule {
        paid_per: paid_per?,
        lines,
    })
}

fn check_threshold(
    checker: &mut Checker,
    path: &str,
    threshold: &ThresholdRewardBlock,
) -> Option<ThresholdRule> {
    let baseline = checker.amount(&format!("{path}.baseline"), threshold.baseline);
    let value = checker.amount(&format!("{path}.value"), threshold.value);
    let value_type = checker.required(&format!("{path}.valueType"), threshold.value_type);
    let has_steps = checker.non_empty(&format!("{path}.thresholds"), &threshold.thresholds);

    let steps: Vec<Option<ThresholdRuleStep>> = threshold
        .thresholds
        .iter()
        .enumerate()
        .map(|(k, step)| {
            let step_path = format!("{path}.thresholds[{k}]");
            let from = checker.amount(&format!("{step_path}.from"), step.from);
            let to = check_upper_bound(checker, &format!("{step_path}.to"), step.to);
            let value = checker.amount(&format!("{step_path}.value"), step.value);
            let unit = checker.required(&format!("{step_path}.unit"), step.unit);
            Some(ThresholdRuleStep {
                from: from?,
                to: to?,
                value: value?,
                unit: unit?,
            })
        })
        .collect();

    let steps = steps.into_iter().collect::<Option<Vec<_>>>()?;
    if !has_steps {
        return None;
    }
    Some(ThresholdRule {
        baseline: baseline?,
        value: value?,
        value_type: value_type?,
        steps,
    })
}

fn check_upper_bound(
    checker: &mut Checker,
    path: &str,
    bound: Option<UpperBound>,
) -> Option<UpperBound> {
    match checker.required(path, bound)? {
        UpperBound::AndMore => Some(UpperBound::AndMore),
        UpperBound::Value(v) => checker.finite_non_negative(path, v).map(UpperBound::Value),
    }
}
