//! Axum REST handlers for the promo wizard API.

use crate::step::{DraftStatus, IncentiveStep, StepView, SubmitError, SubmitOutcome};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use promo_core::catalog::{CatalogOption, TargetAudienceType};
use promo_core::payload::{ApiIncentivePayload, PartnerRewardsPayload};
use promo_rewards::partner::PartnerRewardForm;
use promo_rewards::{IncentiveForm, ValidationReport};
use serde::Serialize;
use std::sync::Arc;

/// Shared wizard state.
#[derive(Clone)]
pub struct WizardState {
    pub step: Arc<IncentiveStep>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: SubmitError) -> ApiError {
    let message = err.to_string();
    let (status, error, message, validation) = match err {
        SubmitError::Invalid(report) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_failed",
            message,
            Some(report),
        ),
        SubmitError::Gated(block) => (StatusCode::CONFLICT, "save_disabled", block.tooltip(), None),
        SubmitError::Api { message, .. } => {
            (StatusCode::BAD_GATEWAY, "reward_api_error", message, None)
        }
        SubmitError::Storage(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "storage_error",
            message,
            None,
        ),
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            message,
            validation,
        }),
    )
}

// ─── Catalog ───────────────────────────────────────────────────────────────

pub async fn audience_options(
    State(state): State<WizardState>,
) -> Json<Vec<CatalogOption<TargetAudienceType>>> {
    Json(state.step.audience_options().await)
}

// ─── Incentives ────────────────────────────────────────────────────────────

pub async fn get_incentives(
    State(state): State<WizardState>,
    Path(promo_id): Path<String>,
) -> Result<Json<StepView>, ApiError> {
    state.step.open(&promo_id).await.map(Json).map_err(error_response)
}

pub async fn save_incentives(
    State(state): State<WizardState>,
    Path(promo_id): Path<String>,
    Json(form): Json<IncentiveForm>,
) -> Result<Json<DraftStatus>, ApiError> {
    state
        .step
        .save_draft(&promo_id, form)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn preview_incentives(
    State(state): State<WizardState>,
    Path(_promo_id): Path<String>,
    Json(form): Json<IncentiveForm>,
) -> Result<Json<ApiIncentivePayload>, ApiError> {
    state.step.preview(&form).await.map(Json).map_err(error_response)
}

/// An empty body submits the saved draft. A body that is present must be a
/// well-formed form; it is never swapped for the draft.
pub async fn submit_incentives(
    State(state): State<WizardState>,
    Path(promo_id): Path<String>,
    body: Bytes,
) -> Result<Json<SubmitOutcome<ApiIncentivePayload>>, ApiError> {
    let form = parse_optional_form(&body)?;
    let outcome = state
        .step
        .submit(&promo_id, form)
        .await
        .map_err(error_response)?;
    Ok(Json(outcome))
}

fn parse_optional_form(body: &[u8]) -> Result<Option<IncentiveForm>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map(Some).map_err(|e| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: "invalid_body".to_string(),
                message: e.to_string(),
                validation: None,
            }),
        )
    })
}

// ─── Partner rewards ───────────────────────────────────────────────────────

pub async fn submit_partner_rewards(
    State(state): State<WizardState>,
    Path(promo_id): Path<String>,
    Json(form): Json<PartnerRewardForm>,
) -> Result<Json<SubmitOutcome<PartnerRewardsPayload>>, ApiError> {
    state
        .step
        .submit_partner(&promo_id, form)
        .await
        .map(Json)
        .map_err(error_response)
}

// ─── Drafts ────────────────────────────────────────────────────────────────

pub async fn complete_later(
    State(state): State<WizardState>,
    Path(promo_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.step.complete_later(&promo_id).map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}
