//! Wizard API router: mounts the wizard endpoints under /api/v1/wizard.

use crate::handlers::{self, WizardState};
use axum::routing::{delete, get, post};
use axum::Router;

/// Build the wizard router. Returns a Router that should be merged into the
/// main app.
pub fn wizard_router(state: WizardState) -> Router {
    Router::new()
        // Catalog
        .route("/api/v1/wizard/audience-options", get(handlers::audience_options))
        // Incentives
        .route(
            "/api/v1/wizard/promos/:promo_id/incentives",
            get(handlers::get_incentives).put(handlers::save_incentives),
        )
        .route(
            "/api/v1/wizard/promos/:promo_id/incentives/preview",
            post(handlers::preview_incentives),
        )
        .route(
            "/api/v1/wizard/promos/:promo_id/incentives/submit",
            post(handlers::submit_incentives),
        )
        // Partner rewards
        .route(
            "/api/v1/wizard/promos/:promo_id/partner-rewards/submit",
            post(handlers::submit_partner_rewards),
        )
        // Drafts
        .route(
            "/api/v1/wizard/promos/:promo_id",
            delete(handlers::complete_later),
        )
        .with_state(state)
}
