//! Reward API client.
//!
//! `RewardsBackend` is the seam between the wizard and the upstream API:
//! `HttpRewardsBackend` talks to it over HTTP, `MemoryRewardsBackend` stands
//! in for it in development and tests.

use async_trait::async_trait;
use dashmap::DashMap;
use promo_core::config::BackendConfig;
use promo_core::payload::{ApiIncentivePayload, PartnerRewardsPayload};
use promo_core::subscription::{BusinessSubscription, SubscriptionPlan};
use reqwest::header::{ACCEPT_LANGUAGE, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Shown when the API gives no usable message.
pub const FALLBACK_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BackendError {
    /// Message fit for the operator notification.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Api { message, .. } => message.clone(),
            _ => FALLBACK_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Api { status, .. } => Some(*status),
            BackendError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Build an API error from a failed response body.
    pub fn from_body(status: u16, body: &Value) -> Self {
        BackendError::Api {
            status,
            message: extract_error_message(body)
                .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string()),
        }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// First human-readable message in an error body: the first entry of the
/// first field under `errors`, else `message`. Later fields are never
/// consulted.
pub fn extract_error_message(body: &Value) -> Option<String> {
    let from_errors = match body.get("errors") {
        Some(Value::Object(fields)) => fields.values().next().and_then(first_string),
        Some(list @ Value::Array(_)) => first_string(list),
        _ => None,
    };
    from_errors.or_else(|| {
        body.get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
    })
}

fn first_string(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.first().and_then(Value::as_str).map(str::to_string),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// List endpoints answer either with a bare array or with `{ "data": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Wrapped { data: Vec<T> },
    Bare(Vec<T>),
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Wrapped { data } => data,
            Listing::Bare(items) => items,
        }
    }
}

// ─── Port ──────────────────────────────────────────────────────────────────

#[async_trait]
pub trait RewardsBackend: Send + Sync {
    async fn subscription_plans(
        &self,
        business_id: &str,
        language: &str,
    ) -> BackendResult<Vec<SubscriptionPlan>>;

    async fn subscriptions(
        &self,
        business_id: &str,
        language: &str,
    ) -> BackendResult<Vec<BusinessSubscription>>;

    async fn update_promo_rewards(
        &self,
        promo_id: &str,
        payload: &ApiIncentivePayload,
    ) -> BackendResult<()>;

    async fn update_partner_promo_rewards(
        &self,
        promo_id: &str,
        payload: &PartnerRewardsPayload,
    ) -> BackendResult<()>;
}

// ─── HTTP ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HttpRewardsBackend {
    client: reqwest::Client,
    base_url: String,
    language: String,
    token: Option<String>,
}

impl HttpRewardsBackend {
    pub fn new(config: &BackendConfig) -> BackendResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        info!(base_url = %config.base_url, "Reward API client initialized");
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
            token: config.access_token.clone(),
        })
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .client
            .request(method, url)
            .header(ACCEPT_LANGUAGE, &self.language);
        if let Some(token) = &self.token {
            req = req.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        req
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str, language: &str) -> BackendResult<Vec<T>> {
        let resp = self
            .request(reqwest::Method::GET, path)
            .query(&[("lang", language)])
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        let listing: Listing<T> = resp
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        Ok(listing.into_vec())
    }

    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> BackendResult<()> {
        let resp = self
            .request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn check(resp: reqwest::Response) -> BackendResult<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let text = resp.text().await.unwrap_or_default();
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::Null);
        debug!(status = status.as_u16(), body = %text, "Reward API request failed");
        Err(BackendError::from_body(status.as_u16(), &body))
    }
}

#[async_trait]
impl RewardsBackend for HttpRewardsBackend {
    async fn subscription_plans(
        &self,
        business_id: &str,
        language: &str,
    ) -> BackendResult<Vec<SubscriptionPlan>> {
        self.get_list(&format!("/businesses/{business_id}/subscription-plans"), language)
            .await
    }

    async fn subscriptions(
        &self,
        business_id: &str,
        language: &str,
    ) -> BackendResult<Vec<BusinessSubscription>> {
        self.get_list(&format!("/businesses/{business_id}/subscriptions"), language)
            .await
    }

    async fn update_promo_rewards(
        &self,
        promo_id: &str,
        payload: &ApiIncentivePayload,
    ) -> BackendResult<()> {
        self.post(&format!("/promos/{promo_id}/rewards"), payload).await
    }

    async fn update_partner_promo_rewards(
        &self,
        promo_id: &str,
        payload: &PartnerRewardsPayload,
    ) -> BackendResult<()> {
        self.post(&format!("/promos/{promo_id}/partner-rewards"), payload)
            .await
    }
}

// ─── In-memory ─────────────────────────────────────────────────────────────

/// In-memory reward API backed by DashMap.
#[derive(Default)]
pub struct MemoryRewardsBackend {
    plans: DashMap<String, Vec<SubscriptionPlan>>,
    subscriptions: DashMap<String, Vec<BusinessSubscription>>,
    rewards: DashMap<String, ApiIncentivePayload>,
    partner_rewards: DashMap<String, PartnerRewardsPayload>,
    /// Promo id -> (status, error body) returned on submit.
    failures: DashMap<String, (u16, Value)>,
    catalog_unavailable: AtomicBool,
}

impl MemoryRewardsBackend {
    pub fn new() -> Self {
        info!("Reward API backend initialized (in-memory, development mode)");
        Self::default()
    }

    pub fn with_subscription_state(
        self,
        business_id: &str,
        plans: Vec<SubscriptionPlan>,
        subscriptions: Vec<BusinessSubscription>,
    ) -> Self {
        self.plans.insert(business_id.to_string(), plans);
        self.subscriptions.insert(business_id.to_string(), subscriptions);
        self
    }

    /// Make every submit for `promo_id` fail with `status` and `body`.
    pub fn fail_submissions(&self, promo_id: &str, status: u16, body: Value) {
        self.failures.insert(promo_id.to_string(), (status, body));
    }

    pub fn set_catalog_unavailable(&self, unavailable: bool) {
        self.catalog_unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn submitted_rewards(&self, promo_id: &str) -> Option<ApiIncentivePayload> {
        self.rewards.get(promo_id).map(|r| r.value().clone())
    }

    pub fn submitted_partner_rewards(&self, promo_id: &str) -> Option<PartnerRewardsPayload> {
        self.partner_rewards.get(promo_id).map(|r| r.value().clone())
    }

    fn check_catalog(&self) -> BackendResult<()> {
        if self.catalog_unavailable.load(Ordering::SeqCst) {
            return Err(BackendError::Api {
                status: 503,
                message: "catalog unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn check_submission(&self, promo_id: &str) -> BackendResult<()> {
        match self.failures.get(promo_id) {
            Some(entry) => {
                let (status, body) = entry.value();
                Err(BackendError::from_body(*status, body))
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RewardsBackend for MemoryRewardsBackend {
    async fn subscription_plans(
        &self,
        business_id: &str,
        _language: &str,
    ) -> BackendResult<Vec<SubscriptionPlan>> {
        self.check_catalog()?;
        Ok(self
            .plans
            .get(business_id)
            .map(|r| r.value().clone())
            .unwrap_or_default())
    }

    async fn subscriptions(
        &self,
        business_id: &str,
        _language: &str,
    ) -> BackendResult<Vec<BusinessSubscription>> {
        self.check_catalog()?;
        Ok(self
            .subscriptions
            .get(business_id)
            .map(|r| r.value().clone())
            .unwrap_or_default())
    }

    async fn update_promo_rewards(
        &self,
        promo_id: &str,
        payload: &ApiIncentivePayload,
    ) -> BackendResult<()> {
        self.check_submission(promo_id)?;
        self.rewards.insert(promo_id.to_string(), payload.clone());
        Ok(())
    }

    async fn update_partner_promo_rewards(
        &self,
        promo_id: &str,
        payload: &PartnerRewardsPayload,
    ) -> BackendResult<()> {
        self.check_submission(promo_id)?;
        self.partner_rewards
            .insert(promo_id.to_string(), payload.clone());
        Ok(())
    }
}
