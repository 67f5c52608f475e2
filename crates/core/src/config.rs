use serde::Deserialize;

/// Root application configuration. Loaded from an optional
/// `promo-express.toml` next to the binary, then environment variables with
/// the prefix `PROMO_EXPRESS__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub wizard: WizardConfig,
    #[serde(default)]
    pub subscriptions: SubscriptionGateConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

/// Upstream reward API the wizard submits to.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sent as `Accept-Language` and as the `lang` query parameter.
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WizardConfig {
    /// Business the operator acts for; stamped on threshold rewards.
    #[serde(default = "default_business_id")]
    pub business_id: String,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Directory for file-backed drafts. In-memory storage when unset.
    #[serde(default)]
    pub storage_dir: Option<String>,
    #[serde(default = "default_dashboard_path")]
    pub dashboard_path: String,
    #[serde(default = "default_redirect_delay_ms")]
    pub redirect_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// How the travel agency subscription plan is recognised.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionGateConfig {
    /// Stable plan id. Takes precedence over name matching when set.
    #[serde(default)]
    pub travel_agency_plan_id: Option<String>,
    /// Every keyword must appear (case-insensitive) in the plan name.
    #[serde(default = "default_plan_name_keywords")]
    pub plan_name_keywords: Vec<String>,
}

// Default functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}
fn default_language() -> String {
    "en".to_string()
}
fn default_timeout_ms() -> u64 {
    30_000
}
fn default_business_id() -> String {
    "business-01".to_string()
}
fn default_storage_key() -> String {
    "promo-wizard-data".to_string()
}
fn default_dashboard_path() -> String {
    "/dashboard".to_string()
}
fn default_redirect_delay_ms() -> u64 {
    1500
}
fn default_metrics_enabled() -> bool {
    true
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_plan_name_keywords() -> Vec<String> {
    vec!["travel agency".to_string(), "travel agent".to_string()]
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            language: default_language(),
            access_token: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            business_id: default_business_id(),
            storage_key: default_storage_key(),
            storage_dir: None,
            dashboard_path: default_dashboard_path(),
            redirect_delay_ms: default_redirect_delay_ms(),
        }
    }
}

impl Default for SubscriptionGateConfig {
    fn default() -> Self {
        Self {
            travel_agency_plan_id: None,
            plan_name_keywords: default_plan_name_keywords(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            backend: BackendConfig::default(),
            wizard: WizardConfig::default(),
            subscriptions: SubscriptionGateConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the optional config file and environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("promo-express").required(false))
            .add_source(
                config::Environment::with_prefix("PROMO_EXPRESS")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("subscriptions.plan_name_keywords"),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.wizard.storage_key, "promo-wizard-data");
        assert_eq!(config.api.http_port, 8080);
        assert!(config.subscriptions.travel_agency_plan_id.is_none());
        assert_eq!(config.subscriptions.plan_name_keywords.len(), 2);
        assert_eq!(config.metrics.port, 9091);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "wizard": { "business_id": "biz-42" },
            "backend": { "language": "ka" }
        }))
        .unwrap();
        assert_eq!(config.wizard.business_id, "biz-42");
        assert_eq!(config.wizard.redirect_delay_ms, 1500);
        assert_eq!(config.backend.language, "ka");
        assert_eq!(config.backend.timeout_ms, 30_000);
    }
}
