use secrecy::Secret;
use serde::Deserialize;
use service_core::config::{self as core_config, env_flag, get_env};
use service_core::error::AppError;
use std::env;

pub const SANDBOX_API_URL: &str = "https://sandbox.sslcommerz.com";
pub const LIVE_API_URL: &str = "https://securepay.sslcommerz.com";

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub server: core_config::Config,
    pub store: StoreConfig,
    pub callback: CallbackConfig,
    pub service_name: String,
}

/// SSLCommerz merchant credentials and endpoint.
#[derive(Deserialize, Clone, Debug)]
pub struct StoreConfig {
    pub store_id: String,
    pub store_password: Secret<String>,
    pub is_live: bool,
    pub api_base_url: String,
    pub timeout_secs: u64,
}

/// Where the gateway sends the browser back to, and how we hand off to the app.
#[derive(Deserialize, Clone, Debug)]
pub struct CallbackConfig {
    /// Public base URL of this service, reachable by the gateway.
    pub base_url: String,
    /// Deep link target, e.g. `giftwrap://homepage`.
    pub deep_link: String,
    pub app_name: String,
    pub redirect_delay_ms: u64,
    /// Reject callbacks whose `verify_sign` cannot be verified.
    pub require_signature: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let server = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let is_live = env_flag("STORE_IS_LIVE", false);
        let default_api = if is_live { LIVE_API_URL } else { SANDBOX_API_URL };

        Ok(Self {
            server,
            store: StoreConfig {
                store_id: get_env("STORE_ID", Some(""), is_prod)?,
                store_password: Secret::new(get_env("STORE_PASS", Some(""), is_prod)?),
                is_live,
                api_base_url: env::var("SSLCOMMERZ_API_URL")
                    .unwrap_or_else(|_| default_api.to_string()),
                timeout_secs: parse_timeout_secs(
                    env::var("GATEWAY_TIMEOUT_SECS").ok().as_deref(),
                ),
            },
            callback: CallbackConfig {
                base_url: get_env(
                    "BASE_URL",
                    Some("https://giftwrap-ssl-backend.onrender.com"),
                    is_prod,
                )?,
                deep_link: env::var("APP_DEEP_LINK")
                    .unwrap_or_else(|_| "giftwrap://homepage".to_string()),
                app_name: env::var("APP_DISPLAY_NAME").unwrap_or_else(|_| "GiftWrap".to_string()),
                redirect_delay_ms: env::var("CALLBACK_REDIRECT_DELAY_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1000),
                require_signature: env_flag("CALLBACK_REQUIRE_SIGNATURE", false),
            },
            service_name: "payment-relay".to_string(),
        })
    }
}

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Gateway timeout in seconds. Zero or unparsable falls back to the default.
fn parse_timeout_secs(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.trim().parse().ok())
        .filter(|&secs| secs > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECS)
}

impl CallbackConfig {
    /// Absolute callback URL for `path` (which starts with `/`).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
