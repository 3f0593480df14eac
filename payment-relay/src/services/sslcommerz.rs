//! SSLCommerz payment provider client.
//!
//! Implements the hosted-checkout session API and the `verify_sign` check
//! used on redirect and IPN callbacks.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use service_core::utils::signature::digests_match;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::config::StoreConfig;
use crate::models::{CallbackTrust, GatewayInitEnvelope, GatewayInitResponse};
use crate::services::gateway::{CheckoutGateway, GatewayError};

const INIT_PATH: &str = "/gwprocess/v4/api.php";

/// SSLCommerz client for a single merchant store.
#[derive(Clone)]
pub struct SslCommerzClient {
    client: Client,
    config: StoreConfig,
    timeout: Duration,
}

/// Form body of the session API: credentials plus the envelope.
#[derive(Serialize)]
struct InitForm<'a> {
    store_id: &'a str,
    store_passwd: &'a str,
    #[serde(flatten)]
    envelope: &'a GatewayInitEnvelope,
}

fn md5_hex(data: &str) -> String {
    format!("{:x}", md5::compute(data.as_bytes()))
}

impl SslCommerzClient {
    /// Create a new client; the configured timeout bounds every gateway call.
    pub fn new(config: StoreConfig) -> reqwest::Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            config,
            timeout,
        })
    }

    /// Check if store credentials are set.
    pub fn is_configured(&self) -> bool {
        !self.config.store_id.is_empty() && !self.config.store_password.expose_secret().is_empty()
    }

    fn init_url(&self) -> String {
        format!(
            "{}{}",
            self.config.api_base_url.trim_end_matches('/'),
            INIT_PATH
        )
    }

    fn map_send_error(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout(self.timeout)
        } else {
            GatewayError::Request(err)
        }
    }
}

/// Checks gateway callbacks against the store password.
#[derive(Clone)]
pub struct CallbackVerifier {
    store_password: Secret<String>,
}

impl CallbackVerifier {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            store_password: config.store_password.clone(),
        }
    }

    /// Classify a callback by its `verify_sign`.
    ///
    /// The signature is computed as:
    /// `md5(k1=v1&k2=v2&...)` over the keys named in `verify_key` plus
    /// `store_passwd=md5(store password)`, sorted by key.
    pub fn verify_callback(&self, params: &HashMap<String, String>) -> CallbackTrust {
        verify_callback_signature(params, self.store_password.expose_secret())
    }
}

fn verify_callback_signature(
    params: &HashMap<String, String>,
    store_password: &str,
) -> CallbackTrust {
    let (Some(signature), Some(keys)) = (params.get("verify_sign"), params.get("verify_key"))
    else {
        return CallbackTrust::Unsigned;
    };

    let mut fields: BTreeMap<&str, String> = keys
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|k| (k, params.get(k).cloned().unwrap_or_default()))
        .collect();
    fields.insert("store_passwd", md5_hex(store_password));

    let payload = fields
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    if digests_match(&md5_hex(&payload), signature) {
        CallbackTrust::Verified
    } else {
        CallbackTrust::Invalid
    }
}

#[async_trait]
impl CheckoutGateway for SslCommerzClient {
    async fn initialize_checkout(
        &self,
        envelope: &GatewayInitEnvelope,
    ) -> Result<GatewayInitResponse, GatewayError> {
        let form = InitForm {
            store_id: &self.config.store_id,
            store_passwd: self.config.store_password.expose_secret(),
            envelope,
        };

        let url = self.init_url();
        tracing::debug!(
            %url,
            tran_id = %envelope.tran_id,
            amount = %envelope.total_amount,
            live = self.config.is_live,
            "SSLCommerz session request"
        );

        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        tracing::debug!(status = %status, body = %body, "SSLCommerz session response");

        if !status.is_success() {
            tracing::error!(
                status = status.as_u16(),
                tran_id = %envelope.tran_id,
                "SSLCommerz session request rejected"
            );
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let session: GatewayInitResponse = serde_json::from_str(&body)?;
        tracing::info!(
            tran_id = %envelope.tran_id,
            status = session.status.as_deref().unwrap_or("-"),
            has_url = session.checkout_url().is_some(),
            "SSLCommerz session created"
        );
        Ok(session)
    }
}
