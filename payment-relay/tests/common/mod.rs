use async_trait::async_trait;
use payment_relay::config::{CallbackConfig, Config, StoreConfig};
use payment_relay::models::{GatewayInitEnvelope, GatewayInitResponse};
use payment_relay::services::{CheckoutGateway, GatewayError};
use payment_relay::Application;
use secrecy::Secret;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_STORE_ID: &str = "teststore";
pub const TEST_STORE_PASSWORD: &str = "teststore@ssl";

/// What the stub gateway answers with.
#[derive(Clone)]
pub enum StubBehavior {
    CheckoutUrl(String),
    NoUrl { failed_reason: Option<String> },
    Rejected,
    Timeout,
}

/// In-process gateway that records every envelope it receives.
pub struct StubGateway {
    behavior: StubBehavior,
    calls: AtomicUsize,
    envelopes: Mutex<Vec<GatewayInitEnvelope>>,
}

impl StubGateway {
    pub fn new(behavior: StubBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            envelopes: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn envelopes(&self) -> Vec<GatewayInitEnvelope> {
        self.envelopes.lock().unwrap().clone()
    }
}

#[async_trait]
impl CheckoutGateway for StubGateway {
    async fn initialize_checkout(
        &self,
        envelope: &GatewayInitEnvelope,
    ) -> Result<GatewayInitResponse, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.envelopes.lock().unwrap().push(envelope.clone());

        match &self.behavior {
            StubBehavior::CheckoutUrl(url) => Ok(GatewayInitResponse {
                status: Some("SUCCESS".to_string()),
                gateway_page_url: Some(url.clone()),
                ..Default::default()
            }),
            StubBehavior::NoUrl { failed_reason } => Ok(GatewayInitResponse {
                status: Some("FAILED".to_string()),
                failed_reason: failed_reason.clone(),
                ..Default::default()
            }),
            StubBehavior::Rejected => Err(GatewayError::Rejected {
                status: 500,
                body: "internal error".to_string(),
            }),
            StubBehavior::Timeout => Err(GatewayError::Timeout(Duration::from_secs(30))),
        }
    }
}

pub fn test_config(api_base_url: &str) -> Config {
    Config {
        server: service_core::config::Config {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port
        },
        store: StoreConfig {
            store_id: TEST_STORE_ID.to_string(),
            store_password: Secret::new(TEST_STORE_PASSWORD.to_string()),
            is_live: false,
            api_base_url: api_base_url.to_string(),
            timeout_secs: 2,
        },
        callback: CallbackConfig {
            base_url: "https://relay.test".to_string(),
            deep_link: "giftwrap://homepage".to_string(),
            app_name: "GiftWrap".to_string(),
            redirect_delay_ms: 1000,
            require_signature: false,
        },
        service_name: "payment-relay-test".to_string(),
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
}

impl TestApp {
    /// Spawn the relay with a stubbed gateway.
    pub async fn spawn_with_gateway(config: Config, gateway: Arc<dyn CheckoutGateway>) -> Self {
        let app = Application::build_with_gateway(config, gateway)
            .await
            .expect("Failed to build test application");
        Self::run(app).await
    }

    /// Spawn the relay with the real SSLCommerz client pointed at `api_base_url`.
    pub async fn spawn_with_sslcommerz(api_base_url: &str) -> Self {
        let app = Application::build(test_config(api_base_url))
            .await
            .expect("Failed to build test application");
        Self::run(app).await
    }

    async fn run(app: Application) -> Self {
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to answer
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        TestApp { address, port }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

/// A local address nothing is listening on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind probe listener");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// Sign callback params the way SSLCommerz does.
pub fn sign_params(params: &mut Vec<(String, String)>, store_password: &str) {
    let md5_hex = |data: &str| format!("{:x}", md5::compute(data.as_bytes()));

    let mut fields: Vec<(String, String)> = params.clone();
    fields.push(("store_passwd".to_string(), md5_hex(store_password)));
    fields.sort();

    let keys = params
        .iter()
        .map(|(k, _)| k.as_str())
        .collect::<Vec<_>>()
        .join(",");
    let payload = fields
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    params.push(("verify_key".to_string(), keys));
    params.push(("verify_sign".to_string(), md5_hex(&payload)));
}
