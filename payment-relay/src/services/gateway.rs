//! Payment gateway capability.
//!
//! Handlers only see [`CheckoutGateway`], so tests can swap the real
//! SSLCommerz client for a stub.

use async_trait::async_trait;
use service_core::error::AppError;
use std::time::Duration;
use thiserror::Error;

use crate::models::{GatewayInitEnvelope, GatewayInitResponse};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway did not answer within {0:?}")]
    Timeout(Duration),

    #[error("http request error: {0}")]
    Request(reqwest::Error),

    #[error("gateway rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("gateway response deserialization: {0}")]
    Decode(#[from] serde_json::Error),
}

impl GatewayError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Timeout(_))
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        let message = if err.is_timeout() {
            "Payment gateway unavailable"
        } else {
            "Payment initialization failed"
        };
        AppError::upstream(message, Some(err.to_string()))
    }
}

/// Starts a hosted checkout session for an order.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    async fn initialize_checkout(
        &self,
        envelope: &GatewayInitEnvelope,
    ) -> Result<GatewayInitResponse, GatewayError>;
}
