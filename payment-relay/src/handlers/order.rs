//! Order initialization: validates the app's order and opens a hosted
//! checkout session with the gateway.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request, State},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{OrderRequest, OrderResponse},
    models::GatewayInitEnvelope,
    AppState,
};

/// Order body, accepted as JSON or as a urlencoded form. A body of any other
/// type (or none at all) is read as an empty order.
pub struct OrderPayload(pub OrderRequest);

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"))
}

#[axum::async_trait]
impl<S> FromRequest<S> for OrderPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(&req) {
            let Form(order) = Form::<OrderRequest>::from_request(req, state)
                .await
                .map_err(|rejection| {
                    tracing::warn!(error = %rejection.body_text(), "Malformed order form");
                    AppError::BadRequest(anyhow::anyhow!(rejection.body_text()))
                })?;
            return Ok(Self(order));
        }

        match Json::<OrderRequest>::from_request(req, state).await {
            Ok(Json(order)) => Ok(Self(order)),
            Err(JsonRejection::MissingJsonContentType(_)) => Ok(Self(OrderRequest::default())),
            Err(rejection) => {
                tracing::warn!(error = %rejection.body_text(), "Malformed order payload");
                Err(AppError::BadRequest(anyhow::anyhow!(rejection.body_text())))
            }
        }
    }
}

/// Create a checkout session for an order and return its URL.
///
/// The gateway is called exactly once per valid order and never for an
/// invalid one. No retry: the app resubmits, which yields a new `tran_id`.
pub async fn create_order(
    State(state): State<AppState>,
    OrderPayload(order): OrderPayload,
) -> Result<Json<OrderResponse>, AppError> {
    let total = order.total().map_err(|e| {
        tracing::warn!(error = %e, "Order rejected");
        AppError::BadRequest(e.into())
    })?;

    let tran_id = state.transaction_ids.next_id();
    let envelope = GatewayInitEnvelope::build(&order, total, tran_id, &state.config.callback);

    tracing::info!(
        tran_id = %envelope.tran_id,
        amount = %envelope.total_amount,
        currency = %envelope.currency,
        "Initializing payment"
    );

    let session = state
        .gateway
        .initialize_checkout(&envelope)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, tran_id = %envelope.tran_id, "Payment init error");
            AppError::from(e)
        })?;

    let Some(url) = session.checkout_url() else {
        tracing::error!(
            tran_id = %envelope.tran_id,
            status = session.status.as_deref().unwrap_or("-"),
            reason = session.failure_reason().as_deref().unwrap_or("-"),
            "Gateway returned no checkout URL"
        );
        return Err(AppError::upstream(
            "No gateway URL returned",
            session.failure_reason(),
        ));
    };

    tracing::info!(tran_id = %envelope.tran_id, "Checkout session ready");

    Ok(Json(OrderResponse {
        url: url.to_string(),
    }))
}
