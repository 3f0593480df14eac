//! Gateway callbacks.
//!
//! The gateway sends the browser to `/success`, `/fail` or `/cancel` (by GET or
//! POST) once checkout ends; each renders a page that hands control back to
//! the app through its deep link. `/ipn` receives the server-to-server
//! notification.

use askama::Template;
use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use service_core::error::AppError;
use std::collections::HashMap;

use crate::{
    models::{CallbackTrust, PaymentOutcome, IPN_PATH},
    AppState,
};

#[derive(Template)]
#[template(path = "redirect.html")]
pub struct RedirectPage {
    pub outcome: &'static str,
    pub heading: String,
    pub deep_link: String,
    pub app_name: String,
    pub delay_ms: u64,
}

impl RedirectPage {
    pub fn new(outcome: PaymentOutcome, state: &AppState) -> Self {
        let callback = &state.config.callback;
        Self {
            outcome: outcome.as_str(),
            heading: outcome.as_str().to_uppercase(),
            deep_link: outcome.deep_link(&callback.deep_link),
            app_name: callback.app_name.clone(),
            delay_ms: callback.redirect_delay_ms,
        }
    }
}

/// Merge query string and urlencoded body. Unparsable input is ignored.
fn collect_params(query: Option<&str>, body: &[u8]) -> HashMap<String, String> {
    let mut params: HashMap<String, String> = query
        .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
        .unwrap_or_default()
        .into_iter()
        .collect();

    if let Ok(form) = serde_urlencoded::from_bytes::<Vec<(String, String)>>(body) {
        params.extend(form.into_iter().filter(|(k, _)| !k.is_empty()));
    }
    params
}

fn param<'a>(params: &'a HashMap<String, String>, key: &str) -> &'a str {
    params.get(key).map(String::as_str).unwrap_or("-")
}

/// Classify the callback and reject it when signatures are enforced.
fn check_trust(
    state: &AppState,
    params: &HashMap<String, String>,
    route: &str,
) -> Result<CallbackTrust, AppError> {
    let trust = state.callback_verifier.verify_callback(params);

    if !trust.is_trusted() {
        tracing::warn!(
            route,
            trust = trust.as_str(),
            tran_id = param(params, "tran_id"),
            "Callback authenticity not verified"
        );
        if state.config.callback.require_signature {
            return Err(AppError::Unauthorized(anyhow::anyhow!(
                "Callback signature could not be verified"
            )));
        }
    }
    Ok(trust)
}

async fn outcome_page(
    state: AppState,
    outcome: PaymentOutcome,
    method: &'static str,
    params: HashMap<String, String>,
) -> Result<RedirectPage, AppError> {
    let trust = check_trust(&state, &params, outcome.path())?;

    match outcome {
        PaymentOutcome::Fail => tracing::warn!(
            method,
            tran_id = param(&params, "tran_id"),
            status = param(&params, "status"),
            error = param(&params, "error"),
            params = params.len(),
            trust = trust.as_str(),
            "Payment failed"
        ),
        _ => tracing::info!(
            method,
            outcome = outcome.as_str(),
            tran_id = param(&params, "tran_id"),
            status = param(&params, "status"),
            val_id = param(&params, "val_id"),
            params = params.len(),
            trust = trust.as_str(),
            "Payment callback"
        ),
    }

    Ok(RedirectPage::new(outcome, &state))
}

async fn ipn(
    state: AppState,
    method: &'static str,
    params: HashMap<String, String>,
) -> Result<Json<Value>, AppError> {
    let trust = check_trust(&state, &params, IPN_PATH)?;

    tracing::info!(
        method,
        tran_id = param(&params, "tran_id"),
        status = param(&params, "status"),
        val_id = param(&params, "val_id"),
        amount = param(&params, "amount"),
        trust = trust.as_str(),
        "IPN received"
    );

    Ok(Json(json!({
        "received": true,
        "tran_id": params.get("tran_id"),
    })))
}

pub fn router() -> Router<AppState> {
    PaymentOutcome::ALL
        .into_iter()
        .fold(Router::new(), |router, outcome| {
            router.route(
                outcome.path(),
                get(move |State(state): State<AppState>, RawQuery(query): RawQuery| {
                    outcome_page(state, outcome, "GET", collect_params(query.as_deref(), &[]))
                })
                .post(
                    move |State(state): State<AppState>, RawQuery(query): RawQuery, body: Bytes| {
                        outcome_page(
                            state,
                            outcome,
                            "POST",
                            collect_params(query.as_deref(), &body),
                        )
                    },
                ),
            )
        })
        .route(
            IPN_PATH,
            get(|State(state): State<AppState>, RawQuery(query): RawQuery| {
                ipn(state, "GET", collect_params(query.as_deref(), &[]))
            })
            .post(
                |State(state): State<AppState>, RawQuery(query): RawQuery, body: Bytes| {
                    ipn(state, "POST", collect_params(query.as_deref(), &body))
                },
            ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_params_merges_query_and_form() {
        let params = collect_params(Some("tran_id=REF1&status=VALID"), b"val_id=V1&amount=500.00");
        assert_eq!(params["tran_id"], "REF1");
        assert_eq!(params["status"], "VALID");
        assert_eq!(params["val_id"], "V1");
        assert_eq!(params["amount"], "500.00");
    }

    #[test]
    fn test_collect_params_body_wins_over_query() {
        let params = collect_params(Some("status=PENDING"), b"status=VALID");
        assert_eq!(params["status"], "VALID");
    }

    #[test]
    fn test_collect_params_tolerates_garbage() {
        let params = collect_params(Some("%%%"), &[0xff, 0xfe, 0x00]);
        assert!(!params.contains_key("tran_id"));

        let params = collect_params(None, b"");
        assert!(params.is_empty());
    }

    #[test]
    fn test_collect_params_decodes_percent_encoding() {
        let params = collect_params(None, b"error=Card+declined%21");
        assert_eq!(params["error"], "Card declined!");
    }

    #[test]
    fn test_redirect_page_renders_deep_link() {
        let page = RedirectPage {
            outcome: "cancel",
            heading: "CANCEL".to_string(),
            deep_link: PaymentOutcome::Cancel.deep_link("giftwrap://homepage"),
            app_name: "GiftWrap".to_string(),
            delay_ms: 1000,
        };
        let html = page.render().unwrap();

        assert!(html.contains("<title>Payment cancel</title>"));
        assert!(html.contains("Payment CANCEL"));
        assert!(html.contains("window.location = \"giftwrap://homepage?payment=cancel\""));
        assert!(html.contains("}, 1000);"));
        assert!(html.contains("Redirecting back to GiftWrap app..."));
    }
}
