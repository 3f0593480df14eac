use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

/// Order submitted by the mobile app, as JSON or as a urlencoded form.
///
/// Only `total` is required. Every field is kept as a raw value: the app is
/// loose about types (numbers for phones, strings for amounts) and the raw
/// values are echoed back to it through the gateway's pass-through field.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[serde(default)]
    pub total: Option<Value>,
    pub receiver: Option<Value>,
    pub address: Option<Value>,
    pub phone: Option<Value>,
    pub user_email: Option<Value>,
    /// Opaque to the relay; echoed into the gateway pass-through field.
    pub user_id: Option<Value>,
    pub order_items: Option<Value>,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("total is required")]
pub struct MissingTotal;

/// Text form of an optional field. Null, `false` and blank values count as
/// absent.
fn text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::Null | Value::Bool(false) => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    (!text.trim().is_empty()).then_some(text)
}

impl OrderRequest {
    /// Amount to charge, as sent to the gateway.
    ///
    /// Absent, `null`, `false`, `""` and numeric zero are missing. Anything
    /// else is forwarded; the gateway has the final say on whether it is a
    /// valid amount.
    pub fn total(&self) -> Result<String, MissingTotal> {
        match &self.total {
            None | Some(Value::Null) | Some(Value::Bool(false)) => Err(MissingTotal),
            Some(Value::Number(n)) => {
                let raw = n.to_string();
                match Decimal::from_str(&raw).or_else(|_| Decimal::from_scientific(&raw)) {
                    Ok(amount) if amount.is_zero() => Err(MissingTotal),
                    Ok(amount) => Ok(amount.normalize().to_string()),
                    Err(_) => Ok(raw),
                }
            }
            Some(Value::String(s)) if s.is_empty() => Err(MissingTotal),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Ok(other.to_string()),
        }
    }

    pub fn receiver(&self) -> Option<String> {
        text(self.receiver.as_ref())
    }

    pub fn address(&self) -> Option<String> {
        text(self.address.as_ref())
    }

    pub fn phone(&self) -> Option<String> {
        text(self.phone.as_ref())
    }

    pub fn user_email(&self) -> Option<String> {
        text(self.user_email.as_ref())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub url: String,
}
