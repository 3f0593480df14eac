use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::CallbackConfig;
use crate::dtos::OrderRequest;

pub const CURRENCY: &str = "BDT";
pub const DEFAULT_CUSTOMER_NAME: &str = "Guest";
pub const DEFAULT_CUSTOMER_EMAIL: &str = "guest@example.com";

const SHIPPING_METHOD: &str = "Courier";
const PRODUCT_NAME: &str = "GiftWrap Order";
const PRODUCT_CATEGORY: &str = "Gifts";
const PRODUCT_PROFILE: &str = "general";
const CITY: &str = "Dhaka";
const POSTCODE: &str = "1200";
const COUNTRY: &str = "Bangladesh";

/// Result of a hosted checkout, as reported by the gateway's browser redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Success,
    Fail,
    Cancel,
}

impl PaymentOutcome {
    pub const ALL: [PaymentOutcome; 3] = [
        PaymentOutcome::Success,
        PaymentOutcome::Fail,
        PaymentOutcome::Cancel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentOutcome::Success => "success",
            PaymentOutcome::Fail => "fail",
            PaymentOutcome::Cancel => "cancel",
        }
    }

    /// Route path the gateway redirects to for this outcome.
    pub fn path(&self) -> &'static str {
        match self {
            PaymentOutcome::Success => "/success",
            PaymentOutcome::Fail => "/fail",
            PaymentOutcome::Cancel => "/cancel",
        }
    }

    /// `<deep_link>?payment=<outcome>`
    pub fn deep_link(&self, base: &str) -> String {
        format!("{}?payment={}", base, self.as_str())
    }
}

pub const IPN_PATH: &str = "/ipn";

/// Whether a gateway callback could be tied back to our store credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackTrust {
    /// `verify_sign` matches the fields listed in `verify_key`.
    Verified,
    /// No `verify_sign`/`verify_key` supplied.
    Unsigned,
    /// A signature was supplied but does not match.
    Invalid,
}

impl CallbackTrust {
    pub fn is_trusted(&self) -> bool {
        matches!(self, CallbackTrust::Verified)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackTrust::Verified => "verified",
            CallbackTrust::Unsigned => "unsigned",
            CallbackTrust::Invalid => "invalid",
        }
    }
}

/// Hosted-checkout session request, in SSLCommerz form field names.
///
/// Store credentials are not part of the envelope; the gateway client adds
/// them when sending.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayInitEnvelope {
    pub total_amount: String,
    pub currency: &'static str,
    pub tran_id: String,
    pub success_url: String,
    pub fail_url: String,
    pub cancel_url: String,
    pub ipn_url: String,
    pub shipping_method: &'static str,
    pub product_name: &'static str,
    pub product_category: &'static str,
    pub product_profile: &'static str,
    pub cus_name: String,
    pub cus_email: String,
    pub cus_add1: String,
    pub cus_city: &'static str,
    pub cus_postcode: &'static str,
    pub cus_country: &'static str,
    pub cus_phone: String,
    pub ship_name: String,
    pub ship_add1: String,
    pub ship_city: &'static str,
    pub ship_postcode: &'static str,
    pub ship_country: &'static str,
    /// Order context echoed back by the gateway on callbacks.
    pub value_a: String,
}

impl GatewayInitEnvelope {
    pub fn build(
        order: &OrderRequest,
        total_amount: String,
        tran_id: String,
        callback: &CallbackConfig,
    ) -> Self {
        let name = order
            .receiver()
            .unwrap_or_else(|| DEFAULT_CUSTOMER_NAME.to_string());
        let address = order.address().unwrap_or_default();

        // Raw values, before defaults are applied
        let value_a = json!({
            "userId": order.user_id,
            "orderItems": order.order_items,
            "receiver": order.receiver,
            "address": order.address,
            "phone": order.phone,
        })
        .to_string();

        Self {
            total_amount,
            currency: CURRENCY,
            tran_id,
            success_url: callback.url(PaymentOutcome::Success.path()),
            fail_url: callback.url(PaymentOutcome::Fail.path()),
            cancel_url: callback.url(PaymentOutcome::Cancel.path()),
            ipn_url: callback.url(IPN_PATH),
            shipping_method: SHIPPING_METHOD,
            product_name: PRODUCT_NAME,
            product_category: PRODUCT_CATEGORY,
            product_profile: PRODUCT_PROFILE,
            cus_name: name.clone(),
            cus_email: order
                .user_email()
                .unwrap_or_else(|| DEFAULT_CUSTOMER_EMAIL.to_string()),
            cus_add1: address.clone(),
            cus_city: CITY,
            cus_postcode: POSTCODE,
            cus_country: COUNTRY,
            cus_phone: order.phone().unwrap_or_default(),
            ship_name: name,
            ship_add1: address,
            ship_city: CITY,
            ship_postcode: POSTCODE,
            ship_country: COUNTRY,
            value_a,
        }
    }
}

/// Session response from the gateway's init API. Only the fields the relay
/// reads are modelled.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct GatewayInitResponse {
    pub status: Option<String>,
    #[serde(rename = "failedreason")]
    pub failed_reason: Option<String>,
    #[serde(rename = "sessionkey")]
    pub session_key: Option<String>,
    #[serde(rename = "GatewayPageURL")]
    pub gateway_page_url: Option<String>,
}

impl GatewayInitResponse {
    /// Hosted checkout URL, if the gateway issued a usable one.
    pub fn checkout_url(&self) -> Option<&str> {
        self.gateway_page_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Gateway-supplied explanation for a missing checkout URL.
    pub fn failure_reason(&self) -> Option<String> {
        self.failed_reason
            .as_deref()
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .map(str::to_string)
    }
}
