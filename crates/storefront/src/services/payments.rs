//! Payments provider client for hosted checkout sessions.
//!
//! The provider exposes a Stripe-shaped REST API: sessions are created with
//! form-encoded line items in `payment` mode and resolved by fetching the
//! session with its payment intent expanded. The local order id rides along
//! in the session metadata so the reconciler can find the order afterwards.

use std::collections::HashMap;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use mangaba_core::{Money, OrderId};

use crate::config::PaymentsConfig;

/// Errors that can occur when talking to the payments provider.
#[derive(Debug, Error)]
pub enum PaymentsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Session not found.
    #[error("checkout session not found: {0}")]
    SessionNotFound(String),

    /// Failed to parse the response body.
    #[error("parse error: {0}")]
    Parse(String),

    /// The client could not be constructed (bad credentials format).
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// One line item submitted to a checkout session.
///
/// Freight travels as a synthetic line item alongside the cart lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLineItem {
    pub description: String,
    /// Unit price in minor currency units.
    pub unit_amount: Money,
    pub quantity: u32,
}

/// Input for creating a checkout session.
#[derive(Debug, Clone)]
pub struct CreateSessionRequest {
    pub line_items: Vec<SessionLineItem>,
    /// Local order id carried in session metadata for reconciliation.
    pub order_id: OrderId,
    pub success_url: String,
    pub cancel_url: String,
}

/// A created checkout session: its id and the hosted payment page URL.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// A fetched checkout session with its payment intent resolved.
#[derive(Debug, Clone, Default)]
pub struct SessionDetails {
    pub id: String,
    /// Order id recovered from session metadata, if present and valid.
    pub order_id: Option<OrderId>,
    /// Raw payment-intent status (e.g., `succeeded`, `canceled`).
    pub intent_status: Option<String>,
    /// Payment method type reported by the provider (e.g., `card`).
    pub payment_method: Option<String>,
}

/// Source of checkout-session state.
///
/// The production implementation is [`PaymentsClient`]; the reconciler is
/// generic over this trait so its mapping logic tests against a stub.
pub trait SessionSource {
    /// Fetch a session by id, with its payment intent expanded.
    fn fetch_session(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<SessionDetails, PaymentsError>> + Send;
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    id: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    #[serde(default)]
    metadata: HashMap<String, String>,
    payment_intent: Option<PaymentIntentResponse>,
}

#[derive(Debug, Deserialize)]
struct PaymentIntentResponse {
    status: Option<String>,
    #[serde(default)]
    payment_method_types: Vec<String>,
}

impl From<SessionResponse> for SessionDetails {
    fn from(body: SessionResponse) -> Self {
        let order_id = body
            .metadata
            .get("order_id")
            .and_then(|raw| raw.parse::<i32>().ok())
            .map(OrderId::new);

        let (intent_status, payment_method) = body.payment_intent.map_or((None, None), |intent| {
            (intent.status, intent.payment_method_types.into_iter().next())
        });

        Self {
            id: body.id,
            order_id,
            intent_status,
            payment_method,
        }
    }
}

/// Client for the payments provider API.
#[derive(Clone)]
pub struct PaymentsClient {
    client: reqwest::Client,
    api_base: String,
    currency: String,
}

impl PaymentsClient {
    /// Create a new payments client.
    ///
    /// # Errors
    ///
    /// Returns `PaymentsError::Config` if the secret key is not a valid
    /// header value, or `PaymentsError::Http` if the client fails to build.
    pub fn new(config: &PaymentsConfig) -> Result<Self, PaymentsError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| PaymentsError::Config(format!("invalid secret key format: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_header);

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            currency: config.currency.clone(),
        })
    }

    /// Create a hosted checkout session in `payment` mode.
    ///
    /// # Errors
    ///
    /// Returns `PaymentsError` if the request fails or the response cannot
    /// be parsed.
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn create_checkout_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CheckoutSession, PaymentsError> {
        let url = format!("{}/v1/checkout/sessions", self.api_base);
        let params = session_form_params(request, &self.currency);

        let response = self.client.post(&url).form(&params).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: CreateSessionResponse = response
            .json()
            .await
            .map_err(|e| PaymentsError::Parse(e.to_string()))?;

        Ok(CheckoutSession {
            id: body.id,
            url: body.url,
        })
    }
}

impl SessionSource for PaymentsClient {
    #[instrument(skip(self))]
    async fn fetch_session(&self, session_id: &str) -> Result<SessionDetails, PaymentsError> {
        let url = format!(
            "{}/v1/checkout/sessions/{session_id}?expand[]=payment_intent",
            self.api_base
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PaymentsError::SessionNotFound(session_id.to_owned()));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: SessionResponse = response
            .json()
            .await
            .map_err(|e| PaymentsError::Parse(e.to_string()))?;

        Ok(SessionDetails::from(body))
    }
}

/// Build the form-encoded parameter list for session creation.
fn session_form_params(request: &CreateSessionRequest, currency: &str) -> Vec<(String, String)> {
    let mut params = vec![
        ("mode".to_owned(), "payment".to_owned()),
        ("success_url".to_owned(), request.success_url.clone()),
        ("cancel_url".to_owned(), request.cancel_url.clone()),
        (
            "metadata[order_id]".to_owned(),
            request.order_id.to_string(),
        ),
    ];

    for (i, item) in request.line_items.iter().enumerate() {
        params.push((
            format!("line_items[{i}][price_data][currency]"),
            currency.to_owned(),
        ));
        params.push((
            format!("line_items[{i}][price_data][product_data][name]"),
            item.description.clone(),
        ));
        params.push((
            format!("line_items[{i}][price_data][unit_amount]"),
            item.unit_amount.minor_units().to_string(),
        ));
        params.push((format!("line_items[{i}][quantity]"), item.quantity.to_string()));
    }

    params
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn find<'a>(params: &'a [(String, String)], key: &str) -> &'a str {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn test_session_form_params_layout() {
        let request = CreateSessionRequest {
            line_items: vec![
                SessionLineItem {
                    description: "Ceramic mug".to_owned(),
                    unit_amount: Money::from_minor_units(2500),
                    quantity: 2,
                },
                SessionLineItem {
                    description: "Shipping (Express)".to_owned(),
                    unit_amount: Money::from_minor_units(2290),
                    quantity: 1,
                },
            ],
            order_id: OrderId::new(91),
            success_url: "https://shop.test/checkout/result?session_id={CHECKOUT_SESSION_ID}"
                .to_owned(),
            cancel_url: "https://shop.test/checkout/result?session_id={CHECKOUT_SESSION_ID}"
                .to_owned(),
        };

        let params = session_form_params(&request, "usd");

        assert_eq!(find(&params, "mode"), "payment");
        assert_eq!(find(&params, "metadata[order_id]"), "91");
        assert_eq!(
            find(&params, "line_items[0][price_data][product_data][name]"),
            "Ceramic mug"
        );
        assert_eq!(
            find(&params, "line_items[0][price_data][unit_amount]"),
            "2500"
        );
        assert_eq!(find(&params, "line_items[0][quantity]"), "2");
        assert_eq!(
            find(&params, "line_items[1][price_data][unit_amount]"),
            "2290"
        );
        assert_eq!(find(&params, "line_items[1][price_data][currency]"), "usd");
    }

    #[test]
    fn test_session_details_from_response() {
        let json = r#"{
            "id": "cs_test_123",
            "metadata": {"order_id": "7"},
            "payment_intent": {
                "status": "succeeded",
                "payment_method_types": ["card"]
            }
        }"#;

        let body: SessionResponse = serde_json::from_str(json).unwrap();
        let details = SessionDetails::from(body);

        assert_eq!(details.id, "cs_test_123");
        assert_eq!(details.order_id, Some(OrderId::new(7)));
        assert_eq!(details.intent_status.as_deref(), Some("succeeded"));
        assert_eq!(details.payment_method.as_deref(), Some("card"));
    }

    #[test]
    fn test_session_details_tolerates_missing_intent_and_metadata() {
        let body: SessionResponse = serde_json::from_str(r#"{"id": "cs_x"}"#).unwrap();
        let details = SessionDetails::from(body);

        assert_eq!(details.order_id, None);
        assert_eq!(details.intent_status, None);
        assert_eq!(details.payment_method, None);
    }

    #[test]
    fn test_session_details_ignores_malformed_order_id() {
        let json = r#"{"id": "cs_x", "metadata": {"order_id": "not-a-number"}}"#;
        let body: SessionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(SessionDetails::from(body).order_id, None);
    }
}
