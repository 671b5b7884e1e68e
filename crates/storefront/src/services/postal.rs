//! Postal-code lookup client.
//!
//! Resolves an 8-digit postal code to street/neighborhood/city/region via a
//! public lookup service (ViaCEP-compatible API shape). The lookup signals an
//! unknown code with an `erro` flag in an otherwise 200 response.

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use mangaba_core::PostalCode;

use crate::config::PostalConfig;

/// Errors that can occur when resolving a postal code.
#[derive(Debug, Error)]
pub enum PostalError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The lookup reported no match for the code.
    #[error("postal code not found: {0}")]
    NotFound(String),

    /// Failed to parse the response body.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Resolved address fields for a postal code.
///
/// Any field the service does not know comes back empty; callers backfill
/// only fields the user has not already supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostalAddress {
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    /// Two-letter region code (e.g., `SP`).
    pub region: String,
}

/// Source of postal-code resolutions.
///
/// The production implementation is [`PostalClient`]; tests substitute a
/// stub so the shipping estimator runs without network access.
pub trait PostalLookup {
    /// Resolve a postal code to address fields.
    fn lookup(
        &self,
        code: &PostalCode,
    ) -> impl Future<Output = Result<PostalAddress, PostalError>> + Send;
}

/// Wire format of the lookup response.
#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    erro: bool,
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
}

/// Client for the postal lookup service.
#[derive(Clone)]
pub struct PostalClient {
    client: reqwest::Client,
    api_base: String,
}

impl PostalClient {
    /// Create a new postal lookup client.
    #[must_use]
    pub fn new(config: &PostalConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_owned(),
        }
    }
}

impl PostalLookup for PostalClient {
    #[instrument(skip(self), fields(code = %code))]
    async fn lookup(&self, code: &PostalCode) -> Result<PostalAddress, PostalError> {
        let url = format!("{}/ws/{}/json/", self.api_base, code.as_str());

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PostalError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: LookupResponse = response
            .json()
            .await
            .map_err(|e| PostalError::Parse(e.to_string()))?;

        if body.erro {
            return Err(PostalError::NotFound(code.as_str().to_owned()));
        }

        Ok(PostalAddress {
            street: body.logradouro,
            neighborhood: body.bairro,
            city: body.localidade,
            region: body.uf,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_response_parses_found() {
        let json = r#"{
            "cep": "01001-000",
            "logradouro": "Praça da Sé",
            "bairro": "Sé",
            "localidade": "São Paulo",
            "uf": "SP"
        }"#;

        let body: LookupResponse = serde_json::from_str(json).unwrap();
        assert!(!body.erro);
        assert_eq!(body.logradouro, "Praça da Sé");
        assert_eq!(body.uf, "SP");
    }

    #[test]
    fn test_lookup_response_parses_error_flag() {
        let body: LookupResponse = serde_json::from_str(r#"{"erro": true}"#).unwrap();
        assert!(body.erro);
    }

    #[test]
    fn test_lookup_response_tolerates_missing_fields() {
        let body: LookupResponse = serde_json::from_str(r#"{"localidade": "Manaus"}"#).unwrap();
        assert_eq!(body.localidade, "Manaus");
        assert_eq!(body.logradouro, "");
    }
}
