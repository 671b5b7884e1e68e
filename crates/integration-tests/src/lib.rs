//! Integration tests for Mangaba.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and run migrations + seed
//! cargo run -p mangaba-cli -- migrate
//! cargo run -p mangaba-cli -- seed
//!
//! # Start the storefront
//! cargo run -p mangaba-storefront
//!
//! # Run integration tests
//! cargo test -p mangaba-integration-tests -- --ignored
//! ```
//!
//! Tests are `#[ignore]`d by default because they need a running storefront
//! (and, for the full checkout flow, provider credentials).

use reqwest::Client;

/// Base URL for the storefront (configurable via environment).
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Create a client with a cookie store, so the session survives requests.
///
/// # Panics
///
/// Panics if the HTTP client cannot be constructed.
#[must_use]
pub fn session_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A unique email for registration tests.
#[must_use]
pub fn unique_email() -> String {
    format!("shopper-{}@integration.test", uuid::Uuid::new_v4())
}
