//! Integration tests for the checkout funnel.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - A seeded catalog (mg-cli seed)
//! - The storefront running (cargo run -p mangaba-storefront)
//!
//! The final payment-session handoff additionally needs provider
//! credentials, so these tests stop at the precondition boundary.
//!
//! Run with: cargo test -p mangaba-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::{Value, json};

use mangaba_integration_tests::{session_client, storefront_base_url, unique_email};

const SEEDED_PRODUCT: &str = "prod_mug_terracotta";

fn valid_address() -> Value {
    json!({
        "postal_code": "01001-000",
        "street": "",
        "number": "100",
        "neighborhood": "",
        "city": "",
        "region": "",
        "complement": null
    })
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_checkout_requires_authentication() {
    let client = session_client();
    let base_url = storefront_base_url();

    let resp = client
        .post(format!("{base_url}/checkout"))
        .send()
        .await
        .expect("Failed to reach storefront");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_freight_quote_backfills_address() {
    let client = session_client();
    let base_url = storefront_base_url();

    // Save an address with only postal code and number; lookup fills the rest
    let resp = client
        .put(format!("{base_url}/checkout/address"))
        .json(&valid_address())
        .send()
        .await
        .expect("Failed to save address");
    assert_eq!(resp.status(), StatusCode::OK);
    let validation: Value = resp.json().await.expect("Failed to parse validation");
    assert_eq!(validation["valid"], false); // street/city/region still blank

    let resp = client
        .post(format!("{base_url}/checkout/freight"))
        .send()
        .await
        .expect("Failed to quote freight");
    assert_eq!(resp.status(), StatusCode::OK);

    let quote: Value = resp.json().await.expect("Failed to parse quote");
    let options = quote["options"].as_array().expect("options array");
    assert_eq!(options.len(), 3);

    // 01001-000 resolves to SP, a near region
    let prices: Vec<i64> = options
        .iter()
        .map(|o| o["price"].as_i64().expect("price"))
        .collect();
    assert_eq!(prices, vec![1490, 2290, 3290]);

    // Selecting now succeeds because the lookup backfilled the address
    let resp = client
        .post(format!("{base_url}/checkout/freight/select"))
        .json(&json!({"index": 0}))
        .send()
        .await
        .expect("Failed to select freight");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_invalid_postal_code_is_rejected() {
    let client = session_client();
    let base_url = storefront_base_url();

    let mut address = valid_address();
    address["postal_code"] = json!("0100100"); // 7 digits
    client
        .put(format!("{base_url}/checkout/address"))
        .json(&address)
        .send()
        .await
        .expect("Failed to save address");

    let resp = client
        .post(format!("{base_url}/checkout/freight"))
        .send()
        .await
        .expect("Failed to quote freight");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_authenticated_checkout_rejects_empty_cart() {
    let client = session_client();
    let base_url = storefront_base_url();

    // Register (also logs in)
    let resp = client
        .post(format!("{base_url}/auth/register"))
        .json(&json!({"email": unique_email(), "password": "integration-test-pw"}))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::OK);

    // Fresh profile namespace means an empty cart
    let resp = client
        .post(format!("{base_url}/checkout"))
        .send()
        .await
        .expect("Failed to reach storefront");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_login_switches_cart_namespace_without_merge() {
    let client = session_client();
    let base_url = storefront_base_url();

    // Build a guest cart
    client
        .post(format!("{base_url}/cart/items"))
        .json(&json!({"product_id": SEEDED_PRODUCT, "quantity": 2}))
        .send()
        .await
        .expect("Failed to add to cart");

    // Register; the active namespace becomes the new profile's
    client
        .post(format!("{base_url}/auth/register"))
        .json(&json!({"email": unique_email(), "password": "integration-test-pw"}))
        .send()
        .await
        .expect("Failed to register");

    let resp = client
        .get(format!("{base_url}/cart"))
        .send()
        .await
        .expect("Failed to get cart");
    let cart: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(cart["item_count"], 0); // no merge

    // Logging out returns to the guest namespace, which kept its items
    client
        .post(format!("{base_url}/auth/logout"))
        .send()
        .await
        .expect("Failed to logout");

    let resp = client
        .get(format!("{base_url}/cart"))
        .send()
        .await
        .expect("Failed to get cart");
    let cart: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(cart["item_count"], 2);

    // Clean up the guest cart
    client
        .delete(format!("{base_url}/cart"))
        .send()
        .await
        .expect("Failed to clear cart");
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_checkout_result_requires_authentication() {
    let client = session_client();
    let base_url = storefront_base_url();

    let resp = client
        .get(format!("{base_url}/checkout/result?session_id=cs_test_missing"))
        .send()
        .await
        .expect("Failed to reach storefront");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["status"], "unauthorized");
}
