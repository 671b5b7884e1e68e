//! Integration tests for cart operations.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - A seeded catalog (mg-cli seed)
//! - The storefront running (cargo run -p mangaba-storefront)
//!
//! Run with: cargo test -p mangaba-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::{Value, json};

use mangaba_integration_tests::{session_client, storefront_base_url};

const SEEDED_PRODUCT: &str = "prod_mug_terracotta";

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_health() {
    let client = session_client();
    let base_url = storefront_base_url();

    let resp = client
        .get(format!("{base_url}/health"))
        .send()
        .await
        .expect("Failed to reach storefront");

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_guest_cart_add_and_decrement() {
    let client = session_client();
    let base_url = storefront_base_url();

    // Add two units
    let resp = client
        .post(format!("{base_url}/cart/items"))
        .json(&json!({"product_id": SEEDED_PRODUCT, "quantity": 2}))
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::OK);

    let cart: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(cart["item_count"], 2);
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(1));

    // Adding the same product again merges into the existing line
    let resp = client
        .post(format!("{base_url}/cart/items"))
        .json(&json!({"product_id": SEEDED_PRODUCT}))
        .send()
        .await
        .expect("Failed to add to cart");
    let cart: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(cart["items"][0]["quantity"], 3);

    // Decrement twice, then the line survives at quantity 1
    for _ in 0..2 {
        client
            .post(format!("{base_url}/cart/items/{SEEDED_PRODUCT}/decrement"))
            .send()
            .await
            .expect("Failed to decrement");
    }
    let resp = client
        .get(format!("{base_url}/cart"))
        .send()
        .await
        .expect("Failed to get cart");
    let cart: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(cart["items"][0]["quantity"], 1);

    // Clear the cart for the next run
    let resp = client
        .delete(format!("{base_url}/cart"))
        .send()
        .await
        .expect("Failed to clear cart");
    let cart: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(cart["item_count"], 0);
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_add_unknown_product_is_404() {
    let client = session_client();
    let base_url = storefront_base_url();

    let resp = client
        .post(format!("{base_url}/cart/items"))
        .json(&json!({"product_id": "prod_does_not_exist"}))
        .send()
        .await
        .expect("Failed to reach storefront");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
