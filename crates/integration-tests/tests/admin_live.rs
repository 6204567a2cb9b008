//! Admin flows against a running server.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - The admin server running (cargo run -p amazon-clone-admin)
//! - An active admin whose credentials are in `ADMIN_TEST_EMAIL` and
//!   `ADMIN_TEST_PASSWORD` (create one with `ac-cli admin create`)

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use amazon_clone_integration_tests::admin_base_url;

fn credentials() -> (String, String) {
    (
        std::env::var("ADMIN_TEST_EMAIL").expect("ADMIN_TEST_EMAIL"),
        std::env::var("ADMIN_TEST_PASSWORD").expect("ADMIN_TEST_PASSWORD"),
    )
}

/// Log in and return the bearer token.
async fn login(client: &Client) -> String {
    let (email, password) = credentials();
    let resp = client
        .post(format!("{}/api/admin/auth/login", admin_base_url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Failed to read login response");
    assert_eq!(body["status"], true);
    body["token"].as_str().expect("token in body").to_owned()
}

#[tokio::test]
#[ignore = "Requires running admin server and a seeded admin"]
async fn test_login_then_logout_revokes_token() {
    let client = Client::new();
    let token = login(&client).await;
    let base_url = admin_base_url();

    let resp = client
        .get(format!("{base_url}/api/admin/auth/profile"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to get profile");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{base_url}/api/admin/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/api/admin/auth/profile"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to get profile");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running admin server and a seeded admin"]
async fn test_product_lifecycle() {
    let client = Client::new();
    let token = login(&client).await;
    let base_url = admin_base_url();
    let product_id = 900_001;

    let resp = client
        .post(format!("{base_url}/api/admin/products"))
        .bearer_auth(&token)
        .json(&json!({
            "id": product_id,
            "name": "Integration Test Kettle",
            "url": "https://example.com/kettle.jpg",
            "price": "₹1,299",
            "value": 1299,
            "accValue": 1299,
        }))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = client
        .post(format!("{base_url}/api/admin/products"))
        .bearer_auth(&token)
        .json(&json!({
            "id": product_id,
            "name": "Duplicate",
            "url": "https://example.com/dup.jpg",
            "price": "₹1",
        }))
        .send()
        .await
        .expect("Failed to post duplicate");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .put(format!("{base_url}/api/admin/products/{product_id}"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Renamed Kettle" }))
        .send()
        .await
        .expect("Failed to update product");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to read product");
    assert_eq!(body["product"]["name"], "Renamed Kettle");

    let resp = client
        .delete(format!("{base_url}/api/admin/products/{product_id}"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to delete product");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/api/admin/products/{product_id}"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to get product");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running admin server and a seeded admin"]
async fn test_dashboard_and_stats() {
    let client = Client::new();
    let token = login(&client).await;
    let base_url = admin_base_url();

    for path in [
        "dashboard/stats",
        "stats/products",
        "stats/orders",
        "stats/users",
        "analytics/revenue?days=7",
    ] {
        let resp = client
            .get(format!("{base_url}/api/admin/{path}"))
            .bearer_auth(&token)
            .send()
            .await
            .expect("Failed to get stats");
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
    }
}
