//! End-to-end tests for the Cartwheel storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo run -p cartwheel-cli -- migrate
//! cargo run -p cartwheel-cli -- seed catalog
//! cargo run -p cartwheel-storefront &
//! cargo test -p cartwheel-integration-tests -- --ignored
//! ```
//!
//! The tests register fresh users on every run, so they can share a database
//! with manual testing. They assume the default stock policy (debit on add,
//! restore on clear).

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the storefront API (configurable via environment).
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// An unused email address.
#[must_use]
pub fn unique_email() -> String {
    format!("shopper-{}@example.com", Uuid::new_v4().simple())
}

/// A registered, logged-in shopper.
pub struct Shopper {
    pub client: Client,
    pub base_url: String,
    pub token: String,
    pub user: Value,
}

/// Failure talking to the storefront.
#[derive(Debug)]
pub struct HarnessError(pub String);

impl std::fmt::Display for HarnessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for HarnessError {}

impl From<reqwest::Error> for HarnessError {
    fn from(e: reqwest::Error) -> Self {
        Self(e.to_string())
    }
}

impl Shopper {
    /// Register a new account and log it in.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError` if the server is unreachable or either call fails.
    pub async fn register() -> Result<Self, HarnessError> {
        let client = Client::new();
        let base_url = storefront_base_url();
        let email = unique_email();
        let password = "correct horse battery";

        let resp = client
            .post(format!("{base_url}/api/user/register"))
            .json(&json!({
                "firstName": "Test",
                "lastName": "Shopper",
                "email": email,
                "password": password,
            }))
            .send()
            .await?;
        if resp.status() != StatusCode::OK {
            return Err(HarnessError(format!("register failed: {}", resp.status())));
        }

        let resp = client
            .post(format!("{base_url}/api/user/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        if resp.status() != StatusCode::OK {
            return Err(HarnessError(format!("login failed: {}", resp.status())));
        }
        let body: Value = resp.json().await?;
        let token = body["data"]["token"]
            .as_str()
            .ok_or_else(|| HarnessError("login response without token".to_string()))?
            .to_string();

        Ok(Self {
            client,
            base_url,
            token,
            user: body["data"]["user"].clone(),
        })
    }

    /// An authenticated request.
    #[must_use]
    pub fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
    }

    /// Send a request and return status and JSON body.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError` if the request fails or the body isn't JSON.
    pub async fn send(request: RequestBuilder) -> Result<(StatusCode, Value), HarnessError> {
        let resp = request.send().await?;
        let status = resp.status();
        Ok((status, resp.json().await?))
    }
}

/// Current stock of a product, read from the catalog.
///
/// # Errors
///
/// Returns `HarnessError` if the catalog can't be read or lacks the product.
pub async fn product_stock(client: &Client, product_id: i64) -> Result<i64, HarnessError> {
    let body: Value = client
        .get(format!("{}/api/product", storefront_base_url()))
        .send()
        .await?
        .json()
        .await?;
    body["data"]
        .as_array()
        .and_then(|products| products.iter().find(|p| p["id"] == product_id))
        .and_then(|p| p["stock"].as_i64())
        .ok_or_else(|| HarnessError(format!("product {product_id} not in catalog")))
}

/// The first product with at least `min_stock` units.
///
/// # Errors
///
/// Returns `HarnessError` if no product qualifies.
pub async fn product_with_stock(client: &Client, min_stock: i64) -> Result<Value, HarnessError> {
    let body: Value = client
        .get(format!("{}/api/product", storefront_base_url()))
        .send()
        .await?
        .json()
        .await?;
    body["data"]
        .as_array()
        .and_then(|products| {
            products
                .iter()
                .find(|p| p["stock"].as_i64().is_some_and(|s| s >= min_stock))
        })
        .cloned()
        .ok_or_else(|| HarnessError(format!("no product with {min_stock} units, seed the catalog")))
}
