//! Integration test harness for the Toko API.
//!
//! Builds the real router over in-memory storage and an in-memory session
//! store, then drives it with `tower::ServiceExt::oneshot`. No database or
//! running server is needed:
//!
//! ```bash
//! cargo test -p toko-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use toko_api::config::ApiConfig;
use toko_api::db::{MemoryStore, Stores};
use toko_api::state::AppState;

/// Default password used by [`TestApp::login_as`].
pub const PASSWORD: &str = "rahasia123";

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    /// JSON body, or `Value::Null` if the body was not JSON.
    pub body: Value,
    /// Raw body text.
    pub text: String,
    /// `name=value` of the first `Set-Cookie` header, if any.
    pub cookie: Option<String>,
}

/// The API router plus the state behind it.
pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    /// Fresh app with empty storage and rate limiting off.
    #[must_use]
    pub fn new() -> Self {
        let mut config = ApiConfig::new(SecretString::from("postgres://unused/toko"));
        config.auth_rate_limit = false;
        Self::with_config(config)
    }

    /// Fresh app with empty storage and the `/api/auth` rate limit on.
    #[must_use]
    pub fn with_auth_rate_limit() -> Self {
        Self::with_config(ApiConfig::new(SecretString::from("postgres://unused/toko")))
    }

    fn with_config(config: ApiConfig) -> Self {
        let state = AppState::new(config, Stores::in_memory(MemoryStore::new()));
        let router = toko_api::app(state.clone(), tower_sessions::MemoryStore::default());
        Self { state, router }
    }

    /// Send a request, optionally with a JSON body and a session cookie.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    /// Send a prebuilt request.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_owned);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);

        TestResponse {
            status,
            body,
            text,
            cookie,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, None, cookie).await
    }

    pub async fn post(&self, uri: &str, body: Value, cookie: Option<&str>) -> TestResponse {
        self.request(Method::POST, uri, Some(body), cookie).await
    }

    pub async fn put(&self, uri: &str, body: Value, cookie: Option<&str>) -> TestResponse {
        self.request(Method::PUT, uri, Some(body), cookie).await
    }

    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, None, cookie).await
    }

    /// Register `username` and log in; returns the session cookie.
    pub async fn login_as(&self, username: &str) -> String {
        let credentials = json!({ "username": username, "password": PASSWORD });

        let registered = self.post("/api/auth/register", credentials.clone(), None).await;
        assert_eq!(registered.status, StatusCode::CREATED, "{}", registered.text);

        let login = self.post("/api/auth/login", credentials, None).await;
        assert_eq!(login.status, StatusCode::OK, "{}", login.text);
        login.cookie.expect("login sets a session cookie")
    }

    /// Create a product through the API; returns its id.
    pub async fn create_product(&self, cookie: &str, name: &str, price: i64, stock: i64) -> i64 {
        let response = self
            .post(
                "/api/products",
                json!({ "name": name, "price": price, "stock": stock }),
                Some(cookie),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text);
        response.body["id"].as_i64().unwrap()
    }

    /// Add a product to the cart; returns the cart line id.
    pub async fn add_to_cart(&self, cookie: &str, product_id: i64, quantity: i64) -> i64 {
        let response = self
            .post(
                "/api/cart",
                json!({ "product_id": product_id, "quantity": quantity }),
                Some(cookie),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text);
        response.body["cart_item"]["id"].as_i64().unwrap()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
