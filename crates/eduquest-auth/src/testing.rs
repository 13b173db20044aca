use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderMap;
use tokio::net::TcpListener;

use crate::app::App;
use crate::auth::{ExternalProfile, IdentityProvider, ProviderError};
use crate::config::Config;

/// Identity provider that resolves fixed authorization codes to profiles.
#[derive(Debug, Clone, Default)]
pub struct StubIdentityProvider {
    profiles: HashMap<String, ExternalProfile>,
}

impl StubIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `code` exchange for `profile`.
    pub fn with_profile(mut self, code: &str, profile: ExternalProfile) -> Self {
        self.profiles.insert(code.to_string(), profile);
        self
    }
}

#[async_trait::async_trait]
impl IdentityProvider for StubIdentityProvider {
    fn authorization_url(&self) -> String {
        "https://id.example.test/authorize?client_id=stub".to_string()
    }

    async fn exchange(&self, code: &str) -> Result<ExternalProfile, ProviderError> {
        self.profiles
            .get(code)
            .cloned()
            .ok_or_else(|| ProviderError::Rejected(format!("unknown code {code}")))
    }
}

/// Build an [`App`] over a fresh in-memory SQLite database.
pub async fn test_app() -> App {
    App::with_config(Config::for_tests())
        .await
        .expect("Failed to create test app")
}

/// A running server for HTTP-level integration tests.
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_register() {
///     let app = TestApp::new().await;
///     let res = app.client.post(&app.url("/api/auth/register"), r#"{"email":"a@b.com","password":"secret123"}"#).await;
///     assert_eq!(res.status, 201);
/// }
/// ```
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: TestClient,
    pub app: Arc<App>,
}

impl TestApp {
    /// Serve with the test config and no identity provider.
    pub async fn new() -> Self {
        Self::from_app(test_app().await).await
    }

    /// Serve with a stub identity provider.
    pub async fn with_provider(provider: StubIdentityProvider) -> Self {
        Self::from_app(test_app().await.with_identity_provider(Arc::new(provider))).await
    }

    /// Serve a prepared app on an ephemeral port.
    pub async fn from_app(app: App) -> Self {
        let router = app.router();
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("Failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("test server failed");
        });

        TestApp {
            addr,
            client: TestClient::new(addr),
            app: Arc::new(app),
        }
    }

    /// Get the full URL for a path on the test server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Register a user and return the token and user JSON.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> (String, serde_json::Value) {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "name": name,
        });

        let res = self
            .client
            .post(&self.url("/api/auth/register"), &body.to_string())
            .await;

        assert_eq!(res.status, 201, "Register failed: {}", res.body);

        let data = res.data();
        let token = data["token"].as_str().expect("token").to_string();
        (token, data["user"].clone())
    }

    /// Login and return the token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let body = serde_json::json!({
            "email": email,
            "password": password,
        });

        let res = self
            .client
            .post(&self.url("/api/auth/login"), &body.to_string())
            .await;

        assert_eq!(res.status, 200, "Login failed: {}", res.body);
        res.data()["token"].as_str().expect("token").to_string()
    }
}

/// HTTP client for tests. Does not follow redirects.
#[derive(Clone)]
pub struct TestClient {
    inner: reqwest::Client,
    base_addr: SocketAddr,
}

impl TestClient {
    pub fn new(addr: SocketAddr) -> Self {
        let inner = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to build test client");

        TestClient {
            inner,
            base_addr: addr,
        }
    }

    pub async fn get(&self, url: &str) -> TestResponse {
        let res = self.inner.get(url).send().await.expect("GET request failed");
        TestResponse::from_response(res).await
    }

    pub async fn get_with_auth(&self, url: &str, token: &str) -> TestResponse {
        let res = self
            .inner
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .expect("GET request failed");
        TestResponse::from_response(res).await
    }

    pub async fn post(&self, url: &str, body: &str) -> TestResponse {
        let res = self
            .inner
            .post(url)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("POST request failed");
        TestResponse::from_response(res).await
    }

    pub async fn post_with_auth(&self, url: &str, token: &str, body: &str) -> TestResponse {
        let res = self
            .inner
            .post(url)
            .header("Content-Type", "application/json")
            .bearer_auth(token)
            .body(body.to_string())
            .send()
            .await
            .expect("POST request failed");
        TestResponse::from_response(res).await
    }

    pub async fn put_with_auth(&self, url: &str, token: &str, body: &str) -> TestResponse {
        let res = self
            .inner
            .put(url)
            .header("Content-Type", "application/json")
            .bearer_auth(token)
            .body(body.to_string())
            .send()
            .await
            .expect("PUT request failed");
        TestResponse::from_response(res).await
    }

    pub async fn delete_with_auth(&self, url: &str, token: &str, body: &str) -> TestResponse {
        let res = self
            .inner
            .delete(url)
            .header("Content-Type", "application/json")
            .bearer_auth(token)
            .body(body.to_string())
            .send()
            .await
            .expect("DELETE request failed");
        TestResponse::from_response(res).await
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.base_addr)
    }
}

/// A simplified HTTP response for test assertions.
#[derive(Debug)]
pub struct TestResponse {
    pub status: u16,
    pub body: String,
    pub headers: HeaderMap,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let body = res.text().await.unwrap_or_default();
        TestResponse {
            status,
            body,
            headers,
        }
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("Failed to parse response as JSON")
    }

    pub fn is_success(&self) -> bool {
        self.json()["success"].as_bool().unwrap_or(false)
    }

    pub fn data(&self) -> serde_json::Value {
        self.json()["data"].clone()
    }

    pub fn error(&self) -> serde_json::Value {
        self.json()["error"].clone()
    }

    /// The `Location` header of a redirect.
    pub fn location(&self) -> Option<String> {
        self.headers
            .get("location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}
