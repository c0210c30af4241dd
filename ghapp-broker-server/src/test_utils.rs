use crate::config::Settings;
use crate::create_app;
use crate::state::AppState;
use axum::body::Body;
use axum::Router;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use rand::rngs::OsRng;
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::sync::OnceLock;
use tower::ServiceExt;
use wiremock::matchers;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

/// PKCS#1 PEM private key generated once per test run
pub fn test_private_key() -> &'static str {
    static KEY: OnceLock<String> = OnceLock::new();
    KEY.get_or_init(|| {
        RsaPrivateKey::new(&mut OsRng, 2048)
            .expect("key generation failed")
            .to_pkcs1_pem(LineEnding::LF)
            .expect("PEM export failed")
            .to_string()
    })
}

/// Test fixture driving the application router against a mocked GitHub API.
///
/// ```rust
/// #[tokio::test]
/// async fn test_endpoint() {
///     let fixture = TestFixture::new().await;
///     fixture.configure().await;
///     fixture
///         .mock_installations(json!([{"account": {"login": "octo"}, "id": 1}]), 1)
///         .await;
///
///     let response = fixture.get("/token").await;
///     response.assert_ok();
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// Mock server standing in for api.github.com
    pub github_mock: MockServer,
}

impl TestFixture {
    /// Creates a fixture with default test settings
    pub async fn new() -> Self {
        Self::with_settings(|_| {}).await
    }

    /// Creates a fixture after letting `adjust` tweak the test settings
    pub async fn with_settings(adjust: impl FnOnce(&mut Settings)) -> Self {
        Self::setup_logger(LevelFilter::Debug);

        let github_mock = MockServer::start().await;
        let mut settings = Settings::for_test_with_mock(&github_mock);
        adjust(&mut settings);

        let state = AppState::new(settings)
            .await
            .expect("Failed to build application state");
        let app = create_app(state).await;

        Self { app, github_mock }
    }

    /// Initializes the test logger with the given level
    pub fn setup_logger(level: LevelFilter) {
        let _ = env_logger::builder()
            .filter_level(level)
            .is_test(true)
            .try_init();
    }

    /// Write a complete configuration with the test key and app id 12345
    pub async fn configure(&self) {
        self.post(
            "/config",
            &json!({"private_key": test_private_key(), "app_id": 12345}),
        )
        .await
        .assert_status(StatusCode::NO_CONTENT);
    }

    /// Mock `GET /app/installations`, expecting `expected_calls` requests
    pub async fn mock_installations(&self, body: Value, expected_calls: u64) {
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/app/installations"))
            .and(matchers::header(
                "accept",
                ghapp_broker::github::MACHINE_MAN_PREVIEW,
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(expected_calls)
            .mount(&self.github_mock)
            .await;
    }

    /// Mock the access token endpoint of one installation
    pub async fn mock_access_token(&self, installation_id: u64, token: &str, expected_calls: u64) {
        Mock::given(matchers::method("POST"))
            .and(matchers::path(format!(
                "/app/installations/{installation_id}/access_tokens"
            )))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "token": token,
                "expires_at": "2019-12-04T09:21:14Z"
            })))
            .expect(expected_calls)
            .mount(&self.github_mock)
            .await;
    }

    /// Creates a request builder with a JSON content type
    pub fn request_builder(&self, method: Method, uri: impl AsRef<str>) -> http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri.as_ref())
            .header("Content-Type", "application/json")
    }

    /// Sends a GET request to the specified URI
    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = self
            .request_builder(Method::GET, uri)
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a DELETE request to the specified URI
    pub async fn delete(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = self
            .request_builder(Method::DELETE, uri)
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a POST request with a JSON body to the specified URI
    pub async fn post<T: Serialize>(&self, uri: impl AsRef<str>, body: &T) -> TestResponse {
        self.send_json(Method::POST, uri, body).await
    }

    /// Sends a PUT request with a JSON body to the specified URI
    pub async fn put<T: Serialize>(&self, uri: impl AsRef<str>, body: &T) -> TestResponse {
        self.send_json(Method::PUT, uri, body).await
    }

    async fn send_json<T: Serialize>(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        body: &T,
    ) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        let request = self
            .request_builder(method, uri)
            .body(Body::from(json_body))
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a request and returns a TestResponse.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        // Try to parse as JSON, defaulting to empty object if parsing fails or empty body
        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| json!({}))
        } else {
            json!({})
        };

        TestResponse { status, json }
    }
}

/// Response from a test request that provides convenient access to status and JSON body.
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response body as JSON (if present and valid JSON)
    pub json: Value,
}

impl TestResponse {
    /// Asserts that the response has the expected status code.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            serde_json::to_string_pretty(&self.json).unwrap_or_default()
        );
        self
    }

    /// Asserts that the response status is OK (200).
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    /// Converts the response body to the specified type.
    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.json.clone()).expect("Failed to deserialize response JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrganizationsResponse;

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let fixture = TestFixture::new().await;
        fixture
            .get("/does-not-exist")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let fixture = TestFixture::new().await;

        let response = fixture.get("/openapi.json").await;
        response.assert_ok();
        assert_eq!(response.json["info"]["title"], "GitHub App Broker API");
        assert!(response.json["paths"]["/token/{organization}"].is_object());
    }

    #[tokio::test]
    async fn test_full_flow() {
        let fixture = TestFixture::new().await;
        fixture.configure().await;
        // Listing organizations and issuing the first token each list installations
        fixture
            .mock_installations(
                json!([
                    {"account": {"login": "ownername"}, "id": 12345},
                    {"account": {"login": "other"}, "id": 678}
                ]),
                2,
            )
            .await;
        fixture.mock_access_token(678, "v1.other", 1).await;

        let orgs = fixture.get("/token").await;
        orgs.assert_ok();
        let orgs = orgs.json_as::<OrganizationsResponse>();
        assert_eq!(orgs.organizations, vec!["ownername", "other"]);

        for _ in 0..3 {
            let token = fixture.get("/token/other").await;
            token.assert_ok();
            assert_eq!(token.json["token"], "v1.other");
        }
    }
}
