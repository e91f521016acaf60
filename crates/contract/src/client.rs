//! HTTP client for the service under test.
//!
//! [`ContractClient`] resolves request URIs against the configured base URL,
//! sends them with `reqwest` and captures the full response. It keeps no
//! per-user state: authorization travels with each [`HttpRequest`].

use http::header;
use tracing::{debug, info};

use crate::config::ContractConfig;
use crate::error::{ContractError, ContractResult};
use crate::model::{HUser, LoginResponse};
use crate::request::{HttpRequest, HttpRequestBuilder};
use crate::response::HttpResponse;

/// Path of the login endpoint, relative to the base URL.
pub const LOGIN_PATH: &str = "/authentication/login";

/// An authenticated administrative identity.
#[derive(Debug, Clone)]
pub struct AdminSession {
    /// The bearer token issued at login.
    pub token: String,
    /// The authenticated user, as returned by the login endpoint.
    pub user: HUser,
}

impl AdminSession {
    /// Attaches `Authorization: JWT <token>` to a request.
    pub fn authorize(&self, builder: HttpRequestBuilder) -> HttpRequestBuilder {
        builder.with_bearer_token(&self.token)
    }

    /// Returns the id of the authenticated user.
    pub fn user_id(&self) -> i64 {
        self.user.id
    }
}

/// Sends requests to the service under test.
#[derive(Debug, Clone)]
pub struct ContractClient {
    http: reqwest::Client,
    config: ContractConfig,
}

impl ContractClient {
    /// Creates a client honouring the configured timeout.
    pub fn new(config: ContractConfig) -> ContractResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self { http, config })
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    /// Resolves a request URI against the base URL.
    ///
    /// Absolute URIs are used as-is.
    pub fn resolve(&self, uri: &str) -> String {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            return uri.to_string();
        }
        let base = self.config.base_url.trim_end_matches('/');
        if uri.starts_with('/') {
            format!("{}{}", base, uri)
        } else {
            format!("{}/{}", base, uri)
        }
    }

    /// Sends a request and captures status, headers and body text.
    pub async fn execute(&self, request: &HttpRequest) -> ContractResult<HttpResponse> {
        let url = self.resolve(request.uri());
        debug!(method = %request.method(), url = %url, "Sending request");

        let mut outgoing = self
            .http
            .request(request.method().clone(), &url)
            .headers(request.headers().clone());

        if !request.query().is_empty() {
            outgoing = outgoing.query(request.query());
        }

        if let Some(body) = request.body() {
            outgoing = outgoing.json(body);
        }

        let response = outgoing.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await?;

        debug!(
            method = %request.method(),
            url = %url,
            status,
            body_len = body.len(),
            "Received response"
        );

        Ok(HttpResponse::new(status, headers, body))
    }

    /// Logs in the configured administrative identity.
    pub async fn admin_session(&self) -> ContractResult<AdminSession> {
        self.login(&self.config.admin_username, &self.config.admin_password)
            .await
    }

    /// Logs in with the given credentials through the form-encoded login endpoint.
    pub async fn login(&self, username: &str, password: &str) -> ContractResult<AdminSession> {
        let url = self.resolve(LOGIN_PATH);
        debug!(url = %url, username, "Logging in");

        let response = self
            .http
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ContractError::Authentication(format!(
                "login of {} returned {}: {}",
                username,
                status.as_u16(),
                body
            )));
        }

        let login: LoginResponse = serde_json::from_str(&body).map_err(|e| {
            ContractError::Authentication(format!("unexpected login body: {}", e))
        })?;

        if login.token.is_empty() {
            return Err(ContractError::Authentication(format!(
                "login of {} returned no token",
                username
            )));
        }

        info!(username, user_id = login.authenticable.id, "Logged in");

        Ok(AdminSession {
            token: login.token,
            user: login.authenticable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

    fn test_client(base_url: &str) -> ContractClient {
        ContractClient::new(ContractConfig::for_testing(base_url)).unwrap()
    }

    #[test]
    fn resolve_joins_base_and_path() {
        let client = test_client("http://localhost:8181/hyperiot/");
        assert_eq!(
            client.resolve("/hprojects/1"),
            "http://localhost:8181/hyperiot/hprojects/1"
        );
        assert_eq!(
            client.resolve("hprojects"),
            "http://localhost:8181/hyperiot/hprojects"
        );
        assert_eq!(client.resolve("http://other/x"), "http://other/x");
    }

    #[tokio::test]
    async fn login_returns_session() {
        let mock_server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/hyperiot/authentication/login"))
            .and(matchers::body_string_contains("username=hadmin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "abc.def",
                "authenticable": {"id": 1, "username": "hadmin", "admin": true}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&format!("{}/hyperiot", mock_server.uri()));
        let session = client.admin_session().await.unwrap();
        assert_eq!(session.token, "abc.def");
        assert_eq!(session.user_id(), 1);
    }

    #[tokio::test]
    async fn login_rejected_is_authentication_error() {
        let mock_server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("denied"))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());
        let err = client.admin_session().await.unwrap_err();
        assert!(matches!(err, ContractError::Authentication(_)));
        assert!(err.is_setup());
    }

    #[tokio::test]
    async fn execute_sends_token_query_and_body() {
        let mock_server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/hprojects"))
            .and(matchers::query_param("delta", "10"))
            .and(matchers::header("Authorization", "JWT tok"))
            .and(matchers::body_json(json!({"name": "p"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());
        let session = AdminSession {
            token: "tok".to_string(),
            user: HUser::default(),
        };
        let request = session
            .authorize(HttpRequestBuilder::post())
            .with_uri("/hprojects")
            .with_parameter("delta", "10")
            .with_json_body(&json!({"name": "p"}))
            .build()
            .unwrap();

        let response = client.execute(&request).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.json().unwrap()["id"], 5);
    }

    #[tokio::test]
    async fn execute_keeps_empty_body() {
        let mock_server = MockServer::start().await;
        Mock::given(matchers::method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());
        let request = HttpRequestBuilder::delete()
            .with_uri("/hprojects/9")
            .build()
            .unwrap();
        let response = client.execute(&request).await.unwrap();
        assert_eq!(response.status(), 200);
        assert!(response.body().is_empty());
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        // port 9 (discard) is not listening on loopback
        let client = test_client("http://127.0.0.1:9");
        let request = HttpRequestBuilder::get()
            .with_uri("/hprojects/all")
            .build()
            .unwrap();
        let err = client.execute(&request).await.unwrap_err();
        assert!(matches!(err, ContractError::Transport(_)));
    }
}
