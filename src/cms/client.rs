//! Sanity query API client
//!
//! Issues GROQ queries over the HTTP query endpoint:
//! `GET https://{project}.{api|apicdn}.sanity.io/v{version}/data/query/{dataset}`
//! with the query and its `$parameters` in the query string.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::CmsError;
use crate::config::CmsConfig;

/// Outbound timeout for CMS queries
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP client for the CMS query API
#[derive(Debug, Clone)]
pub struct SanityClient {
    http: reqwest::Client,
    config: CmsConfig,
    /// Overrides the derived `https://{project}.api.sanity.io` origin
    endpoint: Option<String>,
}

impl SanityClient {
    /// Create a client for the configured project
    pub fn new(config: CmsConfig) -> Result<Self, CmsError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            config,
            endpoint: None,
        })
    }

    /// Send queries to a different origin (e.g. a local mirror)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into().trim_end_matches('/').to_string());
        self
    }

    pub fn config(&self) -> &CmsConfig {
        &self.config
    }

    /// Whether a project is configured; unconfigured clients answer every query with `null`
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Full URL of the query endpoint
    pub fn query_url(&self) -> String {
        let origin = match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => {
                let host = if self.config.use_cdn { "apicdn" } else { "api" };
                format!("https://{}.{}.sanity.io", self.config.project_id, host)
            }
        };
        let version = self.config.api_version.trim_start_matches('v');
        format!("{}/v{}/data/query/{}", origin, version, self.config.dataset)
    }

    /// Run a query and return its raw `result`
    ///
    /// Parameters are JSON-encoded and passed as `$name=<json>`.
    pub async fn fetch(&self, query: &str, params: &[(&str, Value)]) -> Result<Value, CmsError> {
        if !self.is_configured() {
            return Ok(Value::Null);
        }

        let mut pairs: Vec<(String, String)> = Vec::with_capacity(params.len() + 1);
        pairs.push(("query".to_string(), query.to_string()));
        for (name, value) in params {
            pairs.push((format!("${}", name), value.to_string()));
        }

        let mut request = self.http.get(self.query_url()).query(&pairs);
        if let Some(token) = self.config.token.as_deref().filter(|t| !t.is_empty()) {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = error_message(&body).unwrap_or_else(|| status.to_string());
            tracing::warn!("CMS query failed ({}): {}", status.as_u16(), message);
            return Err(CmsError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }

    /// Run a query and decode its result; `null` becomes `T::default()`
    pub async fn fetch_as<T>(&self, query: &str, params: &[(&str, Value)]) -> Result<T, CmsError>
    where
        T: DeserializeOwned + Default,
    {
        let value = self.fetch(query, params).await?;
        if value.is_null() {
            return Ok(T::default());
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Pull a human readable message out of an error body
fn error_message(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    error
        .get("description")
        .or_else(|| error.get("message"))
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    fn configured() -> CmsConfig {
        CmsConfig {
            project_id: "abc123".to_string(),
            ..CmsConfig::default()
        }
    }

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_query_url() {
        let client = SanityClient::new(configured()).unwrap();
        assert_eq!(
            client.query_url(),
            "https://abc123.api.sanity.io/v2024-01-01/data/query/production"
        );

        let cdn = SanityClient::new(CmsConfig {
            use_cdn: true,
            api_version: "v2023-05-03".to_string(),
            ..configured()
        })
        .unwrap();
        assert_eq!(
            cdn.query_url(),
            "https://abc123.apicdn.sanity.io/v2023-05-03/data/query/production"
        );
    }

    #[tokio::test]
    async fn test_unconfigured_returns_null() {
        let client = SanityClient::new(CmsConfig::default()).unwrap();
        assert!(!client.is_configured());

        let value = client.fetch("*[_type == \"post\"]", &[]).await.unwrap();
        assert!(value.is_null());

        let posts: Vec<String> = client.fetch_as("*", &[]).await.unwrap();
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_passes_query_and_params() {
        let router = Router::new().route(
            "/v2024-01-01/data/query/production",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                Json(json!({ "result": { "query": q.get("query"), "slug": q.get("$slug"), "limit": q.get("$limit") } }))
            }),
        );
        let endpoint = spawn(router).await;
        let client = SanityClient::new(configured()).unwrap().with_endpoint(endpoint);

        let value = client
            .fetch("*[slug.current == $slug]", &[("slug", json!("respirar")), ("limit", json!(3))])
            .await
            .unwrap();

        assert_eq!(value["query"], "*[slug.current == $slug]");
        assert_eq!(value["slug"], "\"respirar\"");
        assert_eq!(value["limit"], "3");
    }

    #[tokio::test]
    async fn test_fetch_sends_bearer_token() {
        let router = Router::new().route(
            "/v2024-01-01/data/query/production",
            get(|headers: axum::http::HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                Json(json!({ "result": auth }))
            }),
        );
        let endpoint = spawn(router).await;
        let client = SanityClient::new(CmsConfig {
            token: Some("secret".to_string()),
            ..configured()
        })
        .unwrap()
        .with_endpoint(endpoint);

        let value = client.fetch("*", &[]).await.unwrap();
        assert_eq!(value, json!("Bearer secret"));
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let router = Router::new().route(
            "/v2024-01-01/data/query/production",
            get(|| async {
                (
                    axum::http::StatusCode::BAD_REQUEST,
                    Json(json!({ "error": { "description": "param $slug referenced, but not provided" } })),
                )
            }),
        );
        let endpoint = spawn(router).await;
        let client = SanityClient::new(configured()).unwrap().with_endpoint(endpoint);

        match client.fetch("*", &[]).await {
            Err(CmsError::Http { status, message }) => {
                assert_eq!(status, 400);
                assert!(message.contains("$slug"));
            }
            other => panic!("expected http error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(&json!({ "error": { "description": "bad" } })),
            Some("bad".to_string())
        );
        assert_eq!(error_message(&json!({ "error": "plain" })), Some("plain".to_string()));
        assert_eq!(error_message(&json!({ "message": "x" })), None);
    }
}
