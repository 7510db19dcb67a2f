//! HTTP transport shared by the API clients
//!
//! Every remote call goes through the `Fetch` trait so the clients can be
//! driven by a recording stub in tests.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

/// User agent sent with every request
const USER_AGENT: &str = concat!("menufinder/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur during a remote call
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// A GET request with query parameters and optional bearer token
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub bearer: Option<String>,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            bearer: None,
        }
    }

    /// Appends a query parameter
    pub fn param(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// Sets the `Authorization: Bearer` token
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Looks up the first value of a query parameter
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Issues GET requests on behalf of the API clients
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetches a JSON document, regardless of the HTTP status
    async fn get_json(&self, request: &Request) -> Result<Value, FetchError>;

    /// Fetches a response body as text
    async fn get_text(&self, request: &Request) -> Result<String, FetchError>;
}

/// `Fetch` implementation backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    /// Create a new HttpFetcher with default settings
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Create a new HttpFetcher with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn build(&self, request: &Request) -> reqwest::RequestBuilder {
        let mut builder = self.client.get(&request.url).query(&request.query);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        builder
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get_json(&self, request: &Request) -> Result<Value, FetchError> {
        // Providers report errors in the body, often with a 4xx status
        let response = self.build(request).send().await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn get_text(&self, request: &Request) -> Result<String, FetchError> {
        let response = self.build(request).send().await?;
        Ok(response.text().await?)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder_collects_params() {
        let request = Request::get("https://api.example.com/search")
            .param("term", "pizza")
            .param("limit", 5)
            .bearer("secret");

        assert_eq!(request.url, "https://api.example.com/search");
        assert_eq!(request.query_value("term"), Some("pizza"));
        assert_eq!(request.query_value("limit"), Some("5"));
        assert_eq!(request.query_value("offset"), None);
        assert_eq!(request.bearer.as_deref(), Some("secret"));
    }

    #[test]
    fn test_http_fetcher_builds_bearer_header() {
        let fetcher = HttpFetcher::new();
        let request = Request::get("https://api.example.com/search")
            .param("term", "tacos")
            .bearer("token123");

        let built = fetcher.build(&request).build().expect("request should build");
        assert_eq!(built.url().query(), Some("term=tacos"));
        assert_eq!(
            built.headers().get("authorization").unwrap(),
            "Bearer token123"
        );
    }

    #[test]
    fn test_http_fetcher_default() {
        let fetcher = HttpFetcher::default();
        let built = fetcher
            .build(&Request::get("https://example.com/"))
            .build()
            .unwrap();
        assert!(built.headers().get("authorization").is_none());
    }
}
