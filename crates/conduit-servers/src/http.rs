//! Outbound HTTP for the market-data and brokerage servers.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use conduit_config::schema::AlphaVantageConfig;

use crate::error::ServerError;

const USER_AGENT: &str = concat!("conduit/", env!("CARGO_PKG_VERSION"));

/// Per-call ceiling; the dispatcher deadline usually fires first.
const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

/// A shared HTTP client rooted at one API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Builds a client for `base_url` (trailing slashes are ignored).
    pub fn new(base_url: &str) -> Result<Self, ServerError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ServerError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Full URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GETs `path` with `query` and returns the body text.
    pub async fn get_text(&self, path: &str, query: &[(&str, &str)]) -> Result<String, ServerError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| http_error(&url, e))?;
        response.text().await.map_err(|e| http_error(&url, e))
    }

    /// POSTs `body` as JSON to `path` with extra headers; returns the body text.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        headers: &[(&str, &str)],
        body: &T,
    ) -> Result<String, ServerError> {
        let url = self.url(path);
        debug!(%url, "POST");
        let mut request = self.client.post(&url).json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| http_error(&url, e))?;
        response.text().await.map_err(|e| http_error(&url, e))
    }
}

/// Alpha Vantage `/query` endpoint with a fixed API key.
#[derive(Debug, Clone)]
pub struct AlphaVantage {
    api: ApiClient,
    api_key: String,
}

impl AlphaVantage {
    pub fn new(config: &AlphaVantageConfig) -> Result<Self, ServerError> {
        Ok(Self {
            api: ApiClient::new(&config.base_url)?,
            api_key: config.api_key.clone(),
        })
    }

    /// Calls `function` with extra `params`; returns the raw body.
    pub async fn query(&self, function: &str, params: &[(&str, &str)]) -> Result<String, ServerError> {
        let mut query = Vec::with_capacity(params.len() + 2);
        query.push(("function", function));
        query.extend_from_slice(params);
        query.push(("apikey", self.api_key.as_str()));
        self.api.get_text("/query", &query).await
    }
}

fn http_error(url: &str, e: reqwest::Error) -> ServerError {
    let reason = match e.status() {
        Some(status) => format!("HTTP {status}"),
        None => e.to_string(),
    };
    ServerError::Http {
        url: url.to_string(),
        reason,
    }
}
