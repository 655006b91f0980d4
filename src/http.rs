//! JSON-over-HTTP transport shared by the token provider and the API client.
//!
//! Transport failures are not returned as `Err`: they come back as an
//! error-shaped JSON body so callers check one thing for both transport and
//! upstream-reported failures.

use std::time::Duration;

use serde_json::{json, Value};

const USER_AGENT: &str = concat!("artfeed/", env!("CARGO_PKG_VERSION"));

/// Minimal async JSON client used by the rest of the crate.
#[async_trait::async_trait]
pub trait HttpJsonClient: Send + Sync {
    async fn get_json(&self, url: &str) -> Value;

    async fn post_json(&self, url: &str, form: &[(&str, &str)]) -> Value;
}

/// Build the body returned in place of a failed request.
pub fn error_json(message: impl Into<String>) -> Value {
    json!({
        "status": "error",
        "error_description": message.into(),
    })
}

/// Build the `reqwest` client used for every upstream call.
pub fn build_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

async fn read_json(result: reqwest::Result<reqwest::Response>, url: &str) -> Value {
    let response = match result {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(url = %redact(url), error = %e, "Request failed");
            return error_json(format!("Request error: {e}"));
        }
    };
    let status = response.status();
    match response.json::<Value>().await {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(url = %redact(url), %status, error = %e, "Response body is not JSON");
            error_json(format!("Unreadable response (HTTP {status}): {e}"))
        }
    }
}

/// Strip the query string so access tokens never reach the logs.
pub fn redact(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}

#[async_trait::async_trait]
impl HttpJsonClient for reqwest::Client {
    async fn get_json(&self, url: &str) -> Value {
        read_json(self.get(url).send().await, url).await
    }

    async fn post_json(&self, url: &str, form: &[(&str, &str)]) -> Value {
        read_json(self.post(url).form(form).send().await, url).await
    }
}
