//! In-process stand-in for the HTTP transport, shared by unit tests.

use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;

use crate::http::{error_json, HttpJsonClient};

struct Route {
    needles: Vec<String>,
    body: Value,
    delay: Option<Duration>,
}

/// Answers requests from a fixed route table and records every URL asked for.
/// The first route whose needles all occur in the URL wins; unmatched URLs
/// get a transport-style error body.
#[derive(Default)]
pub struct FakeHttp {
    routes: Vec<Route>,
    calls: Mutex<Vec<String>>,
    forms: Mutex<Vec<Vec<(String, String)>>>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, needles: &[&str], body: Value) -> Self {
        self.routes.push(Route {
            needles: needles.iter().map(|s| s.to_string()).collect(),
            body,
            delay: None,
        });
        self
    }

    pub fn route_delayed(mut self, needles: &[&str], body: Value, delay: Duration) -> Self {
        self.routes.push(Route {
            needles: needles.iter().map(|s| s.to_string()).collect(),
            body,
            delay: Some(delay),
        });
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_matching(&self, needle: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.contains(needle))
            .count()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn posted_forms(&self) -> Vec<Vec<(String, String)>> {
        self.forms.lock().unwrap().clone()
    }

    async fn respond(&self, url: &str) -> Value {
        self.calls.lock().unwrap().push(url.to_string());
        let route = self
            .routes
            .iter()
            .find(|r| r.needles.iter().all(|n| url.contains(n.as_str())));
        match route {
            Some(r) => {
                if let Some(delay) = r.delay {
                    tokio::time::sleep(delay).await;
                }
                r.body.clone()
            }
            None => error_json(format!("no route for {url}")),
        }
    }
}

#[async_trait::async_trait]
impl HttpJsonClient for FakeHttp {
    async fn get_json(&self, url: &str) -> Value {
        self.respond(url).await
    }

    async fn post_json(&self, url: &str, form: &[(&str, &str)]) -> Value {
        self.forms.lock().unwrap().push(
            form.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self.respond(url).await
    }
}
