//! Reporter Adapter: wraps outbound payloads in the server envelope and
//! ships them over HTTP. Send failures are logged, not propagated as job
//! failures — the core does not retry.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

#[derive(Serialize)]
struct Envelope {
    #[serde(rename = "QUERY")]
    query: &'static str,
    #[serde(rename = "CONTENT")]
    content: Value,
}

/// Thin sender abstraction so the coordinator can be tested without a
/// live server.
#[async_trait::async_trait]
pub trait Reporter: Send + Sync {
    async fn send(&self, content: Value);
}

/// Default reporter: POSTs the envelope to the configured server URL.
pub struct HttpReporter {
    client: reqwest::Client,
    url: String,
}

impl HttpReporter {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait::async_trait]
impl Reporter for HttpReporter {
    async fn send(&self, content: Value) {
        let envelope = Envelope {
            query: "NETDISCOVERY",
            content,
        };
        if let Err(err) = self.client.post(&self.url).json(&envelope).send().await {
            warn!("failed to send report to {}: {}", self.url, err);
        }
    }
}

pub fn start_message(agent_version: &str, module_version: &str, process_number: &str) -> Value {
    json!({
        "AGENT": { "START": "1", "AGENTVERSION": agent_version },
        "MODULEVERSION": module_version,
        "PROCESSNUMBER": process_number,
    })
}

pub fn nbip_message(block_size: usize, process_number: &str) -> Value {
    json!({
        "AGENT": { "NBIP": block_size },
        "PROCESSNUMBER": process_number,
    })
}

pub fn end_message(module_version: &str, process_number: &str) -> Value {
    json!({
        "AGENT": { "END": "1" },
        "MODULEVERSION": module_version,
        "PROCESSNUMBER": process_number,
    })
}

pub fn dico_refresh_message(module_version: &str, process_number: &str) -> Value {
    json!({
        "AGENT": { "END": "1" },
        "MODULEVERSION": module_version,
        "PROCESSNUMBER": process_number,
        "DICO": "REQUEST",
    })
}
