//! Configuration settings structures for the discovery agent: a
//! `#[serde(default)]` struct-of-structs with a matching `Default` impl
//! and manual `apply_overrides`/`apply_env_overrides` methods.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Top-level discovery agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub log: String,

    // Worker pool sizing (§5, §4.7).
    pub threads_discovery: usize,
    pub address_per_thread: usize,
    pub device_per_message: usize,

    // Probe capability toggles.
    pub nmap_enabled: bool,
    pub netbios_enabled: bool,
    pub snmp_enabled: bool,

    // SNMP session parameters.
    pub community: Vec<String>,
    pub snmpver: u8,
    pub snmp_timeout_ms: u64,
    pub snmp_retries: u32,

    // Discovery ACLs.
    pub discover_no: Vec<String>,
    pub discover_only: Vec<String>,

    // Persistence and transport.
    pub spool_path: String,
    pub server_url: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            log: "info".into(),
            threads_discovery: 4,
            address_per_thread: 25,
            device_per_message: 4,
            nmap_enabled: true,
            netbios_enabled: true,
            snmp_enabled: true,
            community: vec!["public".into()],
            snmpver: 2,
            snmp_timeout_ms: 3_000,
            snmp_retries: 2,
            discover_no: vec![],
            discover_only: vec![],
            spool_path: "netdiscovery-spool.sqlite".into(),
            server_url: "http://localhost:8080/netdisco/nbagent".into(),
        }
    }
}

impl DiscoveryConfig {
    /// Apply overrides from a YAML value (`environments/deployment.yml`).
    pub fn apply_overrides(&mut self, overrides: &serde_yaml::Value) -> Result<()> {
        if let Some(v) = overrides.get("threads_discovery").and_then(|v| v.as_u64()) {
            self.threads_discovery = v as usize;
        }
        if let Some(v) = overrides.get("address_per_thread").and_then(|v| v.as_u64()) {
            self.address_per_thread = v as usize;
        }
        if let Some(v) = overrides.get("community") {
            if let Ok(communities) = serde_yaml::from_value::<Vec<String>>(v.clone()) {
                self.community = communities;
            }
        }
        if let Some(v) = overrides.get("server_url").and_then(|v| v.as_str()) {
            self.server_url = v.to_string();
        }
        if let Some(v) = overrides.get("spool_path").and_then(|v| v.as_str()) {
            self.spool_path = v.to_string();
        }
        if let Some(v) = overrides.get("nmap_enabled").and_then(|v| v.as_bool()) {
            self.nmap_enabled = v;
        }
        if let Some(v) = overrides.get("netbios_enabled").and_then(|v| v.as_bool()) {
            self.netbios_enabled = v;
        }
        if let Some(v) = overrides.get("snmp_enabled").and_then(|v| v.as_bool()) {
            self.snmp_enabled = v;
        }
        Ok(())
    }

    /// Apply environment variable overrides (Docker/CI compatibility).
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("NETDISCOVERY_SERVER_URL") {
            self.server_url = v;
        }
        if let Ok(v) = std::env::var("NETDISCOVERY_SPOOL_PATH") {
            self.spool_path = v;
        }
        if let Ok(v) = std::env::var("NETDISCOVERY_THREADS") {
            if let Ok(n) = v.parse() {
                self.threads_discovery = n;
            }
        }
        if let Ok(v) = std::env::var("NETDISCOVERY_RO_COMMUNITY") {
            self.community = v.split(',').map(String::from).collect();
        }
    }
}
