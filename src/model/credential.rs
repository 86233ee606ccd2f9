//! SNMP credentials supplied by the server, tried in order per address.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnmpVersion {
    #[serde(rename = "1")]
    V1,
    #[serde(rename = "2c")]
    V2c,
    #[serde(rename = "3")]
    V3,
}

impl SnmpVersion {
    pub fn is_supported(self) -> bool {
        matches!(self, SnmpVersion::V1 | SnmpVersion::V2c)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: String,
    pub version: SnmpVersion,
    #[serde(default)]
    pub community: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub auth_password: Option<String>,
    #[serde(default)]
    pub auth_protocol: Option<String>,
    #[serde(default)]
    pub priv_password: Option<String>,
    #[serde(default)]
    pub priv_protocol: Option<String>,
}

impl Credential {
    pub fn community_or_default(&self) -> &str {
        self.community.as_deref().unwrap_or("public")
    }
}
