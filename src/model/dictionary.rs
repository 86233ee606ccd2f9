//! The SNMP model dictionary: a content-hashed mapping from system
//! description patterns to the OID bindings used to classify a device.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// OID bindings and identifying attributes for one recognized model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub modelsnmp: String,
    #[serde(rename = "type")]
    pub device_type: String,
    /// OID (dotted string, with or without leading dot) for the serial number.
    #[serde(default)]
    pub serial: Option<String>,
    /// OID for the primary MAC address.
    #[serde(default)]
    pub mac: Option<String>,
    /// OID subtree to walk for a dynamic MAC address, if `mac` is absent
    /// or does not resolve to a canonical address.
    #[serde(default)]
    pub macdyn: Option<String>,
}

/// A resolved dictionary: pattern -> Model, plus its content hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dictionary {
    pub entries: HashMap<String, Model>,
    pub hash: String,
}

impl Dictionary {
    pub fn new(entries: HashMap<String, Model>, hash: impl Into<String>) -> Self {
        Self {
            entries,
            hash: hash.into(),
        }
    }

    /// The built-in fallback dictionary used when the server supplies
    /// neither a dictionary payload nor a usable cached one.
    pub fn built_in() -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            "Linux".to_string(),
            Model {
                modelsnmp: "GENERIC-LINUX".to_string(),
                device_type: "COMPUTER".to_string(),
                serial: None,
                mac: None,
                macdyn: None,
            },
        );
        Self::new(entries, built_in_hash())
    }

    /// Classify a system description against this dictionary. Exact match
    /// is tried first; failing that, the first pattern that matches as a
    /// substring of the description wins.
    pub fn classify(&self, description: &str) -> Option<&Model> {
        if let Some(model) = self.entries.get(description) {
            return Some(model);
        }
        self.entries
            .iter()
            .find(|(pattern, _)| !pattern.is_empty() && description.contains(pattern.as_str()))
            .map(|(_, model)| model)
    }
}

/// Stable hash for the built-in dictionary's content, so it behaves like
/// any other dictionary for the hash-equality handshake.
fn built_in_hash() -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    "built-in:Linux:GENERIC-LINUX:COMPUTER".hash(&mut hasher);
    format!("{:x}", hasher.finish())
}
