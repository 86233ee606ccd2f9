//! Inclusive IPv4 address ranges, as supplied by the server in a job's
//! `NETDISCOVERY.RANGEIP` list.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// One inclusive IPv4 range scoped to an entity tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    #[serde(rename = "IPSTART")]
    pub start: Option<String>,
    #[serde(rename = "IPEND")]
    pub end: Option<String>,
    #[serde(rename = "ENTITY")]
    pub entity: String,
}

impl Range {
    pub fn new(start: impl Into<String>, end: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
            entity: entity.into(),
        }
    }

    /// Parse both endpoints. A range missing either endpoint, or with an
    /// unparseable endpoint, or with `start > end`, is not expandable.
    pub fn bounds(&self) -> Option<(Ipv4Addr, Ipv4Addr)> {
        let start: Ipv4Addr = self.start.as_deref()?.parse().ok()?;
        let end: Ipv4Addr = self.end.as_deref()?.parse().ok()?;
        if u32::from(start) > u32::from(end) {
            return None;
        }
        Some((start, end))
    }
}
