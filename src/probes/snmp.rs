//! SNMP capability: thin wrapper over the `snmp` crate's synchronous
//! v1/v2c client, run on a blocking thread so it composes with the async
//! worker loop. SNMPv3 is not supported by the underlying crate and is
//! treated as a capability gap by the classifier (see DESIGN.md).

use crate::model::credential::{Credential, SnmpVersion};
use anyhow::{bail, Context, Result};
use snmp::{SyncSession, Value};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

pub struct SnmpSession {
    inner: SyncSession,
}

impl SnmpSession {
    /// Open a session for `credential` against `ip`. Fails fast for any
    /// credential version this transport cannot speak (v3).
    pub fn open(ip: Ipv4Addr, credential: &Credential, timeout: Duration, retries: usize) -> Result<Self> {
        if !credential.version.is_supported() {
            bail!("SNMPv3 is not supported by the transport; skipping credential {}", credential.id);
        }
        let addr = SocketAddr::from((ip, 161));
        let community = credential.community_or_default().as_bytes();
        let inner = SyncSession::new(addr, community, Some(timeout), retries as u16)
            .with_context(|| format!("failed to open SNMP session to {ip}"))?;
        Ok(Self { inner })
    }

    /// GET a single scalar OID, returning its textual representation.
    pub fn get_string(&mut self, oid: &[u32]) -> Result<Option<String>> {
        let mut response = self
            .inner
            .get(oid)
            .with_context(|| format!("SNMP GET failed for OID {oid:?}"))?;
        let Some((_, value)) = response.varbinds.next() else {
            return Ok(None);
        };
        Ok(value_to_string(value))
    }

    /// Walk a subtree via repeated GETNEXT, returning `(oid, value)` pairs
    /// until the walk leaves the requested subtree.
    pub fn walk_strings(&mut self, base: &[u32]) -> Result<Vec<(Vec<u32>, String)>> {
        let mut results = Vec::new();
        let mut current = base.to_vec();
        loop {
            let mut response = self
                .inner
                .getnext(&current)
                .with_context(|| format!("SNMP GETNEXT failed from OID {current:?}"))?;
            let Some((oid, value)) = response.varbinds.next() else {
                break;
            };
            let oid_vec: Vec<u32> = oid.0.to_vec();
            if !oid_vec.starts_with(base) {
                break;
            }
            if let Some(text) = value_to_string(value) {
                results.push((oid_vec.clone(), text));
            }
            current = oid_vec;
        }
        Ok(results)
    }
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::OctetString(bytes) => Some(String::from_utf8_lossy(bytes).to_string()),
        Value::ObjectIdentifier(oid) => Some(
            oid.iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join("."),
        ),
        Value::IpAddress(bytes) => Some(
            bytes
                .iter()
                .map(|b| b.to_string())
                .collect::<Vec<_>>()
                .join("."),
        ),
        Value::Integer(i) => Some(i.to_string()),
        Value::Counter32(i) | Value::Unsigned32(i) | Value::Timeticks(i) => Some(i.to_string()),
        Value::Counter64(i) => Some(i.to_string()),
        _ => None,
    }
}
