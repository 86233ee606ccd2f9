//! Work items fed to workers, and the device records / batches they
//! produce.

use super::process_number::ProcessNumber;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// One address to probe, scoped to an entity tag. Produced 1:1 by
/// expanding a `Range`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressItem {
    pub ip: Ipv4Addr,
    pub entity: String,
}

/// A device record fused from up to three probe stages. Only fields a
/// stage actually discovers are set; nothing is overwritten by a later
/// stage that did not discover that field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub ip: String,
    pub entity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(rename = "dnsHostname", skip_serializing_if = "Option::is_none")]
    pub dns_hostname: Option<String>,
    #[serde(rename = "netbiosName", skip_serializing_if = "Option::is_none")]
    pub netbios_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workgroup: Option<String>,
    #[serde(rename = "userSession", skip_serializing_if = "Option::is_none")]
    pub user_session: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "snmpHostname", skip_serializing_if = "Option::is_none")]
    pub snmp_hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modelsnmp: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(rename = "netportVendor", skip_serializing_if = "Option::is_none")]
    pub netport_vendor: Option<String>,
    #[serde(rename = "authSnmp", skip_serializing_if = "Option::is_none")]
    pub auth_snmp: Option<String>,
}

impl Device {
    pub fn blank(ip: Ipv4Addr, entity: impl Into<String>) -> Self {
        Self {
            ip: ip.to_string(),
            entity: entity.into(),
            ..Default::default()
        }
    }

    /// A device is accepted only if it identifies by MAC, DNS hostname, or
    /// NetBIOS name.
    pub fn is_acceptable(&self) -> bool {
        self.mac.as_deref().is_some_and(|s| !s.is_empty())
            || self.dns_hostname.as_deref().is_some_and(|s| !s.is_empty())
            || self.netbios_name.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Merge fields set on `other` into `self`, never overwriting a field
    /// `self` already has.
    pub fn merge_missing(&mut self, other: Device) {
        macro_rules! fill {
            ($field:ident) => {
                if self.$field.is_none() {
                    self.$field = other.$field;
                }
            };
        }
        fill!(mac);
        fill!(dns_hostname);
        fill!(netbios_name);
        fill!(workgroup);
        fill!(user_session);
        fill!(description);
        fill!(snmp_hostname);
        fill!(serial);
        fill!(modelsnmp);
        fill!(device_type);
        fill!(netport_vendor);
        fill!(auth_snmp);
    }
}

/// Up to `DEVICE_PER_MESSAGE` devices flushed together to the spool and
/// then to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    #[serde(rename = "DEVICE")]
    pub devices: Vec<Device>,
    #[serde(rename = "MODULEVERSION")]
    pub module_version: String,
    #[serde(rename = "PROCESSNUMBER")]
    pub process_number: String,
}

impl Batch {
    pub fn new(devices: Vec<Device>, module_version: impl Into<String>, process_number: ProcessNumber) -> Self {
        Self {
            devices,
            module_version: module_version.into(),
            process_number: process_number.to_string(),
        }
    }
}
