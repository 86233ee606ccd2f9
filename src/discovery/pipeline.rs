//! Probe Pipeline: fuses nmap, NetBIOS and SNMP stage outputs into one
//! Device record and applies the acceptance predicate.

use crate::discovery::refiners::Refiner;
use crate::discovery::snmp_classifier::{self, SnmpProbeOptions};
use crate::model::credential::Credential;
use crate::model::device::{AddressItem, Device};
use crate::model::dictionary::Dictionary;
use crate::probes::{nmap, netbios};
use crate::util::{mac, sanitize};

pub struct PipelineOptions {
    pub nmap_enabled: bool,
    pub netbios_enabled: bool,
    pub snmp_enabled: bool,
    pub snmp: SnmpProbeOptions,
}

/// Capability seam between a Worker and the concrete probe stages. The
/// default implementation runs the real nmap/NetBIOS/SNMP fusion below;
/// tests substitute a fake to drive the Coordinator end-to-end without a
/// network.
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    async fn probe(
        &self,
        item: &AddressItem,
        credentials: &[Credential],
        dictionary: &Dictionary,
        refiners: &[Box<dyn Refiner>],
        opts: &PipelineOptions,
    ) -> Option<Device>;
}

/// The shipped prober: the real three-stage fusion pipeline.
pub struct DefaultProber;

#[async_trait::async_trait]
impl Prober for DefaultProber {
    async fn probe(
        &self,
        item: &AddressItem,
        credentials: &[Credential],
        dictionary: &Dictionary,
        refiners: &[Box<dyn Refiner>],
        opts: &PipelineOptions,
    ) -> Option<Device> {
        probe_address(item, credentials, dictionary, refiners, opts).await
    }
}

/// Run every enabled stage for one address and return an accepted device,
/// or `None` if the predicate in §4.5 is not satisfied (or the address is
/// malformed).
pub async fn probe_address(
    item: &AddressItem,
    credentials: &[Credential],
    dictionary: &Dictionary,
    refiners: &[Box<dyn Refiner>],
    opts: &PipelineOptions,
) -> Option<Device> {
    let mut device = Device::blank(item.ip, item.entity.clone());

    if opts.nmap_enabled {
        if let Some(result) = nmap::scan(item.ip).await {
            if let Some(raw_mac) = result.mac {
                device.mac = mac::canonicalize(&raw_mac);
            }
            device.netport_vendor = result.vendor.and_then(|v| sanitize::sanitize(&v));
            device.dns_hostname = result.hostname.and_then(|h| sanitize::sanitize(&h));
        }
    }

    if opts.netbios_enabled {
        if let Some(status) = netbios::query(item.ip) {
            for record in status.records {
                let Some(name) = sanitize::sanitize(&record.name) else {
                    continue;
                };
                match (record.suffix, record.is_group) {
                    (0, true) if device.workgroup.is_none() => device.workgroup = Some(name),
                    (3, false) if device.user_session.is_none() => device.user_session = Some(name),
                    (0, false) if device.netbios_name.is_none() && !name.starts_with("IS~") => {
                        device.netbios_name = Some(name)
                    }
                    _ => {}
                }
            }
            if device.mac.is_none() {
                if let Some(raw_mac) = status.mac {
                    device.mac = mac::canonicalize(&raw_mac.replace('-', ":"));
                }
            }
        }
    }

    if opts.snmp_enabled {
        if let Some(snmp_device) = run_snmp_stage(item, credentials, dictionary, refiners, opts).await {
            // merge_missing never overwrites a MAC an earlier stage already set.
            device.merge_missing(snmp_device);
        }
    }

    if let Some(m) = device.mac.take() {
        device.mac = Some(m.to_lowercase());
    }

    if device.is_acceptable() {
        Some(device)
    } else {
        None
    }
}

// `Box<dyn Refiner>` is `Send` but not `Clone`, so the caller's refiner
// chain can't be moved into the blocking task by value; since the shipped
// refiners are stateless, the blocking task builds its own instance of the
// same default chain rather than threading a borrow across the spawn.
async fn run_snmp_stage(
    item: &AddressItem,
    credentials: &[Credential],
    dictionary: &Dictionary,
    _refiners: &[Box<dyn Refiner>],
    opts: &PipelineOptions,
) -> Option<Device> {
    let ip = item.ip;
    let credentials = credentials.to_vec();
    let dictionary = dictionary.clone();
    let timeout = opts.snmp.timeout;
    let retries = opts.snmp.retries;
    tokio::task::spawn_blocking(move || {
        let refiners = crate::discovery::refiners::default_refiners();
        let probe_opts = SnmpProbeOptions { timeout, retries };
        snmp_classifier::probe(ip, &credentials, &dictionary, &refiners, &probe_opts)
    })
    .await
    .ok()
    .flatten()
}
