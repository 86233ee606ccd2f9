//! SNMP Classifier: iterates credentials, fetches sysDescr, refines it,
//! classifies against the dictionary, and extracts serial/MAC/model/type.

use crate::discovery::refiners::{refine_chain, Refiner};
use crate::model::credential::Credential;
use crate::model::dictionary::Dictionary;
use crate::model::device::Device;
use crate::probes::snmp::SnmpSession;
use crate::snmp::oids;
use crate::util::mac;
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::debug;

pub struct SnmpProbeOptions {
    pub timeout: Duration,
    pub retries: usize,
}

/// Probe `ip` with each credential in order until one yields a sysDescr.
/// Returns the device fragment this stage discovered, or `None` if every
/// credential failed or none were usable.
pub fn probe(
    ip: Ipv4Addr,
    credentials: &[Credential],
    dictionary: &Dictionary,
    refiners: &[Box<dyn Refiner>],
    opts: &SnmpProbeOptions,
) -> Option<Device> {
    for credential in credentials {
        let mut session = match SnmpSession::open(ip, credential, opts.timeout, opts.retries) {
            Ok(s) => s,
            Err(e) => {
                debug!("SNMP session open failed for {ip} with credential {}: {e}", credential.id);
                continue;
            }
        };

        let raw_description = match session.get_string(&oids::SYS_DESCR) {
            Ok(Some(d)) if !d.is_empty() => d,
            Ok(_) => {
                debug!("no sysDescr from {ip} with credential {}, aborting SNMP stage for {ip}", credential.id);
                return None;
            }
            Err(e) => {
                debug!("sysDescr fetch failed for {ip} with credential {}: {e}", credential.id);
                continue;
            }
        };

        let description = refine_chain(refiners, &raw_description, &mut session);
        let model = dictionary.classify(&description);

        let mut device = Device::blank(ip, String::new());
        device.description = Some(description.clone());
        device.auth_snmp = Some(credential.id.clone());

        if let Some(model) = model {
            device.modelsnmp = Some(model.modelsnmp.clone());
            device.device_type = Some(model.device_type.clone());
            device.serial = extract_serial(&mut session, model.serial.as_deref());
            device.mac = extract_mac(&mut session, model.mac.as_deref(), model.macdyn.as_deref());
        } else {
            device.mac = extract_mac(&mut session, None, None);
        }

        device.snmp_hostname = session.get_string(&oids::SYS_NAME).ok().flatten();

        return Some(device);
    }
    None
}

fn extract_serial(session: &mut SnmpSession, oid: Option<&str>) -> Option<String> {
    let oid = parse_oid(oid?)?;
    let raw = session.get_string(&oid).ok()??;
    Some(clean_serial(&raw))
}

fn clean_serial(raw: &str) -> String {
    let no_cr: String = raw.chars().filter(|c| *c != '\r' && *c != '\n').collect();
    let trimmed = no_cr.trim();
    let mut cleaned = String::with_capacity(trimmed.len());
    let mut dot_run = 0u32;
    for c in trimmed.chars() {
        if c == '.' {
            dot_run += 1;
            if dot_run < 2 {
                cleaned.push(c);
            }
        } else {
            if dot_run >= 2 {
                // collapse the run entirely rather than keep a single dot
                let _ = cleaned.pop();
            }
            dot_run = 0;
            cleaned.push(c);
        }
    }
    cleaned
}

fn extract_mac(session: &mut SnmpSession, primary: Option<&str>, dynamic: Option<&str>) -> Option<String> {
    let primary_oid = primary.and_then(parse_oid).or_else(|| Some(oids::DOT1D_BASE_BRIDGE_ADDRESS.to_vec()));
    if let Some(oid) = primary_oid {
        if let Ok(Some(raw)) = session.get_string(&oid) {
            if let Some(canon) = mac::canonicalize(&raw) {
                if mac::is_canonical(&canon) {
                    return Some(canon);
                }
            }
        }
    }

    let subtree = dynamic.and_then(parse_oid).unwrap_or_else(|| oids::IF_PHYS_ADDRESS.to_vec());
    let walked = session.walk_strings(&subtree).ok()?;
    walked
        .into_iter()
        .rev()
        .filter_map(|(_, raw)| mac::canonicalize(&raw))
        .find(|m| !mac::is_zero(m))
}

fn parse_oid(s: &str) -> Option<Vec<u32>> {
    let trimmed = s.trim_start_matches('.');
    trimmed
        .split('.')
        .map(|part| part.parse::<u32>().ok())
        .collect()
}
