//! Manufacturer refiner chain: given a raw `sysDescr` and a live SNMP
//! session, each registered refiner may return a more specific
//! description. The first non-empty replacement wins.

use crate::probes::snmp::SnmpSession;

pub trait Refiner: Send + Sync {
    /// Attempt to refine `description`. Returning `None` defers to the
    /// next refiner in the chain.
    fn refine(&self, description: &str, session: &mut SnmpSession) -> Option<String>;
}

/// Strips a common Cisco IOS banner prefix down to the platform name,
/// e.g. `"Cisco IOS Software, C2960 Software..."` -> `"C2960"`.
pub struct CiscoIosRefiner;

impl Refiner for CiscoIosRefiner {
    fn refine(&self, description: &str, _session: &mut SnmpSession) -> Option<String> {
        if !description.starts_with("Cisco IOS Software") {
            return None;
        }
        let rest = description.strip_prefix("Cisco IOS Software, ")?;
        let platform = rest.split(" Software").next()?;
        if platform.is_empty() {
            None
        } else {
            Some(platform.to_string())
        }
    }
}

/// Run the full refiner chain over `description`, returning the first
/// accepted replacement, or the original description if none apply.
pub fn refine_chain(
    refiners: &[Box<dyn Refiner>],
    description: &str,
    session: &mut SnmpSession,
) -> String {
    for refiner in refiners {
        if let Some(refined) = refiner.refine(description, session) {
            return refined;
        }
    }
    description.to_string()
}

/// The default refiner set shipped with the agent.
pub fn default_refiners() -> Vec<Box<dyn Refiner>> {
    vec![Box::new(CiscoIosRefiner)]
}
