//! End-to-end scenarios from the discovery engine's testable-properties
//! section: full job runs driven only through the public API, with a
//! recording reporter standing in for the server.

use async_trait::async_trait;
use netdiscovery_agent::config::DiscoveryConfig;
use netdiscovery_agent::discovery::coordinator::{Coordinator, Job};
use netdiscovery_agent::discovery::pipeline::{PipelineOptions, Prober};
use netdiscovery_agent::discovery::refiners::Refiner;
use netdiscovery_agent::discovery::reporter::Reporter;
use netdiscovery_agent::discovery::spool::Spool;
use netdiscovery_agent::model::credential::Credential;
use netdiscovery_agent::model::device::{AddressItem, Device};
use netdiscovery_agent::model::dictionary::Dictionary;
use netdiscovery_agent::model::range::Range;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct RecordingReporter {
    sent: Mutex<Vec<Value>>,
}

#[async_trait]
impl Reporter for RecordingReporter {
    async fn send(&self, content: Value) {
        self.sent.lock().unwrap().push(content);
    }
}

async fn open_spool() -> (Spool, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spool.sqlite");
    let spool = Spool::open(&path).await.unwrap();
    (spool, dir)
}

fn no_capability_config() -> DiscoveryConfig {
    let mut config = DiscoveryConfig::default();
    config.nmap_enabled = false;
    config.netbios_enabled = false;
    config.snmp_enabled = false;
    config.threads_discovery = 1;
    config
}

/// S1 - empty job: outbound sequence is START, END; no device batches.
#[tokio::test]
async fn scenario_empty_job_sends_only_start_and_end() {
    let (spool, _dir) = open_spool().await;
    let reporter = Arc::new(RecordingReporter::default());
    let coordinator = Coordinator::new(Arc::new(no_capability_config()), spool, reporter.clone());

    coordinator
        .run(Job {
            ranges: vec![],
            credentials: vec![],
            server_dictionary: None,
            expected_dictionary_hash: None,
            threads_discovery: None,
        })
        .await
        .unwrap();

    let sent = reporter.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0]["AGENT"]["START"], "1");
    assert_eq!(sent[1]["AGENT"]["END"], "1");
}

/// S2 - single address, all probes disabled (stand-in for "all fail"):
/// START, NBIP:1, END. No device batch.
#[tokio::test]
async fn scenario_single_address_all_probes_fail_sends_no_device_batch() {
    let (spool, _dir) = open_spool().await;
    let reporter = Arc::new(RecordingReporter::default());
    let coordinator = Coordinator::new(Arc::new(no_capability_config()), spool, reporter.clone());

    coordinator
        .run(Job {
            ranges: vec![Range::new("10.0.0.1", "10.0.0.1", "e1")],
            credentials: vec![],
            server_dictionary: None,
            expected_dictionary_hash: None,
            threads_discovery: None,
        })
        .await
        .unwrap();

    let sent = reporter.sent.lock().unwrap();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0]["AGENT"]["START"], "1");
    assert_eq!(sent[1]["AGENT"]["NBIP"], 1);
    assert_eq!(sent[2]["AGENT"]["END"], "1");
}

/// S5 - dictionary hash mismatch: a refresh notice is sent and the job
/// aborts without ever sending START/NBIP.
#[tokio::test]
async fn scenario_dictionary_hash_mismatch_aborts_before_start() {
    use netdiscovery_agent::discovery::spool::DICTIONARY_KEY;
    let (spool, _dir) = open_spool().await;
    let reporter = Arc::new(RecordingReporter::default());

    let cached = netdiscovery_agent::model::Dictionary::new(Default::default(), "H1");
    spool.save(DICTIONARY_KEY, &cached).await.unwrap();

    let coordinator = Coordinator::new(Arc::new(no_capability_config()), spool, reporter.clone());
    let result = coordinator
        .run(Job {
            ranges: vec![Range::new("10.0.0.1", "10.0.0.1", "e1")],
            credentials: vec![],
            server_dictionary: None,
            expected_dictionary_hash: Some("H2".to_string()),
            threads_discovery: None,
        })
        .await;

    assert!(result.is_err());
    let sent = reporter.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["DICO"], "REQUEST");
    assert_eq!(sent[0]["AGENT"]["END"], "1");
}

/// A job-supplied `PARAM[0].THREADS_DISCOVERY` overrides the statically
/// configured worker count for that run (§6 inbound parameters): with
/// `address_per_thread` pinned to 1, a block holds exactly `threads`
/// addresses, so the override is visible in how many NBIP blocks it takes
/// to drain two addresses.
#[tokio::test]
async fn scenario_job_thread_count_overrides_static_config() {
    let (spool, _dir) = open_spool().await;
    let reporter = Arc::new(RecordingReporter::default());
    let mut config = no_capability_config();
    config.threads_discovery = 4;
    config.address_per_thread = 1;
    let coordinator = Coordinator::new(Arc::new(config), spool, reporter.clone());

    coordinator
        .run(Job {
            ranges: vec![Range::new("10.0.0.1", "10.0.0.2", "e1")],
            credentials: vec![],
            server_dictionary: None,
            expected_dictionary_hash: None,
            threads_discovery: Some(1),
        })
        .await
        .unwrap();

    let sent = reporter.sent.lock().unwrap();
    let nbip_values: Vec<u64> = sent
        .iter()
        .filter_map(|m| m["AGENT"]["NBIP"].as_u64())
        .collect();
    // block_size = threads(1) * address_per_thread(1) = 1, so 2 addresses
    // take 2 blocks. Had the static config's 4 threads won, block_size
    // would have been 4 and both addresses would fit in a single block.
    assert_eq!(nbip_values, vec![1, 1]);
}

/// Stand-in probe stage: returns a canned device per IP instead of touching
/// nmap/NetBIOS/SNMP, so a full Coordinator run can be driven deterministically.
struct FakeProber {
    devices: HashMap<String, Device>,
}

#[async_trait]
impl Prober for FakeProber {
    async fn probe(
        &self,
        item: &AddressItem,
        _credentials: &[Credential],
        _dictionary: &Dictionary,
        _refiners: &[Box<dyn Refiner>],
        _opts: &PipelineOptions,
    ) -> Option<Device> {
        // A real probe stage blocks on network I/O; a short sleep here keeps
        // the worker observably in RUN for the Coordinator's poll-based
        // handshake instead of completing the whole cycle synchronously.
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.devices.get(&item.ip.to_string()).cloned()
    }
}

fn netbios_only_device(ip: &str) -> Device {
    let mut d = Device::blank(ip.parse().unwrap(), "e1".to_string());
    d.netbios_name = Some("HOST1".to_string());
    d.workgroup = Some("WG".to_string());
    d.mac = Some("00:11:22:33:44:55".to_string());
    d
}

fn snmp_dictionary_hit_device(ip: &str) -> Device {
    let mut d = Device::blank(ip.parse().unwrap(), "e1".to_string());
    d.description = Some("Acme Router X".to_string());
    d.modelsnmp = Some("ACME-X".to_string());
    d.device_type = Some("NETWORKING".to_string());
    d.serial = Some("SN123".to_string());
    d.mac = Some("aa:bb:cc:dd:ee:ff".to_string());
    d.auth_snmp = Some("cred1".to_string());
    d
}

fn mac_only_device(ip: &str, last_octet: u8) -> Device {
    let mut d = Device::blank(ip.parse().unwrap(), "e1".to_string());
    d.mac = Some(format!("aa:bb:cc:dd:ee:{last_octet:02x}"));
    d
}

/// S3/S4/S6 driven through the real Coordinator: a NetBIOS-only device, an
/// SNMP-dictionary-hit device and enough plain devices to exercise the
/// batching boundary (9 accepted devices -> spool entries of 4, 4, 1),
/// asserting the device-batch messages land between NBIP and END in
/// ascending idx order.
#[tokio::test]
async fn scenario_device_batches_are_drained_in_ascending_order_between_nbip_and_end() {
    let (spool, _dir) = open_spool().await;
    let reporter = Arc::new(RecordingReporter::default());

    let mut devices = HashMap::new();
    devices.insert("10.0.1.1".to_string(), mac_only_device("10.0.1.1", 1));
    devices.insert("10.0.1.2".to_string(), mac_only_device("10.0.1.2", 2));
    devices.insert("10.0.1.3".to_string(), mac_only_device("10.0.1.3", 3));
    devices.insert("10.0.1.4".to_string(), snmp_dictionary_hit_device("10.0.1.4"));
    devices.insert("10.0.1.5".to_string(), netbios_only_device("10.0.1.5"));
    devices.insert("10.0.1.6".to_string(), mac_only_device("10.0.1.6", 6));
    devices.insert("10.0.1.7".to_string(), mac_only_device("10.0.1.7", 7));
    devices.insert("10.0.1.8".to_string(), mac_only_device("10.0.1.8", 8));
    devices.insert("10.0.1.9".to_string(), mac_only_device("10.0.1.9", 9));

    let mut config = no_capability_config();
    config.threads_discovery = 1;
    config.address_per_thread = 25;
    let coordinator = Coordinator::new(Arc::new(config), spool, reporter.clone())
        .with_prober(Arc::new(FakeProber { devices }));

    coordinator
        .run(Job {
            ranges: vec![Range::new("10.0.1.1", "10.0.1.9", "e1")],
            credentials: vec![],
            server_dictionary: None,
            expected_dictionary_hash: None,
            threads_discovery: None,
        })
        .await
        .unwrap();

    let sent = reporter.sent.lock().unwrap();

    assert_eq!(sent[0]["AGENT"]["START"], "1");
    assert_eq!(sent[1]["AGENT"]["NBIP"], 9);
    assert_eq!(sent.last().unwrap()["AGENT"]["END"], "1");

    let device_batches: Vec<&Value> = sent[2..sent.len() - 1].iter().collect();
    assert_eq!(device_batches.len(), 3, "9 devices in batches of 4 should flush as 3 messages");

    let batch_sizes: Vec<usize> = device_batches
        .iter()
        .map(|b| b["DEVICE"].as_array().unwrap().len())
        .collect();
    assert_eq!(batch_sizes, vec![4, 4, 1]);

    let all_devices: Vec<&Value> = device_batches
        .iter()
        .flat_map(|b| b["DEVICE"].as_array().unwrap().iter())
        .collect();
    assert_eq!(all_devices.len(), 9);

    let netbios_device = all_devices
        .iter()
        .find(|d| d["ip"] == "10.0.1.5")
        .expect("netbios-only device should be reported");
    assert_eq!(netbios_device["netbiosName"], "HOST1");
    assert_eq!(netbios_device["workgroup"], "WG");
    assert_eq!(netbios_device["mac"], "00:11:22:33:44:55");

    let snmp_device = all_devices
        .iter()
        .find(|d| d["ip"] == "10.0.1.4")
        .expect("snmp dictionary-hit device should be reported");
    assert_eq!(snmp_device["modelsnmp"], "ACME-X");
    assert_eq!(snmp_device["type"], "NETWORKING");
    assert_eq!(snmp_device["serial"], "SN123");
    assert_eq!(snmp_device["authSnmp"], "cred1");
}
