//! Coordinator: the top-level driver for one discovery job. Expands
//! addresses, spawns workers, cycles RUN/PAUSE per block, drains the spool
//! between cycles and ships batches to the reporter, then stops workers
//! and emits the end marker. Grounded on `backend/mod.rs::start_backend`'s
//! task-spawning shape, replacing its ctrl-c-driven perpetual daemon with
//! a one-shot run-to-completion flow.

use crate::config::DiscoveryConfig;
use crate::discovery::dictionary_resolver::{self, Resolution};
use crate::discovery::expander;
use crate::discovery::reporter::{self, Reporter};
use crate::discovery::spool::Spool;
use crate::discovery::worker::{self, AddressBlock, SpoolIndex, WorkerAction, WorkerContext, WorkerSlot, WorkerState};
use crate::error::DiscoveryError;
use crate::model::credential::Credential;
use crate::model::device::AddressItem;
use crate::model::dictionary::Dictionary;
use crate::model::process_number::ProcessNumber;
use crate::model::range::Range;
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Everything the server handed down for this job.
pub struct Job {
    pub ranges: Vec<Range>,
    pub credentials: Vec<Credential>,
    pub server_dictionary: Option<Dictionary>,
    pub expected_dictionary_hash: Option<String>,
    /// `NETDISCOVERY.PARAM[0].THREADS_DISCOVERY`, if the server prolog
    /// supplied one; overrides the statically configured worker count.
    pub threads_discovery: Option<usize>,
}

const AGENT_VERSION: &str = "1.0";
const POLL_INTERVAL: Duration = Duration::from_millis(50);
const WORKER_STARTUP_BATCH: usize = 4;
const WORKER_STARTUP_PAUSE: Duration = Duration::from_millis(200);

pub struct Coordinator {
    config: Arc<DiscoveryConfig>,
    spool: Spool,
    reporter: Arc<dyn Reporter>,
    prober: Arc<dyn crate::discovery::pipeline::Prober>,
}

impl Coordinator {
    pub fn new(config: Arc<DiscoveryConfig>, spool: Spool, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            config,
            spool,
            reporter,
            prober: Arc::new(crate::discovery::pipeline::DefaultProber),
        }
    }

    /// Substitute the probe stage, e.g. with a fake in tests that exercises
    /// the full worker/spool/reporter flow without touching the network.
    pub fn with_prober(mut self, prober: Arc<dyn crate::discovery::pipeline::Prober>) -> Self {
        self.prober = prober;
        self
    }

    pub async fn run(&self, job: Job) -> Result<()> {
        let process_number = ProcessNumber::from_timestamp(Utc::now());
        let module_version = crate::VERSION.to_string();

        let resolution = dictionary_resolver::resolve(
            &self.spool,
            job.server_dictionary,
            job.expected_dictionary_hash.as_deref(),
        )
        .await?;

        let dictionary = match resolution {
            Resolution::Ready(dico) => dico,
            Resolution::RefreshRequired => {
                self.reporter
                    .send(reporter::dico_refresh_message(&module_version, process_number.as_str()))
                    .await;
                return Err(DiscoveryError::DictionaryRefreshRequested.into());
            }
        };

        let addresses = expander::expand(&job.ranges, &self.config.discover_only, &self.config.discover_no);
        info!("expanded {} address(es) for processNumber {}", addresses.len(), process_number);

        if addresses.is_empty() {
            self.reporter
                .send(reporter::start_message(AGENT_VERSION, &module_version, process_number.as_str()))
                .await;
            self.reporter
                .send(reporter::end_message(&module_version, process_number.as_str()))
                .await;
            return Ok(());
        }

        let threads = job
            .threads_discovery
            .unwrap_or(self.config.threads_discovery)
            .max(1);
        let block_size = threads * self.config.address_per_thread;

        let slots: Vec<Arc<WorkerSlot>> = (0..threads).map(|_| Arc::new(WorkerSlot::new())).collect();
        let block = Arc::new(AddressBlock::default());
        let spool_index = Arc::new(SpoolIndex::default());

        let mut handles = Vec::with_capacity(threads);
        for (i, slot) in slots.iter().cloned().enumerate() {
            let ctx = WorkerContext {
                slot,
                block: block.clone(),
                spool: self.spool.clone(),
                spool_index: spool_index.clone(),
                credentials: job.credentials.clone(),
                dictionary: dictionary.clone(),
                refiners: crate::discovery::refiners::default_refiners(),
                pipeline_opts: self.pipeline_options(),
                prober: self.prober.clone(),
                module_version: module_version.clone(),
                process_number: process_number.clone(),
            };
            handles.push(tokio::spawn(worker::run(ctx)));
            if (i + 1) % WORKER_STARTUP_BATCH == 0 {
                tokio::time::sleep(WORKER_STARTUP_PAUSE).await;
            }
        }

        self.reporter
            .send(reporter::start_message(AGENT_VERSION, &module_version, process_number.as_str()))
            .await;

        let mut remaining: Vec<AddressItem> = addresses;
        while !remaining.is_empty() {
            let take = block_size.min(remaining.len());
            let this_block: Vec<AddressItem> = remaining.drain(..take).collect();
            let this_block_len = this_block.len();
            block.fill(this_block);
            spool_index.reset();

            self.reporter
                .send(reporter::nbip_message(this_block_len, process_number.as_str()))
                .await;

            for slot in &slots {
                slot.set_action(WorkerAction::Run);
            }
            self.wait_for_state(&slots, WorkerState::Run).await;
            self.wait_for_state(&slots, WorkerState::Pause).await;

            self.drain_and_send(spool_index.current(), &module_version).await?;
        }

        for slot in &slots {
            slot.set_action(WorkerAction::Stop);
        }
        self.wait_for_state(&slots, WorkerState::Stop).await;
        for handle in handles {
            let _ = handle.await;
        }

        self.reporter
            .send(reporter::end_message(&module_version, process_number.as_str()))
            .await;

        Ok(())
    }

    fn pipeline_options(&self) -> crate::discovery::pipeline::PipelineOptions {
        crate::discovery::pipeline::PipelineOptions {
            nmap_enabled: self.config.nmap_enabled,
            netbios_enabled: self.config.netbios_enabled,
            snmp_enabled: self.config.snmp_enabled,
            snmp: crate::discovery::snmp_classifier::SnmpProbeOptions {
                timeout: Duration::from_millis(self.config.snmp_timeout_ms),
                retries: self.config.snmp_retries as usize,
            },
        }
    }

    async fn wait_for_state(&self, slots: &[Arc<WorkerSlot>], target: WorkerState) {
        loop {
            if slots.iter().all(|s| s.state() == target) {
                return;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn drain_and_send(&self, max_idx: i64, module_version: &str) -> Result<()> {
        for idx in 1..=max_idx {
            let Some(batch) = self
                .spool
                .restore::<crate::model::device::Batch>(idx)
                .await?
            else {
                continue;
            };
            let payload = serde_json::json!({
                "DEVICE": batch.devices,
                "MODULEVERSION": module_version,
                "PROCESSNUMBER": batch.process_number,
            });
            self.reporter.send(payload).await;
            self.spool.remove(idx).await?;
        }
        Ok(())
    }
}
