//! Worker: one of N long-lived tasks cycling through the PAUSE/RUN/STOP
//! protocol. In RUN it pops addresses from a shared block, runs the probe
//! pipeline, and flushes accepted devices to the Spool in fixed-size
//! batches. Grounded on `backend/manager.rs::run_worker`'s long-lived
//! `tokio::spawn`ed loop shape; the job-queue dispatch is replaced by the
//! cooperative PAUSE/RUN/STOP handshake.

use crate::discovery::pipeline::{PipelineOptions, Prober};
use crate::discovery::refiners::Refiner;
use crate::discovery::spool::Spool;
use crate::model::credential::Credential;
use crate::model::device::{AddressItem, Batch};
use crate::model::dictionary::Dictionary;
use crate::model::process_number::ProcessNumber;
use std::sync::atomic::{AtomicU8, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

pub const DEVICE_PER_MESSAGE: usize = 4;
const POLL_INTERVAL: Duration = Duration::from_millis(50);
/// Floor on how long a RUN cycle holds `state = Run` before reporting
/// PAUSE. Every probe stage disabled (or a tiny address block) can drain
/// a cycle synchronously; without this floor the Coordinator's poll-based
/// handshake could miss the RUN acknowledgement entirely and hang waiting
/// for it. Comfortably above `POLL_INTERVAL` so at least one Coordinator
/// poll always lands inside the window.
const MIN_RUN_HOLD: Duration = Duration::from_millis(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    Pause = 0,
    Run = 1,
    Stop = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerAction {
    Pause = 0,
    Run = 1,
    Stop = 2,
}

impl From<u8> for WorkerState {
    fn from(v: u8) -> Self {
        match v {
            1 => WorkerState::Run,
            2 => WorkerState::Stop,
            _ => WorkerState::Pause,
        }
    }
}

impl From<u8> for WorkerAction {
    fn from(v: u8) -> Self {
        match v {
            1 => WorkerAction::Run,
            2 => WorkerAction::Stop,
            _ => WorkerAction::Pause,
        }
    }
}

/// The handshake slot for one worker. `action` is written only by the
/// Coordinator; `state` is written only by the Worker.
pub struct WorkerSlot {
    action: AtomicU8,
    state: AtomicU8,
}

impl WorkerSlot {
    pub fn new() -> Self {
        Self {
            action: AtomicU8::new(WorkerAction::Pause as u8),
            state: AtomicU8::new(WorkerState::Pause as u8),
        }
    }

    pub fn set_action(&self, action: WorkerAction) {
        self.action.store(action as u8, Ordering::SeqCst);
    }

    pub fn action(&self) -> WorkerAction {
        WorkerAction::from(self.action.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    pub fn state(&self) -> WorkerState {
        WorkerState::from(self.state.load(Ordering::SeqCst))
    }
}

impl Default for WorkerSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Stack-like shared block of pending addresses, popped under a mutex by
/// whichever worker asks first.
#[derive(Default)]
pub struct AddressBlock {
    items: Mutex<Vec<AddressItem>>,
}

impl AddressBlock {
    pub fn fill(&self, items: Vec<AddressItem>) {
        *self.items.lock().unwrap() = items;
    }

    pub fn pop(&self) -> Option<AddressItem> {
        self.items.lock().unwrap().pop()
    }
}

/// Shared, monotonically increasing spool index counter. Reset by the
/// coordinator at the start of each block cycle.
#[derive(Default)]
pub struct SpoolIndex(AtomicI64);

impl SpoolIndex {
    pub fn reset(&self) {
        self.0.store(0, Ordering::SeqCst);
    }

    pub fn next(&self) -> i64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct WorkerContext {
    pub slot: Arc<WorkerSlot>,
    pub block: Arc<AddressBlock>,
    pub spool: Spool,
    pub spool_index: Arc<SpoolIndex>,
    pub credentials: Vec<Credential>,
    pub dictionary: Dictionary,
    pub refiners: Vec<Box<dyn Refiner>>,
    pub pipeline_opts: PipelineOptions,
    pub prober: Arc<dyn Prober>,
    pub module_version: String,
    pub process_number: ProcessNumber,
}

/// Run one worker's lifetime: PAUSE until told to RUN, drain the shared
/// block while RUN, flush the tail batch, go back to PAUSE, repeat until
/// told to STOP.
pub async fn run(ctx: WorkerContext) {
    loop {
        match ctx.slot.action() {
            WorkerAction::Pause => {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            WorkerAction::Stop => {
                ctx.slot.set_state(WorkerState::Stop);
                return;
            }
            WorkerAction::Run => {
                ctx.slot.set_state(WorkerState::Run);
                tokio::join!(run_cycle(&ctx), tokio::time::sleep(MIN_RUN_HOLD));
                let should_stop = ctx.slot.action() == WorkerAction::Stop;
                ctx.slot.set_state(WorkerState::Pause);
                if should_stop {
                    ctx.slot.set_state(WorkerState::Stop);
                    return;
                }
                // `action` stays RUN across cycles (the Coordinator only
                // rewrites it for the next block or for STOP); idle one
                // poll tick before re-reading it so a worker that already
                // drained an empty block doesn't busy-spin ahead of the
                // Coordinator refilling the block or raising STOP.
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }
    }
}

/// Pure batching rule used by `run_cycle`'s incremental flush: split an
/// ordered sequence of accepted devices into chunks of at most `size`.
/// Exposed standalone so the batching boundary (§8 S6) is testable
/// without a live probe pipeline.
pub fn partition_devices(devices: Vec<crate::model::device::Device>, size: usize) -> Vec<Vec<crate::model::device::Device>> {
    devices.chunks(size).map(|c| c.to_vec()).collect()
}

async fn run_cycle(ctx: &WorkerContext) {
    let mut buffer = Vec::with_capacity(DEVICE_PER_MESSAGE);
    while let Some(item) = ctx.block.pop() {
        match ctx
            .prober
            .probe(
                &item,
                &ctx.credentials,
                &ctx.dictionary,
                &ctx.refiners,
                &ctx.pipeline_opts,
            )
            .await
        {
            Some(device) => {
                buffer.push(device);
                if buffer.len() >= DEVICE_PER_MESSAGE {
                    flush(ctx, &mut buffer).await;
                }
            }
            None => debug!("no acceptable device for {}", item.ip),
        }
    }
    if !buffer.is_empty() {
        flush(ctx, &mut buffer).await;
    }
}

async fn flush(ctx: &WorkerContext, buffer: &mut Vec<crate::model::device::Device>) {
    let idx = ctx.spool_index.next();
    let batch = Batch::new(
        std::mem::take(buffer),
        ctx.module_version.clone(),
        ctx.process_number.clone(),
    );
    if let Err(e) = ctx.spool.save(idx, &batch).await {
        tracing::error!("failed to save batch {idx} to spool: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_defaults_to_pause() {
        let slot = WorkerSlot::new();
        assert_eq!(slot.action(), WorkerAction::Pause);
        assert_eq!(slot.state(), WorkerState::Pause);
    }

    #[test]
    fn address_block_pops_all_items() {
        let block = AddressBlock::default();
        block.fill(vec![
            AddressItem {
                ip: "10.0.0.1".parse().unwrap(),
                entity: "e1".into(),
            },
            AddressItem {
                ip: "10.0.0.2".parse().unwrap(),
                entity: "e1".into(),
            },
        ]);
        assert!(block.pop().is_some());
        assert!(block.pop().is_some());
        assert!(block.pop().is_none());
    }

    #[test]
    fn partition_devices_splits_nine_into_four_four_one() {
        use crate::model::device::Device;
        let devices: Vec<Device> = (0..9)
            .map(|i| Device::blank(format!("10.0.0.{i}").parse().unwrap(), "e1"))
            .collect();
        let batches = partition_devices(devices, DEVICE_PER_MESSAGE);
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 4, 1]);
    }

    #[test]
    fn no_batch_exceeds_device_per_message() {
        use crate::model::device::Device;
        let devices: Vec<Device> = (0..13)
            .map(|i| Device::blank(format!("10.0.1.{i}").parse().unwrap(), "e1"))
            .collect();
        let batches = partition_devices(devices, DEVICE_PER_MESSAGE);
        assert!(batches.iter().all(|b| b.len() <= DEVICE_PER_MESSAGE));
    }

    #[test]
    fn spool_index_resets_to_zero() {
        let idx = SpoolIndex::default();
        assert_eq!(idx.next(), 1);
        assert_eq!(idx.next(), 2);
        idx.reset();
        assert_eq!(idx.current(), 0);
        assert_eq!(idx.next(), 1);
    }
}
