//! Shared-memory workload
//!
//! Threads join memory containers, map a set of objects into their own
//! (simulated) address space, and repeatedly increment a counter stored in an
//! object. The read and the write of each increment are separate accesses, so
//! the final counters only add up if the object locks serialize them.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::container::ContainerId;
use crate::error::{ContainerError, Result};
use crate::memory::{
    round_up_to_page, MemoryManager, ObjectId, RecordingMapper, Region, TeardownSummary,
};
use crate::unit::ActorId;

/// Start of the simulated address range each thread maps objects into
const MAP_BASE: u64 = 0x1000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryOptions {
    pub containers: u64,
    pub threads: usize,
    pub objects: u64,
    pub iterations: usize,
    pub object_size: usize,
}

impl Default for MemoryOptions {
    fn default() -> Self {
        Self {
            containers: 1,
            threads: 2,
            objects: 2,
            iterations: 100,
            object_size: 4096,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectCounter {
    pub object: ObjectId,
    pub expected: u64,
    pub observed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContainerCounters {
    pub container: ContainerId,
    pub objects: Vec<ObjectCounter>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryReport {
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u128,
    pub threads: usize,
    pub mappings: usize,
    pub resident_bytes: usize,
    pub containers: Vec<ContainerCounters>,
    pub teardown: TeardownSummary,
    pub interrupted: bool,
    /// True when every observed counter matches the increments performed
    pub consistent: bool,
}

type Tally = BTreeMap<(ContainerId, ObjectId), AtomicU64>;

/// Run the workload until done or until `stop` is raised.
pub fn run_memory(
    manager: Arc<MemoryManager>,
    options: &MemoryOptions,
    stop: Arc<AtomicBool>,
) -> Result<MemoryReport> {
    if options.containers == 0 || options.threads == 0 || options.objects == 0 {
        return Err(ContainerError::Config(
            "memory needs at least one container, thread and object".to_string(),
        ));
    }
    if options.object_size < std::mem::size_of::<u64>() {
        return Err(ContainerError::Config(format!(
            "object size must be at least {} bytes",
            std::mem::size_of::<u64>()
        )));
    }

    let started_at = Utc::now();
    let start = Instant::now();
    let tally: Arc<Tally> = Arc::new(
        (0..options.containers)
            .flat_map(|c| (0..options.objects).map(move |o| ((c, o), AtomicU64::new(0))))
            .collect(),
    );

    info!(
        containers = options.containers,
        threads = options.threads,
        objects = options.objects,
        iterations = options.iterations,
        "starting memory workload"
    );

    let mut handles = Vec::with_capacity(options.threads);
    for index in 0..options.threads {
        let container = index as u64 % options.containers;
        let manager = Arc::clone(&manager);
        let tally = Arc::clone(&tally);
        let stop = Arc::clone(&stop);
        let options = *options;

        handles.push(thread::spawn(move || -> Result<usize> {
            let actor = ActorId::current();
            let mapper = RecordingMapper::new();
            manager.create(actor, container)?;

            let stride = round_up_to_page(options.object_size, manager.limits().page_size)
                .ok_or(ContainerError::ResourceExhausted {
                    requested: options.object_size,
                })? as u64;
            for object in 0..options.objects {
                let region = Region::new(MAP_BASE + object * stride, options.object_size);
                manager.map(actor, object, region, &mapper)?;
            }

            for iteration in 0..options.iterations {
                if stop.load(Ordering::SeqCst) {
                    break;
                }
                let object = iteration as u64 % options.objects;
                increment(&manager, actor, object)?;
                tally[&(container, object)].fetch_add(1, Ordering::SeqCst);
            }

            manager.delete(actor)?;
            debug!(%actor, container, "memory unit finished");
            Ok(mapper.len())
        }));
    }

    let mut mappings = 0;
    for handle in handles {
        mappings += handle
            .join()
            .map_err(|_| ContainerError::Config("a workload thread panicked".to_string()))??;
    }

    let resident_bytes = manager.stats().resident_bytes;
    let containers = collect_counters(&manager, &tally, options)?;
    let consistent = containers
        .iter()
        .flat_map(|c| c.objects.iter())
        .all(|o| o.expected == o.observed);
    let teardown = manager.teardown();

    Ok(MemoryReport {
        started_at,
        elapsed_ms: start.elapsed().as_millis(),
        threads: options.threads,
        mappings,
        resident_bytes,
        containers,
        teardown,
        interrupted: stop.load(Ordering::SeqCst),
        consistent,
    })
}

/// Read-modify-write of the counter in the first eight bytes of `object`
fn increment(manager: &MemoryManager, actor: ActorId, object: ObjectId) -> Result<()> {
    manager.lock(actor, object)?;
    let current = manager.with_object(actor, object, |bytes| read_counter(bytes))?;
    thread::yield_now();
    manager.with_object(actor, object, |bytes| write_counter(bytes, current + 1))?;
    manager.unlock(actor, object)
}

/// Join each container from the calling thread and read its counters
fn collect_counters(
    manager: &MemoryManager,
    tally: &Tally,
    options: &MemoryOptions,
) -> Result<Vec<ContainerCounters>> {
    let reader = ActorId::current();
    let mut containers = Vec::new();

    for container in 0..options.containers.min(options.threads as u64) {
        manager.create(reader, container)?;
        let mut objects = Vec::new();
        for object in 0..options.objects {
            let observed = manager.with_object(reader, object, |bytes| read_counter(bytes))?;
            objects.push(ObjectCounter {
                object,
                expected: tally[&(container, object)].load(Ordering::SeqCst),
                observed,
            });
        }
        manager.delete(reader)?;
        containers.push(ContainerCounters { container, objects });
    }

    Ok(containers)
}

fn read_counter(bytes: &[u8]) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(raw)
}

fn write_counter(bytes: &mut [u8], value: u64) {
    bytes[..8].copy_from_slice(&value.to_le_bytes());
}
