//! Round-robin scheduling workload
//!
//! Spawns threads spread over a number of containers. Each thread joins its
//! container, takes a number of turns, and leaves. A turn checks that the
//! thread is the container's running member and that no other member of the
//! same container is inside a turn at the same time.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::container::ContainerId;
use crate::error::{ContainerError, Result};
use crate::scheduler::Scheduler;
use crate::unit::{ActorId, ExecutionUnit};

/// Turns kept per container in the report
pub const TURN_SAMPLE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleOptions {
    pub containers: u64,
    pub threads: usize,
    pub switches: usize,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            containers: 1,
            threads: 2,
            switches: 4,
        }
    }
}

/// Per-container outcome
#[derive(Debug, Clone, Serialize)]
pub struct ContainerTurns {
    pub container: ContainerId,
    pub units: usize,
    pub turns: usize,
    /// Turns taken by a member that was not at the head
    pub out_of_turn: usize,
    /// Turns that started while another member was mid-turn
    pub overlaps: usize,
    /// First turns in the order they happened
    pub sample: Vec<ActorId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleReport {
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u128,
    pub threads: usize,
    pub containers: Vec<ContainerTurns>,
    pub total_turns: usize,
    /// True when no turn was out of order or overlapping
    pub round_robin: bool,
}

#[derive(Debug, Default)]
struct TurnLog {
    units: usize,
    turns: Vec<ActorId>,
    out_of_turn: usize,
    overlaps: usize,
}

#[derive(Default)]
struct ContainerProbe {
    busy: AtomicBool,
    log: Mutex<TurnLog>,
}

/// Run the workload to completion.
pub fn run_schedule(options: &ScheduleOptions) -> Result<ScheduleReport> {
    if options.containers == 0 || options.threads == 0 {
        return Err(ContainerError::Config(
            "schedule needs at least one container and one thread".to_string(),
        ));
    }

    let started_at = Utc::now();
    let start = Instant::now();
    let scheduler = Arc::new(Scheduler::new());
    let probes: Arc<BTreeMap<ContainerId, ContainerProbe>> = Arc::new(
        (0..options.containers)
            .map(|id| (id, ContainerProbe::default()))
            .collect(),
    );
    let finished = Arc::new(AtomicUsize::new(0));

    info!(
        containers = options.containers,
        threads = options.threads,
        switches = options.switches,
        "starting schedule workload"
    );

    let mut handles = Vec::with_capacity(options.threads);
    for index in 0..options.threads {
        let container = index as u64 % options.containers;
        let scheduler = Arc::clone(&scheduler);
        let probes = Arc::clone(&probes);
        let finished = Arc::clone(&finished);
        let switches = options.switches;

        handles.push(thread::spawn(move || -> Result<()> {
            let unit = ExecutionUnit::current();
            let probe = &probes[&container];
            probe.log.lock().units += 1;

            scheduler.create(&unit, container)?;
            for _ in 0..switches {
                take_turn(&scheduler, &unit, container, probe);
                scheduler.switch(&unit)?;
            }
            take_turn(&scheduler, &unit, container, probe);
            scheduler.delete(&unit)?;

            finished.fetch_add(1, Ordering::SeqCst);
            debug!(actor = %unit.id(), container, "unit finished");
            Ok(())
        }));
    }

    for handle in handles {
        handle
            .join()
            .map_err(|_| ContainerError::Config("a workload thread panicked".to_string()))??;
    }

    let containers: Vec<ContainerTurns> = probes
        .iter()
        .map(|(id, probe)| {
            let log = probe.log.lock();
            ContainerTurns {
                container: *id,
                units: log.units,
                turns: log.turns.len(),
                out_of_turn: log.out_of_turn,
                overlaps: log.overlaps,
                sample: log.turns.iter().take(TURN_SAMPLE).copied().collect(),
            }
        })
        .collect();

    let total_turns = containers.iter().map(|c| c.turns).sum();
    let round_robin = containers
        .iter()
        .all(|c| c.out_of_turn == 0 && c.overlaps == 0);

    Ok(ScheduleReport {
        started_at,
        elapsed_ms: start.elapsed().as_millis(),
        threads: finished.load(Ordering::SeqCst),
        containers,
        total_turns,
        round_robin,
    })
}

fn take_turn(
    scheduler: &Scheduler,
    unit: &ExecutionUnit,
    container: ContainerId,
    probe: &ContainerProbe,
) {
    let overlapped = probe.busy.swap(true, Ordering::SeqCst);
    let in_turn = scheduler.running(container) == Some(unit.id());

    {
        let mut log = probe.log.lock();
        log.turns.push(unit.id());
        if overlapped {
            log.overlaps += 1;
        }
        if !in_turn {
            log.out_of_turn += 1;
        }
    }

    thread::yield_now();
    if !overlapped {
        probe.busy.store(false, Ordering::SeqCst);
    }
}
