//! Workloads that drive the container services from many threads

mod memory;
mod schedule;

pub use memory::{run_memory, ContainerCounters, MemoryOptions, MemoryReport, ObjectCounter};
pub use schedule::{run_schedule, ContainerTurns, ScheduleOptions, ScheduleReport};
