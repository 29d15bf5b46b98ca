//! ucontainer - lightweight containers for threads
//!
//! Two container services share one registry design:
//!
//! - [`Scheduler`]: members of a container take turns. The head of the
//!   membership list runs; `switch` hands the turn to the next member and
//!   parks the caller.
//! - [`MemoryManager`]: members of a container share memory objects by id,
//!   with a lazily created lock per object id.
//!
//! # Example
//!
//! ```no_run
//! use ucontainer::{ExecutionUnit, Scheduler};
//!
//! let scheduler = Scheduler::new();
//! let unit = ExecutionUnit::current();
//! scheduler.create(&unit, 7).unwrap();
//! scheduler.switch(&unit).unwrap();
//! scheduler.delete(&unit).unwrap();
//! ```

pub mod cli;
pub mod config;
pub mod container;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod memory;
pub mod output;
pub mod scheduler;
pub mod unit;
pub mod workload;

pub use config::Limits;
pub use container::{ContainerId, ContainerInfo, ContainerRegistry, MembershipList};
pub use dispatch::{ContainerCmd, MemoryCommand, SchedulerCommand};
pub use error::{ContainerError, Result};
pub use memory::{
    AddressSpaceMapper, FrameDescriptor, MapError, MemoryManager, ObjectId, RecordingMapper,
    Region, TeardownSummary,
};
pub use output::{format_output, OutputFormat, Report};
pub use scheduler::Scheduler;
pub use unit::{ActorId, ExecutionUnit, UnitState};
