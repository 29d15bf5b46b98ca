//! Container registry and membership
//!
//! Both container services share this layer:
//! - `MembershipList` keeps members in turn order
//! - `ContainerRegistry` maps ids to records and finds an actor's container
//! - `types` defines the scheduler and memory container records

mod membership;
mod registry;
mod types;

pub use membership::{MembershipList, Removed};
pub use registry::ContainerRegistry;
pub use types::{Container, ContainerId, ContainerInfo, MemoryContainer, SchedulerContainer};
