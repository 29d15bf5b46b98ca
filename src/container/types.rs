//! Container records
//!
//! A scheduler container holds execution units taking turns; a memory
//! container holds shared objects and their locks for its members.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::membership::MembershipList;
use crate::memory::{LockTable, ObjectStore};
use crate::unit::{ActorId, ExecutionUnit};

pub type ContainerId = u64;

/// Behaviour the registry needs from a container record
pub trait Container {
    fn new(id: ContainerId) -> Self;
    fn id(&self) -> ContainerId;
    fn is_member(&self, actor: ActorId) -> bool;
    /// True when the container has no members
    fn is_empty(&self) -> bool;
}

/// Container whose members take turns running
#[derive(Debug)]
pub struct SchedulerContainer {
    pub id: ContainerId,
    pub members: MembershipList<ExecutionUnit>,
    pub created_at: DateTime<Utc>,
}

impl Container for SchedulerContainer {
    fn new(id: ContainerId) -> Self {
        Self {
            id,
            members: MembershipList::new(),
            created_at: Utc::now(),
        }
    }

    fn id(&self) -> ContainerId {
        self.id
    }

    fn is_member(&self, actor: ActorId) -> bool {
        self.members.contains(actor)
    }

    fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Container whose members share memory objects
#[derive(Debug)]
pub struct MemoryContainer {
    pub id: ContainerId,
    pub members: MembershipList<ActorId>,
    pub objects: ObjectStore,
    pub locks: LockTable,
    pub created_at: DateTime<Utc>,
}

impl Container for MemoryContainer {
    fn new(id: ContainerId) -> Self {
        Self {
            id,
            members: MembershipList::new(),
            objects: ObjectStore::new(),
            locks: LockTable::new(),
            created_at: Utc::now(),
        }
    }

    fn id(&self) -> ContainerId {
        self.id
    }

    fn is_member(&self, actor: ActorId) -> bool {
        self.members.contains(actor)
    }

    fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Snapshot of a container for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerInfo {
    pub id: ContainerId,
    pub members: Vec<ActorId>,
    pub objects: usize,
    pub locks: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&SchedulerContainer> for ContainerInfo {
    fn from(container: &SchedulerContainer) -> Self {
        Self {
            id: container.id,
            members: container.members.ids(),
            objects: 0,
            locks: 0,
            created_at: container.created_at,
        }
    }
}

impl From<&MemoryContainer> for ContainerInfo {
    fn from(container: &MemoryContainer) -> Self {
        Self {
            id: container.id,
            members: container.members.ids(),
            objects: container.objects.len(),
            locks: container.locks.len(),
            created_at: container.created_at,
        }
    }
}
