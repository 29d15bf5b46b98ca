//! Container registry
//!
//! The registry maps container ids to container records and answers "which
//! container is this actor in". It is not synchronized itself: each service
//! keeps one registry behind its own mutex, and that mutex is the
//! serialization point for every structural change.

use std::collections::BTreeMap;

use tracing::debug;

use super::types::{Container, ContainerId};
use crate::unit::ActorId;

/// All containers of one kind, keyed by id
#[derive(Debug)]
pub struct ContainerRegistry<C> {
    containers: BTreeMap<ContainerId, C>,
}

impl<C: Container> ContainerRegistry<C> {
    pub fn new() -> Self {
        Self {
            containers: BTreeMap::new(),
        }
    }

    /// Find the container listing `actor` as a member
    pub fn find_by_member(&self, actor: ActorId) -> Option<ContainerId> {
        self.containers
            .values()
            .find(|c| c.is_member(actor))
            .map(Container::id)
    }

    /// Return the container with `id`, linking a new empty one if absent.
    /// The flag is true when the container was created by this call.
    pub fn find_or_create(&mut self, id: ContainerId) -> (&mut C, bool) {
        let mut created = false;
        let container = self.containers.entry(id).or_insert_with(|| {
            debug!(container = id, "creating container");
            created = true;
            C::new(id)
        });
        (container, created)
    }

    /// Unlink and drop the container once it has no members.
    /// Returns true if the container was destroyed.
    pub fn delete_if_empty(&mut self, id: ContainerId) -> bool {
        let empty = self.containers.get(&id).is_some_and(Container::is_empty);
        if empty {
            debug!(container = id, "destroying empty container");
            self.containers.remove(&id);
        }
        empty
    }

    /// Unlink a container regardless of its membership
    pub fn remove(&mut self, id: ContainerId) -> Option<C> {
        self.containers.remove(&id)
    }

    /// Unlink every container
    pub fn drain(&mut self) -> Vec<C> {
        std::mem::take(&mut self.containers).into_values().collect()
    }

    pub fn get(&self, id: ContainerId) -> Option<&C> {
        self.containers.get(&id)
    }

    pub fn get_mut(&mut self, id: ContainerId) -> Option<&mut C> {
        self.containers.get_mut(&id)
    }

    pub fn exists(&self, id: ContainerId) -> bool {
        self.containers.contains_key(&id)
    }

    /// Container ids in ascending order
    pub fn ids(&self) -> Vec<ContainerId> {
        self.containers.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &C> {
        self.containers.values()
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

impl<C: Container> Default for ContainerRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
