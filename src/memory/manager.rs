//! Memory container service
//!
//! Members of a memory container share objects by id: the first map of an id
//! allocates zeroed storage and later maps alias it. Each object id also has
//! a lock that members take and release around their accesses.
//!
//! All table changes happen under one mutex. Waiting for an object lock does
//! not: the lock is looked up (or created) under the mutex and acquired after
//! the mutex is released, so a long-held object lock never stalls other
//! containers.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use super::lock::ObjectLock;
use super::mapper::{AddressSpaceMapper, Region};
use super::object::{BackingStore, FrameDescriptor, MemoryObject, ObjectId};
use crate::config::Limits;
use crate::container::{
    Container, ContainerId, ContainerInfo, ContainerRegistry, MemoryContainer,
};
use crate::dispatch::{ContainerCmd, MemoryCommand};
use crate::error::{ContainerError, Result};
use crate::unit::ActorId;

/// What a destroy or teardown released
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TeardownSummary {
    pub containers: usize,
    pub objects: usize,
    pub bytes_released: usize,
    pub locks_retired: usize,
}

impl TeardownSummary {
    fn absorb(&mut self, other: TeardownSummary) {
        self.containers += other.containers;
        self.objects += other.objects;
        self.bytes_released += other.bytes_released;
        self.locks_retired += other.locks_retired;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    pub containers: usize,
    pub members: usize,
    pub objects: usize,
    pub locks: usize,
    pub resident_bytes: usize,
}

/// Registry of memory containers
#[derive(Debug, Default)]
pub struct MemoryManager {
    registry: Mutex<ContainerRegistry<MemoryContainer>>,
    limits: Limits,
}

impl MemoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self {
            registry: Mutex::new(ContainerRegistry::new()),
            limits,
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Join container `id`, creating it if needed. Never blocks.
    pub fn create(&self, actor: ActorId, id: ContainerId) -> Result<()> {
        let mut registry = self.registry.lock();
        if let Some(container) = registry.find_by_member(actor) {
            return Err(ContainerError::AlreadyMember { actor, container });
        }

        let (container, created) = registry.find_or_create(id);
        container.members.append(actor);
        debug!(container = id, %actor, created, "joined memory container");
        Ok(())
    }

    /// Leave the caller's container. The container and its objects stay.
    pub fn delete(&self, actor: ActorId) -> Result<()> {
        let mut registry = self.registry.lock();
        let container = member_container(&mut registry, actor)?;
        container.members.remove(actor);
        for object in container.locks.held_by(actor) {
            warn!(
                container = container.id,
                %actor,
                object,
                "member left while holding a lock"
            );
        }
        debug!(container = container.id, %actor, "left memory container");
        Ok(())
    }

    /// Map object `object` of the caller's container at `region`.
    ///
    /// The first map of an id allocates zeroed storage of `region.len` bytes
    /// (rounded up to the page size); later maps hand the same storage to the
    /// mapper. Returns the descriptor that was mapped.
    pub fn map(
        &self,
        actor: ActorId,
        object: ObjectId,
        region: Region,
        mapper: &dyn AddressSpaceMapper,
    ) -> Result<FrameDescriptor> {
        self.check_region(region)?;

        let mut registry = self.registry.lock();
        let container = member_container(&mut registry, actor)?;

        if let Some(existing) = container.objects.get(object) {
            if region.len > existing.len() {
                return Err(ContainerError::InvalidRegion(format!(
                    "object {} is {} bytes, {} requested",
                    object,
                    existing.len(),
                    region.len
                )));
            }
            let descriptor = existing.descriptor();
            mapper.map(&descriptor, region)?;
            debug!(container = container.id, object, %actor, "mapped existing object");
            return Ok(descriptor);
        }

        let storage = BackingStore::allocate(region.len, self.limits.page_size)?;
        let fresh = MemoryObject::new(object, storage);
        let descriptor = fresh.descriptor();
        mapper.map(&descriptor, region)?;
        container.objects.insert(fresh);
        debug!(
            container = container.id,
            object,
            %actor,
            bytes = descriptor.len,
            "allocated object"
        );
        Ok(descriptor)
    }

    /// Block until the caller holds the lock for `object`, creating the lock
    /// on first use.
    pub fn lock(&self, actor: ActorId, object: ObjectId) -> Result<()> {
        let lock = {
            let mut registry = self.registry.lock();
            let container = member_container(&mut registry, actor)?;
            container.locks.get_or_create(object)
        };
        lock.acquire(actor)
    }

    /// Like [`lock`](Self::lock) but returns `false` instead of waiting
    pub fn try_lock(&self, actor: ActorId, object: ObjectId) -> Result<bool> {
        let lock = {
            let mut registry = self.registry.lock();
            let container = member_container(&mut registry, actor)?;
            container.locks.get_or_create(object)
        };
        lock.try_acquire(actor)
    }

    pub fn unlock(&self, actor: ActorId, object: ObjectId) -> Result<()> {
        let mut registry = self.registry.lock();
        let container = member_container(&mut registry, actor)?;
        let lock = container
            .locks
            .get(object)
            .ok_or(ContainerError::LockNotFound {
                container: container.id,
                object,
            })?;
        lock.release(actor)
    }

    /// Release the storage of `object`. Its lock is kept.
    pub fn free(&self, actor: ActorId, object: ObjectId) -> Result<()> {
        let mut registry = self.registry.lock();
        let container = member_container(&mut registry, actor)?;
        let removed = container
            .objects
            .remove(object)
            .ok_or(ContainerError::ObjectNotFound {
                container: container.id,
                object,
            })?;
        debug!(
            container = container.id,
            object,
            bytes = removed.len(),
            "freed object"
        );
        Ok(())
    }

    /// Run `f` on the storage of `object` while the registry mutex is held.
    ///
    /// The mutex is not reentrant: calling back into this manager from `f`
    /// deadlocks. Return what you need from `f` and act on it afterwards.
    pub fn with_object<R>(
        &self,
        actor: ActorId,
        object: ObjectId,
        f: impl FnOnce(&mut [u8]) -> R,
    ) -> Result<R> {
        let mut registry = self.registry.lock();
        let container = member_container(&mut registry, actor)?;
        let id = container.id;
        let found = container
            .objects
            .get_mut(object)
            .ok_or(ContainerError::ObjectNotFound {
                container: id,
                object,
            })?;
        Ok(f(found.bytes_mut()))
    }

    /// The lock for `object` in the caller's container, if it was ever taken
    pub fn lock_of(&self, actor: ActorId, object: ObjectId) -> Result<Arc<ObjectLock>> {
        let mut registry = self.registry.lock();
        let container = member_container(&mut registry, actor)?;
        container.locks.get(object).ok_or(ContainerError::LockNotFound {
            container: container.id,
            object,
        })
    }

    /// Destroy container `id`, releasing its objects and retiring its locks
    pub fn destroy(&self, id: ContainerId) -> Option<TeardownSummary> {
        let removed = self.registry.lock().remove(id);
        removed.map(release_container)
    }

    /// Destroy every container
    pub fn teardown(&self) -> TeardownSummary {
        let drained = self.registry.lock().drain();
        let mut summary = TeardownSummary::default();
        for container in drained {
            summary.absorb(release_container(container));
        }
        summary
    }

    pub fn dispatch(&self, actor: ActorId, command: MemoryCommand, cmd: ContainerCmd) -> Result<()> {
        match command {
            MemoryCommand::Create => self.create(actor, cmd.container_id),
            MemoryCommand::Delete => self.delete(actor),
            MemoryCommand::Lock => self.lock(actor, cmd.object_id),
            MemoryCommand::Unlock => self.unlock(actor, cmd.object_id),
            MemoryCommand::Free => self.free(actor, cmd.object_id),
        }
    }

    pub fn container_of(&self, actor: ActorId) -> Option<ContainerId> {
        self.registry.lock().find_by_member(actor)
    }

    pub fn info(&self, id: ContainerId) -> Option<ContainerInfo> {
        self.registry.lock().get(id).map(ContainerInfo::from)
    }

    pub fn containers(&self) -> Vec<ContainerInfo> {
        self.registry.lock().iter().map(ContainerInfo::from).collect()
    }

    pub fn stats(&self) -> MemoryStats {
        let registry = self.registry.lock();
        registry.iter().fold(MemoryStats::default(), |mut stats, c| {
            stats.containers += 1;
            stats.members += c.members.len();
            stats.objects += c.objects.len();
            stats.locks += c.locks.len();
            stats.resident_bytes += c.objects.resident_bytes();
            stats
        })
    }

    fn check_region(&self, region: Region) -> Result<()> {
        if region.len == 0 {
            return Err(ContainerError::InvalidRegion(
                "region length must be greater than zero".to_string(),
            ));
        }
        if region.len > self.limits.max_region_len {
            return Err(ContainerError::InvalidRegion(format!(
                "region of {} bytes exceeds the limit of {}",
                region.len, self.limits.max_region_len
            )));
        }
        Ok(())
    }
}

fn member_container(
    registry: &mut ContainerRegistry<MemoryContainer>,
    actor: ActorId,
) -> Result<&mut MemoryContainer> {
    let id = registry
        .find_by_member(actor)
        .ok_or(ContainerError::NoContainer { actor })?;
    registry
        .get_mut(id)
        .ok_or(ContainerError::NoContainer { actor })
}

fn release_container(mut container: MemoryContainer) -> TeardownSummary {
    let (objects, bytes_released) = container.objects.clear();
    let locks_retired = container.locks.retire_all();
    debug!(
        container = container.id(),
        objects, bytes_released, locks_retired, "destroyed memory container"
    );
    TeardownSummary {
        containers: 1,
        objects,
        bytes_released,
        locks_retired,
    }
}
