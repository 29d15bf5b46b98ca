//! Per-object locks
//!
//! Locks are created on first use and live as long as their container, even
//! after the object they guard has been freed. Holding one is not tied to a
//! Rust guard: a member acquires in one call and releases in a later one.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::trace;

use super::object::ObjectId;
use crate::error::{ContainerError, Result};
use crate::unit::ActorId;

#[derive(Debug, Default)]
struct LockState {
    owner: Option<ActorId>,
    /// Set when the owning container is destroyed
    retired: bool,
}

/// Mutual exclusion primitive for one object id
#[derive(Debug)]
pub struct ObjectLock {
    id: ObjectId,
    state: Mutex<LockState>,
    cond: Condvar,
}

impl ObjectLock {
    pub fn new(id: ObjectId) -> Self {
        Self {
            id,
            state: Mutex::new(LockState::default()),
            cond: Condvar::new(),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Block until `actor` holds the lock
    pub fn acquire(&self, actor: ActorId) -> Result<()> {
        let mut state = self.state.lock();
        if state.owner == Some(actor) {
            return Err(ContainerError::LockAlreadyHeld {
                object: self.id,
                actor,
            });
        }

        loop {
            if state.retired {
                return Err(ContainerError::LockAborted { object: self.id });
            }
            if state.owner.is_none() {
                state.owner = Some(actor);
                trace!(object = self.id, %actor, "lock acquired");
                return Ok(());
            }
            self.cond.wait(&mut state);
        }
    }

    /// Acquire only if nobody holds the lock
    pub fn try_acquire(&self, actor: ActorId) -> Result<bool> {
        let mut state = self.state.lock();
        if state.retired {
            return Err(ContainerError::LockAborted { object: self.id });
        }
        match state.owner {
            Some(owner) if owner == actor => Err(ContainerError::LockAlreadyHeld {
                object: self.id,
                actor,
            }),
            Some(_) => Ok(false),
            None => {
                state.owner = Some(actor);
                Ok(true)
            }
        }
    }

    pub fn release(&self, actor: ActorId) -> Result<()> {
        let mut state = self.state.lock();
        if state.owner != Some(actor) {
            return Err(ContainerError::LockNotHeld {
                object: self.id,
                actor,
            });
        }
        state.owner = None;
        trace!(object = self.id, %actor, "lock released");
        self.cond.notify_one();
        Ok(())
    }

    pub fn holder(&self) -> Option<ActorId> {
        self.state.lock().owner
    }

    pub fn is_retired(&self) -> bool {
        self.state.lock().retired
    }

    /// Discard the lock; current and future waiters fail with `LockAborted`
    fn retire(&self) {
        let mut state = self.state.lock();
        state.retired = true;
        self.cond.notify_all();
    }
}

/// Locks of one container, keyed by object id
#[derive(Debug, Default)]
pub struct LockTable {
    locks: BTreeMap<ObjectId, Arc<ObjectLock>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock for `id`, created on first request
    pub fn get_or_create(&mut self, id: ObjectId) -> Arc<ObjectLock> {
        Arc::clone(
            self.locks
                .entry(id)
                .or_insert_with(|| Arc::new(ObjectLock::new(id))),
        )
    }

    pub fn get(&self, id: ObjectId) -> Option<Arc<ObjectLock>> {
        self.locks.get(&id).cloned()
    }

    /// Ids of the locks currently held by `actor`
    pub fn held_by(&self, actor: ActorId) -> Vec<ObjectId> {
        self.locks
            .values()
            .filter(|lock| lock.holder() == Some(actor))
            .map(|lock| lock.id())
            .collect()
    }

    /// Retire and drop every lock. Returns how many were retired.
    pub fn retire_all(&mut self) -> usize {
        let locks = std::mem::take(&mut self.locks);
        for lock in locks.values() {
            lock.retire();
        }
        locks.len()
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for LockTable {
    fn drop(&mut self) {
        self.retire_all();
    }
}
