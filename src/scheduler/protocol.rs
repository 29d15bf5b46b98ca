//! Round-robin scheduling within a container
//!
//! The head of a container's membership list runs; every other member is
//! parked. `switch` rotates the head to the back and wakes the new head,
//! `delete` removes the caller and wakes its successor. Membership changes and
//! the choice of who to wake happen under the registry mutex; parking happens
//! after it is released; a wake that arrives first is kept as a permit.

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::container::{ContainerId, ContainerInfo, ContainerRegistry, SchedulerContainer};
use crate::dispatch::{ContainerCmd, SchedulerCommand};
use crate::error::{ContainerError, Result};
use crate::unit::{ActorId, ExecutionUnit, UnitState};

/// Registry of scheduler containers
#[derive(Debug, Default)]
pub struct Scheduler {
    registry: Mutex<ContainerRegistry<SchedulerContainer>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join container `id`, creating it if needed.
    ///
    /// The first member runs straight away. Anyone joining a container that
    /// already has members parks until it is woken by a `switch` or `delete`.
    pub fn create(&self, unit: &ExecutionUnit, id: ContainerId) -> Result<()> {
        let actor = unit.id();
        let must_wait = {
            let mut registry = self.registry.lock();
            if let Some(container) = registry.find_by_member(actor) {
                return Err(ContainerError::AlreadyMember { actor, container });
            }

            let (container, created) = registry.find_or_create(id);
            container.members.append(unit.clone());
            debug!(
                container = id,
                %actor,
                created,
                members = container.members.len(),
                "joined scheduler container"
            );
            container.members.len() > 1
        };

        if must_wait {
            trace!(container = id, %actor, "waiting for first turn");
            unit.park();
        }
        Ok(())
    }

    /// Give the turn to the next member of the caller's container.
    ///
    /// No-op when the caller is in no container or is alone in it. The caller
    /// parks on the handle stored when it joined, so any handle carrying the
    /// same [`ActorId`] can issue the request.
    pub fn switch(&self, unit: &ExecutionUnit) -> Result<()> {
        let actor = unit.id();
        let stored = {
            let mut registry = self.registry.lock();
            let Some(container) = member_container(&mut registry, actor) else {
                trace!(%actor, "switch outside a container");
                return Ok(());
            };

            if !container.members.is_head(actor) {
                warn!(container = container.id, %actor, "switch from a member that is not running");
                return Ok(());
            }
            let Some(stored) = container.members.head().cloned() else {
                return Ok(());
            };

            container.members.rotate_to_back();
            let Some(next) = container.members.head() else {
                return Ok(());
            };
            if next.id() == actor {
                return Ok(());
            }

            debug!(container = container.id, from = %actor, to = %next.id(), "switching");
            next.unpark();
            stored
        };

        stored.park();
        Ok(())
    }

    /// Leave the caller's container, waking the next member if the caller was
    /// running. The container is destroyed when its last member leaves.
    pub fn delete(&self, unit: &ExecutionUnit) -> Result<()> {
        let actor = unit.id();
        let mut registry = self.registry.lock();
        let Some(id) = registry.find_by_member(actor) else {
            trace!(%actor, "delete outside a container");
            return Ok(());
        };
        let Some(container) = registry.get_mut(id) else {
            return Ok(());
        };

        let removed = container.members.remove(actor);
        if container.members.is_empty() {
            registry.delete_if_empty(id);
            debug!(container = id, %actor, "last member left");
            return Ok(());
        }

        if removed.is_some_and(|r| r.was_head) {
            if let Some(next) = container.members.head() {
                debug!(container = id, from = %actor, to = %next.id(), "handing over on delete");
                next.unpark();
            }
        }
        Ok(())
    }

    pub fn dispatch(
        &self,
        unit: &ExecutionUnit,
        command: SchedulerCommand,
        cmd: ContainerCmd,
    ) -> Result<()> {
        match command {
            SchedulerCommand::Create => self.create(unit, cmd.container_id),
            SchedulerCommand::Switch => self.switch(unit),
            SchedulerCommand::Delete => self.delete(unit),
        }
    }

    pub fn state_of(&self, actor: ActorId) -> UnitState {
        let registry = self.registry.lock();
        match registry.find_by_member(actor).and_then(|id| registry.get(id)) {
            Some(container) if container.members.is_head(actor) => UnitState::Running,
            Some(_) => UnitState::Waiting,
            None => UnitState::Gone,
        }
    }

    /// Whether `actor` is listed and blocked waiting for its turn
    pub fn is_parked(&self, actor: ActorId) -> bool {
        let registry = self.registry.lock();
        registry
            .find_by_member(actor)
            .and_then(|id| registry.get(id))
            .and_then(|c| c.members.iter().find(|u| u.id() == actor))
            .is_some_and(ExecutionUnit::is_parked)
    }

    /// The member whose turn it is in container `id`
    pub fn running(&self, id: ContainerId) -> Option<ActorId> {
        let registry = self.registry.lock();
        registry
            .get(id)
            .and_then(|c| c.members.head().map(ExecutionUnit::id))
    }

    /// Members of container `id` in turn order
    pub fn members(&self, id: ContainerId) -> Option<Vec<ActorId>> {
        self.registry.lock().get(id).map(|c| c.members.ids())
    }

    pub fn container_of(&self, actor: ActorId) -> Option<ContainerId> {
        self.registry.lock().find_by_member(actor)
    }

    pub fn container_count(&self) -> usize {
        self.registry.lock().len()
    }

    pub fn containers(&self) -> Vec<ContainerInfo> {
        self.registry.lock().iter().map(ContainerInfo::from).collect()
    }
}

fn member_container(
    registry: &mut ContainerRegistry<SchedulerContainer>,
    actor: ActorId,
) -> Option<&mut SchedulerContainer> {
    let id = registry.find_by_member(actor)?;
    registry.get_mut(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn unit(id: u64) -> ExecutionUnit {
        ExecutionUnit::new(ActorId::new(id))
    }

    fn wait_parked(unit: &ExecutionUnit) {
        while !unit.is_parked() {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_first_member_runs() {
        let scheduler = Scheduler::new();
        let a = unit(1);
        scheduler.create(&a, 7).unwrap();
        assert_eq!(scheduler.state_of(a.id()), UnitState::Running);
        assert_eq!(scheduler.running(7), Some(a.id()));
    }

    #[test]
    fn test_switch_alone_is_noop() {
        let scheduler = Scheduler::new();
        let a = unit(1);
        scheduler.create(&a, 1).unwrap();
        scheduler.switch(&a).unwrap();
        assert_eq!(scheduler.members(1), Some(vec![a.id()]));
    }

    #[test]
    fn test_switch_and_delete_without_container() {
        let scheduler = Scheduler::new();
        let a = unit(1);
        scheduler.switch(&a).unwrap();
        scheduler.delete(&a).unwrap();
        assert_eq!(scheduler.state_of(a.id()), UnitState::Gone);
        assert_eq!(scheduler.container_count(), 0);
    }

    #[test]
    fn test_create_twice_is_rejected() {
        let scheduler = Scheduler::new();
        let a = unit(1);
        scheduler.create(&a, 1).unwrap();
        assert!(matches!(
            scheduler.create(&a, 2),
            Err(ContainerError::AlreadyMember { container: 1, .. })
        ));
        assert_eq!(scheduler.container_count(), 1);
    }

    #[test]
    fn test_last_delete_destroys_container() {
        let scheduler = Scheduler::new();
        let a = unit(1);
        scheduler.create(&a, 3).unwrap();
        scheduler.delete(&a).unwrap();
        assert_eq!(scheduler.members(3), None);
        assert_eq!(scheduler.container_count(), 0);
    }

    #[test]
    fn test_joiner_waits_until_delete() {
        let scheduler = Arc::new(Scheduler::new());
        let a = unit(1);
        let b = unit(2);
        scheduler.create(&a, 1).unwrap();

        let joiner = {
            let scheduler = Arc::clone(&scheduler);
            let b = b.clone();
            thread::spawn(move || scheduler.create(&b, 1))
        };

        wait_parked(&b);
        assert_eq!(scheduler.state_of(b.id()), UnitState::Waiting);

        scheduler.delete(&a).unwrap();
        joiner.join().unwrap().unwrap();
        assert_eq!(scheduler.running(1), Some(b.id()));
        assert_eq!(scheduler.state_of(a.id()), UnitState::Gone);
    }

    #[test]
    fn test_switch_from_waiting_member_is_noop() {
        let scheduler = Arc::new(Scheduler::new());
        let a = unit(1);
        let b = unit(2);
        scheduler.create(&a, 4).unwrap();

        let joiner = {
            let scheduler = Arc::clone(&scheduler);
            let b = b.clone();
            thread::spawn(move || scheduler.create(&b, 4))
        };
        wait_parked(&b);

        // Issued on B's behalf while B waits for its turn
        scheduler.switch(&unit(2)).unwrap();
        assert_eq!(scheduler.members(4), Some(vec![a.id(), b.id()]));
        assert_eq!(scheduler.running(4), Some(a.id()));
        assert!(scheduler.is_parked(b.id()));

        scheduler.delete(&a).unwrap();
        joiner.join().unwrap().unwrap();
        assert_eq!(scheduler.members(4), Some(vec![b.id()]));
    }

    #[test]
    fn test_dispatch_routes_commands() {
        let scheduler = Scheduler::new();
        let a = unit(1);
        scheduler
            .dispatch(&a, SchedulerCommand::Create, ContainerCmd::container(5))
            .unwrap();
        scheduler
            .dispatch(&a, SchedulerCommand::Switch, ContainerCmd::default())
            .unwrap();
        assert_eq!(scheduler.container_of(a.id()), Some(5));
        scheduler
            .dispatch(&a, SchedulerCommand::Delete, ContainerCmd::default())
            .unwrap();
        assert_eq!(scheduler.container_of(a.id()), None);
    }
}
