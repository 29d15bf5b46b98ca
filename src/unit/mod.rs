//! Execution units and their identities
//!
//! An [`ExecutionUnit`] is the schedulable thing a scheduler container lists:
//! an [`ActorId`] plus a park/unpark signal. Containers hold clones of the
//! handle taken when the unit joined and always wake and park through that
//! stored clone; they never own the thread behind it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};

/// Identity of the thread or process issuing a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl ActorId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Identity of the calling thread. Ids come from a process-wide counter
    /// and are never reused, even after the thread exits.
    pub fn current() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        thread_local! {
            static ID: u64 = NEXT.fetch_add(1, Ordering::Relaxed);
        }
        Self(ID.with(|id| *id))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ActorId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Scheduling state of a unit, derived from its position in a membership list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitState {
    /// Head of its container's membership list
    Running,
    /// Listed, but not the head
    Waiting,
    /// Not listed in any container
    Gone,
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitState::Running => write!(f, "running"),
            UnitState::Waiting => write!(f, "waiting"),
            UnitState::Gone => write!(f, "gone"),
        }
    }
}

/// Anything a membership list can hold
pub trait Member {
    fn actor_id(&self) -> ActorId;
}

impl Member for ActorId {
    fn actor_id(&self) -> ActorId {
        *self
    }
}

#[derive(Debug, Default)]
struct SignalState {
    /// A wake that has not been consumed by a park yet
    permit: bool,
    parked: bool,
}

/// Park/unpark pair with a single permit, so a wake that lands before the
/// matching park is not lost.
#[derive(Debug, Default)]
struct WakeSignal {
    state: Mutex<SignalState>,
    cond: Condvar,
}

impl WakeSignal {
    fn park(&self) {
        let mut state = self.state.lock();
        state.parked = true;
        while !state.permit {
            self.cond.wait(&mut state);
        }
        state.permit = false;
        state.parked = false;
    }

    fn unpark(&self) {
        let mut state = self.state.lock();
        state.permit = true;
        self.cond.notify_one();
    }
}

/// Non-owning handle to a schedulable unit
#[derive(Debug, Clone)]
pub struct ExecutionUnit {
    id: ActorId,
    signal: Arc<WakeSignal>,
}

impl ExecutionUnit {
    pub fn new(id: ActorId) -> Self {
        Self {
            id,
            signal: Arc::new(WakeSignal::default()),
        }
    }

    /// Handle for the calling thread. Every call on the same thread returns a
    /// clone of one handle, so they all share a wake signal.
    pub fn current() -> Self {
        thread_local! {
            static CURRENT: ExecutionUnit = ExecutionUnit::new(ActorId::current());
        }
        CURRENT.with(ExecutionUnit::clone)
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Block the calling thread until another thread calls [`unpark`](Self::unpark)
    /// on a clone of this handle. Returns at once if a wake is already pending.
    pub fn park(&self) {
        self.signal.park();
    }

    pub fn unpark(&self) {
        self.signal.unpark();
    }

    /// Whether the unit is currently blocked in [`park`](Self::park)
    pub fn is_parked(&self) -> bool {
        self.signal.state.lock().parked
    }
}

impl Member for ExecutionUnit {
    fn actor_id(&self) -> ActorId {
        self.id
    }
}

impl PartialEq for ExecutionUnit {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ExecutionUnit {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_wake_before_park_is_kept() {
        let unit = ExecutionUnit::new(ActorId::new(1));
        unit.unpark();
        // Returns immediately because the permit is pending
        unit.park();
        assert!(!unit.is_parked());
    }

    #[test]
    fn test_park_until_unparked() {
        let unit = ExecutionUnit::new(ActorId::new(2));
        let waker = unit.clone();

        let handle = thread::spawn(move || {
            unit.park();
        });

        while !waker.is_parked() {
            thread::sleep(Duration::from_millis(1));
        }
        waker.unpark();
        handle.join().unwrap();
        assert!(!waker.is_parked());
    }

    #[test]
    fn test_current_actor_is_stable_per_thread() {
        assert_eq!(ActorId::current(), ActorId::current());
        let other = thread::spawn(ActorId::current).join().unwrap();
        assert_ne!(other, ActorId::current());
    }

    #[test]
    fn test_current_unit_shares_one_signal() {
        let first = ExecutionUnit::current();
        let second = ExecutionUnit::current();
        assert_eq!(first.id(), ActorId::current());

        first.unpark();
        // The permit set through one handle is consumed through the other
        second.park();
        assert!(!first.is_parked());
    }

    #[test]
    fn test_units_compare_by_identity() {
        let a = ExecutionUnit::new(ActorId::new(7));
        let b = ExecutionUnit::new(ActorId::new(7));
        assert_eq!(a, b);
        assert_eq!(a.actor_id(), ActorId::new(7));
    }
}
