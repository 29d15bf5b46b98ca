//! Memory containers
//!
//! Shared objects with lazily allocated backing storage, per-object locks,
//! and the mapper interface through which storage reaches an address space.

mod lock;
mod manager;
mod mapper;
mod object;

pub use lock::{LockTable, ObjectLock};
pub use manager::{MemoryManager, MemoryStats, TeardownSummary};
pub use mapper::{AddressSpaceMapper, MapError, Mapping, RecordingMapper, Region};
pub use object::{
    round_up_to_page, BackingStore, FrameDescriptor, MemoryObject, ObjectId, ObjectStore,
};
