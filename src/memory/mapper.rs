//! Address-space mapping collaborator
//!
//! The memory manager decides which backing buffer a request maps; making it
//! visible in the caller's address space is the mapper's job.

use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;

use super::object::FrameDescriptor;

/// Target address range of a mapping request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Region {
    pub start: u64,
    pub len: usize,
}

impl Region {
    pub fn new(start: u64, len: usize) -> Self {
        Self { start, len }
    }

    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.len as u64)
    }

    pub fn overlaps(&self, other: &Region) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("target range {start:#x}+{len:#x} overlaps an existing mapping")]
    Overlap { start: u64, len: usize },

    #[error("mapping rejected: {0}")]
    Rejected(String),
}

pub trait AddressSpaceMapper: Send + Sync {
    fn map(&self, descriptor: &FrameDescriptor, target: Region) -> Result<(), MapError>;
}

/// One mapping performed by a [`RecordingMapper`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Mapping {
    pub descriptor: FrameDescriptor,
    pub target: Region,
}

/// Mapper that keeps a log of every mapping it accepts and refuses
/// overlapping target ranges.
#[derive(Debug, Default)]
pub struct RecordingMapper {
    mappings: Mutex<Vec<Mapping>>,
}

impl RecordingMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mappings(&self) -> Vec<Mapping> {
        self.mappings.lock().clone()
    }

    /// Descriptor mapped at `start`, if any
    pub fn descriptor_at(&self, start: u64) -> Option<FrameDescriptor> {
        self.mappings
            .lock()
            .iter()
            .find(|m| m.target.start == start)
            .map(|m| m.descriptor)
    }

    pub fn len(&self) -> usize {
        self.mappings.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.lock().is_empty()
    }
}

impl AddressSpaceMapper for RecordingMapper {
    fn map(&self, descriptor: &FrameDescriptor, target: Region) -> Result<(), MapError> {
        let mut mappings = self.mappings.lock();
        if mappings.iter().any(|m| m.target.overlaps(&target)) {
            return Err(MapError::Overlap {
                start: target.start,
                len: target.len,
            });
        }
        mappings.push(Mapping {
            descriptor: *descriptor,
            target,
        });
        Ok(())
    }
}
