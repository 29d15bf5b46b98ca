//! Shared memory objects and their backing storage

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{ContainerError, Result};

pub type ObjectId = u64;

/// Physical description of a backing buffer, handed to the mapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FrameDescriptor {
    /// Address of the first byte of the buffer
    pub base: usize,
    /// Length of the buffer in bytes
    pub len: usize,
}

impl FrameDescriptor {
    /// Frame number of the buffer's first byte for the given page size
    pub fn frame_number(&self, page_size: usize) -> usize {
        self.base / page_size.max(1)
    }
}

/// Zero-initialized, exclusively owned byte buffer
#[derive(Debug)]
pub struct BackingStore {
    bytes: Box<[u8]>,
}

impl BackingStore {
    /// Allocate `len` bytes rounded up to a multiple of `page_size`
    pub fn allocate(len: usize, page_size: usize) -> Result<Self> {
        let size = round_up_to_page(len, page_size)
            .ok_or(ContainerError::ResourceExhausted { requested: len })?;

        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(size)
            .map_err(|_| ContainerError::ResourceExhausted { requested: size })?;
        bytes.resize(size, 0);

        Ok(Self {
            bytes: bytes.into_boxed_slice(),
        })
    }

    pub fn descriptor(&self) -> FrameDescriptor {
        FrameDescriptor {
            base: self.bytes.as_ptr() as usize,
            len: self.bytes.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

/// `len` rounded up to a multiple of `page_size`, or `None` on overflow
pub fn round_up_to_page(len: usize, page_size: usize) -> Option<usize> {
    let page_size = page_size.max(1);
    len.checked_add(page_size - 1)
        .map(|n| n / page_size * page_size)
}

/// A shared region identified by its object id within a container
#[derive(Debug)]
pub struct MemoryObject {
    pub id: ObjectId,
    storage: BackingStore,
    descriptor: FrameDescriptor,
}

impl MemoryObject {
    pub fn new(id: ObjectId, storage: BackingStore) -> Self {
        let descriptor = storage.descriptor();
        Self {
            id,
            storage,
            descriptor,
        }
    }

    pub fn descriptor(&self) -> FrameDescriptor {
        self.descriptor
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        self.storage.as_slice()
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        self.storage.as_mut_slice()
    }
}

/// Objects of one container, keyed by object id
#[derive(Debug, Default)]
pub struct ObjectStore {
    objects: BTreeMap<ObjectId, MemoryObject>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ObjectId) -> Option<&MemoryObject> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut MemoryObject> {
        self.objects.get_mut(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn insert(&mut self, object: MemoryObject) -> &mut MemoryObject {
        self.objects.entry(object.id).or_insert(object)
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<MemoryObject> {
        self.objects.remove(&id)
    }

    /// Remove every object, returning (count, bytes) released
    pub fn clear(&mut self) -> (usize, usize) {
        let objects = std::mem::take(&mut self.objects);
        let bytes = objects.values().map(MemoryObject::len).sum();
        (objects.len(), bytes)
    }

    pub fn ids(&self) -> Vec<ObjectId> {
        self.objects.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Total bytes of backing storage held
    pub fn resident_bytes(&self) -> usize {
        self.objects.values().map(MemoryObject::len).sum()
    }
}
