//! Error types for ucontainer

use thiserror::Error;

use crate::memory::MapError;
use crate::unit::ActorId;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("Actor {actor} does not belong to any container")]
    NoContainer { actor: ActorId },

    #[error("Actor {actor} is already a member of container {container}")]
    AlreadyMember { actor: ActorId, container: u64 },

    #[error("Object {object} not found in container {container}")]
    ObjectNotFound { container: u64, object: u64 },

    #[error("No lock for object {object} in container {container}")]
    LockNotFound { container: u64, object: u64 },

    #[error("Lock for object {object} is already held by actor {actor}")]
    LockAlreadyHeld { object: u64, actor: ActorId },

    #[error("Lock for object {object} is not held by actor {actor}")]
    LockNotHeld { object: u64, actor: ActorId },

    #[error("Lock for object {object} was discarded while waiting")]
    LockAborted { object: u64 },

    #[error("Could not allocate {requested} bytes of backing storage")]
    ResourceExhausted { requested: usize },

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Mapping failed: {0}")]
    Map(#[from] MapError),

    #[error("Unknown command code: {0}")]
    UnknownCommand(u32),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ContainerError {
    /// True for the "caller or resource could not be resolved" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ContainerError::NoContainer { .. }
                | ContainerError::ObjectNotFound { .. }
                | ContainerError::LockNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ContainerError>;
