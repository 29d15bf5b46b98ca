//! Command decoding for the container services
//!
//! Requests arrive as a numeric command code plus a fixed payload. This module
//! turns the code into a typed command; the services route typed commands to
//! their operations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ContainerError, Result};

/// Fixed request payload shared by both services
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerCmd {
    pub container_id: u64,
    pub object_id: u64,
}

impl ContainerCmd {
    pub fn container(container_id: u64) -> Self {
        Self {
            container_id,
            object_id: 0,
        }
    }

    pub fn object(object_id: u64) -> Self {
        Self {
            container_id: 0,
            object_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerCommand {
    Switch,
    Create,
    Delete,
}

impl SchedulerCommand {
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            0 => Ok(SchedulerCommand::Switch),
            1 => Ok(SchedulerCommand::Create),
            2 => Ok(SchedulerCommand::Delete),
            _ => Err(ContainerError::UnknownCommand(code)),
        }
    }

    pub fn code(self) -> u32 {
        match self {
            SchedulerCommand::Switch => 0,
            SchedulerCommand::Create => 1,
            SchedulerCommand::Delete => 2,
        }
    }
}

impl fmt::Display for SchedulerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerCommand::Switch => write!(f, "switch"),
            SchedulerCommand::Create => write!(f, "create"),
            SchedulerCommand::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryCommand {
    Create,
    Delete,
    Lock,
    Unlock,
    Free,
}

impl MemoryCommand {
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            0 => Ok(MemoryCommand::Create),
            1 => Ok(MemoryCommand::Delete),
            2 => Ok(MemoryCommand::Lock),
            3 => Ok(MemoryCommand::Unlock),
            4 => Ok(MemoryCommand::Free),
            _ => Err(ContainerError::UnknownCommand(code)),
        }
    }

    pub fn code(self) -> u32 {
        match self {
            MemoryCommand::Create => 0,
            MemoryCommand::Delete => 1,
            MemoryCommand::Lock => 2,
            MemoryCommand::Unlock => 3,
            MemoryCommand::Free => 4,
        }
    }
}

impl fmt::Display for MemoryCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryCommand::Create => write!(f, "create"),
            MemoryCommand::Delete => write!(f, "delete"),
            MemoryCommand::Lock => write!(f, "lock"),
            MemoryCommand::Unlock => write!(f, "unlock"),
            MemoryCommand::Free => write!(f, "free"),
        }
    }
}
