//! Runtime limits
//!
//! Limits can be loaded from a JSON file; any field left out keeps its
//! default.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ContainerError, Result};

/// Default cap on a single mapping request (64 MiB)
pub const DEFAULT_MAX_REGION_LEN: usize = 64 * 1024 * 1024;

pub const DEFAULT_PAGE_SIZE: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Limits {
    /// Largest region a single map request may ask for
    pub max_region_len: usize,
    /// Backing storage is allocated in multiples of this
    pub page_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_region_len: DEFAULT_MAX_REGION_LEN,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Limits {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let limits: Limits = serde_json::from_str(json)?;
        limits.validate()?;
        Ok(limits)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 || !self.page_size.is_power_of_two() {
            return Err(ContainerError::Config(format!(
                "page_size must be a power of two, got {}",
                self.page_size
            )));
        }
        if self.max_region_len == 0 {
            return Err(ContainerError::Config(
                "max_region_len must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
