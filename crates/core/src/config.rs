// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime configuration
//!
//! Loaded from TOML. Every field has a default, so an empty document is a
//! valid configuration.
//!
//! ```toml
//! [allocator]
//! zone_capacity_bytes = 1048576
//! max_tokens_per_zone = 1024
//! id_base = 0x10000000
//! default_token_size = 4096
//!
//! [degradation]
//! degrade_threshold = 0.6
//! recover_confidence_floor = 0.3
//! confidence_decay = 0.9
//! max_retries = 63
//! score_divisor = 100
//! ```

use crate::id::TokenIdGen;
use crate::recovery::DegradationPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhenoConfig {
    pub allocator: AllocatorConfig,
    pub degradation: DegradationPolicy,
}

impl PhenoConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: PhenoConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.allocator.validate()?;
        self.degradation.validate()
    }
}

/// Capacity and identity settings for the zoned allocator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AllocatorConfig {
    /// Bytes each zone may hand out before reporting exhaustion
    pub zone_capacity_bytes: usize,
    /// Live tokens each zone may hold
    pub max_tokens_per_zone: usize,
    /// First token id handed out
    pub id_base: u32,
    /// Storage size requested by state machines on `Alloc`
    pub default_token_size: usize,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            zone_capacity_bytes: 1024 * 1024, // 1 MiB
            max_tokens_per_zone: 1024,
            id_base: TokenIdGen::DEFAULT_BASE,
            default_token_size: 4096,
        }
    }
}

impl AllocatorConfig {
    /// Small limits for exercising exhaustion
    pub fn for_testing() -> Self {
        Self {
            zone_capacity_bytes: 16 * 1024,
            max_tokens_per_zone: 4,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.zone_capacity_bytes == 0 {
            return Err(ConfigError::Invalid(
                "allocator.zone_capacity_bytes must be positive".to_string(),
            ));
        }
        if self.max_tokens_per_zone == 0 {
            return Err(ConfigError::Invalid(
                "allocator.max_tokens_per_zone must be positive".to_string(),
            ));
        }
        if self.id_base == 0 {
            return Err(ConfigError::Invalid(
                "allocator.id_base must be non-zero".to_string(),
            ));
        }
        if self.default_token_size == 0 {
            return Err(ConfigError::Invalid(
                "allocator.default_token_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
