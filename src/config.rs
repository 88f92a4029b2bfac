//! Session settings, read from `CART_*` environment variables.

use serde::{Deserialize, Serialize};
use std::{env, fmt::Display, path::PathBuf, str::FromStr};
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_STORAGE_KEY: &str = "cart:anonymous";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartConfig {
    /// Namespaced local key holding the anonymous cart.
    pub storage_key: String,
    /// Mailbox capacity of the cart session actor.
    pub mailbox_size: usize,
    /// Mailbox capacity of the in-memory remote cart actor.
    pub remote_buffer: usize,
    /// Directory for the file-backed local store. `None` keeps the cart in memory.
    pub local_dir: Option<PathBuf>,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            mailbox_size: 32,
            remote_buffer: 32,
            local_dir: None,
        }
    }
}

impl CartConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads from an arbitrary key lookup; unset keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let local_dir = match lookup("CART_LOCAL_DIR") {
            Some(dir) if !dir.trim().is_empty() => Some(PathBuf::from(dir.trim())),
            _ => {
                info!("CART_LOCAL_DIR not set, keeping the anonymous cart in memory");
                None
            }
        };
        let config = Self {
            storage_key: try_load(&lookup, "CART_STORAGE_KEY", defaults.storage_key)?,
            mailbox_size: positive(
                "CART_MAILBOX_SIZE",
                try_load(&lookup, "CART_MAILBOX_SIZE", defaults.mailbox_size)?,
            )?,
            remote_buffer: positive(
                "CART_REMOTE_BUFFER",
                try_load(&lookup, "CART_REMOTE_BUFFER", defaults.remote_buffer)?,
            )?,
            local_dir,
        };
        if config.storage_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "CART_STORAGE_KEY",
                value: config.storage_key,
                reason: "must not be empty".into(),
            });
        }
        Ok(config)
    }
}

fn try_load<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(value) = lookup(key) else {
        info!("{key} not set, using default: {default}");
        return Ok(default);
    };
    value.trim().parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            value,
            reason: e.to_string(),
        }
    })
}

fn positive(key: &'static str, value: usize) -> Result<usize, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "must be at least 1".into(),
        });
    }
    Ok(value)
}
