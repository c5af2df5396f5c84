//! Postcard persistence for configuration blobs
//!
//! A stored blob is one version byte followed by the postcard encoding.

use serde::{Deserialize, Serialize};

/// Layout version of stored configuration
pub const CONFIG_VERSION: u8 = 1;

/// Configuration persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Blob is empty
    Empty,
    /// Stored version does not match [`CONFIG_VERSION`]
    VersionMismatch,
    /// Serialization failed (buffer too small)
    Serialize,
    /// Deserialization failed
    Deserialize,
}

/// Encode `config` into `buffer`, returning the blob length
pub fn store<T: Serialize>(config: &T, buffer: &mut [u8]) -> Result<usize, ConfigError> {
    let (version, body) = buffer.split_first_mut().ok_or(ConfigError::Serialize)?;
    *version = CONFIG_VERSION;
    let used = postcard::to_slice(config, body)
        .map_err(|_| ConfigError::Serialize)?
        .len();
    Ok(used + 1)
}

/// Decode a blob written by [`store`]
pub fn load<'a, T: Deserialize<'a>>(blob: &'a [u8]) -> Result<T, ConfigError> {
    let (&version, body) = blob.split_first().ok_or(ConfigError::Empty)?;
    if version != CONFIG_VERSION {
        warn!(
            "config version mismatch: found {}, expected {}",
            version, CONFIG_VERSION
        );
        return Err(ConfigError::VersionMismatch);
    }
    postcard::from_bytes(body).map_err(|_| ConfigError::Deserialize)
}
