//! User and device identity.
//!
//! The user id is durable: read from the persistent store, minted and written
//! back when missing. The device id is minted fresh for every tracker.

use at_config::TrackerConfig;
use at_core::CoreError;
use at_core::ids::{DEVICE_ID_LEN, PREFIX_DEVICE, PREFIX_USER, USER_ID_LEN, generate_id};

use crate::store::KeyValueStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub device_id: String,
}

impl Identity {
    /// Resolve identity for a new tracker. A configured `general.user_id`
    /// wins and leaves the store untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Random`] if an id has to be minted and the OS
    /// random source fails.
    pub fn resolve(config: &TrackerConfig, store: &dyn KeyValueStore) -> Result<Self, CoreError> {
        let user_id = match config.general.user_id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => get_or_create_id(store, &config.session.storage_key, PREFIX_USER)?,
        };

        Ok(Self {
            user_id,
            device_id: generate_id(PREFIX_DEVICE, DEVICE_ID_LEN)?,
        })
    }
}

/// Read a durable id from `store`, or mint one and try to persist it.
///
/// A broken store is not an error: it yields an id that lives only as long
/// as this process.
///
/// # Errors
///
/// Returns [`CoreError::Random`] if a new id cannot be generated.
pub fn get_or_create_id(
    store: &dyn KeyValueStore,
    key: &str,
    prefix: &str,
) -> Result<String, CoreError> {
    let stored = match store.get(key) {
        Ok(value) => value.filter(|id| !id.is_empty()),
        Err(error) => {
            tracing::warn!(%error, key, "persistent store unreadable; minting ephemeral id");
            None
        }
    };
    if let Some(id) = stored {
        return Ok(id);
    }

    let id = generate_id(prefix, USER_ID_LEN)?;
    if let Err(error) = store.set(key, &id) {
        tracing::warn!(%error, key, "failed to persist id; it will not survive a reload");
    }
    Ok(id)
}
