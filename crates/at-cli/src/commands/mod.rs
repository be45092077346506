pub mod config;
pub mod identity;
pub mod replay;
pub mod schema;

use at_tracker::{FileStore, StorageError};

/// The on-disk store, or `None` when the platform offers no place for it.
/// Callers carry on with an in-memory store.
fn persistent_store(location: Result<FileStore, StorageError>) -> Option<FileStore> {
    match location {
        Ok(store) => Some(store),
        Err(error) => {
            tracing::warn!(%error, "no persistent store; identifiers last only for this run");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_data_dir_gives_no_store() {
        let missing = Err(StorageError::Unavailable("no data directory".into()));
        assert!(persistent_store(missing).is_none());
    }

    #[test]
    fn located_store_is_kept() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("storage.json");
        let store = persistent_store(Ok(FileStore::new(path.clone()))).expect("store kept");
        assert_eq!(store.path(), path.as_path());
    }
}
