use serde::Serialize;

use at_config::TrackerConfig;
use at_core::ids::PREFIX_USER;
use at_tracker::identity::get_or_create_id;
use at_tracker::{FileStore, MemoryStore};

use super::persistent_store;
use crate::cli::GlobalFlags;
use crate::output::output;

#[derive(Debug, Serialize)]
struct IdentityReport {
    user_id: String,
    /// `config` when `general.user_id` is set, `store` when read from or
    /// written to the file store, `ephemeral` when there is no file store.
    source: &'static str,
    storage_key: String,
    store_path: Option<String>,
}

/// Handle `atrack identity`.
pub fn handle(config: &TrackerConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let store = persistent_store(FileStore::default_location());
    output(&resolve(config, store.as_ref())?, flags.format)
}

fn resolve(config: &TrackerConfig, store: Option<&FileStore>) -> anyhow::Result<IdentityReport> {
    let key = &config.session.storage_key;
    let configured = config.general.user_id.as_deref().filter(|id| !id.is_empty());
    let (user_id, source) = match (configured, store) {
        (Some(id), _) => (id.to_string(), "config"),
        (None, Some(store)) => (get_or_create_id(store, key, PREFIX_USER)?, "store"),
        (None, None) => (get_or_create_id(&MemoryStore::new(), key, PREFIX_USER)?, "ephemeral"),
    };
    Ok(IdentityReport {
        user_id,
        source,
        storage_key: key.clone(),
        store_path: store.map(|store| store.path().display().to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn store_identity_is_stable() {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp.path().join("storage.json"));
        let config = TrackerConfig::default();

        let first = resolve(&config, Some(&store)).unwrap();
        let second = resolve(&config, Some(&store)).unwrap();
        assert_eq!(first.source, "store");
        assert_eq!(first.user_id, second.user_id);
        assert!(first.user_id.starts_with("usr-"));
    }

    #[test]
    fn configured_identity_wins() {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp.path().join("storage.json"));
        let mut config = TrackerConfig::default();
        config.general.user_id = Some("usr-pinned".into());

        let report = resolve(&config, Some(&store)).unwrap();
        assert_eq!(report.user_id, "usr-pinned");
        assert_eq!(report.source, "config");
        assert!(!store.path().exists(), "store left untouched");
    }

    #[test]
    fn missing_store_reports_ephemeral_identity() {
        let config = TrackerConfig::default();

        let first = resolve(&config, None).unwrap();
        let second = resolve(&config, None).unwrap();
        assert_eq!(first.source, "ephemeral");
        assert_eq!(first.store_path, None);
        assert!(first.user_id.starts_with("usr-"));
        assert_ne!(first.user_id, second.user_id, "nothing persists between runs");
    }
}
