use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::models::{Id, Protocol, ProtocolCategory, ProtocolError};

use super::builtin::builtin_protocols;
use super::validation::{has_errors, validate_protocol, IssueSeverity, ProtocolIssue};

/// Source of protocol definitions for the engine.
pub trait ProtocolStore {
    /// The highest-versioned active protocol of a category.
    fn latest_active(&self, category: ProtocolCategory) -> Result<Option<Arc<Protocol>>, ProtocolError>;

    fn get(&self, id: &Id) -> Result<Option<Arc<Protocol>>, ProtocolError>;
}

/// In-memory protocol store backed by RwLock.
/// Stored protocols are never mutated; activation swaps in a new copy.
pub struct InMemoryProtocolStore {
    protocols: RwLock<Vec<Arc<Protocol>>>,
}

impl Default for InMemoryProtocolStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProtocolStore {
    pub fn new() -> Self {
        Self {
            protocols: RwLock::new(Vec::new()),
        }
    }

    /// Store preloaded with the bundled protocols.
    pub fn with_builtin() -> Result<Self, ProtocolError> {
        let store = Self::new();
        for protocol in builtin_protocols()? {
            store.register(protocol)?;
        }
        Ok(store)
    }

    /// Validate and add a protocol, replacing any stored protocol with the
    /// same id. Protocols with validation errors are rejected; warnings are
    /// logged and returned.
    ///
    /// An active protocol deactivates the other protocols of its category.
    pub fn register(&self, protocol: Protocol) -> Result<Vec<ProtocolIssue>, ProtocolError> {
        let issues = validate_protocol(&protocol);
        if has_errors(&issues) {
            let reason = issues
                .iter()
                .filter(|i| i.severity == IssueSeverity::Error)
                .map(|i| i.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ProtocolError::Rejected {
                protocol_id: protocol.id.to_string(),
                reason,
            });
        }
        for issue in &issues {
            tracing::warn!(
                protocol_id = %protocol.id,
                kind = ?issue.kind,
                "{}",
                issue.message
            );
        }

        let mut protocols = self.protocols.write().map_err(|_| ProtocolError::LockFailed)?;
        if protocol.active {
            deactivate_category(&mut protocols, protocol.category);
        }
        protocols.retain(|p| p.id != protocol.id);

        tracing::info!(
            protocol_id = %protocol.id,
            category = protocol.category.as_str(),
            version = %protocol.version,
            active = protocol.active,
            "Protocol registered"
        );
        protocols.push(Arc::new(protocol));
        Ok(issues)
    }

    /// Make a stored protocol the single active one of its category.
    pub fn activate(&self, id: &Id) -> Result<(), ProtocolError> {
        let mut protocols = self.protocols.write().map_err(|_| ProtocolError::LockFailed)?;

        let index = protocols
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| ProtocolError::NotFound(id.clone()))?;
        let category = protocols[index].category;

        deactivate_category(&mut protocols, category);
        let mut activated = (*protocols[index]).clone();
        activated.active = true;
        protocols[index] = Arc::new(activated);

        tracing::info!(protocol_id = %id, category = category.as_str(), "Protocol activated");
        Ok(())
    }

    /// Register every `*.json` file in a directory, in file-name order.
    /// Returns the number of protocols loaded.
    pub fn load_dir(&self, dir: &Path) -> Result<usize, ProtocolError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| ProtocolError::Load(dir.display().to_string(), e.to_string()))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| ProtocolError::Load(dir.display().to_string(), e.to_string()))?
                .path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            self.register(Protocol::load(path)?)?;
        }
        tracing::info!(dir = %dir.display(), count = paths.len(), "Protocols loaded");
        Ok(paths.len())
    }

    pub fn all(&self) -> Result<Vec<Arc<Protocol>>, ProtocolError> {
        let protocols = self.protocols.read().map_err(|_| ProtocolError::LockFailed)?;
        Ok(protocols.clone())
    }

    pub fn len(&self) -> Result<usize, ProtocolError> {
        let protocols = self.protocols.read().map_err(|_| ProtocolError::LockFailed)?;
        Ok(protocols.len())
    }

    pub fn is_empty(&self) -> Result<bool, ProtocolError> {
        Ok(self.len()? == 0)
    }
}

fn deactivate_category(protocols: &mut [Arc<Protocol>], category: ProtocolCategory) {
    for slot in protocols.iter_mut() {
        if slot.category == category && slot.active {
            let mut inactive = (**slot).clone();
            inactive.active = false;
            *slot = Arc::new(inactive);
        }
    }
}

impl ProtocolStore for InMemoryProtocolStore {
    fn latest_active(&self, category: ProtocolCategory) -> Result<Option<Arc<Protocol>>, ProtocolError> {
        let protocols = self.protocols.read().map_err(|_| ProtocolError::LockFailed)?;
        Ok(protocols
            .iter()
            .filter(|p| p.category == category && p.active)
            .max_by(|a, b| a.version.cmp(&b.version))
            .cloned())
    }

    fn get(&self, id: &Id) -> Result<Option<Arc<Protocol>>, ProtocolError> {
        let protocols = self.protocols.read().map_err(|_| ProtocolError::LockFailed)?;
        Ok(protocols.iter().find(|p| &p.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::ProtocolVersion;

    fn protocol(category: &str, version: &str, active: bool) -> Protocol {
        Protocol::from_json_str(
            &json!({
                "category": category,
                "version": version,
                "is_active": active,
                "questions": [{"id": 1, "text": "Pain?", "type": "numeric", "symptom_type": "pain"}],
                "decision_tree": [{"id": 1, "symptom_type": "pain", "condition": ">=7", "intervention_ids": []}]
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn builtin_store_has_one_active_per_category() {
        let store = InMemoryProtocolStore::with_builtin().unwrap();
        assert_eq!(store.len().unwrap(), 4);
        for category in [
            ProtocolCategory::Cancer,
            ProtocolCategory::HeartFailure,
            ProtocolCategory::Copd,
            ProtocolCategory::Fit,
        ] {
            assert!(store.latest_active(category).unwrap().is_some(), "{category}");
        }
        assert!(store.latest_active(ProtocolCategory::General).unwrap().is_none());
    }

    #[test]
    fn registering_active_version_supersedes_previous() {
        let store = InMemoryProtocolStore::new();
        store.register(protocol("cancer", "1.9", true)).unwrap();
        store.register(protocol("cancer", "1.10", true)).unwrap();

        let latest = store.latest_active(ProtocolCategory::Cancer).unwrap().unwrap();
        assert_eq!(latest.version, ProtocolVersion::new("1.10"));

        let old = store.get(&Id::from("cancer-1.9")).unwrap().unwrap();
        assert!(!old.active);
    }

    #[test]
    fn activate_switches_the_active_protocol() {
        let store = InMemoryProtocolStore::new();
        store.register(protocol("copd", "2.0", true)).unwrap();
        store.register(protocol("copd", "1.0", false)).unwrap();

        store.activate(&Id::from("copd-1.0")).unwrap();
        let active = store.latest_active(ProtocolCategory::Copd).unwrap().unwrap();
        assert_eq!(active.id, Id::from("copd-1.0"));
        let active_count = store.all().unwrap().iter().filter(|p| p.active).count();
        assert_eq!(active_count, 1);
    }

    #[test]
    fn activate_unknown_id_fails() {
        let store = InMemoryProtocolStore::new();
        let err = store.activate(&Id::from("missing")).unwrap_err();
        assert!(matches!(err, ProtocolError::NotFound(_)));
    }

    #[test]
    fn inactive_only_category_has_no_active_protocol() {
        let store = InMemoryProtocolStore::new();
        store.register(protocol("fit", "1.0", false)).unwrap();
        assert!(store.latest_active(ProtocolCategory::Fit).unwrap().is_none());
    }

    #[test]
    fn register_rejects_protocols_with_errors() {
        let store = InMemoryProtocolStore::new();
        let bad = Protocol::from_json_str(
            &json!({
                "category": "general",
                "version": "1",
                "questions": [
                    {"id": 1, "text": "A", "type": "numeric"},
                    {"id": 1, "text": "B", "type": "numeric"}
                ]
            })
            .to_string(),
        )
        .unwrap();

        let err = store.register(bad).unwrap_err();
        assert!(matches!(err, ProtocolError::Rejected { .. }));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn load_dir_reads_json_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.json"),
            serde_json::to_string(&protocol("heart_failure", "3.1", true)).unwrap(),
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let store = InMemoryProtocolStore::new();
        assert_eq!(store.load_dir(dir.path()).unwrap(), 1);
        let hf = store.latest_active(ProtocolCategory::HeartFailure).unwrap().unwrap();
        assert_eq!(hf.version.as_str(), "3.1");
    }

    #[test]
    fn load_dir_fails_on_malformed_protocol() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();

        let store = InMemoryProtocolStore::new();
        let err = store.load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, ProtocolError::Parse(_, _)));
    }

    #[test]
    fn poisoned_lock_is_reported_not_hidden() {
        let store = Arc::new(InMemoryProtocolStore::with_builtin().unwrap());
        let writer = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = writer.protocols.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(matches!(store.len(), Err(ProtocolError::LockFailed)));
        assert!(matches!(store.is_empty(), Err(ProtocolError::LockFailed)));
        assert!(matches!(
            store.latest_active(ProtocolCategory::Copd),
            Err(ProtocolError::LockFailed)
        ));
    }
}
