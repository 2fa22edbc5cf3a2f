use crate::models::{PendingKind, PendingSelection};
use crate::store::{StorageBackend, Store, PENDING_KEY};

// Cross-screen handoff slot. A single value, last write wins; storage
// trouble degrades the relay to "always empty" instead of surfacing.
impl Store {
    pub fn save_pending_selection(&self, kind: PendingKind, id: &str) {
        let pending = PendingSelection {
            kind,
            id: id.to_string(),
        };
        if let Ok(bytes) = serde_json::to_vec(&pending) {
            let _ = self.backend.write(PENDING_KEY, &bytes);
        }
    }

    /// The pending selection, if any. Consumers are expected to call
    /// `clear_pending_selection` after applying it, or it will be
    /// re-applied on the next read.
    pub fn pending_selection(&self) -> Option<PendingSelection> {
        let bytes = self.backend.read(PENDING_KEY).ok().flatten()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn clear_pending_selection(&self) {
        let _ = self.backend.remove(PENDING_KEY);
    }
}

#[cfg(test)]
mod tests {
    use crate::models::PendingKind;
    use crate::store::{MemoryBackend, StorageBackend, Store, PENDING_KEY};

    fn store() -> Store {
        Store::new(Box::new(MemoryBackend::new()))
    }

    #[test]
    fn test_empty_relay_reads_none() {
        assert!(store().pending_selection().is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let store = store();
        store.save_pending_selection(PendingKind::Group, "g_1");
        store.save_pending_selection(PendingKind::Problem, "p_1");

        let pending = store.pending_selection().unwrap();
        assert_eq!(pending.kind, PendingKind::Problem);
        assert_eq!(pending.id, "p_1");
    }

    #[test]
    fn test_survives_until_cleared() {
        let store = store();
        store.save_pending_selection(PendingKind::Group, "g_1");

        // not consumed-once by itself: a second read still sees it
        assert!(store.pending_selection().is_some());
        assert!(store.pending_selection().is_some());

        store.clear_pending_selection();
        assert!(store.pending_selection().is_none());
        // clearing twice is fine
        store.clear_pending_selection();
    }

    #[test]
    fn test_garbage_slot_reads_none() {
        let backend = MemoryBackend::new();
        backend.write(PENDING_KEY, b"garbage").unwrap();
        let store = Store::new(Box::new(backend));
        assert!(store.pending_selection().is_none());
    }
}
