use std::cmp::Reverse;

use crate::models::{Group, Word};
use crate::store::{uid, Store};

impl Store {
    /// Appends a group and returns its id. The name is stored as-is;
    /// trimming and validation are the caller's concern.
    pub fn add_group(&self, name: &str) -> String {
        let mut doc = self.load();
        let id = uid("g_");
        doc.groups.push(Group {
            id: id.clone(),
            name: name.to_string(),
            last_used: None,
        });
        self.save(&doc);
        id
    }

    pub fn groups(&self) -> Vec<Group> {
        self.load().groups
    }

    /// Appends a word and returns its id. The group id is not checked; a
    /// word pointing at an unknown group simply never shows up in
    /// `words_by_group`.
    pub fn add_word(&self, group_id: &str, word: &str, meaning: &str) -> String {
        let mut doc = self.load();
        let id = uid("w_");
        doc.words.push(Word {
            id: id.clone(),
            group_id: group_id.to_string(),
            word: word.to_string(),
            meaning: meaning.to_string(),
        });
        self.save(&doc);
        id
    }

    /// Words of one group, in insertion order.
    pub fn words_by_group(&self, group_id: &str) -> Vec<Word> {
        self.load()
            .words
            .into_iter()
            .filter(|w| w.group_id == group_id)
            .collect()
    }

    /// Removes the word and purges it from the wrong list. Deleting an
    /// unknown id is a no-op.
    pub fn delete_word(&self, word_id: &str) {
        let mut doc = self.load();
        doc.words.retain(|w| w.id != word_id);
        doc.wrongs.retain(|id| id != word_id);
        self.save(&doc);
    }

    /// Adds the id to the wrong list unless it is already there.
    pub fn record_wrong(&self, word_id: &str) {
        let mut doc = self.load();
        if !doc.wrongs.iter().any(|id| id == word_id) {
            doc.wrongs.push(word_id.to_string());
            self.save(&doc);
        }
    }

    /// The wrong list resolved to words. Ids whose word no longer exists
    /// are dropped silently; the stored list is not compacted here.
    pub fn wrong_words(&self) -> Vec<Word> {
        let doc = self.load();
        doc.wrongs
            .iter()
            .filter_map(|id| doc.words.iter().find(|w| &w.id == id).cloned())
            .collect()
    }

    pub fn clear_wrongs(&self) {
        let mut doc = self.load();
        doc.wrongs.clear();
        self.save(&doc);
    }

    pub fn remove_wrong(&self, word_id: &str) {
        let mut doc = self.load();
        doc.wrongs.retain(|id| id != word_id);
        self.save(&doc);
    }

    /// Stamps the group's lastUsed with the current time. False if the
    /// group does not exist.
    pub fn touch_group(&self, group_id: &str) -> bool {
        let mut doc = self.load();
        let Some(group) = doc.groups.iter_mut().find(|g| g.id == group_id) else {
            return false;
        };
        group.last_used = Some(chrono::Utc::now().timestamp_millis());
        self.save(&doc);
        true
    }

    /// Up to `limit` groups, most recently used first. Never-used groups
    /// sort last; ties keep their original order.
    pub fn recent_groups(&self, limit: usize) -> Vec<Group> {
        let mut groups = self.load().groups;
        groups.sort_by_key(|g| Reverse(g.last_used.unwrap_or(0)));
        groups.truncate(limit);
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;

    fn store() -> Store {
        Store::new(Box::new(MemoryBackend::new()))
    }

    #[test]
    fn test_add_group_returns_resolvable_id() {
        let store = store();
        let id = store.add_group("Animals");

        let groups = store.groups();
        assert_eq!(groups.len(), 2); // default + new
        let added = groups.iter().find(|g| g.id == id).unwrap();
        assert_eq!(added.name, "Animals");
        assert!(added.last_used.is_none());
    }

    #[test]
    fn test_words_by_group_preserves_insertion_order() {
        let store = store();
        let g = store.add_group("g");
        store.add_word(&g, "cat", "ねこ");
        store.add_word(&g, "dog", "いぬ");
        store.add_word("other", "bird", "とり");

        let words: Vec<String> = store
            .words_by_group(&g)
            .into_iter()
            .map(|w| w.word)
            .collect();
        assert_eq!(words, vec!["cat", "dog"]);
    }

    #[test]
    fn test_add_word_does_not_validate_group() {
        let store = store();
        store.add_word("g_nowhere", "cat", "ねこ");

        // the word exists in the document but surfaces under no known group
        assert_eq!(store.load().words.len(), 1);
        assert!(store.words_by_group("g_other").is_empty());
    }

    #[test]
    fn test_record_wrong_deduplicates() {
        let store = store();
        let g = store.add_group("g");
        let id = store.add_word(&g, "cat", "ねこ");

        store.record_wrong(&id);
        store.record_wrong(&id);

        assert_eq!(store.load().wrongs, vec![id]);
    }

    #[test]
    fn test_delete_word_cascades_to_wrong_list() {
        let store = store();
        let g = store.add_group("g");
        let id = store.add_word(&g, "cat", "ねこ");
        store.record_wrong(&id);

        store.delete_word(&id);

        assert!(store.words_by_group(&g).is_empty());
        assert!(store.load().wrongs.is_empty());
        assert!(store.wrong_words().is_empty());
    }

    #[test]
    fn test_delete_word_unknown_id_is_noop() {
        let store = store();
        let g = store.add_group("g");
        store.add_word(&g, "cat", "ねこ");

        store.delete_word("w_missing");
        assert_eq!(store.words_by_group(&g).len(), 1);
    }

    #[test]
    fn test_wrong_words_drops_dangling_ids_lazily() {
        let store = store();
        let mut doc = store.load();
        doc.wrongs.push("w_gone".to_string());
        store.save(&doc);

        assert!(store.wrong_words().is_empty());
        // the stored list itself is untouched
        assert_eq!(store.load().wrongs, vec!["w_gone"]);
    }

    #[test]
    fn test_remove_wrong_and_clear() {
        let store = store();
        let g = store.add_group("g");
        let a = store.add_word(&g, "a", "1");
        let b = store.add_word(&g, "b", "2");
        store.record_wrong(&a);
        store.record_wrong(&b);

        store.remove_wrong(&a);
        assert_eq!(store.load().wrongs, vec![b.clone()]);
        store.remove_wrong("w_missing");
        assert_eq!(store.load().wrongs, vec![b]);

        store.clear_wrongs();
        assert!(store.load().wrongs.is_empty());
    }

    #[test]
    fn test_touch_group_stamps_last_used() {
        let store = store();
        let id = store.add_group("g");

        assert!(store.touch_group(&id));
        assert!(!store.touch_group("g_missing"));

        let groups = store.groups();
        let touched = groups.iter().find(|g| g.id == id).unwrap();
        assert!(touched.last_used.is_some());
    }

    #[test]
    fn test_recent_groups_orders_by_last_used_desc() {
        let store = store();
        let a = store.add_group("A");
        let b = store.add_group("B");
        let _c = store.add_group("C"); // never used

        let mut doc = store.load();
        for g in &mut doc.groups {
            if g.id == a {
                g.last_used = Some(100);
            } else if g.id == b {
                g.last_used = Some(300);
            }
        }
        store.save(&doc);

        let recent = store.recent_groups(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, b);
        assert_eq!(recent[1].id, a);
    }

    #[test]
    fn test_recent_groups_stable_for_ties() {
        let store = store();
        let a = store.add_group("A");
        let b = store.add_group("B");

        let recent = store.recent_groups(10);
        // default group, A and B all have no stamp; original order holds
        assert_eq!(recent[0].id, crate::models::DEFAULT_GROUP_ID);
        assert_eq!(recent[1].id, a);
        assert_eq!(recent[2].id, b);
    }
}
