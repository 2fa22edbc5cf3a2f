use std::cmp::Reverse;

use crate::models::{FreeItem, ProblemItem, ProblemSet};
use crate::store::{uid, Store};

impl Store {
    pub fn problem_sets(&self) -> Vec<ProblemSet> {
        self.load().problem_sets
    }

    /// Creates a problem set from question/answer pairs and returns its id.
    /// Every item gets a fresh id; `pairs` may be empty.
    pub fn add_problem_set_with_items(&self, name: &str, pairs: &[(String, String)]) -> String {
        let mut doc = self.load();
        let id = uid("p_");
        let items = pairs
            .iter()
            .map(|(question, answer)| {
                ProblemItem::Free(FreeItem {
                    id: uid("pi_"),
                    tag: None,
                    question: question.clone(),
                    answer: answer.clone(),
                })
            })
            .collect();
        doc.problem_sets.push(ProblemSet {
            id: id.clone(),
            name: name.to_string(),
            last_used: None,
            items,
            word_ids: None,
        });
        self.save(&doc);
        id
    }

    /// Removes the named set. Unknown ids are a no-op.
    pub fn delete_problem_set(&self, set_id: &str) {
        let mut doc = self.load();
        doc.problem_sets.retain(|ps| ps.id != set_id);
        self.save(&doc);
    }

    /// Items of one set; empty if the set does not exist. Legacy word-id
    /// sets were already materialized into items at load time.
    pub fn problem_set_items(&self, set_id: &str) -> Vec<ProblemItem> {
        self.load()
            .problem_sets
            .into_iter()
            .find(|ps| ps.id == set_id)
            .map(|ps| ps.items)
            .unwrap_or_default()
    }

    /// Appends the item with a fresh id. False if the set does not exist.
    pub fn add_problem_to_set(&self, set_id: &str, mut item: ProblemItem) -> bool {
        let mut doc = self.load();
        let Some(ps) = doc.problem_sets.iter_mut().find(|ps| ps.id == set_id) else {
            return false;
        };
        item.set_id(uid("pi_"));
        ps.items.push(item);
        self.save(&doc);
        true
    }

    /// Removes the item at `index`. False if the set is missing or the
    /// index is out of bounds; nothing is written in that case.
    pub fn remove_problem_from_set(&self, set_id: &str, index: usize) -> bool {
        let mut doc = self.load();
        let Some(ps) = doc.problem_sets.iter_mut().find(|ps| ps.id == set_id) else {
            return false;
        };
        if index >= ps.items.len() {
            return false;
        }
        ps.items.remove(index);
        self.save(&doc);
        true
    }

    /// Replaces the item at `index`, keeping the original item's id (a new
    /// one is minted only if it was somehow absent). Same bounds policy as
    /// removal.
    pub fn update_problem_in_set(&self, set_id: &str, index: usize, mut item: ProblemItem) -> bool {
        let mut doc = self.load();
        let Some(ps) = doc.problem_sets.iter_mut().find(|ps| ps.id == set_id) else {
            return false;
        };
        let Some(existing) = ps.items.get(index) else {
            return false;
        };
        let id = if existing.id().is_empty() {
            uid("pi_")
        } else {
            existing.id().to_string()
        };
        item.set_id(id);
        ps.items[index] = item;
        self.save(&doc);
        true
    }

    /// Stamps the set's lastUsed with the current time. False if the set
    /// does not exist.
    pub fn touch_problem_set(&self, set_id: &str) -> bool {
        let mut doc = self.load();
        let Some(ps) = doc.problem_sets.iter_mut().find(|ps| ps.id == set_id) else {
            return false;
        };
        ps.last_used = Some(chrono::Utc::now().timestamp_millis());
        self.save(&doc);
        true
    }

    /// Up to `limit` sets, most recently used first; never-used sets last,
    /// ties in original order.
    pub fn recent_problem_sets(&self, limit: usize) -> Vec<ProblemSet> {
        let mut sets = self.load().problem_sets;
        sets.sort_by_key(|ps| Reverse(ps.last_used.unwrap_or(0)));
        sets.truncate(limit);
        sets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChoiceItem;
    use crate::store::MemoryBackend;

    fn store() -> Store {
        Store::new(Box::new(MemoryBackend::new()))
    }

    fn qa(question: &str, answer: &str) -> (String, String) {
        (question.to_string(), answer.to_string())
    }

    #[test]
    fn test_add_problem_set_with_items_mints_item_ids() {
        let store = store();
        let id = store.add_problem_set_with_items("caps", &[qa("France?", "Paris")]);

        let items = store.problem_set_items(&id);
        assert_eq!(items.len(), 1);
        assert!(items[0].id().starts_with("pi_"));
        assert_eq!(items[0].question(), "France?");
    }

    #[test]
    fn test_add_problem_set_with_no_items() {
        let store = store();
        let id = store.add_problem_set_with_items("empty", &[]);
        assert!(store.problem_set_items(&id).is_empty());
        assert_eq!(store.problem_sets().len(), 1);
    }

    #[test]
    fn test_items_of_unknown_set_is_empty() {
        let store = store();
        assert!(store.problem_set_items("p_missing").is_empty());
    }

    #[test]
    fn test_delete_problem_set_removes_only_that_set() {
        let store = store();
        let a = store.add_problem_set_with_items("a", &[]);
        let b = store.add_problem_set_with_items("b", &[]);

        store.delete_problem_set(&a);

        let sets = store.problem_sets();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].id, b);

        store.delete_problem_set("p_missing");
        assert_eq!(store.problem_sets().len(), 1);
    }

    #[test]
    fn test_add_problem_to_set() {
        let store = store();
        let id = store.add_problem_set_with_items("s", &[]);

        let item = ProblemItem::Choice(ChoiceItem::new(
            "2+2?".to_string(),
            vec!["3".to_string(), "4".to_string()],
            1,
        ));
        assert!(store.add_problem_to_set(&id, item.clone()));
        assert!(!store.add_problem_to_set("p_missing", item));

        let items = store.problem_set_items(&id);
        assert_eq!(items.len(), 1);
        assert!(items[0].id().starts_with("pi_"));
    }

    #[test]
    fn test_remove_problem_bounds_checked() {
        let store = store();
        let id = store.add_problem_set_with_items("s", &[qa("q1", "a1"), qa("q2", "a2")]);

        assert!(!store.remove_problem_from_set(&id, 2));
        assert!(!store.remove_problem_from_set("p_missing", 0));
        assert_eq!(store.problem_set_items(&id).len(), 2);

        assert!(store.remove_problem_from_set(&id, 0));
        let items = store.problem_set_items(&id);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].question(), "q2");
    }

    #[test]
    fn test_update_problem_preserves_id() {
        let store = store();
        let id = store.add_problem_set_with_items("s", &[qa("q1", "a1")]);
        let original_id = store.problem_set_items(&id)[0].id().to_string();

        let replacement = ProblemItem::Free(FreeItem::new("q1b".to_string(), "a1b".to_string()));
        assert!(store.update_problem_in_set(&id, 0, replacement));

        let items = store.problem_set_items(&id);
        assert_eq!(items[0].id(), original_id);
        assert_eq!(items[0].question(), "q1b");
    }

    #[test]
    fn test_update_problem_out_of_range() {
        let store = store();
        let id = store.add_problem_set_with_items("s", &[qa("q1", "a1")]);

        let replacement = ProblemItem::Free(FreeItem::new("x".to_string(), "y".to_string()));
        assert!(!store.update_problem_in_set(&id, 1, replacement.clone()));
        assert!(!store.update_problem_in_set("p_missing", 0, replacement));
        assert_eq!(store.problem_set_items(&id)[0].question(), "q1");
    }

    #[test]
    fn test_touch_and_recent_problem_sets() {
        let store = store();
        let a = store.add_problem_set_with_items("a", &[]);
        let b = store.add_problem_set_with_items("b", &[]);
        let _c = store.add_problem_set_with_items("c", &[]);

        let mut doc = store.load();
        for ps in &mut doc.problem_sets {
            if ps.id == a {
                ps.last_used = Some(100);
            } else if ps.id == b {
                ps.last_used = Some(300);
            }
        }
        store.save(&doc);

        assert!(!store.touch_problem_set("p_missing"));

        let recent = store.recent_problem_sets(2);
        assert_eq!(recent[0].id, b);
        assert_eq!(recent[1].id, a);
    }
}
