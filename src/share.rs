use serde::{Deserialize, Serialize};

use crate::models::{Group, ProblemItem, ProblemSet, Word};
use crate::store::{uid, Store};

pub const GROUP_TAG: &str = "group";
pub const PROBLEM_SET_TAG: &str = "problemSet";

/// Portable form of a group: no internal ids, safe to paste into another
/// dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupPayload {
    #[serde(rename = "type")]
    pub tag: String,
    pub name: String,
    #[serde(default)]
    pub words: Vec<WordPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordPair {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub meaning: String,
}

/// Portable form of a problem set. Item ids are stripped on export and
/// re-minted on import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemSetPayload {
    #[serde(rename = "type")]
    pub tag: String,
    pub name: String,
    #[serde(default)]
    pub items: Vec<ProblemItem>,
}

impl Store {
    /// None if the group does not exist.
    pub fn export_group(&self, group_id: &str) -> Option<GroupPayload> {
        let doc = self.load();
        let group = doc.groups.iter().find(|g| g.id == group_id)?;
        let words = doc
            .words
            .iter()
            .filter(|w| w.group_id == group_id)
            .map(|w| WordPair {
                word: w.word.clone(),
                meaning: w.meaning.clone(),
            })
            .collect();
        Some(GroupPayload {
            tag: GROUP_TAG.to_string(),
            name: group.name.clone(),
            words,
        })
    }

    /// Creates a new group and words from the payload, fresh ids for all,
    /// and returns the new group id. A payload with the wrong type tag or
    /// an empty name is rejected with None and nothing is written.
    pub fn import_group(&self, payload: &GroupPayload) -> Option<String> {
        if payload.tag != GROUP_TAG || payload.name.is_empty() {
            return None;
        }
        let mut doc = self.load();
        let group_id = uid("g_");
        doc.groups.push(Group {
            id: group_id.clone(),
            name: payload.name.clone(),
            last_used: None,
        });
        for pair in &payload.words {
            doc.words.push(Word {
                id: uid("w_"),
                group_id: group_id.clone(),
                word: pair.word.clone(),
                meaning: pair.meaning.clone(),
            });
        }
        self.save(&doc);
        Some(group_id)
    }

    /// None if the set does not exist. Item ids are stripped.
    pub fn export_problem_set(&self, set_id: &str) -> Option<ProblemSetPayload> {
        let doc = self.load();
        let ps = doc.problem_sets.iter().find(|ps| ps.id == set_id)?;
        let items = ps
            .items
            .iter()
            .map(|item| {
                let mut copy = item.clone();
                copy.set_id(String::new());
                copy
            })
            .collect();
        Some(ProblemSetPayload {
            tag: PROBLEM_SET_TAG.to_string(),
            name: ps.name.clone(),
            items,
        })
    }

    /// Same validation pattern as `import_group`; the set and every item
    /// get fresh ids so imported entities can never collide with existing
    /// ones.
    pub fn import_problem_set(&self, payload: &ProblemSetPayload) -> Option<String> {
        if payload.tag != PROBLEM_SET_TAG || payload.name.is_empty() {
            return None;
        }
        let mut doc = self.load();
        let set_id = uid("p_");
        let items = payload
            .items
            .iter()
            .map(|item| {
                let mut copy = item.clone();
                copy.set_id(uid("pi_"));
                copy
            })
            .collect();
        doc.problem_sets.push(ProblemSet {
            id: set_id.clone(),
            name: payload.name.clone(),
            last_used: None,
            items,
            word_ids: None,
        });
        self.save(&doc);
        Some(set_id)
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

    #[test]
    fn test_export_group_strips_ids() {
        let store = store();
        let g = store.add_group("Animals");
        store.add_word(&g, "cat", "ねこ");
        store.add_word(&g, "dog", "いぬ");

        let payload = store.export_group(&g).unwrap();
        assert_eq!(payload.tag, "group");
        assert_eq!(payload.name, "Animals");
        assert_eq!(payload.words.len(), 2);

        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("\"id\""));
        assert!(!json.contains("groupId"));
    }

    #[test]
    fn test_export_group_missing_is_none() {
        assert!(store().export_group("g_missing").is_none());
    }

    #[test]
    fn test_group_roundtrip_mints_fresh_ids() {
        let store = store();
        let g = store.add_group("Animals");
        store.add_word(&g, "cat", "ねこ");
        store.add_word(&g, "dog", "いぬ");

        let payload = store.export_group(&g).unwrap();
        let new_id = store.import_group(&payload).unwrap();
        assert_ne!(new_id, g);

        let original: Vec<(String, String)> = store
            .words_by_group(&g)
            .into_iter()
            .map(|w| (w.word, w.meaning))
            .collect();
        let imported = store.words_by_group(&new_id);
        let imported_pairs: Vec<(String, String)> = imported
            .iter()
            .map(|w| (w.word.clone(), w.meaning.clone()))
            .collect();
        assert_eq!(imported_pairs, original);

        // word ids are new too
        let original_ids: Vec<String> =
            store.words_by_group(&g).into_iter().map(|w| w.id).collect();
        for w in &imported {
            assert!(!original_ids.contains(&w.id));
        }
    }

    #[test]
    fn test_import_group_rejects_bad_payload() {
        let store = store();
        let before = store.load();

        let wrong_tag = GroupPayload {
            tag: "problemSet".to_string(),
            name: "x".to_string(),
            words: vec![],
        };
        assert!(store.import_group(&wrong_tag).is_none());

        let no_name = GroupPayload {
            tag: "group".to_string(),
            name: String::new(),
            words: vec![],
        };
        assert!(store.import_group(&no_name).is_none());

        assert_eq!(store.load(), before);
    }

    #[test]
    fn test_problem_set_roundtrip() {
        let store = store();
        let id = store.add_problem_set_with_items(
            "quiz",
            &[("France?".to_string(), "Paris".to_string())],
        );
        store.add_problem_to_set(
            &id,
            ProblemItem::Choice(ChoiceItem::new(
                "2+2?".to_string(),
                vec!["3".to_string(), "4".to_string()],
                1,
            )),
        );

        let payload = store.export_problem_set(&id).unwrap();
        assert_eq!(payload.tag, "problemSet");
        for item in &payload.items {
            assert!(item.id().is_empty());
        }

        // through the JSON string form used for sharing
        let json = serde_json::to_string(&payload).unwrap();
        let parsed: ProblemSetPayload = serde_json::from_str(&json).unwrap();
        let new_id = store.import_problem_set(&parsed).unwrap();
        assert_ne!(new_id, id);

        let items = store.problem_set_items(&new_id);
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|it| it.id().starts_with("pi_")));
        match &items[1] {
            ProblemItem::Choice(it) => assert_eq!(it.answer_index, 1),
            ProblemItem::Free(_) => panic!("expected choice item"),
        }
    }

    #[test]
    fn test_import_problem_set_rejects_group_payload() {
        let store = store();
        let json = r#"{"type":"group","name":"x"}"#;
        let payload: ProblemSetPayload = serde_json::from_str(json).unwrap();

        assert!(store.import_problem_set(&payload).is_none());
        assert!(store.problem_sets().is_empty());
    }
}
