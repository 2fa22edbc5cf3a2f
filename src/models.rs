use serde::{Deserialize, Serialize};

pub const DEFAULT_GROUP_ID: &str = "g_default";
pub const DEFAULT_GROUP_NAME: &str = "Default";

/// The whole persisted dataset. Loaded and saved as one unit; there is no
/// field-level persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Document {
    pub groups: Vec<Group>,
    pub words: Vec<Word>,
    pub wrongs: Vec<String>,
    pub problem_sets: Vec<ProblemSet>,
}

impl Document {
    /// The document a fresh (or unreadable) store starts from: one default
    /// group, nothing else.
    pub fn bootstrap() -> Self {
        Document {
            groups: vec![Group {
                id: DEFAULT_GROUP_ID.to_string(),
                name: DEFAULT_GROUP_NAME.to_string(),
                last_used: None,
            }],
            words: Vec::new(),
            wrongs: Vec::new(),
            problem_sets: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(rename = "lastUsed", default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: String,
    pub group_id: String,
    pub word: String,
    pub meaning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSet {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<i64>,
    #[serde(default)]
    pub items: Vec<ProblemItem>,
    // Old documents stored word references instead of items. The field only
    // survives until Store::load materializes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_ids: Option<Vec<String>>,
}

/// One question inside a problem set. Untagged on the wire because old free
/// items carry no `type` field; the variants are disambiguated by shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProblemItem {
    Choice(ChoiceItem),
    Free(FreeItem),
}

impl ProblemItem {
    pub fn id(&self) -> &str {
        match self {
            ProblemItem::Choice(it) => &it.id,
            ProblemItem::Free(it) => &it.id,
        }
    }

    pub fn set_id(&mut self, id: String) {
        match self {
            ProblemItem::Choice(it) => it.id = id,
            ProblemItem::Free(it) => it.id = id,
        }
    }

    pub fn question(&self) -> &str {
        match self {
            ProblemItem::Choice(it) => &it.question,
            ProblemItem::Free(it) => &it.question,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceItem {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type")]
    pub tag: ChoiceTag,
    pub question: String,
    pub choices: Vec<String>,
    pub answer_index: usize,
}

impl ChoiceItem {
    pub fn new(question: String, choices: Vec<String>, answer_index: usize) -> Self {
        ChoiceItem {
            id: String::new(),
            tag: ChoiceTag::Choice,
            question,
            choices,
            answer_index,
        }
    }
}

/// Marker for the `"type": "choice"` discriminator. Deserialization of a
/// `ChoiceItem` fails unless the tag is present, which is what keeps the
/// untagged `ProblemItem` enum unambiguous.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum ChoiceTag {
    #[default]
    #[serde(rename = "choice")]
    Choice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeItem {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub question: String,
    pub answer: String,
}

impl FreeItem {
    pub fn new(question: String, answer: String) -> Self {
        FreeItem {
            id: String::new(),
            tag: Some("word".to_string()),
            question,
            answer,
        }
    }
}

/// One-shot handoff slot letting one screen pre-select an entity for the
/// quiz setup screen. Stored under its own key, cleared after consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSelection {
    #[serde(rename = "type")]
    pub kind: PendingKind,
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PendingKind {
    #[serde(rename = "group")]
    Group,
    #[serde(rename = "problem")]
    Problem,
}
