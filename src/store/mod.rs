use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use rand::Rng;

use crate::logger;
use crate::models::{Document, FreeItem, ProblemItem};

pub mod group;
pub mod pending;
pub mod problem_set;

pub const DATA_KEY: &str = "data";
pub const PENDING_KEY: &str = "pending";

/// Where the persisted document lives. One opaque slot per key; the store
/// always reads and writes whole values.
pub trait StorageBackend {
    fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>>;
    fn write(&self, key: &str, bytes: &[u8]) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// Backend mapping each key to a JSON file under a directory.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: PathBuf) -> Self {
        FileBackend { dir }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        match std::fs::read(self.path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(key), bytes)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// In-memory backend for tests.
#[derive(Default)]
pub struct MemoryBackend {
    slots: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.slots.lock().unwrap().get(key).cloned())
    }

    fn write(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        self.slots.lock().unwrap().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.slots.lock().unwrap().remove(key);
        Ok(())
    }
}

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap_or_default()
}

/// Mint an entity id: prefix, current millis in base36, six random base36
/// characters. Unique enough across sessions; callers never supply ids.
pub fn uid(prefix: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| BASE36[rng.gen_range(0..36)] as char)
        .collect();
    format!("{}{}{}", prefix, to_base36(millis), suffix)
}

fn data_dir() -> PathBuf {
    let home_var = if cfg!(target_os = "windows") {
        "USERPROFILE"
    } else {
        "HOME"
    };
    let home = std::env::var(home_var).unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".local/share/wordquiz")
}

/// Repository over the persisted document. Every mutator loads the whole
/// document, changes it in memory and writes it back; readers get snapshots.
pub struct Store {
    backend: Box<dyn StorageBackend>,
}

impl Store {
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Store { backend }
    }

    /// Store at the platform data directory (`~/.local/share/wordquiz`).
    pub fn open_default() -> Self {
        Store::new(Box::new(FileBackend::new(data_dir())))
    }

    /// Returns the current document. Missing or unparseable state is
    /// replaced by a fresh default document and persisted; this never
    /// surfaces an error to the caller.
    pub fn load(&self) -> Document {
        let bytes = match self.backend.read(DATA_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return self.reset_to_default(),
            Err(e) => {
                logger::log(&format!("store read failed, reinitializing: {}", e));
                return self.reset_to_default();
            }
        };

        match serde_json::from_slice::<Document>(&bytes) {
            Ok(doc) => self.migrate_legacy_sets(doc),
            Err(e) => {
                logger::log(&format!("store parse failed, reinitializing: {}", e));
                self.reset_to_default()
            }
        }
    }

    pub fn save(&self, doc: &Document) {
        match serde_json::to_vec(doc) {
            Ok(bytes) => {
                if let Err(e) = self.backend.write(DATA_KEY, &bytes) {
                    logger::log(&format!("store write failed: {}", e));
                }
            }
            Err(e) => logger::log(&format!("store serialize failed: {}", e)),
        }
    }

    fn reset_to_default(&self) -> Document {
        let doc = Document::bootstrap();
        self.save(&doc);
        doc
    }

    /// One-time materialization of problem sets that still reference words
    /// by id. Each resolvable id becomes a free item keeping the word's id
    /// (so wrong answers still map back to the word); dangling ids are
    /// dropped. Runs on every load but only writes when something changed.
    fn migrate_legacy_sets(&self, mut doc: Document) -> Document {
        let lookup: HashMap<&str, (&str, &str)> = doc
            .words
            .iter()
            .map(|w| (w.id.as_str(), (w.word.as_str(), w.meaning.as_str())))
            .collect();

        let mut migrated: Vec<(usize, Vec<ProblemItem>)> = Vec::new();
        for (index, ps) in doc.problem_sets.iter().enumerate() {
            let Some(word_ids) = &ps.word_ids else {
                continue;
            };
            let mut items = ps.items.clone();
            if items.is_empty() {
                for word_id in word_ids {
                    if let Some((word, meaning)) = lookup.get(word_id.as_str()) {
                        items.push(ProblemItem::Free(FreeItem {
                            id: word_id.clone(),
                            tag: None,
                            question: word.to_string(),
                            answer: meaning.to_string(),
                        }));
                    }
                }
            }
            migrated.push((index, items));
        }

        if migrated.is_empty() {
            return doc;
        }

        for (index, items) in migrated {
            doc.problem_sets[index].items = items;
            doc.problem_sets[index].word_ids = None;
        }
        self.save(&doc);
        doc
    }
}
