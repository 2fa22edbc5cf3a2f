pub mod app;
pub mod logger;
pub mod models;
pub mod session;
pub mod share;
pub mod store;
pub mod sync;
pub mod ui;
pub mod utils;

// Re-exports for convenience
pub use models::{Document, Group, PendingKind, PendingSelection, ProblemItem, ProblemSet, Word};
pub use session::{QuizItem, QuizSession, Verdict, ADVANCE_DELAY};
pub use share::{GroupPayload, ProblemSetPayload};
pub use store::{MemoryBackend, StorageBackend, Store};
pub use sync::SyncClient;
