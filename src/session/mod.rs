//! Session subsystem: state, persistence, clipboard and the controller that ties them
//! to user intents.

pub mod clipboard;
pub mod controller;
pub mod persistence;
pub mod state;
pub mod store;

pub use clipboard::{Clipboard, NoClipboard, SystemClipboard};
pub use controller::{Command, Feedback, SessionController};
pub use persistence::SessionPersistence;
pub use state::{render_results, SessionState};
pub use store::{JsonFileStore, KvStore, MemoryStore};
