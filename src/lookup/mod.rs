//! Lookup subsystem: provider profiles, the HTTP client, payload normalization
//! and the sequential batch orchestrator.

pub mod normalize;
pub mod orchestrator;
pub mod providers;
pub mod types;

pub use normalize::normalize;
pub use orchestrator::{dedupe, input_lines, QueryOrchestrator};
pub use providers::{builtin_profiles, GeoLookup, HttpLookup, ProviderProfile};
pub use types::{LocationRecord, LookupError, QueryResult, RawLookupResponse, SessionError};
