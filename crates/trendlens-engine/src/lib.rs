//! Cached, fault-tolerant trend analysis over pluggable collaborators.
//!
//! [`TrendEngine`] fans a keyword batch out concurrently. Each keyword is
//! served from a fresh cache entry when possible, otherwise fetched, analyzed,
//! optionally enriched, and persisted. Failures fall back to the last stored
//! analysis before degrading to a per-keyword error stub.

pub mod cache;
pub mod engine;
pub mod error;
pub mod memory_store;
pub mod retry;
pub mod sanitize;

pub use cache::{cache_record, daily_snapshot, is_fresh, restore_analysis};
pub use engine::{EngineConfig, TrendEngine};
pub use error::{BoxError, EngineError};
pub use memory_store::InMemoryStore;
pub use retry::{backoff_delay_ms, retry_with_backoff, RetryPolicy, RetryingStore};
pub use sanitize::{sanitize_text, sanitize_value};
