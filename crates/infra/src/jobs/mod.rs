//! The sweep job.
//!
//! ## Design
//!
//! - One sequential worker per run, resumable through the persisted cursor
//! - Per-track backoff keyed by item id and metadata signature
//! - Run cap bounds the provider calls of one run
//! - State is flushed every few mutations and always at normal completion
//!
//! ## Components
//!
//! - `LyricsSweep`: runs one pass and returns a `RunSummary`
//! - `SweepObserver`: progress and completion reporting

pub mod observer;
pub mod summary;
pub mod sweep;

pub use observer::{InMemoryObserver, NoopObserver, SweepObserver};
pub use summary::RunSummary;
pub use sweep::{DEFAULT_FLUSH_THRESHOLD, LyricsSweep, SweepError};
