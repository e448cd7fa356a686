//! `lyricsweep-core`: domain of the lyrics sweep.
//!
//! This crate is **pure**: signatures, retry state, backoff decisions and
//! configuration sanitization. Collaborators, persistence and the run loop
//! live in `lyricsweep-infra`.

pub mod backoff;
pub mod config;
pub mod error;
pub mod id;
pub mod outcome;
pub mod retry_state;
pub mod signature;
pub mod track;

mod timestamp;

pub use backoff::{BackoffSchedule, GateDecision, RetryBackoffPolicy};
pub use config::{RunSettings, SearchOptions, SweepConfig};
pub use error::{ConfigError, DomainError};
pub use id::{ItemId, RunId};
pub use outcome::TrackOutcome;
pub use retry_state::{RetryEntry, RetryOutcome, RetryState};
pub use signature::signature;
pub use track::{AudioTrack, LibraryItem, TrackMetadata};
