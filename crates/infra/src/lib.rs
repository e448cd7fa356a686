//! Infrastructure layer: library paging, lyrics provider, state file, and the
//! sweep job that ties them together.

pub mod cancel;
pub mod jobs;
pub mod library;
pub mod lyrics;
pub mod pager;
pub mod state_store;


pub use cancel::Cancelled;
pub use jobs::{LyricsSweep, RunSummary, SweepError, SweepObserver};
pub use library::{LibraryQuery, LibrarySource};
pub use lyrics::LyricsProvider;
pub use pager::CursorPager;
pub use state_store::{FileRetryStateStore, RetryStateStore};
