//! Search Module
//!
//! This module provides the lookup core of linefind: five exact full-line
//! search strategies and the engine that binds one of them to the data file.
//!
//! ## Architecture
//!
//! ```text
//! Query
//!   │
//!   ▼
//! ┌─────────────────┐
//! │  SearchEngine   │  backend resolved once at construction
//! └────────┬────────┘
//!          │
//!    ┌─────┴──────────────┬───────────────┐
//!    ▼                    ▼               ▼
//! ┌─────────┐      ┌────────────┐   ┌───────────┐
//! │ reread  │      │  reread    │   │  cached   │
//! │ scans   │      │  grep -Fx  │   │  snapshot │
//! │ (file,  │      │  (child    │   │  (set /   │
//! │  mmap)  │      │  process)  │   │  sorted)  │
//! └─────────┘      └────────────┘   └───────────┘
//! ```
//!
//! ## Consistency Modes
//!
//! - **Reread** (`reread_on_query=true`): every query performs an independent
//!   I/O pass over the file, so edits are visible immediately.
//! - **Cached** (`reread_on_query=false`): the file is loaded once into an
//!   immutable snapshot at engine construction; later edits stay invisible
//!   until the process restarts. Lookups are pure functions of the snapshot.
//!
//! All five algorithms agree on the outcome for any dataset/query pair;
//! the choice only trades per-query cost against memory and freshness.

pub mod algorithms;
pub mod engine;

// Re-export commonly used types
pub use algorithms::SearchError;
pub use engine::{EngineError, SearchEngine};
