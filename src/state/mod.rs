//! Project persistence module
//!
//! Handles the file-backed store for one project, including:
//! - YAML document load/save with atomic writes
//! - Optimistic concurrency on lot documents
//! - Atomic single-use release token consumption

mod store;

pub use store::{ProjectStore, StoreError, StoreResult, TokenState};
