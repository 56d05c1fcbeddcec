//! Repository implementations.
//!
//! - `local`: In-memory implementation backing the dispatch binary and tests
pub mod local;

pub use local::LocalRepository;
