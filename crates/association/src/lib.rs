//! # elif-association: Singular associations for elif.rs
//!
//! Lazy, cached proxies for has-one and belongs-to associations. A proxy
//! defers fetching its target until first read, remembers a confirmed
//! absence, notices when the owner's foreign key changes underneath it, and
//! keeps keys and cache consistent when a target is assigned, built or
//! created.
//!
//! Query execution, persistence and record construction are supplied by the
//! caller through the traits in [`relationships::traits`].

pub mod error;
pub mod model;
pub mod relationships;

// Re-export core traits and types
pub use error::*;
pub use model::*;
pub use relationships::*;
