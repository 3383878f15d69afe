//! Relationships Module - lazy singular associations and their collaborators

pub mod traits;
pub mod has_one;
pub mod belongs_to;
pub mod metadata;
pub mod registry;
pub mod scope;
pub mod singular;


// Re-export main types
pub use traits::*;
pub use has_one::*;
pub use belongs_to::*;
pub use metadata::*;
pub use registry::*;
pub use scope::*;
pub use singular::*;
