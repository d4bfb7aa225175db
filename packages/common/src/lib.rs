//! Shared building blocks for the arbor item tree store: the value type
//! stored in item roles, the error taxonomy and the file system seam used
//! by documents.

pub mod error;
pub mod filesystem;
pub mod result;
pub mod roles;
pub mod variant;

pub use error::*;
pub use filesystem::*;
pub use result::*;
pub use variant::*;
