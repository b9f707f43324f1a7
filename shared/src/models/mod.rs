//! Data models
//!
//! Everything here travels inside the JSON snapshot file, so field names
//! follow the snapshot's camelCase convention.

pub mod amount;
pub mod catalog;
pub mod invoice;
pub mod login_event;
pub mod product;
pub mod snapshot;

// Re-exports
pub use catalog::*;
pub use invoice::*;
pub use login_event::*;
pub use product::*;
pub use snapshot::*;
