//! Data model types.
//!
//! - Dynamic values (the open destination)
//! - Calendar timestamps produced by logical types

pub mod time;
pub mod value;

pub use time::Timestamp;
pub use value::{Value, ValueKind};
