//! avrobind: schema-driven Avro binary decoding into caller-chosen destinations.
//!
//! A byte stream is interpreted strictly according to an externally supplied
//! [`Schema`]; the decoded values land in whatever destination the caller
//! passes: a registered struct, a string-keyed map, or an open [`Value`].
//!
//! # Quick Start
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! use avrobind::{record, decode, Reader, RecordDef, Schema, SchemaDef, Value};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Test {
//!     a: i64,
//!     b: String,
//! }
//!
//! record! {
//!     Test {
//!         a: "a",
//!         b: "b",
//!     }
//! }
//!
//! let schema = Schema::new(
//!     RecordDef::new("test")
//!         .field("a", SchemaDef::LONG)
//!         .field("b", SchemaDef::STRING),
//! )
//! .unwrap();
//! let payload = [0x36, 0x06, b'f', b'o', b'o'];
//!
//! // Into a struct
//! let mut got = Test::default();
//! decode(&schema, &mut Reader::new(&payload), &mut got).unwrap();
//! assert_eq!(got, Test { a: 27, b: "foo".to_string() });
//!
//! // Into a map
//! let mut map: HashMap<String, Value> = HashMap::new();
//! decode(&schema, &mut Reader::new(&payload), &mut map).unwrap();
//! assert_eq!(map["a"], Value::Long(27));
//! ```
//!
//! # Modules
//!
//! - [`schema`]: Schema description and the resolved, shareable schema graph
//! - [`codec`]: Primitive wire encoding plus the schema-driven decoder and encoder
//! - [`bind`]: Destination descriptors and the [`record!`] registration macro
//! - [`logical`]: Logical type projections (timestamps, dates, times)
//! - [`block`]: Container block codecs (`null`, `deflate`, `snappy`, `zstandard`)
//! - [`model`]: Dynamic values and timestamps
//! - [`validate`]: Schema well-formedness checks
//! - [`error`]: Error types
//! - [`limits`]: Security limits for decoding
//!
//! # Security
//!
//! The decoder is designed to safely handle untrusted input:
//! - Lengths, map sizes and nesting depth are bounded by [`DecodeOptions`]
//! - Varints are limited to their type's width
//! - Invalid data is rejected with descriptive errors carrying the field path

pub mod bind;
pub mod block;
pub mod codec;
pub mod error;
pub mod limits;
pub mod logical;
pub mod model;
pub mod schema;
pub mod util;
pub mod validate;

// Re-export commonly used types at crate root
pub use bind::{Bind, Destination, MapKey, MapSink, Polymorphic, Record, Scalar};
pub use block::{resolve_codec, Codec, CodecName, CodecRegistry};
pub use codec::{decode, encode_value, DecodeOptions, Decoder, Reader, Writer};
pub use error::{DecodeError, EncodeError, ErrorClass, SchemaError};
pub use logical::{default_logical_types, LogicalTypes};
pub use model::{Timestamp, Value, ValueKind};
pub use schema::{Node, PrimitiveKind, RecordDef, Schema, SchemaDef};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
