//! Binary encoding and decoding.
//!
//! - [`primitives`]: varints, lengths and fixed-width scalars
//! - [`decoder`]: schema-driven decoding into any [`Bind`](crate::bind::Bind) destination
//! - [`encoder`]: schema-driven encoding of [`Value`](crate::model::Value)s

pub mod decoder;
pub mod encoder;
pub mod primitives;

pub use decoder::{decode, DecodeOptions, Decoder};
pub use encoder::{encode_value, write_value};
pub use primitives::{zigzag_decode, zigzag_encode, Reader, Writer};
