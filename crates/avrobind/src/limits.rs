//! Default limits for decoding untrusted input.
//!
//! These are the defaults behind [`DecodeOptions`](crate::codec::DecodeOptions).
//! The varint widths are fixed by the wire format and are not configurable.

/// Maximum encoded length of an `int` varint (32 bits / 7 bits per byte).
pub const MAX_VARINT_BYTES_INT: usize = 5;

/// Maximum encoded length of a `long` varint (64 bits / 7 bits per byte).
pub const MAX_VARINT_BYTES_LONG: usize = 10;

/// Maximum length of a single `bytes` or `string` value (64 MiB).
pub const MAX_BYTES_LEN: usize = 64 * 1024 * 1024;

/// Maximum number of entries across all blocks of one map.
pub const MAX_MAP_ENTRIES: usize = 1_000_000;

/// Maximum nesting depth of records and maps.
pub const MAX_DEPTH: usize = 128;

/// Width of the big-endian CRC32 trailer appended by the snappy codec.
pub const CHECKSUM_LEN: usize = 4;

/// Default zstd compression level for the `zstandard` codec.
pub const ZSTD_LEVEL: i32 = 3;

/// Maximum decompressed size of one container block (256 MiB).
pub const MAX_BLOCK_LEN: usize = 256 * 1024 * 1024;
