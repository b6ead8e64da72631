//! Block compression codecs for container files.
//!
//! A container file stores records in blocks, each compressed with the codec
//! named in the file header. Every codec is symmetric:
//! `decode(encode(b)) == b` for any byte string.
//!
//! | name        | format                                                  |
//! |-------------|---------------------------------------------------------|
//! | `null`      | bytes stored as-is                                      |
//! | `deflate`   | raw DEFLATE stream (no zlib or gzip header)             |
//! | `snappy`    | raw snappy block + big-endian CRC32 of the uncompressed |
//! | `zstandard` | zstd frame                                              |
//!
//! The empty codec name is treated as `null`.

use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;
use std::sync::Arc;

use lazy_static::lazy_static;
use rustc_hash::FxHashMap;

use crate::error::{DecodeError, EncodeError};
use crate::limits::{CHECKSUM_LEN, MAX_BLOCK_LEN, ZSTD_LEVEL};

/// A symmetric block transform.
pub trait Codec: Send + Sync {
    /// The codec name as it appears in a container header.
    fn name(&self) -> &'static str;

    /// Compresses a block.
    fn encode(&self, block: &[u8]) -> Result<Vec<u8>, EncodeError>;

    /// Decompresses (and verifies, where the format carries a checksum) a block.
    fn decode(&self, block: &[u8]) -> Result<Vec<u8>, DecodeError>;
}

// =============================================================================
// CODEC NAMES
// =============================================================================

/// The built-in codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecName {
    Null,
    Deflate,
    Snappy,
    Zstandard,
}

impl CodecName {
    pub const ALL: [CodecName; 4] = [
        CodecName::Null,
        CodecName::Deflate,
        CodecName::Snappy,
        CodecName::Zstandard,
    ];

    /// Returns the header name of this codec.
    pub fn as_str(self) -> &'static str {
        match self {
            CodecName::Null => "null",
            CodecName::Deflate => "deflate",
            CodecName::Snappy => "snappy",
            CodecName::Zstandard => "zstandard",
        }
    }

    /// Returns a shared instance of this codec.
    pub fn codec(self) -> Arc<dyn Codec> {
        match self {
            CodecName::Null => Arc::new(NullCodec),
            CodecName::Deflate => Arc::new(DeflateCodec::default()),
            CodecName::Snappy => Arc::new(SnappyCodec::default()),
            CodecName::Zstandard => Arc::new(ZstandardCodec::default()),
        }
    }
}

impl fmt::Display for CodecName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodecName {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "null" => Ok(CodecName::Null),
            "deflate" => Ok(CodecName::Deflate),
            "snappy" => Ok(CodecName::Snappy),
            "zstandard" => Ok(CodecName::Zstandard),
            other => Err(DecodeError::UnknownCodec {
                name: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

lazy_static! {
    static ref DEFAULT_CODECS: CodecRegistry = CodecRegistry::with_defaults();
}

/// Resolves a codec name against the built-in codecs.
pub fn resolve_codec(name: &str) -> Result<Arc<dyn Codec>, DecodeError> {
    DEFAULT_CODECS.get(name)
}

/// Codecs available to a container reader or writer, keyed by name.
#[derive(Clone, Default)]
pub struct CodecRegistry {
    codecs: FxHashMap<String, Arc<dyn Codec>>,
}

impl CodecRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in codec.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for name in CodecName::ALL {
            registry.register(name.codec());
        }
        registry
    }

    /// Registers (or replaces) a codec under its own name.
    pub fn register(&mut self, codec: Arc<dyn Codec>) {
        self.codecs.insert(codec.name().to_string(), codec);
    }

    /// Looks up a codec by header name. The empty name means `null`.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Codec>, DecodeError> {
        let key = if name.is_empty() { CodecName::Null.as_str() } else { name };
        self.codecs
            .get(key)
            .cloned()
            .ok_or_else(|| DecodeError::UnknownCodec {
                name: name.to_string(),
            })
    }

    /// Names of the registered codecs, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.codecs.keys().map(String::as_str)
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

// =============================================================================
// CODECS
// =============================================================================

/// Stores blocks uncompressed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCodec;

impl Codec for NullCodec {
    fn name(&self) -> &'static str {
        CodecName::Null.as_str()
    }

    fn encode(&self, block: &[u8]) -> Result<Vec<u8>, EncodeError> {
        Ok(block.to_vec())
    }

    fn decode(&self, block: &[u8]) -> Result<Vec<u8>, DecodeError> {
        Ok(block.to_vec())
    }
}

/// Raw DEFLATE compression.
#[derive(Debug, Clone, Copy)]
pub struct DeflateCodec {
    level: flate2::Compression,
    max_len: usize,
}

impl DeflateCodec {
    /// Creates a codec compressing at `level` (0 to 9).
    pub fn new(level: u32) -> Self {
        Self {
            level: flate2::Compression::new(level),
            max_len: MAX_BLOCK_LEN,
        }
    }

    /// Sets the maximum decompressed block size.
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }
}

impl Default for DeflateCodec {
    fn default() -> Self {
        Self {
            level: flate2::Compression::default(),
            max_len: MAX_BLOCK_LEN,
        }
    }
}

impl Codec for DeflateCodec {
    fn name(&self) -> &'static str {
        CodecName::Deflate.as_str()
    }

    fn encode(&self, block: &[u8]) -> Result<Vec<u8>, EncodeError> {
        let mut encoder = flate2::write::DeflateEncoder::new(Vec::new(), self.level);
        encoder
            .write_all(block)
            .and_then(|()| encoder.finish())
            .map(|compressed| {
                tracing::debug!(codec = "deflate", raw = block.len(), compressed = compressed.len(), "encoded block");
                compressed
            })
            .map_err(|e| EncodeError::CompressionFailed {
                codec: "deflate",
                reason: e.to_string(),
            })
    }

    fn decode(&self, block: &[u8]) -> Result<Vec<u8>, DecodeError> {
        let decoder = flate2::read::DeflateDecoder::new(block);
        let decompressed = read_bounded(decoder, self.max_len, "deflate")?;
        tracing::debug!(codec = "deflate", compressed = block.len(), raw = decompressed.len(), "decoded block");
        Ok(decompressed)
    }
}

/// Raw snappy compression with a trailing big-endian CRC32 (IEEE) of the
/// uncompressed bytes.
#[derive(Debug, Clone, Copy)]
pub struct SnappyCodec {
    max_len: usize,
}

impl SnappyCodec {
    /// Sets the maximum decompressed block size.
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }
}

impl Default for SnappyCodec {
    fn default() -> Self {
        Self {
            max_len: MAX_BLOCK_LEN,
        }
    }
}

impl Codec for SnappyCodec {
    fn name(&self) -> &'static str {
        CodecName::Snappy.as_str()
    }

    fn encode(&self, block: &[u8]) -> Result<Vec<u8>, EncodeError> {
        let mut compressed = snap::raw::Encoder::new()
            .compress_vec(block)
            .map_err(|e| EncodeError::CompressionFailed {
                codec: "snappy",
                reason: e.to_string(),
            })?;
        compressed.extend_from_slice(&crc32fast::hash(block).to_be_bytes());
        tracing::debug!(codec = "snappy", raw = block.len(), compressed = compressed.len(), "encoded block");
        Ok(compressed)
    }

    fn decode(&self, block: &[u8]) -> Result<Vec<u8>, DecodeError> {
        if block.len() <= CHECKSUM_LEN {
            return Err(DecodeError::TruncatedBlock { len: block.len() });
        }
        let (payload, trailer) = block.split_at(block.len() - CHECKSUM_LEN);
        let mut expected = [0u8; CHECKSUM_LEN];
        expected.copy_from_slice(trailer);
        let expected = u32::from_be_bytes(expected);

        // The header's declared length is checked before anything is allocated.
        let declared = snap::raw::decompress_len(payload).map_err(|e| {
            tracing::warn!(codec = "snappy", error = %e, "block header is malformed");
            DecodeError::ChecksumMismatch {
                expected,
                actual: None,
            }
        })?;
        if declared > self.max_len {
            return Err(DecodeError::LengthExceedsLimit {
                context: "decompressed block",
                len: declared,
                max: self.max_len,
            });
        }

        let decompressed = match snap::raw::Decoder::new().decompress_vec(payload) {
            Ok(decompressed) => decompressed,
            Err(e) => {
                tracing::warn!(codec = "snappy", error = %e, "block failed to decompress");
                return Err(DecodeError::ChecksumMismatch {
                    expected,
                    actual: None,
                });
            }
        };

        let actual = crc32fast::hash(&decompressed);
        if actual != expected {
            tracing::warn!(codec = "snappy", expected, actual, "block checksum mismatch");
            return Err(DecodeError::ChecksumMismatch {
                expected,
                actual: Some(actual),
            });
        }
        tracing::debug!(codec = "snappy", compressed = block.len(), raw = decompressed.len(), "decoded block");
        Ok(decompressed)
    }
}

/// Zstandard compression.
#[derive(Debug, Clone, Copy)]
pub struct ZstandardCodec {
    level: i32,
    max_len: usize,
}

impl ZstandardCodec {
    /// Creates a codec compressing at `level`.
    pub fn new(level: i32) -> Self {
        Self {
            level,
            max_len: MAX_BLOCK_LEN,
        }
    }

    /// Sets the maximum decompressed block size.
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }
}

impl Default for ZstandardCodec {
    fn default() -> Self {
        Self::new(ZSTD_LEVEL)
    }
}

impl Codec for ZstandardCodec {
    fn name(&self) -> &'static str {
        CodecName::Zstandard.as_str()
    }

    fn encode(&self, block: &[u8]) -> Result<Vec<u8>, EncodeError> {
        let compressed = zstd::encode_all(block, self.level).map_err(|e| {
            EncodeError::CompressionFailed {
                codec: "zstandard",
                reason: e.to_string(),
            }
        })?;
        tracing::debug!(codec = "zstandard", raw = block.len(), compressed = compressed.len(), "encoded block");
        Ok(compressed)
    }

    fn decode(&self, block: &[u8]) -> Result<Vec<u8>, DecodeError> {
        let decoder = zstd::Decoder::new(block).map_err(|e| DecodeError::DecompressionFailed {
            codec: "zstandard",
            reason: e.to_string(),
        })?;
        let decompressed = read_bounded(decoder, self.max_len, "zstandard")?;
        tracing::debug!(codec = "zstandard", compressed = block.len(), raw = decompressed.len(), "decoded block");
        Ok(decompressed)
    }
}

/// Reads a decompressing stream to the end, failing once it yields more
/// than `max_len` bytes.
fn read_bounded(source: impl Read, max_len: usize, codec: &'static str) -> Result<Vec<u8>, DecodeError> {
    let limit = u64::try_from(max_len).unwrap_or(u64::MAX).saturating_add(1);
    let mut decompressed = Vec::new();
    source
        .take(limit)
        .read_to_end(&mut decompressed)
        .map_err(|e| DecodeError::DecompressionFailed {
            codec,
            reason: e.to_string(),
        })?;
    if decompressed.len() > max_len {
        tracing::warn!(codec, max = max_len, "decompressed block exceeds limit");
        return Err(DecodeError::LengthExceedsLimit {
            context: "decompressed block",
            len: decompressed.len(),
            max: max_len,
        });
    }
    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        b"avrobind block ".iter().copied().cycle().take(600).collect()
    }

    #[test]
    fn test_roundtrip_all_codecs() {
        let data = sample();
        for name in CodecName::ALL {
            let codec = name.codec();
            let encoded = codec.encode(&data).unwrap();
            assert_eq!(codec.decode(&encoded).unwrap(), data, "codec {}", name);
        }
    }

    #[test]
    fn test_empty_block_roundtrip() {
        for name in CodecName::ALL {
            let codec = name.codec();
            let encoded = codec.encode(&[]).unwrap();
            assert_eq!(codec.decode(&encoded).unwrap(), Vec::<u8>::new(), "codec {}", name);
        }
    }

    #[test]
    fn test_snappy_trailer_is_big_endian_crc() {
        let data = sample();
        let encoded = SnappyCodec::default().encode(&data).unwrap();
        let trailer = &encoded[encoded.len() - CHECKSUM_LEN..];
        assert_eq!(trailer, crc32fast::hash(&data).to_be_bytes());
    }

    #[test]
    fn test_snappy_checksum_mismatch() {
        let data = sample();
        let mut encoded = SnappyCodec::default().encode(&data).unwrap();
        let last = encoded.len() - 1;
        encoded[last] ^= 0x01;
        let expected = crc32fast::hash(&data) ^ 0x01;
        assert_eq!(
            SnappyCodec::default().decode(&encoded),
            Err(DecodeError::ChecksumMismatch {
                expected,
                actual: Some(crc32fast::hash(&data)),
            })
        );
    }

    #[test]
    fn test_snappy_truncated_block() {
        assert_eq!(
            SnappyCodec::default().decode(&[0, 1, 2, 3]),
            Err(DecodeError::TruncatedBlock { len: 4 })
        );
        assert_eq!(
            SnappyCodec::default().decode(&[]),
            Err(DecodeError::TruncatedBlock { len: 0 })
        );
    }

    #[test]
    fn test_resolve_codec() {
        assert_eq!(resolve_codec("").unwrap().name(), "null");
        assert_eq!(resolve_codec("snappy").unwrap().name(), "snappy");
        assert!(matches!(
            resolve_codec("lz4"),
            Err(DecodeError::UnknownCodec { ref name }) if name == "lz4"
        ));
        assert_eq!("zstandard".parse::<CodecName>().unwrap(), CodecName::Zstandard);
        assert!("bzip2".parse::<CodecName>().is_err());
    }

    #[test]
    fn test_custom_registry() {
        let mut registry = CodecRegistry::new();
        registry.register(Arc::new(NullCodec));
        assert!(registry.get("null").is_ok());
        assert!(registry.get("").is_ok());
        assert!(registry.get("deflate").is_err());
        assert_eq!(registry.names().count(), 1);
    }

    #[test]
    fn test_decompressed_size_is_bounded() {
        let data = vec![0u8; 64 * 1024];
        let max = 1024;
        let codecs: [(&str, Box<dyn Codec>); 3] = [
            ("deflate", Box::new(DeflateCodec::default().with_max_len(max))),
            ("snappy", Box::new(SnappyCodec::default().with_max_len(max))),
            ("zstandard", Box::new(ZstandardCodec::default().with_max_len(max))),
        ];
        for (name, codec) in codecs {
            let encoded = codec.encode(&data).unwrap();
            let err = codec.decode(&encoded).unwrap_err();
            assert!(
                matches!(
                    err,
                    DecodeError::LengthExceedsLimit { context: "decompressed block", max: 1024, .. }
                ),
                "codec {}: {:?}",
                name,
                err
            );
        }

        let exact = vec![7u8; max];
        for codec in [
            Box::new(DeflateCodec::default().with_max_len(max)) as Box<dyn Codec>,
            Box::new(SnappyCodec::default().with_max_len(max)),
            Box::new(ZstandardCodec::default().with_max_len(max)),
        ] {
            let encoded = codec.encode(&exact).unwrap();
            assert_eq!(codec.decode(&encoded).unwrap(), exact);
        }
    }

    #[test]
    fn test_snappy_declared_length_checked_before_decompressing() {
        // Header declares 2^32 - 1 bytes; the body is never read.
        let block = [0xff, 0xff, 0xff, 0xff, 0x0f, 0x00, 0, 0, 0, 0];
        assert_eq!(
            SnappyCodec::default().decode(&block),
            Err(DecodeError::LengthExceedsLimit {
                context: "decompressed block",
                len: u32::MAX as usize,
                max: MAX_BLOCK_LEN,
            })
        );
    }

    #[test]
    fn test_deflate_rejects_garbage() {
        let err = DeflateCodec::default().decode(&[0xff; 16]).unwrap_err();
        assert_eq!(err.class(), crate::error::ErrorClass::Codec);
    }
}
