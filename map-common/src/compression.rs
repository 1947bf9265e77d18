use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::io::{self, Read, Write};
use thiserror::Error;

/// Magic bytes identifying a compressed catalog file
pub const MAGIC_BYTES: &[u8] = b"URTMP";

/// Current snapshot format version
pub const SNAPSHOT_VERSION: [u8; 2] = [1, 0];

/// Largest decompressed payload the decoder accepts
pub const MAX_RAW_LEN: usize = 64 * 1024 * 1024;

const HEADER_LEN: usize = MAGIC_BYTES.len() + 2 + 4;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("serialization failed: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("deserialization failed: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("data too short to parse: {0} bytes")]
    TooShort(usize),

    #[error("invalid file format: magic bytes mismatch")]
    BadMagic,

    #[error("unsupported version: {0}.{1}")]
    UnsupportedVersion(u8, u8),

    #[error("decompressed size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("snapshot too large: {0} bytes")]
    TooLarge(usize),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Serialize an object to bincode (standard config).
pub fn to_binary<T: serde::Serialize>(obj: &T) -> Result<Vec<u8>, CodecError> {
    Ok(bincode::serde::encode_to_vec(obj, bincode::config::standard())?)
}

/// Deserialize an object from bincode (standard config).
pub fn from_binary<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T, CodecError> {
    let (value, _) = bincode::serde::decode_from_slice(data, bincode::config::standard())?;
    Ok(value)
}

/// Serialize and gzip an object behind the `MAGIC | version | raw_len` header.
pub fn to_compressed<T: serde::Serialize>(
    obj: &T,
    version: [u8; 2],
) -> Result<Vec<u8>, CodecError> {
    let binary = to_binary(obj)?;
    let raw_len = u32::try_from(binary.len()).map_err(|_| CodecError::TooLarge(binary.len()))?;

    let mut output = Vec::with_capacity(HEADER_LEN + binary.len() / 2);
    output.extend_from_slice(MAGIC_BYTES);
    output.extend_from_slice(&version);
    output.extend_from_slice(&raw_len.to_le_bytes());

    let mut encoder = GzEncoder::new(output, Compression::best());
    encoder.write_all(&binary)?;
    Ok(encoder.finish()?)
}

/// Decode a compressed object, accepting any major version up to the current one.
pub fn from_compressed<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T, CodecError> {
    from_compressed_with_max_version(data, SNAPSHOT_VERSION[0])
}

pub fn from_compressed_with_max_version<T: serde::de::DeserializeOwned>(
    data: &[u8],
    max_version: u8,
) -> Result<T, CodecError> {
    let (_, raw_len, payload) = split_header(data, max_version)?;

    if raw_len > MAX_RAW_LEN {
        return Err(CodecError::TooLarge(raw_len));
    }

    // One byte past the declared size is enough to detect a longer stream.
    let mut decoder = GzDecoder::new(payload).take(raw_len as u64 + 1);
    let mut decompressed = Vec::with_capacity(raw_len.min(payload.len().saturating_mul(4)));
    decoder.read_to_end(&mut decompressed)?;

    if decompressed.len() != raw_len {
        return Err(CodecError::SizeMismatch {
            expected: raw_len,
            actual: decompressed.len(),
        });
    }

    from_binary(&decompressed)
}

/// Check the header of compressed data and return its version.
pub fn validate_compressed_data(data: &[u8]) -> Result<[u8; 2], CodecError> {
    split_header(data, SNAPSHOT_VERSION[0]).map(|(version, _, _)| version)
}

fn split_header(data: &[u8], max_version: u8) -> Result<([u8; 2], usize, &[u8]), CodecError> {
    if data.len() < HEADER_LEN {
        return Err(CodecError::TooShort(data.len()));
    }

    let (magic, rest) = data.split_at(MAGIC_BYTES.len());
    if magic != MAGIC_BYTES {
        return Err(CodecError::BadMagic);
    }

    let (version, rest) = rest.split_at(2);
    let version = [version[0], version[1]];
    if version[0] > max_version {
        return Err(CodecError::UnsupportedVersion(version[0], version[1]));
    }

    let (size, payload) = rest.split_at(4);
    let mut size_bytes = [0u8; 4];
    size_bytes.copy_from_slice(size);
    let raw_len = u32::from_le_bytes(size_bytes) as usize;

    Ok((version, raw_len, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CatalogSnapshot, MapDocument};
    use testresult::TestResult;

    fn sample_snapshot() -> CatalogSnapshot {
        CatalogSnapshot::new(
            vec![
                MapDocument::new("A", ["forest", "night"]).with_screenshots(["a.jpg"]),
                MapDocument::new("B", ["forest"]),
            ],
            SNAPSHOT_VERSION,
        )
    }

    #[test]
    fn compressed_snapshot_keeps_maps_and_order() -> TestResult {
        let snapshot = sample_snapshot();

        let bytes = to_compressed(&snapshot, SNAPSHOT_VERSION)?;
        let decoded: CatalogSnapshot = from_compressed(&bytes)?;

        assert_eq!(decoded.maps, snapshot.maps);
        assert_eq!(decoded.metadata, snapshot.metadata);
        Ok(())
    }

    #[test]
    fn validate_reports_header_version() -> TestResult {
        let bytes = to_compressed(&sample_snapshot(), [1, 3])?;

        assert_eq!(validate_compressed_data(&bytes)?, [1, 3]);
        Ok(())
    }

    #[test]
    fn rejects_wrong_magic() -> TestResult {
        let mut bytes = to_compressed(&sample_snapshot(), SNAPSHOT_VERSION)?;
        bytes[0] = b'X';

        let result = from_compressed::<CatalogSnapshot>(&bytes);
        assert!(matches!(result, Err(CodecError::BadMagic)));
        Ok(())
    }

    #[test]
    fn rejects_newer_major_version() -> TestResult {
        let bytes = to_compressed(&sample_snapshot(), [2, 0])?;

        let result = from_compressed::<CatalogSnapshot>(&bytes);
        assert!(matches!(result, Err(CodecError::UnsupportedVersion(2, 0))));
        Ok(())
    }

    fn with_header(raw_len: u32, body: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut data = MAGIC_BYTES.to_vec();
        data.extend_from_slice(&SNAPSHOT_VERSION);
        data.extend_from_slice(&raw_len.to_le_bytes());

        let mut encoder = GzEncoder::new(data, Compression::fast());
        encoder.write_all(body)?;
        Ok(encoder.finish()?)
    }

    #[test]
    fn stops_inflating_past_declared_size() -> TestResult {
        let data = with_header(16, &vec![0u8; 4 * 1024 * 1024])?;

        let result = from_compressed::<CatalogSnapshot>(&data);

        assert!(matches!(
            result,
            Err(CodecError::SizeMismatch { expected: 16, actual: 17 })
        ));
        Ok(())
    }

    #[test]
    fn rejects_oversized_declared_length() -> TestResult {
        let data = with_header(u32::MAX, b"tiny")?;

        let result = from_compressed::<CatalogSnapshot>(&data);

        assert!(matches!(result, Err(CodecError::TooLarge(len)) if len == u32::MAX as usize));
        Ok(())
    }

    #[test]
    fn rejects_truncated_header() {
        let result = from_compressed::<CatalogSnapshot>(b"URTMP\x01");
        assert!(matches!(result, Err(CodecError::TooShort(6))));
    }
}
