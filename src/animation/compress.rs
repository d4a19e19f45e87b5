//! Whole-artifact compression.
//!
//! A compressed artifact is the original length as a little-endian `u64`
//! followed by the compressor's output:
//!
//! ```text
//! original size: u64 | compressed bytes ...
//! ```

/// A lossless byte compressor with bounded-output decompression.
pub trait Compressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError>;

    /// Decompress into exactly `expected_size` bytes.
    fn decompress(&self, data: &[u8], expected_size: usize) -> Result<Vec<u8>, CompressionError>;
}

/// LZ4 block compression.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4Compressor;

impl Compressor for Lz4Compressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let compressed = lz4_flex::block::compress(data);
        if compressed.is_empty() && !data.is_empty() {
            return Err(CompressionError::Empty);
        }
        Ok(compressed)
    }

    fn decompress(&self, data: &[u8], expected_size: usize) -> Result<Vec<u8>, CompressionError> {
        let decompressed = lz4_flex::block::decompress(data, expected_size)?;
        if decompressed.len() != expected_size {
            return Err(CompressionError::SizeMismatch {
                expected: expected_size,
                actual: decompressed.len(),
            });
        }
        Ok(decompressed)
    }
}

/// Size of the original-length prefix.
pub const SIZE_PREFIX_LEN: usize = 8;

/// Upper bound on LZ4 block expansion: one length byte extends a match by
/// at most 255 output bytes.
const MAX_EXPANSION: u64 = 255;

/// Largest original size `compressed_len` bytes of LZ4 can decode to.
fn max_decoded_len(compressed_len: usize) -> u64 {
    (compressed_len as u64)
        .saturating_mul(MAX_EXPANSION)
        .saturating_add(64)
}

/// Compress `data` and prepend its original length.
pub fn wrap_compressed<C: Compressor>(
    compressor: &C,
    data: &[u8],
) -> Result<Vec<u8>, CompressionError> {
    let compressed = compressor.compress(data)?;
    let mut out = Vec::with_capacity(SIZE_PREFIX_LEN + compressed.len());
    out.extend_from_slice(&(data.len() as u64).to_le_bytes());
    out.extend_from_slice(&compressed);
    log::debug!("compressed {} -> {} bytes", data.len(), out.len());
    Ok(out)
}

/// Undo [`wrap_compressed`].
pub fn unwrap_compressed<C: Compressor>(
    compressor: &C,
    data: &[u8],
) -> Result<Vec<u8>, CompressionError> {
    let prefix: [u8; SIZE_PREFIX_LEN] = data
        .get(..SIZE_PREFIX_LEN)
        .and_then(|p| p.try_into().ok())
        .ok_or(CompressionError::MissingSizePrefix)?;
    let expected = u64::from_le_bytes(prefix);
    let body = &data[SIZE_PREFIX_LEN..];
    if expected > max_decoded_len(body.len()) {
        return Err(CompressionError::ImplausibleSize {
            declared: expected,
            compressed: body.len(),
        });
    }
    let expected =
        usize::try_from(expected).map_err(|_| CompressionError::TooLarge(expected))?;
    compressor.decompress(body, expected)
}

/// Compression errors.
#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    #[error("Compressor produced no output")]
    Empty,
    #[error("Compressed data is shorter than its 8-byte size prefix")]
    MissingSizePrefix,
    #[error("LZ4 decompression failed: {0}")]
    Lz4(#[from] lz4_flex::block::DecompressError),
    #[error("Declared size {0} does not fit in memory")]
    TooLarge(u64),
    #[error("Declared size {declared} cannot come from {compressed} compressed bytes")]
    ImplausibleSize { declared: u64, compressed: usize },
    #[error("Decompressed {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let data: Vec<u8> = (0..4096).map(|i| (i % 7) as u8).collect();
        let wrapped = wrap_compressed(&Lz4Compressor, &data).unwrap();
        assert_eq!(&wrapped[..8], &(data.len() as u64).to_le_bytes());
        assert!(wrapped.len() < data.len());
        assert_eq!(unwrap_compressed(&Lz4Compressor, &wrapped).unwrap(), data);
    }

    #[test]
    fn test_missing_prefix() {
        assert!(matches!(
            unwrap_compressed(&Lz4Compressor, &[1, 2, 3]),
            Err(CompressionError::MissingSizePrefix)
        ));
    }

    #[test]
    fn test_truncated_stream() {
        let data: Vec<u8> = (0..1000).map(|i| (i * 31 % 251) as u8).collect();
        let mut wrapped = wrap_compressed(&Lz4Compressor, &data).unwrap();
        wrapped.truncate(wrapped.len() / 2);
        assert!(unwrap_compressed(&Lz4Compressor, &wrapped).is_err());
    }

    #[test]
    fn test_huge_declared_size_is_rejected() {
        let mut data = (1u64 << 62).to_le_bytes().to_vec();
        data.extend_from_slice(&[0x10, b'a']);
        assert!(matches!(
            unwrap_compressed(&Lz4Compressor, &data),
            Err(CompressionError::ImplausibleSize {
                declared,
                compressed: 2,
            }) if declared == 1 << 62
        ));
    }

    #[test]
    fn test_highly_compressible_input_fits_bound() {
        let data = vec![0u8; 1 << 20];
        let wrapped = wrap_compressed(&Lz4Compressor, &data).unwrap();
        assert_eq!(unwrap_compressed(&Lz4Compressor, &wrapped).unwrap(), data);
    }

    #[test]
    fn test_wrong_expected_size() {
        let data = b"hello hello hello hello".to_vec();
        let mut wrapped = wrap_compressed(&Lz4Compressor, &data).unwrap();
        wrapped[..8].copy_from_slice(&((data.len() + 5) as u64).to_le_bytes());
        assert!(unwrap_compressed(&Lz4Compressor, &wrapped).is_err());
    }
}
