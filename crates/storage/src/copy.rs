//! Copy planning utilities.
//!
//! Pure logic deciding how a server-side copy is issued. No I/O operations.

use crate::error::StorageError;
use crate::types::{MAX_COPY_PARTS, MAX_COPY_PART_SIZE, MAX_SINGLE_COPY_SIZE, MIN_COPY_PART_SIZE};

/// One part of a multipart copy, as an inclusive byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyPart {
    /// One-based part number, as S3 expects.
    pub part_number: i32,
    /// First byte of the range.
    pub first_byte: u64,
    /// Last byte of the range (inclusive).
    pub last_byte: u64,
}

impl CopyPart {
    /// Format as an `x-amz-copy-source-range` header value.
    pub fn range_header(&self) -> String {
        format!("bytes={}-{}", self.first_byte, self.last_byte)
    }
}

/// How a copy request should be issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStrategy {
    /// A single CopyObject request.
    SingleRequest,
    /// CreateMultipartUpload followed by UploadPartCopy per part.
    Multipart,
}

/// Determine copy strategy based on object size.
pub fn copy_strategy(size: u64) -> CopyStrategy {
    if size > MAX_SINGLE_COPY_SIZE {
        CopyStrategy::Multipart
    } else {
        CopyStrategy::SingleRequest
    }
}

/// Check a configured multipart copy part size against S3's limits.
///
/// # Returns
/// The part size, or `StorageError::InvalidConfig` when it is outside
/// `MIN_COPY_PART_SIZE..=MAX_COPY_PART_SIZE`.
pub fn validate_copy_part_size(part_size: u64) -> Result<u64, StorageError> {
    if !(MIN_COPY_PART_SIZE..=MAX_COPY_PART_SIZE).contains(&part_size) {
        return Err(StorageError::InvalidConfig {
            message: format!(
                "copy_part_size {} is outside {}..={} bytes",
                part_size, MIN_COPY_PART_SIZE, MAX_COPY_PART_SIZE
            ),
        });
    }
    Ok(part_size)
}

/// Split an object of `size` bytes into copy parts of `part_size` bytes.
///
/// The last part may be smaller than `part_size`. The part size is raised
/// when the object would otherwise need more than `MAX_COPY_PARTS` parts.
/// An empty object yields no parts.
///
/// # Arguments
/// * `size` - Total object size in bytes
/// * `part_size` - Requested size of each part
pub fn plan_copy_parts(size: u64, part_size: u64) -> Vec<CopyPart> {
    if size == 0 {
        return Vec::new();
    }
    let part_size: u64 = part_size.max(size.div_ceil(MAX_COPY_PARTS)).max(1);

    let mut parts = Vec::new();
    let mut offset = 0u64;
    let mut part_number = 1i32;

    while offset < size {
        let length = std::cmp::min(part_size, size - offset);
        parts.push(CopyPart {
            part_number,
            first_byte: offset,
            last_byte: offset + length - 1,
        });
        offset += length;
        part_number += 1;
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_COPY_PART_SIZE;

    #[test]
    fn test_copy_strategy() {
        assert_eq!(copy_strategy(100), CopyStrategy::SingleRequest);
        assert_eq!(copy_strategy(MAX_SINGLE_COPY_SIZE), CopyStrategy::SingleRequest);
        assert_eq!(copy_strategy(MAX_SINGLE_COPY_SIZE + 1), CopyStrategy::Multipart);
    }

    #[test]
    fn test_plan_copy_parts_with_remainder() {
        let parts = plan_copy_parts(250, 100);
        assert_eq!(
            parts,
            vec![
                CopyPart {
                    part_number: 1,
                    first_byte: 0,
                    last_byte: 99,
                },
                CopyPart {
                    part_number: 2,
                    first_byte: 100,
                    last_byte: 199,
                },
                CopyPart {
                    part_number: 3,
                    first_byte: 200,
                    last_byte: 249,
                },
            ]
        );
        assert_eq!(parts[2].range_header(), "bytes=200-249");
    }

    #[test]
    fn test_plan_copy_parts_large_object() {
        // 6 GiB with 512 MiB parts = 12 parts
        let size = 6 * 1024 * 1024 * 1024;
        let parts = plan_copy_parts(size, DEFAULT_COPY_PART_SIZE);
        assert_eq!(parts.len(), 12);
        assert_eq!(parts.last().unwrap().last_byte, size - 1);
    }

    #[test]
    fn test_plan_copy_parts_empty() {
        assert!(plan_copy_parts(0, 100).is_empty());
    }

    fn assert_covers(parts: &[CopyPart], size: u64) {
        assert!(!parts.is_empty());
        assert!(parts.len() as u64 <= MAX_COPY_PARTS);
        assert_eq!(parts[0].first_byte, 0);
        assert_eq!(parts.last().unwrap().last_byte, size - 1);
        for pair in parts.windows(2) {
            assert_eq!(pair[1].first_byte, pair[0].last_byte + 1);
            assert_eq!(pair[1].part_number, pair[0].part_number + 1);
        }
    }

    #[test]
    fn test_plan_copy_parts_raises_part_size_to_fit_part_limit() {
        let size = MAX_SINGLE_COPY_SIZE + 1;
        let parts = plan_copy_parts(size, 1024);
        assert_eq!(parts.len() as u64, MAX_COPY_PARTS);
        assert_covers(&parts, size);
    }

    #[test]
    fn test_plan_copy_parts_zero_part_size_still_covers_object() {
        let size = MAX_SINGLE_COPY_SIZE + 1;
        assert_covers(&plan_copy_parts(size, 0), size);
        assert_covers(&plan_copy_parts(100, 0), 100);
    }

    #[test]
    fn test_validate_copy_part_size() {
        assert_eq!(
            validate_copy_part_size(DEFAULT_COPY_PART_SIZE).unwrap(),
            DEFAULT_COPY_PART_SIZE
        );
        assert!(validate_copy_part_size(MIN_COPY_PART_SIZE).is_ok());
        assert!(validate_copy_part_size(MAX_COPY_PART_SIZE).is_ok());
        for bad in [0, 1024, MIN_COPY_PART_SIZE - 1, MAX_COPY_PART_SIZE + 1] {
            assert!(matches!(
                validate_copy_part_size(bad),
                Err(StorageError::InvalidConfig { .. })
            ));
        }
    }
}
