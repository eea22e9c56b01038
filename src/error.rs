//! Error handling for the BPM library.
//!
//! This module defines all error types that can occur while decoding a bead pool
//! manifest: I/O errors from the underlying stream and format errors raised by
//! the decoder's validation passes.

use thiserror::Error;

use crate::Section;

/// A specialized `Result` type for BPM operations.
///
/// This type is used throughout the BPM library for any operation that can fail.
/// It's equivalent to `std::result::Result<T, BpmError>`.
///
/// # Examples
///
/// ```rust
/// use bpm::{Manifest, Result};
/// use std::io::Cursor;
///
/// fn decode(bytes: Vec<u8>) -> Result<Manifest> {
///     let manifest = Manifest::from_reader(Cursor::new(bytes))?;
///     Ok(manifest)
/// }
/// ```
pub type Result<T> = std::result::Result<T, BpmError>;

/// Error types for BPM decoding.
///
/// Every format error is fatal: the manifest is either well-formed or rejected
/// as a whole, no partially decoded manifest is ever returned. Variants that
/// concern a single probe carry its zero-based index.
///
/// # Examples
///
/// ```rust
/// use bpm::{BpmError, Reader};
/// use std::io::Cursor;
///
/// let not_a_manifest = b"GTC\x01".to_vec();
///
/// match Reader::new(Cursor::new(not_a_manifest)) {
///     Err(BpmError::InvalidIdentifier { expected, actual }) => {
///         println!("Wrong file type: expected {expected}, got {actual}");
///     }
///     Err(e) => println!("Other error: {e}"),
///     Ok(_) => unreachable!(),
/// }
/// ```
#[derive(Error, Debug)]
pub enum BpmError {
    /// I/O error from the underlying stream.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// Compression/decompression error from niffler.
    #[cfg(feature = "niffler")]
    #[error("Niffler error")]
    Niffler(#[from] niffler::Error),

    /// The stream ended before the named section was fully decoded.
    #[error("Truncated manifest in {section} section at byte {pos}")]
    Truncated { section: Section, pos: u64 },

    /// The leading 3-byte tag is not `BPM`.
    #[error("Invalid identifier, expected ({expected}), found ({actual})")]
    InvalidIdentifier { expected: &'static str, actual: String },

    /// The container version byte is not 1.
    #[error("Unsupported container version ({0}), only version 1 is supported")]
    UnsupportedContainerVersion(u8),

    /// The masked inner version is outside the supported range.
    #[error("Unsupported inner version ({version}), must be {min}-{max}")]
    UnsupportedInnerVersion { version: u32, min: u32, max: u32 },

    /// A length-prefixed text field is malformed.
    #[error("Invalid string at byte {pos}: {reason}")]
    InvalidString { pos: u64, reason: String },

    /// The probe count field is negative.
    #[error("Invalid probe count ({0})")]
    InvalidProbeCount(i32),

    /// A record's on-disk index does not address a slot in `[0, probe_count)`.
    #[error("Invalid probe index ({index}) - Must be less than {max}")]
    IndexOutOfRange { index: i64, max: usize },

    /// A record's map info field is not an integer.
    #[error("Invalid map info ({value:?}) for probe index {index}")]
    InvalidMapInfo { index: usize, value: String },

    /// The assay type is outside {0, 1, 2}, or disagrees with address B.
    #[error("Invalid assay type ({assay_type}) for address B ({address_b}) at probe index {index}")]
    InvalidAssayType {
        index: usize,
        assay_type: u8,
        address_b: i32,
    },

    /// The raw normalization id for a probe exceeds 100.
    #[error("Invalid normalization id ({raw}) for probe {name:?} at index {index}")]
    InvalidNormalizationId { index: usize, name: String, raw: u8 },

    /// Two records claim the same index.
    #[error("Duplicate probe entry for index {index} ({name:?})")]
    DuplicateIndex { index: usize, name: String },

    /// The name inside a record differs from the name table entry at its index.
    #[error("Mismatch in names at index {index}, name table has ({expected:?}), record has ({actual:?})")]
    NameMismatch {
        index: usize,
        expected: String,
        actual: String,
    },
}

impl BpmError {
    /// Returns the probe index the error refers to, if any.
    pub fn probe_index(&self) -> Option<usize> {
        match self {
            Self::InvalidMapInfo { index, .. }
            | Self::InvalidAssayType { index, .. }
            | Self::InvalidNormalizationId { index, .. }
            | Self::DuplicateIndex { index, .. }
            | Self::NameMismatch { index, .. } => Some(*index),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display_messages() {
        let err = BpmError::InvalidIdentifier {
            expected: "BPM",
            actual: "GTC".to_string(),
        };
        let display = format!("{}", err);
        assert!(display.contains("expected (BPM)"));
        assert!(display.contains("found (GTC)"));

        let err = BpmError::UnsupportedContainerVersion(2);
        let display = format!("{}", err);
        assert!(display.contains("(2)"));

        let err = BpmError::UnsupportedInnerVersion {
            version: 6,
            min: 3,
            max: 5,
        };
        let display = format!("{}", err);
        assert!(display.contains("(6)"));
        assert!(display.contains("3-5"));

        let err = BpmError::Truncated {
            section: Section::Names,
            pos: 1024,
        };
        let display = format!("{}", err);
        assert!(display.contains("names"));
        assert!(display.contains("1024"));

        let err = BpmError::InvalidAssayType {
            index: 7,
            assay_type: 0,
            address_b: 42,
        };
        let display = format!("{}", err);
        assert!(display.contains("(0)"));
        assert!(display.contains("(42)"));
        assert!(display.contains("index 7"));

        let err = BpmError::NameMismatch {
            index: 3,
            expected: "rs1".to_string(),
            actual: "rs2".to_string(),
        };
        let display = format!("{}", err);
        assert!(display.contains("\"rs1\""));
        assert!(display.contains("\"rs2\""));
    }

    #[test]
    fn test_probe_index() {
        let err = BpmError::DuplicateIndex {
            index: 9,
            name: "rs9".to_string(),
        };
        assert_eq!(err.probe_index(), Some(9));

        let err = BpmError::InvalidMapInfo {
            index: 0,
            value: "12a".to_string(),
        };
        assert_eq!(err.probe_index(), Some(0));

        let err = BpmError::UnsupportedContainerVersion(3);
        assert_eq!(err.probe_index(), None);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let bpm_err: BpmError = io_err.into();

        match bpm_err {
            BpmError::Io(inner) => {
                assert_eq!(inner.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("Expected Io variant"),
        }
    }

    #[test]
    fn test_error_source_chain() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Access denied");
        let bpm_err = BpmError::Io(io_err);

        let source = bpm_err.source();
        assert!(source.is_some());

        if let Some(source) = source {
            let io_source = source.downcast_ref::<std::io::Error>();
            assert!(io_source.is_some());
            assert_eq!(
                io_source.unwrap().kind(),
                std::io::ErrorKind::PermissionDenied
            );
        }
    }

    #[test]
    fn test_error_send_sync() {
        fn is_send<T: Send>() {}
        fn is_sync<T: Sync>() {}

        is_send::<BpmError>();
        is_sync::<BpmError>();
    }
}
