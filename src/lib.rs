//! # bpm - Decoder for Illumina Bead Pool Manifests
//!
//! `bpm` is a Rust library for decoding the binary bead pool manifest (BPM) that
//! describes the fixed content of an Illumina genotyping array: which probes exist,
//! where they map on the genome, and which normalization group each probe belongs to.
//! Downstream tools use the decoded manifest to interpret raw per-sample intensity files.
//!
//! Decoding is a single validated pass. A manifest is either fully decoded and
//! internally consistent, or rejected with a [`BpmError`].
//!
//! ## Format Specification
//!
//! All integers are little-endian. Text fields are prefixed by a 7-bit
//! variable-length byte count.
//!
//! ### Header
//! - Identifier: 3 bytes, `"BPM"`
//! - Container version: 1 byte, must be 1
//! - Inner version: `u32`, flag bit `0x1000` masked off, must be 3-5
//! - Manifest name: text
//! - Control config: text
//! - Probe count: `i32`
//!
//! ### Probe tables
//! - Index block: `4 * probe_count` bytes (skipped)
//! - Names: `probe_count` text fields, by probe index
//! - Normalization ids: `probe_count` bytes, by probe index
//! - Records: `probe_count` locus entries, each with its own version. Versions 7
//!   and later carry base fractions; version 8 also carries a reference strand.
//!
//! ### Normalization ids
//!
//! Each probe's composite normalization id is its raw id (at most 100) plus
//! `100 * assay_type`, so groups stay distinct across assay types.
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use bpm::{load_manifest, AssayType};
//!
//! # fn main() -> bpm::Result<()> {
//! let manifest = load_manifest("GSA-24v3-0_A1.bpm")?;
//!
//! println!("{}: {} probes", manifest.header().manifest_name, manifest.probe_count());
//!
//! let two_color = manifest
//!     .iter()
//!     .filter(|probe| probe.assay_type == AssayType::InfiniumII)
//!     .count();
//! println!("{two_color} two-color probes");
//!
//! for id in manifest.unique_normalization_ids() {
//!     println!("normalization group {id}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Comparing Manifests
//!
//! ```rust,no_run
//! use bpm::{compare_manifests, load_manifest};
//!
//! # fn main() -> bpm::Result<()> {
//! let left = load_manifest("array_A1.bpm")?;
//! let right = load_manifest("array_A2.bpm")?;
//! let report = compare_manifests(&left, &right);
//! if !report.is_identical() {
//!     for mismatch in report.mismatches() {
//!         eprintln!("{mismatch}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All operations return `Result<T, BpmError>`. Format errors name the offending
//! value and, where applicable, the probe index:
//!
//! ```rust
//! use bpm::{BpmError, Reader};
//! use std::io::Cursor;
//!
//! # fn main() {
//! let cursor = Cursor::new(b"BPM\x02".to_vec());
//!
//! match Reader::new(cursor) {
//!     Err(BpmError::UnsupportedContainerVersion(version)) => {
//!         println!("Unsupported container version {version}");
//!     }
//!     Err(e) => println!("Other error: {}", e),
//!     Ok(_) => unreachable!(),
//! }
//! # }
//! ```

mod compare;
mod constructs;
mod error;
mod io;

#[cfg(test)]
mod testutil;

pub use compare::{
    compare_manifests, Comparator, ComparisonReport, Field, Mismatch, DEFAULT_IGNORED,
};
pub use constructs::{
    AssayType, BaseFractions, Header, Manifest, ProbeRecord, RecordTail, TailLayout,
    ASSAY_TYPE_STRIDE, CONTAINER_VERSION, FRACTIONS_VERSION, IDENTIFIER, IDENTIFIER_LEN,
    MAX_INNER_VERSION, MAX_RAW_NORMALIZATION_ID, MIN_INNER_VERSION, REF_STRAND_VERSION,
    VERSION_FLAG,
};
pub use error::{BpmError, Result};
pub use io::{load_manifest, PrimitiveReader, Reader, Section};
