//! Decoder for BPM manifests.
//!
//! Decoding is a single forward pass over the stream through a fixed sequence
//! of sections (see [`Section`]). Any validation failure abandons the decode;
//! no partial manifest is ever returned. The stream is owned by the decode and
//! dropped on every exit path.

use std::{
    collections::BTreeSet,
    fmt,
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

use tracing::debug;

use super::primitive::PrimitiveReader;
use crate::{
    BaseFractions, BpmError, Header, Manifest, ProbeRecord, RecordTail, TailLayout,
    IDENTIFIER_LEN,
};

type BoxedReader = Box<dyn Read + Send>;

/// Upper bound on eager allocation driven by the on-disk probe count.
const MAX_PREALLOC: usize = 1 << 16;

/// The sections of a manifest, in decode order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Section {
    Header,
    IndexBlock,
    Names,
    NormalizationIds,
    Records,
}
impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Header => "header",
            Section::IndexBlock => "index block",
            Section::Names => "names",
            Section::NormalizationIds => "normalization ids",
            Section::Records => "records",
        };
        f.write_str(name)
    }
}

/// A decoded BPM manifest together with decode statistics.
///
/// Construction reads and validates the whole manifest; there is no lazy or
/// streaming access to individual records.
///
/// # Examples
///
/// ```rust,no_run
/// use bpm::Reader;
///
/// # fn main() -> bpm::Result<()> {
/// let reader = Reader::from_path("GSA-24v3-0_A1.bpm")?;
/// let manifest = reader.manifest();
/// println!("{} probes", manifest.probe_count());
/// println!("{} normalization groups", manifest.unique_normalization_ids().len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Reader {
    manifest: Manifest,

    /// Bytes consumed from the stream to decode the manifest
    bytes_read: u64,
}
impl Reader {
    /// Decodes a manifest from the given data source.
    ///
    /// The source is consumed and dropped before this returns, whether or not
    /// decoding succeeds. Bytes following the last probe record are ignored.
    ///
    /// # Arguments
    ///
    /// * `inner` - The data source to read from, positioned at the `"BPM"` tag
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The stream ends before the last record ([`BpmError::Truncated`])
    /// - The header is invalid (identifier, container version or inner version)
    /// - A text field is malformed ([`BpmError::InvalidString`])
    /// - Any table or record check fails (index range, assay type, normalization
    ///   id, duplicate index, name mismatch, map info)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bpm::Reader;
    /// use std::io::Cursor;
    ///
    /// # fn main() -> bpm::Result<()> {
    /// // An empty version 4 manifest named "demo"
    /// let bytes = b"BPM\x01\x04\x00\x00\x00\x04demo\x00\x00\x00\x00\x00";
    /// let reader = Reader::new(Cursor::new(bytes))?;
    ///
    /// assert_eq!(reader.manifest().header().manifest_name, "demo");
    /// assert_eq!(reader.manifest().probe_count(), 0);
    /// assert_eq!(reader.bytes_read(), bytes.len() as u64);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new<R: Read>(inner: R) -> crate::Result<Self> {
        let mut decoder = Decoder::new(inner);
        let manifest = decoder.decode().map_err(|e| decoder.annotate(e))?;
        Ok(Self {
            manifest,
            bytes_read: decoder.rdr.position(),
        })
    }

    /// Returns the decoded manifest.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bpm::Reader;
    /// use std::io::Cursor;
    ///
    /// # fn main() -> bpm::Result<()> {
    /// let bytes = b"BPM\x01\x04\x00\x00\x00\x04demo\x00\x00\x00\x00\x00";
    /// let reader = Reader::new(Cursor::new(bytes))?;
    ///
    /// let manifest = reader.manifest();
    /// assert_eq!(manifest.header().inner_version, 4);
    /// assert!(manifest.unique_normalization_ids().is_empty());
    /// # Ok(())
    /// # }
    /// ```
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Consumes the reader and returns the decoded manifest.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bpm::{Manifest, Reader};
    /// use std::io::Cursor;
    ///
    /// # fn main() -> bpm::Result<()> {
    /// let bytes = b"BPM\x01\x04\x00\x00\x00\x04demo\x00\x00\x00\x00\x00";
    /// let manifest: Manifest = Reader::new(Cursor::new(bytes))?.into_manifest();
    ///
    /// assert_eq!(manifest.probe_count(), 0);
    /// # Ok(())
    /// # }
    /// ```
    pub fn into_manifest(self) -> Manifest {
        self.manifest
    }

    /// Number of bytes consumed up to the end of the last probe record.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Decodes a manifest from a file path.
    ///
    /// Compressed manifests (gzip, zstd, ...) are decompressed transparently
    /// when the `niffler` feature is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be opened ([`BpmError::Io`])
    /// - The compression format cannot be detected (`BpmError::Niffler`)
    /// - Decoding fails for any reason listed on [`Reader::new`]
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use bpm::Reader;
    ///
    /// # fn main() -> bpm::Result<()> {
    /// let reader = Reader::from_path("GSA-24v3-0_A1.bpm.gz")?;
    /// println!("{} bytes decoded", reader.bytes_read());
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let rdr = File::open(path).map(BufReader::new)?;

        #[cfg(feature = "niffler")]
        {
            let (pt, _format) = niffler::send::get_reader(Box::new(rdr))?;
            Self::new(pt)
        }
        #[cfg(not(feature = "niffler"))]
        {
            Self::new(rdr)
        }
    }

    /// Decodes a manifest from standard input.
    ///
    /// Standard input is read until the last probe record; anything piped
    /// after it is left unread. Compressed input is handled as in
    /// [`Reader::from_path`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Reading standard input fails ([`BpmError::Io`])
    /// - The compression format cannot be detected (`BpmError::Niffler`)
    /// - Decoding fails for any reason listed on [`Reader::new`]
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use bpm::Reader;
    ///
    /// # fn main() -> bpm::Result<()> {
    /// // zcat GSA-24v3-0_A1.bpm.gz | my-tool
    /// let manifest = Reader::from_stdin()?.into_manifest();
    /// println!("{}", manifest.header().manifest_name);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_stdin() -> crate::Result<Self> {
        let rdr: BoxedReader = Box::new(io::stdin());

        #[cfg(feature = "niffler")]
        {
            let (pt, _format) = niffler::send::get_reader(rdr)?;
            Self::new(pt)
        }
        #[cfg(not(feature = "niffler"))]
        {
            Self::new(rdr)
        }
    }

    /// Decodes from the path if one is given, otherwise from standard input.
    ///
    /// # Errors
    ///
    /// See [`Reader::from_path`] and [`Reader::from_stdin`].
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use bpm::Reader;
    ///
    /// # fn main() -> bpm::Result<()> {
    /// let path: Option<String> = std::env::args().nth(1);
    /// let reader = Reader::from_optional_path(path)?;
    /// println!("{} probes", reader.manifest().probe_count());
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_optional_path<P: AsRef<Path>>(path: Option<P>) -> crate::Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::from_stdin(),
        }
    }
}

/// Loads and validates the manifest at `path`.
///
/// # Examples
///
/// ```rust,no_run
/// use bpm::load_manifest;
///
/// # fn main() -> bpm::Result<()> {
/// let manifest = load_manifest("GSA-24v3-0_A1.bpm")?;
/// for probe in &manifest {
///     println!("{}\t{}\t{}", probe.name, probe.chromosome, probe.map_info);
/// }
/// # Ok(())
/// # }
/// ```
pub fn load_manifest<P: AsRef<Path>>(path: P) -> crate::Result<Manifest> {
    Reader::from_path(path).map(Reader::into_manifest)
}

struct Decoder<R: Read> {
    rdr: PrimitiveReader<R>,
    section: Section,
}
impl<R: Read> Decoder<R> {
    fn new(inner: R) -> Self {
        Self {
            rdr: PrimitiveReader::new(inner),
            section: Section::Header,
        }
    }

    /// Attaches the current section to an early end of stream.
    fn annotate(&self, err: BpmError) -> BpmError {
        match err {
            BpmError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => BpmError::Truncated {
                section: self.section,
                pos: self.rdr.position(),
            },
            other => other,
        }
    }

    fn decode(&mut self) -> crate::Result<Manifest> {
        let header = self.decode_header()?;
        debug!(
            name = %header.manifest_name,
            inner_version = header.inner_version,
            "accepted BPM header"
        );

        let raw_count = self.rdr.read_i32()?;
        let count = usize::try_from(raw_count).map_err(|_| BpmError::InvalidProbeCount(raw_count))?;

        self.section = Section::IndexBlock;
        self.rdr.skip(4 * count as u64)?;

        self.section = Section::Names;
        let names = self.read_names(count)?;

        self.section = Section::NormalizationIds;
        let mut raw_normalization_ids = vec![0u8; count];
        self.rdr.read_exact(&mut raw_normalization_ids)?;

        self.section = Section::Records;
        let mut slots: Vec<Option<ProbeRecord>> = Vec::with_capacity(count);
        slots.resize_with(count, || None);
        let mut normalization_ids = vec![0u16; count];
        let mut unique_normalization_ids = BTreeSet::new();

        for _ in 0..count {
            let mut probe = self.read_record(count)?;
            let index = probe.index;

            let raw = raw_normalization_ids[index];
            probe.validate_raw_normalization_id(raw)?;
            probe.normalization_id = ProbeRecord::composite_normalization_id(raw, probe.assay_type);
            normalization_ids[index] = probe.normalization_id;

            if slots[index].is_some() {
                return Err(BpmError::DuplicateIndex {
                    index,
                    name: probe.name,
                });
            }
            if names[index] != probe.name {
                return Err(BpmError::NameMismatch {
                    index,
                    expected: names[index].clone(),
                    actual: probe.name,
                });
            }
            unique_normalization_ids.insert(probe.normalization_id);
            slots[index] = Some(probe);
        }

        // Exactly `count` records were read, each into a distinct in-range slot,
        // so every slot is filled.
        let probes: Vec<ProbeRecord> = slots.into_iter().flatten().collect();
        debug_assert_eq!(probes.len(), count);

        debug!(
            probes = probes.len(),
            groups = unique_normalization_ids.len(),
            bytes = self.rdr.position(),
            "decoded BPM manifest"
        );
        Ok(Manifest::new(
            header,
            probes,
            raw_normalization_ids,
            normalization_ids,
            unique_normalization_ids,
        ))
    }

    fn decode_header(&mut self) -> crate::Result<Header> {
        let mut tag = [0u8; IDENTIFIER_LEN];
        self.rdr.read_exact(&mut tag)?;
        let identifier = String::from_utf8_lossy(&tag).into_owned();
        Header::validate_identifier(&identifier)?;

        let container_version = self.rdr.read_u8()?;
        Header::validate_container_version(container_version)?;

        let (inner_version, version_flag) = Header::split_inner_version(self.rdr.read_u32()?);
        Header::validate_inner_version(inner_version)?;

        let manifest_name = self.rdr.read_string()?;
        let control_config = if Header::has_control_config(inner_version) {
            Some(self.rdr.read_string()?)
        } else {
            None
        };

        Ok(Header {
            identifier,
            container_version,
            inner_version,
            version_flag,
            manifest_name,
            control_config,
        })
    }

    fn read_names(&mut self, count: usize) -> crate::Result<Vec<String>> {
        let mut names = Vec::with_capacity(count.min(MAX_PREALLOC));
        for _ in 0..count {
            names.push(self.rdr.read_string()?);
        }
        Ok(names)
    }

    /// Reads one locus entry and checks its index and assay fields.
    ///
    /// The composite normalization id is left at zero for the caller to fill.
    fn read_record(&mut self, count: usize) -> crate::Result<ProbeRecord> {
        let rdr = &mut self.rdr;
        let record_version = rdr.read_i32()?;
        let probe_id = rdr.read_string()?;
        let name = rdr.read_string()?;
        for _ in 0..3 {
            rdr.skip_string()?;
        }

        let disk_index = i64::from(rdr.read_i32()?) - 1;
        let index = usize::try_from(disk_index)
            .ok()
            .filter(|&index| index < count)
            .ok_or(BpmError::IndexOutOfRange {
                index: disk_index,
                max: count,
            })?;

        rdr.skip_string()?;
        let ilmn_strand = rdr.read_string()?;
        let snp_alleles = rdr.read_string()?;
        let chromosome = rdr.read_string()?;
        let ploidy = rdr.read_string()?;
        let species = rdr.read_string()?;
        let map_text = rdr.read_string()?;
        let map_info = map_text
            .parse::<i32>()
            .map_err(|_| BpmError::InvalidMapInfo {
                index,
                value: map_text.clone(),
            })?;
        rdr.skip_string()?;
        let customer_strand = rdr.read_string()?;
        let address_a = rdr.read_i32()?;
        let address_b = rdr.read_i32()?;
        rdr.skip_string()?;
        rdr.skip_string()?;
        let genome_build = rdr.read_string()?;
        let source = rdr.read_string()?;
        let source_version = rdr.read_string()?;
        let source_strand = rdr.read_string()?;
        rdr.skip_string()?;
        rdr.read_u8()?;
        let expected_clusters = rdr.read_u8()?;
        let intensity_only = rdr.read_u8()?;
        let assay_code = rdr.read_u8()?;

        let tail = match RecordTail::layout_for_version(record_version) {
            TailLayout::Plain => RecordTail::Plain,
            TailLayout::Fractions => RecordTail::Fractions(Self::read_fractions(rdr)?),
            TailLayout::FractionsAndRefStrand => RecordTail::FractionsAndRefStrand {
                fractions: Self::read_fractions(rdr)?,
                ref_strand: rdr.read_string()?,
            },
        };

        let assay_type = ProbeRecord::validate_assay(index, assay_code, address_b)?;

        Ok(ProbeRecord {
            record_version,
            probe_id,
            name,
            index,
            ilmn_strand,
            snp_alleles,
            chromosome,
            ploidy,
            species,
            map_info,
            customer_strand,
            address_a,
            address_b,
            genome_build,
            source,
            source_version,
            source_strand,
            expected_clusters,
            intensity_only,
            assay_type,
            tail,
            normalization_id: 0,
        })
    }

    fn read_fractions(rdr: &mut PrimitiveReader<R>) -> io::Result<BaseFractions> {
        Ok(BaseFractions {
            a: rdr.read_f32()?,
            c: rdr.read_f32()?,
            t: rdr.read_f32()?,
            g: rdr.read_f32()?,
        })
    }
}
