use std::collections::BTreeSet;
use std::io::Read;

use crate::{Header, ProbeRecord, Reader};

/// A fully decoded and validated bead pool manifest.
///
/// Probes are stored by their zero-based index, so `probes()[i].index == i`.
/// The value is immutable once decoded.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Manifest {
    header: Header,
    probes: Vec<ProbeRecord>,
    /// Raw normalization ids in on-disk order
    raw_normalization_ids: Vec<u8>,
    /// Composite normalization ids by probe index
    normalization_ids: Vec<u16>,
    unique_normalization_ids: BTreeSet<u16>,
}
impl Manifest {
    pub(crate) fn new(
        header: Header,
        probes: Vec<ProbeRecord>,
        raw_normalization_ids: Vec<u8>,
        normalization_ids: Vec<u16>,
        unique_normalization_ids: BTreeSet<u16>,
    ) -> Self {
        Self {
            header,
            probes,
            raw_normalization_ids,
            normalization_ids,
            unique_normalization_ids,
        }
    }

    /// Decodes a manifest from a byte stream, consuming the stream.
    pub fn from_reader<R: Read>(reader: R) -> crate::Result<Self> {
        Reader::new(reader).map(Reader::into_manifest)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }
    pub fn probe_count(&self) -> usize {
        self.probes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
    pub fn probes(&self) -> &[ProbeRecord] {
        &self.probes
    }
    pub fn probe(&self, index: usize) -> Option<&ProbeRecord> {
        self.probes.get(index)
    }
    /// Linear lookup by variant name.
    pub fn probe_by_name(&self, name: &str) -> Option<&ProbeRecord> {
        self.probes.iter().find(|probe| probe.name == name)
    }
    pub fn iter(&self) -> std::slice::Iter<'_, ProbeRecord> {
        self.probes.iter()
    }
    /// Composite normalization id of every probe, by probe index.
    pub fn normalization_ids(&self) -> &[u16] {
        &self.normalization_ids
    }
    /// Normalization ids exactly as stored on disk, before assay-type folding.
    pub fn raw_normalization_ids(&self) -> &[u8] {
        &self.raw_normalization_ids
    }
    /// Distinct composite normalization ids in ascending order.
    pub fn unique_normalization_ids(&self) -> &BTreeSet<u16> {
        &self.unique_normalization_ids
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ProbeRecord;
    type IntoIter = std::slice::Iter<'a, ProbeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{ManifestBuilder, ProbeSpec};
    use std::io::Cursor;

    fn build_manifest() -> Manifest {
        let bytes = ManifestBuilder::new()
            .probe(ProbeSpec::new("rs10", 1).one_color(2, 555).raw_norm_id(7))
            .probe(ProbeSpec::new("rs20", 0).raw_norm_id(3))
            .build();
        Manifest::from_reader(Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn test_accessors() {
        let manifest = build_manifest();
        assert_eq!(manifest.probe_count(), 2);
        assert!(!manifest.is_empty());
        assert_eq!(manifest.probe(0).unwrap().name, "rs20");
        assert_eq!(manifest.probe(1).unwrap().name, "rs10");
        assert!(manifest.probe(2).is_none());
        assert_eq!(manifest.probe_by_name("rs10").unwrap().index, 1);
        assert!(manifest.probe_by_name("rs30").is_none());
    }

    #[test]
    fn test_normalization_tables_are_separate() {
        let manifest = build_manifest();
        // raw table is on-disk order, composite table is by probe index
        assert_eq!(manifest.raw_normalization_ids(), &[3, 7]);
        assert_eq!(manifest.normalization_ids(), &[3, 207]);
        let unique: Vec<u16> = manifest.unique_normalization_ids().iter().copied().collect();
        assert_eq!(unique, vec![3, 207]);
    }

    #[test]
    fn test_iteration_order() {
        let manifest = build_manifest();
        let indices: Vec<usize> = manifest.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 1]);
        let names: Vec<&str> = (&manifest).into_iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["rs20", "rs10"]);
    }
}
