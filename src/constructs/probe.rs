use crate::BpmError;

/// First per-record version that carries base fractions.
pub const FRACTIONS_VERSION: i32 = 7;
/// The only per-record version that carries a reference strand.
pub const REF_STRAND_VERSION: i32 = 8;
/// Raw normalization ids above this are rejected.
pub const MAX_RAW_NORMALIZATION_ID: u8 = 100;
/// Spacing between assay types in the composite normalization id.
pub const ASSAY_TYPE_STRIDE: u16 = 100;

/// Probe chemistry, which fixes whether a second bead address exists.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum AssayType {
    /// Two-color assay, single address.
    InfiniumII = 0,
    /// One-color assay on the A/T channel.
    InfiniumIAT = 1,
    /// One-color assay on the G/C channel.
    InfiniumIGC = 2,
}
impl AssayType {
    pub fn code(self) -> u8 {
        self as u8
    }
    pub fn has_address_b(self) -> bool {
        self != AssayType::InfiniumII
    }
}
impl TryFrom<u8> for AssayType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AssayType::InfiniumII),
            1 => Ok(AssayType::InfiniumIAT),
            2 => Ok(AssayType::InfiniumIGC),
            other => Err(other),
        }
    }
}

/// Per-base fractions carried by records of version 7 and later.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaseFractions {
    pub a: f32,
    pub c: f32,
    pub t: f32,
    pub g: f32,
}

/// Optional trailing fields of a record, selected by its own version.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecordTail {
    #[default]
    Plain,
    Fractions(BaseFractions),
    FractionsAndRefStrand {
        fractions: BaseFractions,
        ref_strand: String,
    },
}

/// Which trailing fields a record version carries.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TailLayout {
    Plain,
    Fractions,
    FractionsAndRefStrand,
}

impl RecordTail {
    /// Negative versions carry no trailing fields.
    pub fn layout_for_version(version: i32) -> TailLayout {
        if version == REF_STRAND_VERSION {
            TailLayout::FractionsAndRefStrand
        } else if version >= FRACTIONS_VERSION {
            TailLayout::Fractions
        } else {
            TailLayout::Plain
        }
    }
    pub fn fractions(&self) -> Option<&BaseFractions> {
        match self {
            Self::Plain => None,
            Self::Fractions(fractions) | Self::FractionsAndRefStrand { fractions, .. } => {
                Some(fractions)
            }
        }
    }
    pub fn ref_strand(&self) -> Option<&str> {
        match self {
            Self::FractionsAndRefStrand { ref_strand, .. } => Some(ref_strand),
            _ => None,
        }
    }
}

/// A single locus entry of the manifest.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProbeRecord {
    pub record_version: i32,
    pub probe_id: String, // IlmnID
    pub name: String, // variant name, matches the name table
    pub index: usize, // zero-based slot
    pub ilmn_strand: String,
    pub snp_alleles: String, // e.g. "[A/C]"
    pub chromosome: String,
    pub ploidy: String,
    pub species: String,
    pub map_info: i32, // genomic position
    pub customer_strand: String,
    pub address_a: i32,
    pub address_b: i32, // 0 iff assay type is InfiniumII
    pub genome_build: String,
    pub source: String,
    pub source_version: String,
    pub source_strand: String,
    pub expected_clusters: u8,
    pub intensity_only: u8,
    pub assay_type: AssayType,
    pub tail: RecordTail,
    pub normalization_id: u16, // raw id + 100 * assay type
}
impl ProbeRecord {
    /// Composite normalization id for a raw id under the given assay type.
    pub fn composite_normalization_id(raw: u8, assay_type: AssayType) -> u16 {
        u16::from(raw) + ASSAY_TYPE_STRIDE * u16::from(assay_type.code())
    }

    /// Checks the assay type code against address B and returns the typed assay.
    pub fn validate_assay(
        index: usize,
        assay_code: u8,
        address_b: i32,
    ) -> crate::Result<AssayType> {
        let invalid = || BpmError::InvalidAssayType {
            index,
            assay_type: assay_code,
            address_b,
        };
        let assay_type = AssayType::try_from(assay_code).map_err(|_| invalid())?;
        if assay_type.has_address_b() != (address_b != 0) {
            return Err(invalid());
        }
        Ok(assay_type)
    }

    pub fn validate_raw_normalization_id(&self, raw: u8) -> crate::Result<()> {
        if raw > MAX_RAW_NORMALIZATION_ID {
            return Err(BpmError::InvalidNormalizationId {
                index: self.index,
                name: self.name.clone(),
                raw,
            });
        }
        Ok(())
    }

    pub fn fractions(&self) -> Option<&BaseFractions> {
        self.tail.fractions()
    }
    pub fn ref_strand(&self) -> Option<&str> {
        self.tail.ref_strand()
    }
    pub fn has_address_b(&self) -> bool {
        self.address_b != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assay_type_codes() {
        assert_eq!(AssayType::try_from(0), Ok(AssayType::InfiniumII));
        assert_eq!(AssayType::try_from(1), Ok(AssayType::InfiniumIAT));
        assert_eq!(AssayType::try_from(2), Ok(AssayType::InfiniumIGC));
        assert_eq!(AssayType::try_from(3), Err(3));
        assert!(!AssayType::InfiniumII.has_address_b());
        assert!(AssayType::InfiniumIGC.has_address_b());
    }

    #[test]
    fn test_composite_normalization_id() {
        for raw in 0..=MAX_RAW_NORMALIZATION_ID {
            for code in 0..=2u8 {
                let assay = AssayType::try_from(code).unwrap();
                assert_eq!(
                    ProbeRecord::composite_normalization_id(raw, assay),
                    u16::from(raw) + 100 * u16::from(code)
                );
            }
        }
        assert_eq!(
            ProbeRecord::composite_normalization_id(100, AssayType::InfiniumIGC),
            300
        );
    }

    #[test]
    fn test_validate_assay() {
        assert_eq!(
            ProbeRecord::validate_assay(0, 0, 0).unwrap(),
            AssayType::InfiniumII
        );
        assert_eq!(
            ProbeRecord::validate_assay(0, 1, 17).unwrap(),
            AssayType::InfiniumIAT
        );
        assert!(matches!(
            ProbeRecord::validate_assay(4, 0, 17),
            Err(BpmError::InvalidAssayType { index: 4, .. })
        ));
        assert!(matches!(
            ProbeRecord::validate_assay(5, 2, 0),
            Err(BpmError::InvalidAssayType { index: 5, .. })
        ));
        assert!(matches!(
            ProbeRecord::validate_assay(6, 3, 17),
            Err(BpmError::InvalidAssayType { assay_type: 3, .. })
        ));
    }

    #[test]
    fn test_tail_layout() {
        assert_eq!(RecordTail::layout_for_version(4), TailLayout::Plain);
        assert_eq!(RecordTail::layout_for_version(6), TailLayout::Plain);
        assert_eq!(RecordTail::layout_for_version(7), TailLayout::Fractions);
        assert_eq!(
            RecordTail::layout_for_version(8),
            TailLayout::FractionsAndRefStrand
        );
        assert_eq!(RecordTail::layout_for_version(9), TailLayout::Fractions);
        assert_eq!(RecordTail::layout_for_version(-1), TailLayout::Plain);
        assert_eq!(RecordTail::layout_for_version(i32::MIN), TailLayout::Plain);
    }

    #[test]
    fn test_tail_accessors() {
        let fractions = BaseFractions {
            a: 0.1,
            c: 0.2,
            t: 0.3,
            g: 0.4,
        };
        assert!(RecordTail::Plain.fractions().is_none());
        assert_eq!(
            RecordTail::Fractions(fractions).fractions(),
            Some(&fractions)
        );
        assert!(RecordTail::Fractions(fractions).ref_strand().is_none());
        let tail = RecordTail::FractionsAndRefStrand {
            fractions,
            ref_strand: "+".to_string(),
        };
        assert_eq!(tail.fractions(), Some(&fractions));
        assert_eq!(tail.ref_strand(), Some("+"));
    }
}
