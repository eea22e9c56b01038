mod header;
mod manifest;
mod probe;

pub use header::{
    Header, CONTAINER_VERSION, IDENTIFIER, IDENTIFIER_LEN, MAX_INNER_VERSION, MIN_INNER_VERSION,
    VERSION_FLAG,
};
pub use manifest::Manifest;
pub use probe::{
    AssayType, BaseFractions, ProbeRecord, RecordTail, TailLayout, ASSAY_TYPE_STRIDE,
    FRACTIONS_VERSION, MAX_RAW_NORMALIZATION_ID, REF_STRAND_VERSION,
};
