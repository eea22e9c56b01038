//! Field-by-field comparison of two decoded manifests.
//!
//! Every comparable field is listed in [`Field`]. Fields on the comparator's
//! ignore list are skipped. Version fields and version-gated fields never
//! produce mismatches: drift in format version alone does not indicate
//! corruption, so those differences are logged as warnings instead.

use std::{collections::BTreeSet, fmt};

use tracing::{info, warn};

use crate::{Manifest, ProbeRecord};

/// Fields excluded from comparison unless overridden.
///
/// Manifests carry no run-dependent values such as timestamps, so nothing is
/// excluded by default.
pub const DEFAULT_IGNORED: &[Field] = &[];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Identifier,
    ContainerVersion,
    InnerVersion,
    ManifestName,
    ControlConfig,
    ProbeCount,
    RecordVersion,
    ProbeId,
    Name,
    Index,
    IlmnStrand,
    SnpAlleles,
    Chromosome,
    Ploidy,
    Species,
    MapInfo,
    CustomerStrand,
    AddressA,
    AddressB,
    GenomeBuild,
    Source,
    SourceVersion,
    SourceStrand,
    ExpectedClusters,
    IntensityOnly,
    AssayType,
    Fractions,
    RefStrand,
    NormalizationId,
    RawNormalizationIds,
    NormalizationIds,
    UniqueNormalizationIds,
}
impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Identifier => "identifier",
            Field::ContainerVersion => "container_version",
            Field::InnerVersion => "inner_version",
            Field::ManifestName => "manifest_name",
            Field::ControlConfig => "control_config",
            Field::ProbeCount => "probe_count",
            Field::RecordVersion => "record_version",
            Field::ProbeId => "probe_id",
            Field::Name => "name",
            Field::Index => "index",
            Field::IlmnStrand => "ilmn_strand",
            Field::SnpAlleles => "snp_alleles",
            Field::Chromosome => "chromosome",
            Field::Ploidy => "ploidy",
            Field::Species => "species",
            Field::MapInfo => "map_info",
            Field::CustomerStrand => "customer_strand",
            Field::AddressA => "address_a",
            Field::AddressB => "address_b",
            Field::GenomeBuild => "genome_build",
            Field::Source => "source",
            Field::SourceVersion => "source_version",
            Field::SourceStrand => "source_strand",
            Field::ExpectedClusters => "expected_clusters",
            Field::IntensityOnly => "intensity_only",
            Field::AssayType => "assay_type",
            Field::Fractions => "fractions",
            Field::RefStrand => "ref_strand",
            Field::NormalizationId => "normalization_id",
            Field::RawNormalizationIds => "raw_normalization_ids",
            Field::NormalizationIds => "normalization_ids",
            Field::UniqueNormalizationIds => "unique_normalization_ids",
        }
    }
}
impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A field whose values differ between the two manifests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mismatch {
    pub field: Field,
    pub message: String,
}
impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ComparisonReport {
    mismatches: Vec<Mismatch>,
    warnings: Vec<String>,
    identical: Vec<Field>,
}
impl ComparisonReport {
    pub fn is_identical(&self) -> bool {
        self.mismatches.is_empty()
    }
    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }
    /// Version drift notices; these never affect [`Self::is_identical`].
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
    pub fn identical_fields(&self) -> &[Field] {
        &self.identical
    }
    pub fn mismatch(&self, field: Field) -> Option<&Mismatch> {
        self.mismatches.iter().find(|m| m.field == field)
    }

    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }
    fn finish(&mut self, field: Field, errors: Vec<String>) {
        if errors.is_empty() {
            info!("{field} IDENTICAL");
            self.identical.push(field);
        } else {
            self.mismatches
                .extend(errors.into_iter().map(|message| Mismatch { field, message }));
        }
    }
}

/// Compares manifests field by field, skipping an explicit set of fields.
///
/// # Examples
///
/// ```rust,no_run
/// use bpm::{load_manifest, Comparator, Field};
///
/// # fn main() -> bpm::Result<()> {
/// let left = load_manifest("array_A1.bpm")?;
/// let right = load_manifest("array_A2.bpm")?;
///
/// let report = Comparator::new().ignore(Field::ManifestName).compare(&left, &right);
/// for mismatch in report.mismatches() {
///     eprintln!("{mismatch}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Comparator {
    ignored: BTreeSet<Field>,
}
impl Default for Comparator {
    fn default() -> Self {
        Self::new()
    }
}
impl Comparator {
    pub fn new() -> Self {
        Self {
            ignored: DEFAULT_IGNORED.iter().copied().collect(),
        }
    }
    pub fn ignore(mut self, field: Field) -> Self {
        self.ignored.insert(field);
        self
    }
    pub fn is_ignored(&self, field: Field) -> bool {
        self.ignored.contains(&field)
    }

    pub fn compare(&self, left: &Manifest, right: &Manifest) -> ComparisonReport {
        let mut report = ComparisonReport::default();
        let (lh, rh) = (left.header(), right.header());

        self.scalar(&mut report, Field::Identifier, &lh.identifier, &rh.identifier);
        self.version(
            &mut report,
            Field::ContainerVersion,
            lh.container_version,
            rh.container_version,
        );
        self.version(&mut report, Field::InnerVersion, lh.inner_version, rh.inner_version);
        self.scalar(&mut report, Field::ManifestName, &lh.manifest_name, &rh.manifest_name);
        self.optional(
            &mut report,
            Field::ControlConfig,
            lh.control_config.as_ref(),
            rh.control_config.as_ref(),
        );
        self.scalar(
            &mut report,
            Field::ProbeCount,
            left.probe_count(),
            right.probe_count(),
        );

        self.record_versions(&mut report, left.probes(), right.probes());
        let (lp, rp) = (left.probes(), right.probes());
        self.probes(&mut report, Field::ProbeId, lp, rp, |p| &p.probe_id);
        self.probes(&mut report, Field::Name, lp, rp, |p| &p.name);
        self.probes(&mut report, Field::Index, lp, rp, |p| p.index);
        self.probes(&mut report, Field::IlmnStrand, lp, rp, |p| &p.ilmn_strand);
        self.probes(&mut report, Field::SnpAlleles, lp, rp, |p| &p.snp_alleles);
        self.probes(&mut report, Field::Chromosome, lp, rp, |p| &p.chromosome);
        self.probes(&mut report, Field::Ploidy, lp, rp, |p| &p.ploidy);
        self.probes(&mut report, Field::Species, lp, rp, |p| &p.species);
        self.probes(&mut report, Field::MapInfo, lp, rp, |p| p.map_info);
        self.probes(&mut report, Field::CustomerStrand, lp, rp, |p| &p.customer_strand);
        self.probes(&mut report, Field::AddressA, lp, rp, |p| p.address_a);
        self.probes(&mut report, Field::AddressB, lp, rp, |p| p.address_b);
        self.probes(&mut report, Field::GenomeBuild, lp, rp, |p| &p.genome_build);
        self.probes(&mut report, Field::Source, lp, rp, |p| &p.source);
        self.probes(&mut report, Field::SourceVersion, lp, rp, |p| &p.source_version);
        self.probes(&mut report, Field::SourceStrand, lp, rp, |p| &p.source_strand);
        self.probes(&mut report, Field::ExpectedClusters, lp, rp, |p| p.expected_clusters);
        self.probes(&mut report, Field::IntensityOnly, lp, rp, |p| p.intensity_only);
        self.probes(&mut report, Field::AssayType, lp, rp, |p| p.assay_type);
        self.gated_probes(&mut report, Field::Fractions, lp, rp, |l, r| {
            match (l.fractions(), r.fractions()) {
                (Some(a), Some(b)) => Some(
                    float_eq(a.a, b.a)
                        && float_eq(a.c, b.c)
                        && float_eq(a.t, b.t)
                        && float_eq(a.g, b.g),
                ),
                (None, None) => Some(true),
                _ => None,
            }
        });
        self.gated_probes(&mut report, Field::RefStrand, lp, rp, |l, r| {
            match (l.ref_strand(), r.ref_strand()) {
                (Some(a), Some(b)) => Some(a == b),
                (None, None) => Some(true),
                _ => None,
            }
        });
        self.probes(&mut report, Field::NormalizationId, lp, rp, |p| p.normalization_id);

        self.sequence(
            &mut report,
            Field::RawNormalizationIds,
            left.raw_normalization_ids(),
            right.raw_normalization_ids(),
        );
        self.sequence(
            &mut report,
            Field::NormalizationIds,
            left.normalization_ids(),
            right.normalization_ids(),
        );
        self.unique_ids(&mut report, left, right);

        report
    }

    fn scalar<T: PartialEq + fmt::Debug>(
        &self,
        report: &mut ComparisonReport,
        field: Field,
        left: T,
        right: T,
    ) {
        if self.is_ignored(field) {
            return;
        }
        let mut errors = Vec::new();
        if left != right {
            errors.push(format!("{field} does not match ( {left:?} vs {right:?} )"));
        }
        report.finish(field, errors);
    }

    fn version<T: PartialEq + fmt::Display>(
        &self,
        report: &mut ComparisonReport,
        field: Field,
        left: T,
        right: T,
    ) {
        if self.is_ignored(field) {
            return;
        }
        if left != right {
            report.warn(format!("{field} does not match ( {left} vs {right} )"));
        }
    }

    fn optional<T: PartialEq + fmt::Debug>(
        &self,
        report: &mut ComparisonReport,
        field: Field,
        left: Option<T>,
        right: Option<T>,
    ) {
        if self.is_ignored(field) {
            return;
        }
        match (left, right) {
            (Some(left), Some(right)) => self.scalar(report, field, left, right),
            (None, None) => report.finish(field, Vec::new()),
            _ => report.warn(not_in_both(field)),
        }
    }

    fn sequence<T: PartialEq>(
        &self,
        report: &mut ComparisonReport,
        field: Field,
        left: &[T],
        right: &[T],
    ) {
        if self.is_ignored(field) {
            return;
        }
        let errors = diff_counts(field, left, right, |l, r| l == r);
        report.finish(field, errors);
    }

    fn probes<'a, T, F>(
        &self,
        report: &mut ComparisonReport,
        field: Field,
        left: &'a [ProbeRecord],
        right: &'a [ProbeRecord],
        get: F,
    ) where
        T: PartialEq,
        F: Fn(&'a ProbeRecord) -> T,
    {
        if self.is_ignored(field) {
            return;
        }
        let errors = diff_counts(field, left, right, |l, r| get(l) == get(r));
        report.finish(field, errors);
    }

    /// Compares a version-gated probe field. `eq` returns `None` when the
    /// field is present on only one side.
    fn gated_probes<F>(
        &self,
        report: &mut ComparisonReport,
        field: Field,
        left: &[ProbeRecord],
        right: &[ProbeRecord],
        eq: F,
    ) where
        F: Fn(&ProbeRecord, &ProbeRecord) -> Option<bool>,
    {
        if self.is_ignored(field) {
            return;
        }
        if left.len() != right.len() {
            report.finish(field, vec![length_mismatch(field, left.len(), right.len())]);
            return;
        }
        let mut absent = 0;
        let mut differences = 0;
        for (l, r) in left.iter().zip(right) {
            match eq(l, r) {
                Some(true) => {}
                Some(false) => differences += 1,
                None => absent += 1,
            }
        }
        if absent > 0 {
            report.warn(format!("{} ({absent} probes)", not_in_both(field)));
        }
        let mut errors = Vec::new();
        if differences > 0 {
            errors.push(element_mismatch(field, differences));
        }
        report.finish(field, errors);
    }

    fn record_versions(
        &self,
        report: &mut ComparisonReport,
        left: &[ProbeRecord],
        right: &[ProbeRecord],
    ) {
        if self.is_ignored(Field::RecordVersion) {
            return;
        }
        let differences = left
            .iter()
            .zip(right)
            .filter(|(l, r)| l.record_version != r.record_version)
            .count();
        if differences > 0 {
            report.warn(format!(
                "{} does not match for {differences} probes",
                Field::RecordVersion
            ));
        }
    }

    fn unique_ids(&self, report: &mut ComparisonReport, left: &Manifest, right: &Manifest) {
        let field = Field::UniqueNormalizationIds;
        if self.is_ignored(field) {
            return;
        }
        let (l, r) = (
            left.unique_normalization_ids(),
            right.unique_normalization_ids(),
        );
        let mut errors = Vec::new();
        let differences = l.symmetric_difference(r).count();
        if differences > 0 {
            errors.push(format!(
                "{field} do not match. {differences} ids are present in only one manifest."
            ));
        }
        report.finish(field, errors);
    }
}

/// Compares two manifests with the default ignore list.
pub fn compare_manifests(left: &Manifest, right: &Manifest) -> ComparisonReport {
    Comparator::new().compare(left, right)
}

fn diff_counts<'a, T, F>(field: Field, left: &'a [T], right: &'a [T], eq: F) -> Vec<String>
where
    F: Fn(&'a T, &'a T) -> bool,
{
    if left.len() != right.len() {
        return vec![length_mismatch(field, left.len(), right.len())];
    }
    let differences = left.iter().zip(right).filter(|&(l, r)| !eq(l, r)).count();
    if differences > 0 {
        vec![element_mismatch(field, differences)]
    } else {
        Vec::new()
    }
}

fn length_mismatch(field: Field, left: usize, right: usize) -> String {
    format!("{field} do not match. Arrays of different lengths. ( {left} vs {right} )")
}

fn element_mismatch(field: Field, differences: usize) -> String {
    format!("{field} do not match. {differences} elements of the array differ.")
}

fn not_in_both(field: Field) -> String {
    format!("Field {field} is not in both manifests. Version mismatch likely")
}

/// Float equality at three decimal places, truncating toward zero.
fn float_eq(left: f32, right: f32) -> bool {
    if left.is_nan() || right.is_nan() {
        return left.is_nan() && right.is_nan();
    }
    if !left.is_finite() || !right.is_finite() {
        return left == right;
    }
    let scale = |v: f32| (f64::from(v) * 1000.0).trunc();
    scale(left) == scale(right)
}
