use crate::annot::fields::AnnotationMode;

/// One materialized structural-variant row. Only `full`-mode rows are ever
/// materialized; the mode still participates in the identity so the store
/// mirrors the upstream AnnotSV keying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvRecord {
    pub annotsv_id: String,
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub sv_type: String,
    pub mode: AnnotationMode,
}

impl SvRecord {
    pub fn identity(&self) -> SvKey {
        SvKey {
            annotsv_id: self.annotsv_id.clone(),
            chrom: self.chrom.clone(),
            start: self.start,
            end: self.end,
            mode: self.mode,
        }
    }
}

/// Natural identity of an SV row; pass 3 keeps a set of these to skip
/// duplicate rows within one file independently of the store's constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SvKey {
    pub annotsv_id: String,
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub mode: AnnotationMode,
}

/// Descriptive attributes of one SV-transcript association. All fields are
/// per-pairing annotation; absence means the column was missing or the value
/// did not parse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TxOverlap {
    pub overlapped_tx_length: Option<i64>,
    pub overlapped_cds_length: Option<i64>,
    pub overlapped_cds_percent: Option<f64>,
    pub frameshift: Option<String>,
    pub exon_count: Option<i64>,
    pub location: Option<String>,
    pub location2: Option<String>,
    pub dist_nearest_ss: Option<i64>,
    pub nearest_ss_type: Option<String>,
    pub intersect_start: Option<i64>,
    pub intersect_end: Option<i64>,
}
