use serde::Serialize;

use crate::store::{
    FrameshiftRow, GeneUsageRow, SampleSpreadRow, SampleUsageRow, StoreTotals, SvStore,
    TranscriptUsageRow,
};

pub const TOP_GENES_DEFAULT: usize = 10;
pub const TOP_TRANSCRIPTS_DEFAULT: usize = 10;
pub const TOP_FRAMESHIFT_DEFAULT: usize = 10;

/// Aggregate view over a finished store. Reads only; safe to build at any
/// point, including over a store another import later appends to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub totals: StoreTotals,
    pub samples_per_sv: Vec<SampleSpreadRow>,
    pub top_samples: Vec<SampleUsageRow>,
    pub top_genes: Vec<GeneUsageRow>,
    pub top_transcripts: Vec<TranscriptUsageRow>,
    pub frameshift_svs: Vec<FrameshiftRow>,
}

pub fn collect(store: &SvStore) -> rusqlite::Result<StatsReport> {
    Ok(StatsReport {
        totals: store.totals()?,
        samples_per_sv: store.sample_spread()?,
        top_samples: store.samples_by_sv_count()?,
        top_genes: store.top_genes(TOP_GENES_DEFAULT)?,
        top_transcripts: store.top_transcripts(TOP_TRANSCRIPTS_DEFAULT)?,
        frameshift_svs: store.frameshift_svs(TOP_FRAMESHIFT_DEFAULT)?,
    })
}
