use std::collections::{HashMap, HashSet};
use std::ops::Deref;
use std::path::Path;

use rusqlite::Connection;

use crate::annot::fields::{optional_text, parse_float, parse_int, text};
use crate::annot::{AnnotationMode, ColumnMap, TableReader, field, split_samples};
use crate::store::SvStore;
use crate::store::records::{SvKey, SvRecord, TxOverlap};

#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Table(csv::Error),
    Store(rusqlite::Error),
    BadAnnotationMode { line: u64, found: String },
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Table(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::BadAnnotationMode { line, found } => write!(
                f,
                "line {line}: Annotation_mode must be `full` or `split`, found {found:?}"
            ),
        }
    }
}

impl std::error::Error for ImportError {}

impl From<std::io::Error> for ImportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for ImportError {
    fn from(value: csv::Error) -> Self {
        Self::Table(value)
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Store(value)
    }
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Coordinate stored when SV_start or SV_end is absent or empty.
    pub missing_coord: i64,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self { missing_coord: 0 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportCounts {
    pub rows: u64,
    pub full_rows: u64,
    pub split_rows: u64,
    pub skipped_rows: u64,
    pub defaulted_coordinates: u64,
    pub new_samples: u64,
    pub new_genes: u64,
    pub new_svs: u64,
    pub new_sample_links: u64,
    pub new_gene_links: u64,
    pub new_tx_links: u64,
}

/// Runs the four passes in order, each one re-reading the file from the
/// start and committing its own transaction before the next begins.
pub fn run(
    store: &SvStore,
    path: &Path,
    options: &ImportOptions,
) -> Result<ImportCounts, ImportError> {
    let mut counts = ImportCounts::default();
    collect_samples(store, path, &mut counts)?;
    collect_genes(store, path, &mut counts)?;
    import_variants(store, path, options, &mut counts)?;
    build_relationships(store, path, &mut counts)?;
    Ok(counts)
}

fn collect_samples(
    store: &SvStore,
    path: &Path,
    counts: &mut ImportCounts,
) -> Result<(), ImportError> {
    let mut reader = TableReader::open(path)?;
    let columns = reader.columns()?;

    let mut seen: HashSet<String> = HashSet::new();
    for record in reader.records() {
        let record = record?;
        for sample in split_samples(field(&record, columns.samples)) {
            seen.insert(sample);
        }
    }

    let txn = store.transaction()?;
    for sample in &seen {
        counts.new_samples += SvStore::insert_sample_on(txn.deref(), sample)? as u64;
    }
    txn.commit()?;

    eprintln!(
        "pass 1/4: {} distinct samples, {} new",
        seen.len(),
        counts.new_samples
    );
    Ok(())
}

fn collect_genes(
    store: &SvStore,
    path: &Path,
    counts: &mut ImportCounts,
) -> Result<(), ImportError> {
    let mut reader = TableReader::open(path)?;
    let columns = reader.columns()?;

    let mut seen: HashSet<String> = HashSet::new();
    for record in reader.records() {
        let record = record?;
        let mode = field(&record, columns.annotation_mode).and_then(AnnotationMode::parse);
        if mode != Some(AnnotationMode::Split) {
            continue;
        }
        let gene = text(field(&record, columns.gene_name));
        if !gene.is_empty() {
            seen.insert(gene.to_string());
        }
    }

    let txn = store.transaction()?;
    for gene in &seen {
        counts.new_genes += SvStore::insert_gene_on(txn.deref(), gene)? as u64;
    }
    txn.commit()?;

    eprintln!(
        "pass 2/4: {} distinct genes, {} new",
        seen.len(),
        counts.new_genes
    );
    Ok(())
}

fn import_variants(
    store: &SvStore,
    path: &Path,
    options: &ImportOptions,
    counts: &mut ImportCounts,
) -> Result<(), ImportError> {
    let mut reader = TableReader::open(path)?;
    let columns = reader.columns()?;

    let txn = store.transaction()?;
    let mut imported: HashSet<SvKey> = HashSet::new();

    for record in reader.records() {
        let record = record?;
        counts.rows += 1;

        let raw_mode = text(field(&record, columns.annotation_mode));
        let Some(mode) = AnnotationMode::parse(raw_mode) else {
            // an unrecognized mode means the file is not what we think it
            // is; downstream passes assume exactly two modes exist
            return Err(ImportError::BadAnnotationMode {
                line: record.position().map_or(0, |p| p.line()),
                found: raw_mode.to_string(),
            });
        };
        if mode == AnnotationMode::Split {
            counts.split_rows += 1;
            continue;
        }
        counts.full_rows += 1;

        let samples = split_samples(field(&record, columns.samples));
        let annotsv_id = text(field(&record, columns.annotsv_id)).to_string();
        let chrom = text(field(&record, columns.sv_chrom)).to_string();
        let sv_type = text(field(&record, columns.sv_type)).to_string();

        let mut defaulted = false;
        let Some(start) = coordinate(field(&record, columns.sv_start), options, &mut defaulted)
        else {
            counts.skipped_rows += 1;
            continue;
        };
        let Some(end) = coordinate(field(&record, columns.sv_end), options, &mut defaulted) else {
            counts.skipped_rows += 1;
            continue;
        };
        if defaulted {
            counts.defaulted_coordinates += 1;
        }

        let sv = SvRecord {
            annotsv_id,
            chrom,
            start,
            end,
            sv_type,
            mode,
        };
        if !imported.insert(sv.identity()) {
            continue; // same identity tuple earlier in this file
        }

        counts.new_svs += SvStore::insert_sv_on(txn.deref(), &sv)? as u64;
        let Some(sv_id) = SvStore::find_sv_on(txn.deref(), &sv.annotsv_id, mode)? else {
            continue;
        };
        for sample in &samples {
            counts.new_sample_links += SvStore::link_sample_on(txn.deref(), sv_id, sample)? as u64;
        }
    }

    txn.commit()?;
    eprintln!(
        "pass 3/4: {} rows ({} full, {} split, {} skipped), {} new SVs",
        counts.rows, counts.full_rows, counts.split_rows, counts.skipped_rows, counts.new_svs
    );
    Ok(())
}

/// Absent and empty cells take the configured stand-in value; anything else
/// must parse as an integer or the row is skipped.
fn coordinate(raw: Option<&str>, options: &ImportOptions, defaulted: &mut bool) -> Option<i64> {
    let trimmed = text(raw);
    if trimmed.is_empty() {
        *defaulted = true;
        return Some(options.missing_coord);
    }
    trimmed.parse().ok()
}

fn build_relationships(
    store: &SvStore,
    path: &Path,
    counts: &mut ImportCounts,
) -> Result<(), ImportError> {
    let mut reader = TableReader::open(path)?;
    let columns = reader.columns()?;

    let txn = store.transaction()?;
    let mut genes: HashMap<String, i64> = HashMap::new();
    let mut transcripts: HashMap<(String, Option<String>), i64> = HashMap::new();
    let mut parents: HashMap<String, Option<i64>> = HashMap::new();

    for record in reader.records() {
        let record = record?;
        let mode = field(&record, columns.annotation_mode).and_then(AnnotationMode::parse);
        if mode != Some(AnnotationMode::Split) {
            continue;
        }

        let annotsv_id = text(field(&record, columns.annotsv_id));

        let tx_name = text(field(&record, columns.tx_name));
        if !tx_name.is_empty()
            && let Some(tx_start) = parse_int(field(&record, columns.tx_start))
            && let Some(tx_end) = parse_int(field(&record, columns.tx_end))
        {
            let tx_version = optional_text(field(&record, columns.tx_version));
            let tx_id = resolve_transcript(
                txn.deref(),
                &mut transcripts,
                tx_name,
                tx_version.as_deref(),
                tx_start,
                tx_end,
            )?;
            // the transcript row outlives a missing parent; only the
            // association is dropped
            if let Some(sv_id) = resolve_parent(txn.deref(), &mut parents, annotsv_id)? {
                let overlap = overlap_fields(&record, &columns);
                counts.new_tx_links +=
                    SvStore::link_transcript_on(txn.deref(), sv_id, tx_id, &overlap)? as u64;
            }
        }

        let gene_name = text(field(&record, columns.gene_name));
        if !annotsv_id.is_empty() && !gene_name.is_empty() {
            let gene_id = resolve_gene(txn.deref(), &mut genes, gene_name)?;
            if let Some(sv_id) = resolve_parent(txn.deref(), &mut parents, annotsv_id)? {
                counts.new_gene_links += SvStore::link_gene_on(txn.deref(), sv_id, gene_id)? as u64;
            }
        }
    }

    txn.commit()?;
    eprintln!(
        "pass 4/4: {} gene links, {} transcript links",
        counts.new_gene_links, counts.new_tx_links
    );
    Ok(())
}

fn overlap_fields(record: &csv::StringRecord, columns: &ColumnMap) -> TxOverlap {
    TxOverlap {
        overlapped_tx_length: parse_int(field(record, columns.overlapped_tx_length)),
        overlapped_cds_length: parse_int(field(record, columns.overlapped_cds_length)),
        overlapped_cds_percent: parse_float(field(record, columns.overlapped_cds_percent)),
        frameshift: optional_text(field(record, columns.frameshift)),
        exon_count: parse_int(field(record, columns.exon_count)),
        location: optional_text(field(record, columns.location)),
        location2: optional_text(field(record, columns.location2)),
        dist_nearest_ss: parse_int(field(record, columns.dist_nearest_ss)),
        nearest_ss_type: optional_text(field(record, columns.nearest_ss_type)),
        intersect_start: parse_int(field(record, columns.intersect_start)),
        intersect_end: parse_int(field(record, columns.intersect_end)),
    }
}

fn resolve_gene(
    conn: &Connection,
    cache: &mut HashMap<String, i64>,
    name: &str,
) -> rusqlite::Result<i64> {
    if let Some(&gene_id) = cache.get(name) {
        return Ok(gene_id);
    }
    let gene_id = SvStore::get_or_create_gene_on(conn, name)?;
    cache.insert(name.to_string(), gene_id);
    Ok(gene_id)
}

fn resolve_transcript(
    conn: &Connection,
    cache: &mut HashMap<(String, Option<String>), i64>,
    name: &str,
    version: Option<&str>,
    start: i64,
    end: i64,
) -> rusqlite::Result<i64> {
    let key = (name.to_string(), version.map(str::to_string));
    if let Some(&tx_id) = cache.get(&key) {
        return Ok(tx_id);
    }
    let tx_id = SvStore::get_or_create_transcript_on(conn, name, version, start, end)?;
    cache.insert(key, tx_id);
    Ok(tx_id)
}

/// Detail rows attach to the `full` SV sharing their AnnotSV id. Misses are
/// cached too: a file with many orphaned detail rows stays one query per id.
fn resolve_parent(
    conn: &Connection,
    cache: &mut HashMap<String, Option<i64>>,
    annotsv_id: &str,
) -> rusqlite::Result<Option<i64>> {
    if let Some(&sv_id) = cache.get(annotsv_id) {
        return Ok(sv_id);
    }
    let sv_id = SvStore::find_sv_on(conn, annotsv_id, AnnotationMode::Full)?;
    cache.insert(annotsv_id.to_string(), sv_id);
    Ok(sv_id)
}
