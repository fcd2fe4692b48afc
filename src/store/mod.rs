pub mod records;

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Transaction, params};
use serde::Serialize;

use crate::annot::fields::AnnotationMode;
use crate::store::records::{SvRecord, TxOverlap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreTotals {
    pub samples: i64,
    pub genes: i64,
    pub svs: i64,
    pub transcripts: i64,
    pub sample_links: i64,
    pub gene_links: i64,
    pub tx_links: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleSpreadRow {
    pub samples_per_sv: i64,
    pub sv_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleUsageRow {
    pub sample_id: String,
    pub sv_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneUsageRow {
    pub gene_name: String,
    pub sv_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptUsageRow {
    pub tx_name: String,
    pub tx_version: Option<String>,
    pub sv_count: i64,
    pub avg_cds_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameshiftRow {
    pub annotsv_id: String,
    pub tx_count: i64,
}

pub struct SvStore {
    conn: Connection,
}

impl SvStore {
    /// Opens the store at `path`, creating the file and provisioning the
    /// schema when needed. Safe to run against an already provisioned store.
    pub fn create(path: &Path) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_connection()?;
        store.create_schema()?;
        Ok(store)
    }

    /// Opens an existing store without touching the schema. Callers check
    /// for the file first; SQLite would otherwise create an empty one.
    pub fn open(path: &Path) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_connection()?;
        Ok(store)
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_connection()?;
        store.create_schema()?;
        Ok(store)
    }

    fn init_connection(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")
    }

    fn create_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS samples (
                sample_id TEXT PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS genes (
                gene_id INTEGER PRIMARY KEY AUTOINCREMENT,
                gene_name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS SV (
                SV_id INTEGER PRIMARY KEY AUTOINCREMENT,
                AnnotSV_ID TEXT NOT NULL,
                SV_chrom TEXT NOT NULL,
                SV_start INTEGER NOT NULL,
                SV_end INTEGER NOT NULL,
                SV_type TEXT NOT NULL,
                Annotation_mode TEXT NOT NULL,
                UNIQUE(AnnotSV_ID, SV_chrom, SV_start, SV_end, Annotation_mode)
            );

            CREATE TABLE IF NOT EXISTS Tx (
                Tx_id INTEGER PRIMARY KEY AUTOINCREMENT,
                Tx_name TEXT NOT NULL,
                Tx_version TEXT,
                Tx_start INTEGER NOT NULL,
                Tx_end INTEGER NOT NULL,
                UNIQUE(Tx_name, Tx_version)
            );

            CREATE TABLE IF NOT EXISTS sv_samples (
                SV_id INTEGER NOT NULL,
                sample_id TEXT NOT NULL,
                PRIMARY KEY (SV_id, sample_id),
                FOREIGN KEY (SV_id) REFERENCES SV(SV_id) ON DELETE CASCADE,
                FOREIGN KEY (sample_id) REFERENCES samples(sample_id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS sv_genes (
                SV_id INTEGER NOT NULL,
                gene_id INTEGER NOT NULL,
                PRIMARY KEY (SV_id, gene_id),
                FOREIGN KEY (SV_id) REFERENCES SV(SV_id) ON DELETE CASCADE,
                FOREIGN KEY (gene_id) REFERENCES genes(gene_id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS sv_tx (
                SV_id INTEGER NOT NULL,
                Tx_id INTEGER NOT NULL,
                Overlapped_tx_length INTEGER,
                Overlapped_CDS_length INTEGER,
                Overlapped_CDS_percent REAL,
                Frameshift TEXT,
                Exon_count INTEGER,
                Location TEXT,
                Location2 TEXT,
                Dist_nearest_SS INTEGER,
                Nearest_SS_type TEXT,
                Intersect_start INTEGER,
                Intersect_end INTEGER,
                PRIMARY KEY (SV_id, Tx_id),
                FOREIGN KEY (SV_id) REFERENCES SV(SV_id) ON DELETE CASCADE,
                FOREIGN KEY (Tx_id) REFERENCES Tx(Tx_id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_sv_annotsv ON SV(AnnotSV_ID);
            CREATE INDEX IF NOT EXISTS idx_sv_position ON SV(SV_chrom, SV_start, SV_end);
            CREATE INDEX IF NOT EXISTS idx_genes_name ON genes(gene_name);
            CREATE INDEX IF NOT EXISTS idx_tx_name ON Tx(Tx_name);
            CREATE INDEX IF NOT EXISTS idx_tx_position ON Tx(Tx_start, Tx_end);
            ",
        )
    }

    pub fn transaction(&self) -> rusqlite::Result<Transaction<'_>> {
        self.conn.unchecked_transaction()
    }

    pub fn insert_sample(&self, sample_id: &str) -> rusqlite::Result<usize> {
        Self::insert_sample_on(&self.conn, sample_id)
    }

    pub fn insert_sample_on(conn: &Connection, sample_id: &str) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT OR IGNORE INTO samples (sample_id) VALUES (?1)",
            params![sample_id],
        )
    }

    pub fn insert_gene(&self, gene_name: &str) -> rusqlite::Result<usize> {
        Self::insert_gene_on(&self.conn, gene_name)
    }

    pub fn insert_gene_on(conn: &Connection, gene_name: &str) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT OR IGNORE INTO genes (gene_name) VALUES (?1)",
            params![gene_name],
        )
    }

    pub fn insert_sv(&self, record: &SvRecord) -> rusqlite::Result<usize> {
        Self::insert_sv_on(&self.conn, record)
    }

    pub fn insert_sv_on(conn: &Connection, record: &SvRecord) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT OR IGNORE INTO SV (
                AnnotSV_ID, SV_chrom, SV_start, SV_end, SV_type, Annotation_mode
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.annotsv_id,
                record.chrom,
                record.start,
                record.end,
                record.sv_type,
                record.mode.as_str()
            ],
        )
    }

    pub fn find_sv(&self, annotsv_id: &str, mode: AnnotationMode) -> rusqlite::Result<Option<i64>> {
        Self::find_sv_on(&self.conn, annotsv_id, mode)
    }

    pub fn find_sv_on(
        conn: &Connection,
        annotsv_id: &str,
        mode: AnnotationMode,
    ) -> rusqlite::Result<Option<i64>> {
        conn.query_row(
            "SELECT SV_id FROM SV
             WHERE AnnotSV_ID = ?1 AND Annotation_mode = ?2
             ORDER BY SV_id LIMIT 1",
            params![annotsv_id, mode.as_str()],
            |row| row.get(0),
        )
        .optional()
    }

    pub fn link_sample(&self, sv_id: i64, sample_id: &str) -> rusqlite::Result<usize> {
        Self::link_sample_on(&self.conn, sv_id, sample_id)
    }

    pub fn link_sample_on(
        conn: &Connection,
        sv_id: i64,
        sample_id: &str,
    ) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT OR IGNORE INTO sv_samples (SV_id, sample_id) VALUES (?1, ?2)",
            params![sv_id, sample_id],
        )
    }

    pub fn link_gene(&self, sv_id: i64, gene_id: i64) -> rusqlite::Result<usize> {
        Self::link_gene_on(&self.conn, sv_id, gene_id)
    }

    pub fn link_gene_on(conn: &Connection, sv_id: i64, gene_id: i64) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT OR IGNORE INTO sv_genes (SV_id, gene_id) VALUES (?1, ?2)",
            params![sv_id, gene_id],
        )
    }

    pub fn link_transcript(
        &self,
        sv_id: i64,
        tx_id: i64,
        overlap: &TxOverlap,
    ) -> rusqlite::Result<usize> {
        Self::link_transcript_on(&self.conn, sv_id, tx_id, overlap)
    }

    pub fn link_transcript_on(
        conn: &Connection,
        sv_id: i64,
        tx_id: i64,
        overlap: &TxOverlap,
    ) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT OR IGNORE INTO sv_tx (
                SV_id, Tx_id, Overlapped_tx_length, Overlapped_CDS_length,
                Overlapped_CDS_percent, Frameshift, Exon_count, Location, Location2,
                Dist_nearest_SS, Nearest_SS_type, Intersect_start, Intersect_end
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                sv_id,
                tx_id,
                overlap.overlapped_tx_length,
                overlap.overlapped_cds_length,
                overlap.overlapped_cds_percent,
                overlap.frameshift,
                overlap.exon_count,
                overlap.location,
                overlap.location2,
                overlap.dist_nearest_ss,
                overlap.nearest_ss_type,
                overlap.intersect_start,
                overlap.intersect_end
            ],
        )
    }

    pub fn get_or_create_gene(&self, gene_name: &str) -> rusqlite::Result<i64> {
        Self::get_or_create_gene_on(&self.conn, gene_name)
    }

    pub fn get_or_create_gene_on(conn: &Connection, gene_name: &str) -> rusqlite::Result<i64> {
        let existing: Option<i64> = conn
            .query_row(
                "SELECT gene_id FROM genes WHERE gene_name = ?1",
                params![gene_name],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(gene_id) = existing {
            return Ok(gene_id);
        }
        conn.execute(
            "INSERT INTO genes (gene_name) VALUES (?1)",
            params![gene_name],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_or_create_transcript(
        &self,
        tx_name: &str,
        tx_version: Option<&str>,
        tx_start: i64,
        tx_end: i64,
    ) -> rusqlite::Result<i64> {
        Self::get_or_create_transcript_on(&self.conn, tx_name, tx_version, tx_start, tx_end)
    }

    pub fn get_or_create_transcript_on(
        conn: &Connection,
        tx_name: &str,
        tx_version: Option<&str>,
        tx_start: i64,
        tx_end: i64,
    ) -> rusqlite::Result<i64> {
        // UNIQUE(Tx_name, Tx_version) treats NULL versions as distinct, so
        // the NULL-aware lookup is what actually dedups version-less rows.
        let existing: Option<i64> = conn
            .query_row(
                "SELECT Tx_id FROM Tx
                 WHERE Tx_name = ?1
                   AND (Tx_version = ?2 OR (Tx_version IS NULL AND ?2 IS NULL))",
                params![tx_name, tx_version],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(tx_id) = existing {
            return Ok(tx_id);
        }
        conn.execute(
            "INSERT INTO Tx (Tx_name, Tx_version, Tx_start, Tx_end) VALUES (?1, ?2, ?3, ?4)",
            params![tx_name, tx_version, tx_start, tx_end],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

impl SvStore {
    pub fn totals(&self) -> rusqlite::Result<StoreTotals> {
        Ok(StoreTotals {
            samples: self.table_count("samples")?,
            genes: self.table_count("genes")?,
            svs: self.table_count("SV")?,
            transcripts: self.table_count("Tx")?,
            sample_links: self.table_count("sv_samples")?,
            gene_links: self.table_count("sv_genes")?,
            tx_links: self.table_count("sv_tx")?,
        })
    }

    fn table_count(&self, table: &str) -> rusqlite::Result<i64> {
        // callers pass fixed table names, never user input
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })
    }

    pub fn sample_spread(&self) -> rusqlite::Result<Vec<SampleSpreadRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT sample_count, COUNT(*) AS sv_count
             FROM (
                 SELECT sv.SV_id, COUNT(ss.sample_id) AS sample_count
                 FROM SV sv
                 JOIN sv_samples ss ON sv.SV_id = ss.SV_id
                 WHERE sv.Annotation_mode = 'full'
                 GROUP BY sv.SV_id
             )
             GROUP BY sample_count
             ORDER BY sample_count",
        )?;

        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(SampleSpreadRow {
                samples_per_sv: row.get(0)?,
                sv_count: row.get(1)?,
            });
        }
        Ok(out)
    }

    pub fn samples_by_sv_count(&self) -> rusqlite::Result<Vec<SampleUsageRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.sample_id, COUNT(DISTINCT ss.SV_id) AS sv_count
             FROM samples s
             LEFT JOIN sv_samples ss ON s.sample_id = ss.sample_id
             GROUP BY s.sample_id
             ORDER BY sv_count DESC, s.sample_id ASC",
        )?;

        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(SampleUsageRow {
                sample_id: row.get(0)?,
                sv_count: row.get(1)?,
            });
        }
        Ok(out)
    }

    pub fn top_genes(&self, limit: usize) -> rusqlite::Result<Vec<GeneUsageRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT g.gene_name, COUNT(DISTINCT sg.SV_id) AS sv_count
             FROM genes g
             LEFT JOIN sv_genes sg ON g.gene_id = sg.gene_id
             GROUP BY g.gene_id, g.gene_name
             HAVING sv_count > 0
             ORDER BY sv_count DESC, g.gene_name ASC
             LIMIT ?1",
        )?;

        let mut rows = stmt.query(params![limit as i64])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(GeneUsageRow {
                gene_name: row.get(0)?,
                sv_count: row.get(1)?,
            });
        }
        Ok(out)
    }

    pub fn top_transcripts(&self, limit: usize) -> rusqlite::Result<Vec<TranscriptUsageRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.Tx_name, t.Tx_version, COUNT(DISTINCT st.SV_id) AS sv_count,
                    AVG(st.Overlapped_CDS_percent) AS avg_cds_percent
             FROM Tx t
             LEFT JOIN sv_tx st ON t.Tx_id = st.Tx_id
             WHERE st.SV_id IS NOT NULL
             GROUP BY t.Tx_id, t.Tx_name, t.Tx_version
             ORDER BY sv_count DESC, t.Tx_name ASC
             LIMIT ?1",
        )?;

        let mut rows = stmt.query(params![limit as i64])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(TranscriptUsageRow {
                tx_name: row.get(0)?,
                tx_version: row.get(1)?,
                sv_count: row.get(2)?,
                avg_cds_percent: row.get(3)?,
            });
        }
        Ok(out)
    }

    pub fn frameshift_svs(&self, limit: usize) -> rusqlite::Result<Vec<FrameshiftRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT sv.AnnotSV_ID, COUNT(DISTINCT st.Tx_id) AS tx_count
             FROM SV sv
             JOIN sv_tx st ON sv.SV_id = st.SV_id
             WHERE st.Frameshift = 'yes'
             GROUP BY sv.SV_id, sv.AnnotSV_ID
             ORDER BY tx_count DESC, sv.AnnotSV_ID ASC
             LIMIT ?1",
        )?;

        let mut rows = stmt.query(params![limit as i64])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(FrameshiftRow {
                annotsv_id: row.get(0)?,
                tx_count: row.get(1)?,
            });
        }
        Ok(out)
    }
}
