use csv::StringRecord;

/// Positions of the recognized AnnotSV columns in one header row. Absent
/// columns stay `None`; row code treats them as producing no value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub samples: Option<usize>,
    pub gene_name: Option<usize>,
    pub annotation_mode: Option<usize>,
    pub annotsv_id: Option<usize>,
    pub sv_chrom: Option<usize>,
    pub sv_start: Option<usize>,
    pub sv_end: Option<usize>,
    pub sv_type: Option<usize>,
    pub tx_name: Option<usize>,
    pub tx_version: Option<usize>,
    pub tx_start: Option<usize>,
    pub tx_end: Option<usize>,
    pub overlapped_tx_length: Option<usize>,
    pub overlapped_cds_length: Option<usize>,
    pub overlapped_cds_percent: Option<usize>,
    pub frameshift: Option<usize>,
    pub exon_count: Option<usize>,
    pub location: Option<usize>,
    pub location2: Option<usize>,
    pub dist_nearest_ss: Option<usize>,
    pub nearest_ss_type: Option<usize>,
    pub intersect_start: Option<usize>,
    pub intersect_end: Option<usize>,
}

impl ColumnMap {
    pub fn from_header(header: &StringRecord) -> Self {
        let mut map = Self::default();
        for (position, name) in header.iter().enumerate() {
            let slot = match name {
                "Samples_ID" => &mut map.samples,
                "Gene_name" => &mut map.gene_name,
                "Annotation_mode" => &mut map.annotation_mode,
                "AnnotSV_ID" => &mut map.annotsv_id,
                "SV_chrom" => &mut map.sv_chrom,
                "SV_start" => &mut map.sv_start,
                "SV_end" => &mut map.sv_end,
                "SV_type" => &mut map.sv_type,
                "Tx" => &mut map.tx_name,
                "Tx_version" => &mut map.tx_version,
                "Tx_start" => &mut map.tx_start,
                "Tx_end" => &mut map.tx_end,
                "Overlapped_tx_length" => &mut map.overlapped_tx_length,
                "Overlapped_CDS_length" => &mut map.overlapped_cds_length,
                "Overlapped_CDS_percent" => &mut map.overlapped_cds_percent,
                "Frameshift" => &mut map.frameshift,
                "Exon_count" => &mut map.exon_count,
                "Location" => &mut map.location,
                "Location2" => &mut map.location2,
                "Dist_nearest_SS" => &mut map.dist_nearest_ss,
                "Nearest_SS_type" => &mut map.nearest_ss_type,
                "Intersect_start" => &mut map.intersect_start,
                "Intersect_end" => &mut map.intersect_end,
                _ => continue,
            };
            *slot = Some(position);
        }
        map
    }
}

/// Cell value for a resolved column, `None` when the column is absent or the
/// row is too short to carry it.
pub fn field<'r>(row: &'r StringRecord, column: Option<usize>) -> Option<&'r str> {
    column.and_then(|position| row.get(position))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> StringRecord {
        let mut record = StringRecord::new();
        for name in names {
            record.push_field(name);
        }
        record
    }

    #[test]
    fn resolves_columns_in_any_order() {
        let map = ColumnMap::from_header(&header(&[
            "SV_type",
            "AnnotSV_ID",
            "Annotation_mode",
            "Samples_ID",
        ]));
        assert_eq!(map.sv_type, Some(0));
        assert_eq!(map.annotsv_id, Some(1));
        assert_eq!(map.annotation_mode, Some(2));
        assert_eq!(map.samples, Some(3));
        assert_eq!(map.gene_name, None);
        assert_eq!(map.tx_name, None);
    }

    #[test]
    fn match_is_exact_and_case_sensitive() {
        let map = ColumnMap::from_header(&header(&[
            "samples_id",
            "ANNOTSV_ID",
            "SV_start ",
            "Gene_name",
        ]));
        assert_eq!(map.samples, None);
        assert_eq!(map.annotsv_id, None);
        assert_eq!(map.sv_start, None);
        assert_eq!(map.gene_name, Some(3));
    }

    #[test]
    fn unknown_columns_are_ignored() {
        let map = ColumnMap::from_header(&header(&["ACMG_class", "Tx", "AnnotSV_ranking_score"]));
        assert_eq!(map.tx_name, Some(1));
        assert_eq!(map, ColumnMap {
            tx_name: Some(1),
            ..ColumnMap::default()
        });
    }

    #[test]
    fn field_reads_cell_or_nothing() {
        let map = ColumnMap::from_header(&header(&["AnnotSV_ID", "SV_chrom", "SV_start"]));
        let mut row = StringRecord::new();
        row.push_field("sv-1");
        row.push_field("7");

        assert_eq!(field(&row, map.annotsv_id), Some("sv-1"));
        assert_eq!(field(&row, map.sv_chrom), Some("7"));
        // short row: the column exists in the header but not in this record
        assert_eq!(field(&row, map.sv_start), None);
        assert_eq!(field(&row, map.samples), None);
    }
}
