//! CSV export of finished listing records.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::error::ExportResult;
use crate::types::ListingRecord;

/// Accessor for one export column.
pub type ColumnAccessor = fn(&ListingRecord) -> &str;

/// Export schema: header and accessor per column, in output order.
pub const COLUMNS: [(&str, ColumnAccessor); 9] = [
    ("Plate", plate),
    ("Estimated", estimated_price),
    ("Blocket", listed_price),
    ("Diff", price_differential),
    ("Link", link),
    ("Model Id", ListingRecord::model_id),
    ("Distance", ListingRecord::distance),
    ("Year", ListingRecord::model_year),
    ("Reg Date", ListingRecord::registration_date),
];

fn plate(r: &ListingRecord) -> &str {
    r.plate.as_deref().unwrap_or("")
}

fn estimated_price(r: &ListingRecord) -> &str {
    r.estimated_price.as_deref().unwrap_or("")
}

fn listed_price(r: &ListingRecord) -> &str {
    r.listed_price.as_deref().unwrap_or("")
}

fn price_differential(r: &ListingRecord) -> &str {
    r.price_differential.as_deref().unwrap_or("")
}

fn link(r: &ListingRecord) -> &str {
    &r.link
}

/// Records without a plate are dropped from the export.
pub fn is_exportable(record: &ListingRecord) -> bool {
    record.plate.as_deref().is_some_and(|p| !p.trim().is_empty())
}

/// Write the header and one row per exportable record, in the given order.
///
/// Returns the number of data rows written.
pub fn write_table<W: Write>(writer: W, records: &[ListingRecord]) -> ExportResult<usize> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(COLUMNS.iter().map(|(header, _)| *header))?;

    let mut rows = 0;
    for record in records {
        if !is_exportable(record) {
            debug!(key = %record.key, link = %record.link, "Skipping listing without plate");
            continue;
        }
        csv.write_record(COLUMNS.iter().map(|(_, value)| value(record)))?;
        rows += 1;
    }

    csv.flush()?;
    Ok(rows)
}

/// Create `path` and write the table to it.
pub fn export_csv(path: impl AsRef<Path>, records: &[ListingRecord]) -> ExportResult<usize> {
    let path = path.as_ref();
    info!(path = %path.display(), records = records.len(), "Saving results");

    let file = File::create(path)?;
    let rows = write_table(file, records)?;

    info!(path = %path.display(), rows, "Done saving");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ListingKey, VehicleInfo};

    const HEADER: &str = "Plate,Estimated,Blocket,Diff,Link,Model Id,Distance,Year,Reg Date\n";

    fn full_record(key: u64, plate: &str) -> ListingRecord {
        let mut record = ListingRecord::new(ListingKey(key), format!("https://market.test/{key}.htm"));
        record.plate = Some(plate.to_string());
        record.listed_price = Some("185000".into());
        record.estimated_price = Some("201500".into());
        record.price_differential = Some("16500".into());
        record.vehicle = Some(VehicleInfo {
            model_id: "4521".into(),
            distance: "12000".into(),
            model_year: "2015".into(),
            registration_date: "2015-04-01".into(),
        });
        record
    }

    fn to_string(records: &[ListingRecord]) -> (usize, String) {
        let mut buf = Vec::new();
        let rows = write_table(&mut buf, records).unwrap();
        (rows, String::from_utf8(buf).unwrap())
    }

    #[test]
    fn test_empty_export_is_header_only() {
        let (rows, out) = to_string(&[]);
        assert_eq!(rows, 0);
        assert_eq!(out, HEADER);
    }

    #[test]
    fn test_row_column_order() {
        let (rows, out) = to_string(&[full_record(0, "ABC123")]);
        assert_eq!(rows, 1);
        assert_eq!(
            out,
            format!("{HEADER}ABC123,201500,185000,16500,https://market.test/0.htm,4521,12000,2015,2015-04-01\n")
        );
    }

    #[test]
    fn test_empty_plate_excluded() {
        let mut no_plate = full_record(1, "");
        assert!(!is_exportable(&no_plate));

        no_plate.plate = None;
        let (rows, out) = to_string(&[no_plate, full_record(2, "XYZ789")]);

        assert_eq!(rows, 1);
        assert!(out.contains("XYZ789"));
        assert!(!out.contains("/1.htm"));
    }

    #[test]
    fn test_partial_record_exports_empty_cells() {
        let mut record = ListingRecord::new(ListingKey(0), "https://market.test/0.htm");
        record.plate = Some("ABC123".into());

        let (_, out) = to_string(&[record]);
        assert!(out.ends_with("ABC123,,,,https://market.test/0.htm,,,,\n"));
    }

    #[test]
    fn test_export_csv_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.csv");

        let rows = export_csv(&path, &[full_record(0, "ABC123")]).unwrap();
        assert_eq!(rows, 1);

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with(HEADER));
    }

    #[test]
    fn test_export_csv_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("result.csv");

        assert!(export_csv(&path, &[]).is_err());
    }
}
