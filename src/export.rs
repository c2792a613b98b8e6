use std::fs::OpenOptions;
use std::path::Path;

use csv::WriterBuilder;
use tracing::debug;

use crate::decode::ScheduleRow;
use crate::display::format_weight;
use crate::error::Result;
use crate::form::CoursePlan;

const HEADER: [&str; 4] = ["generated_at", "slot", "entities", "total_weight"];

/// Appends a decoded plan to a CSV file, writing the header if the file is new.
///
/// Every row carries the plan timestamp so successive runs can share a file.
pub fn export_plan_to_csv(plan: &CoursePlan, csv_path: &Path) -> Result<()> {
    let file_exists = csv_path.exists() && csv_path.metadata()?.len() > 0;

    let file = OpenOptions::new().create(true).append(true).open(csv_path)?;
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);

    if !file_exists {
        wtr.write_record(HEADER)?;
    }

    let generated_at = plan.generated_at.to_rfc3339();
    for row in plan.rows() {
        write_row(&mut wtr, &generated_at, row)?;
    }

    wtr.flush()?;
    debug!(path = %csv_path.display(), rows = plan.rows().len(), "exported plan");
    Ok(())
}

fn write_row<W: std::io::Write>(
    wtr: &mut csv::Writer<W>,
    generated_at: &str,
    row: &ScheduleRow,
) -> Result<()> {
    let slot = row.slot.to_string();
    let entities = row.entities.join(", ");
    let total = format_weight(row.total_weight);
    wtr.write_record([generated_at, slot.as_str(), entities.as_str(), total.as_str()])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::DecodeReport;

    fn plan(rows: Vec<ScheduleRow>) -> CoursePlan {
        CoursePlan::new(
            DecodeReport {
                rows,
                skipped: Vec::new(),
                unknown_entities: Vec::new(),
            },
            18,
        )
    }

    #[test]
    fn appends_with_single_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plans.csv");

        export_plan_to_csv(&plan(vec![ScheduleRow::new(0, vec!["CS180".into(), "MA161".into()], 9.0)]), &path)
            .unwrap();
        export_plan_to_csv(&plan(vec![ScheduleRow::no_plan()]), &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), HEADER.to_vec());

        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][1], "1");
        assert_eq!(&records[0][2], "CS180, MA161");
        assert_eq!(&records[0][3], "9");
        assert_eq!(&records[1][1], "N/A");
        assert_eq!(&records[1][2], "");
    }
}
