use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::decode::{DecodeReport, ScheduleRow, NO_PLAN_TEXT};
use crate::form::SupplierOrderRow;

/// Formats a weight without a trailing `.0` for whole numbers.
pub fn format_weight(weight: f64) -> String {
    if weight.fract() == 0.0 && weight.abs() < 1e15 {
        format!("{}", weight as i64)
    } else {
        format!("{:.2}", weight)
    }
}

/// Formats one row as `<slot> | <entities> | <total>`.
pub fn format_row(row: &ScheduleRow) -> String {
    let entities = if row.is_no_plan() {
        NO_PLAN_TEXT.to_string()
    } else {
        row.entities.join(", ")
    };
    format!("{:>4} | {:<48} | {:>6}", row.slot, entities, format_weight(row.total_weight))
}

fn header() -> String {
    format!("{:>4} | {:<48} | {:>6}", "Slot", "Entities", "Total")
}

/// Writes a decoded plan to a file, one slot per line.
pub fn write_plan_to_file(
    title: &str,
    rows: &[ScheduleRow],
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = File::create(path)?;

    writeln!(file, "** {} **", title)?;
    writeln!(file, "{}", header())?;
    for row in rows {
        writeln!(file, "{}", format_row(row))?;
    }

    Ok(())
}

/// Prints a decoded plan in a readable format
pub fn print_plan(title: &str, rows: &[ScheduleRow]) {
    println!("\n=== {} ===", title);
    println!("{}", header());
    for row in rows {
        println!("{}", format_row(row));
    }
    let total: f64 = rows.iter().map(|r| r.total_weight).sum();
    println!("Total: {}", format_weight(total));
}

pub fn print_report(report: &DecodeReport) {
    if !report.skipped.is_empty() {
        println!("\n⚠️  Skipped solver keys ({}):", report.skipped.len());
        for skipped in &report.skipped {
            println!("  - {} ({})", skipped.key, skipped.reason);
        }
    }
    if !report.unknown_entities.is_empty() {
        println!("\n⚠️  Not in reference table ({}):", report.unknown_entities.len());
        for unknown in &report.unknown_entities {
            println!("  - {} (slot {})", unknown.entity, unknown.slot);
        }
    }
}

pub fn print_supplier_orders(rows: &[SupplierOrderRow]) {
    println!("\n=== Supplier Orders ===");
    if rows.is_empty() {
        println!("  [NO SUPPLIERS]");
        return;
    }
    for row in rows {
        let orders: Vec<String> = row.orders.iter().map(|o| format_weight(*o)).collect();
        println!("  {:<20} {}", row.supplier, orders.join("  "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights() {
        assert_eq!(format_weight(9.0), "9");
        assert_eq!(format_weight(0.0), "0");
        assert_eq!(format_weight(2.5), "2.50");
    }

    #[test]
    fn sentinel_row_text() {
        let line = format_row(&ScheduleRow::no_plan());
        assert!(line.starts_with(" N/A"));
        assert!(line.contains(NO_PLAN_TEXT));
        assert!(line.trim_end().ends_with('0'));
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.txt");
        let rows = vec![ScheduleRow::new(0, vec!["CS180".into(), "MA161".into()], 9.0)];
        write_plan_to_file("Course Plan", &rows, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "** Course Plan **");
        assert!(lines[2].contains("CS180, MA161"));
        assert!(lines[2].trim_end().ends_with('9'));
    }
}
