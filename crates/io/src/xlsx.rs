// Excel input tables and the multi-sheet reconciliation report
//
// Input: calamine (xlsx, xlsm, xls, xlsb, ods); every cell is read as text.
// Output: rust_xlsxwriter, rendered fully in memory before anything touches disk.

use std::path::Path;
use std::time::Instant;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use oa2_recon::model::{AggregatedTable, ComparisonTable, ReconResult};
use oa2_recon::RawTable;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, FormatBorder, Workbook as XlsxWorkbook, Worksheet};
use tracing::debug;

/// Excel's maximum number of rows per sheet.
const MAX_ROWS: usize = 1_048_576;

const AGGREGATED_HEADERS: [&str; 3] = ["datounico", "cuenta", "MONTO"];

const COMPARISON_HEADERS: [&str; 7] = [
    "datounico",
    "Cuenta_Pasado",
    "Cuenta_Actual",
    "MONTO_PASADO",
    "MONTO_ACTUAL",
    "Diferencia",
    "Resultado",
];

// ============================================================================
// Import
// ============================================================================

/// Read one sheet (the first when `sheet` is `None`) as a raw table.
/// The first non-empty row is the header row; fully blank rows are skipped.
pub fn read_table(path: &Path, sheet: Option<&str>) -> Result<RawTable, String> {
    let start_time = Instant::now();

    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open Excel file: {}", e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(name) => sheet_names
            .iter()
            .find(|s| s.as_str() == name)
            .cloned()
            .ok_or_else(|| {
                format!("Sheet '{}' not found (available: {})", name, sheet_names.join(", "))
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| "Excel file contains no sheets".to_string())?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;

    let mut rows = range
        .rows()
        .filter(|row| row.iter().any(|c| !cell_text(c).trim().is_empty()));

    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(|c| cell_text(c).trim().to_string()).collect(),
        None => return Ok(RawTable::default()),
    };
    let rows: Vec<Vec<String>> = rows.map(|row| row.iter().map(cell_text).collect()).collect();

    debug!(
        path = %path.display(),
        sheet = %sheet_name,
        rows = rows.len(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "read sheet"
    );

    Ok(RawTable::new(headers, rows))
}

/// Render a cell as text the way a text-typed spreadsheet read does:
/// integral numbers without a trailing `.0`, booleans as `True`/`False`,
/// empty cells as "".
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        Data::Bool(true) => "True".to_string(),
        Data::Bool(false) => "False".to_string(),
        other => other.to_string(),
    }
}

fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

// ============================================================================
// Export
// ============================================================================

/// Statistics from writing a report.
#[derive(Debug, Default, Clone)]
pub struct ReportStats {
    pub sheets_written: usize,
    pub rows_written: usize,
    pub bytes: usize,
    pub export_duration_ms: u128,
}

/// Render the report workbook: `PASADO`, `ACTUAL`, then one sheet per comparison.
pub fn render_report(result: &ReconResult) -> Result<(Vec<u8>, ReportStats), String> {
    let start_time = Instant::now();
    let mut stats = ReportStats::default();
    let mut workbook = XlsxWorkbook::new();

    let header_format = Format::new().set_bold().set_border_bottom(FormatBorder::Thin);
    let amount_format = Format::new().set_num_format("#,##0.00");

    for table in [&result.past, &result.current] {
        let worksheet = add_sheet(&mut workbook, table.snapshot.sheet_name())?;
        stats.rows_written += write_aggregated(worksheet, table, &header_format, &amount_format)?;
        stats.sheets_written += 1;
    }

    for comparison in &result.comparisons {
        let worksheet = add_sheet(&mut workbook, &comparison.name)?;
        stats.rows_written += write_comparison(worksheet, comparison, &header_format, &amount_format)?;
        stats.sheets_written += 1;
    }

    let bytes = workbook
        .save_to_buffer()
        .map_err(|e| format!("Failed to render XLSX report: {}", e))?;

    stats.bytes = bytes.len();
    stats.export_duration_ms = start_time.elapsed().as_millis();
    Ok((bytes, stats))
}

/// Render the report and write it to `path`. Nothing is written if rendering fails.
pub fn write_report(result: &ReconResult, path: &Path) -> Result<ReportStats, String> {
    let (bytes, stats) = render_report(result)?;
    std::fs::write(path, &bytes)
        .map_err(|e| format!("Failed to save XLSX file {}: {}", path.display(), e))?;
    debug!(path = %path.display(), sheets = stats.sheets_written, bytes = stats.bytes, "wrote report");
    Ok(stats)
}

fn add_sheet<'a>(workbook: &'a mut XlsxWorkbook, name: &str) -> Result<&'a mut Worksheet, String> {
    workbook
        .add_worksheet()
        .set_name(name)
        .map_err(|e| format!("Failed to create sheet '{}': {}", name, e))
}

fn check_row_limit(name: &str, rows: usize) -> Result<(), String> {
    // +1 for the header row
    if rows + 1 > MAX_ROWS {
        return Err(format!(
            "Sheet '{}' has {} rows; Excel allows at most {}",
            name,
            rows,
            MAX_ROWS - 1
        ));
    }
    Ok(())
}

fn write_headers(worksheet: &mut Worksheet, headers: &[&str], format: &Format) -> Result<(), String> {
    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, format)
            .map_err(|e| format!("Failed to write header: {}", e))?;
    }
    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| format!("Failed to set freeze panes: {}", e))?;
    Ok(())
}

fn write_amount(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    amount: Decimal,
    format: &Format,
) -> Result<(), String> {
    let value = amount
        .to_f64()
        .ok_or_else(|| format!("Amount {} cannot be written as a number", amount))?;
    worksheet
        .write_number_with_format(row, col, value, format)
        .map_err(|e| format!("Failed to write amount: {}", e))?;
    Ok(())
}

fn write_text(worksheet: &mut Worksheet, row: u32, col: u16, text: &str) -> Result<(), String> {
    worksheet
        .write_string(row, col, text)
        .map_err(|e| format!("Failed to write cell: {}", e))?;
    Ok(())
}

fn write_aggregated(
    worksheet: &mut Worksheet,
    table: &AggregatedTable,
    header_format: &Format,
    amount_format: &Format,
) -> Result<usize, String> {
    check_row_limit(table.snapshot.sheet_name(), table.len())?;
    write_headers(worksheet, &AGGREGATED_HEADERS, header_format)?;

    for (i, record) in table.records.iter().enumerate() {
        let row = (i + 1) as u32;
        write_text(worksheet, row, 0, record.entity.as_str())?;
        write_text(worksheet, row, 1, record.account.as_str())?;
        write_amount(worksheet, row, 2, record.amount, amount_format)?;
    }

    set_widths(worksheet, &[48.0, 14.0, 16.0])?;
    Ok(table.len())
}

fn write_comparison(
    worksheet: &mut Worksheet,
    table: &ComparisonTable,
    header_format: &Format,
    amount_format: &Format,
) -> Result<usize, String> {
    check_row_limit(&table.name, table.rows.len())?;
    write_headers(worksheet, &COMPARISON_HEADERS, header_format)?;

    for (i, r) in table.rows.iter().enumerate() {
        let row = (i + 1) as u32;
        write_text(worksheet, row, 0, r.entity.as_str())?;
        write_text(worksheet, row, 1, &r.account_past)?;
        write_text(worksheet, row, 2, &r.account_current)?;
        write_amount(worksheet, row, 3, r.amount_past, amount_format)?;
        write_amount(worksheet, row, 4, r.amount_current, amount_format)?;
        // Absent difference stays a blank cell
        if let Some(difference) = r.difference {
            write_amount(worksheet, row, 5, difference, amount_format)?;
        }
        write_text(worksheet, row, 6, r.disposition.label())?;
    }

    set_widths(worksheet, &[48.0, 14.0, 24.0, 16.0, 16.0, 16.0, 18.0])?;
    Ok(table.rows.len())
}

fn set_widths(worksheet: &mut Worksheet, widths: &[f64]) -> Result<(), String> {
    for (col, width) in widths.iter().enumerate() {
        worksheet
            .set_column_width(col as u16, *width)
            .map_err(|e| format!("Failed to set column {} width: {}", col, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oa2_recon::{MatchPolicy, ReconConfig};
    use tempfile::tempdir;

    const HEADERS: [&str; 6] = [
        "EXPEDIENTE / CASO",
        "NUM_DOC_DEMANDANTE",
        "DEMANDANTE_NOMBRE",
        "MAYOR",
        "SUB_CTA",
        "MONTO",
    ];

    fn raw(rows: &[[&str; 6]]) -> RawTable {
        RawTable::new(
            HEADERS.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn sample_result() -> ReconResult {
        let past = raw(&[
            ["C1", "D1", "N1", "1202", "01", "100"],
            ["C2", "D2", "N2", "1202", "01", "200"],
            ["C3", "D3", "N3", "1202", "01", "40"],
        ]);
        let current = raw(&[
            ["C1", "D1", "N1", "1202", "01", "150"],
            ["C3", "D3", "N3", "1202", "05", "40"],
            ["C4", "D4", "N4", "1202", "01", "75"],
        ]);
        let config = ReconConfig::default()
            .with_policies(vec![MatchPolicy::prefix_group("1202"), MatchPolicy::full_key()])
            .unwrap();
        oa2_recon::run(&config, &past, &current).unwrap()
    }

    fn read_sheet(path: &Path, name: &str) -> calamine::Range<Data> {
        let mut wb: Sheets<_> = open_workbook_auto(path).unwrap();
        wb.worksheet_range(name).unwrap()
    }

    #[test]
    fn cell_text_matches_text_read() {
        assert_eq!(cell_text(&Data::Float(1202.0)), "1202");
        assert_eq!(cell_text(&Data::Float(100.5)), "100.5");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::String("01".into())), "01");
        assert_eq!(cell_text(&Data::Bool(true)), "True");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn report_sheets_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Reporte_OA2.xlsx");
        let stats = write_report(&sample_result(), &path).unwrap();
        assert_eq!(stats.sheets_written, 4);

        let wb: Sheets<_> = open_workbook_auto(&path).unwrap();
        assert_eq!(
            wb.sheet_names(),
            ["PASADO", "ACTUAL", "Comparación 1202", "Comparación total"]
        );
    }

    #[test]
    fn report_comparison_cells() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        write_report(&sample_result(), &path).unwrap();

        let range = read_sheet(&path, "Comparación 1202");
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|r| r.iter().map(cell_text).collect())
            .collect();

        assert_eq!(rows[0], COMPARISON_HEADERS);
        assert_eq!(rows[1], ["C1-D1-N1", "1202-01", "1202-01", "100", "150", "50", "Misma cuenta"]);
        assert_eq!(rows[2], ["C2-D2-N2", "1202-01", "-", "200", "0", "-200", "Solo en pasado"]);
        assert_eq!(rows[3], ["C3-D3-N3", "1202-01", "1202-05", "40", "40", "", "Cuenta diferente"]);
        assert_eq!(rows[4], ["C4-D4-N4", "-", "1202-01", "0", "75", "75", "Solo en actual"]);
    }

    #[test]
    fn report_aggregated_cells() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        write_report(&sample_result(), &path).unwrap();

        let range = read_sheet(&path, "ACTUAL");
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|r| r.iter().map(cell_text).collect())
            .collect();
        assert_eq!(rows[0], AGGREGATED_HEADERS);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[3], ["C4-D4-N4", "1202-01", "75"]);
    }

    #[test]
    fn duplicate_sheet_name_fails_without_writing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("never.xlsx");
        let mut result = sample_result();
        result.comparisons[1].name = result.comparisons[0].name.clone();

        assert!(write_report(&result, &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn read_table_as_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("input.xlsx");

        let mut wb = XlsxWorkbook::new();
        let ws = wb.add_worksheet().set_name("Hoja1").unwrap();
        for (col, h) in HEADERS.iter().enumerate() {
            ws.write_string(0, col as u16, *h).unwrap();
        }
        ws.write_string(1, 0, "EXP-1").unwrap();
        ws.write_number(1, 1, 12345678.0).unwrap();
        ws.write_string(1, 2, "PEREZ").unwrap();
        ws.write_number(1, 3, 1202.0).unwrap();
        ws.write_string(1, 4, "01").unwrap();
        ws.write_number(1, 5, 99.5).unwrap();
        wb.save(&path).unwrap();

        let table = read_table(&path, None).unwrap();
        assert_eq!(table.headers, HEADERS);
        assert_eq!(table.rows[0], ["EXP-1", "12345678", "PEREZ", "1202", "01", "99.5"]);

        assert!(read_table(&path, Some("Hoja1")).is_ok());
        let err = read_table(&path, Some("Missing")).unwrap_err();
        assert!(err.contains("Hoja1"));
    }
}
