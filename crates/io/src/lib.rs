// File I/O operations

pub mod csv;
pub mod xlsx;

use std::path::Path;

use oa2_recon::RawTable;

/// Input formats recognized by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Excel,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self, String> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" | "tsv" | "txt" => Ok(InputFormat::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(InputFormat::Excel),
            "" => Err(format!("{}: missing file extension", path.display())),
            other => Err(format!(
                "{}: unsupported format '.{}' (expected csv, tsv, xlsx, xlsm, xls, xlsb or ods)",
                path.display(),
                other
            )),
        }
    }
}

/// Load an input table. `sheet` selects a worksheet for Excel inputs and is
/// ignored for CSV.
pub fn read_table(path: &Path, sheet: Option<&str>) -> Result<RawTable, String> {
    match InputFormat::from_path(path)? {
        InputFormat::Csv => csv::read_table(path),
        InputFormat::Excel => xlsx::read_table(path, sheet),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn format_by_extension() {
        assert_eq!(InputFormat::from_path(&PathBuf::from("a.CSV")).unwrap(), InputFormat::Csv);
        assert_eq!(InputFormat::from_path(&PathBuf::from("b.tsv")).unwrap(), InputFormat::Csv);
        assert_eq!(InputFormat::from_path(&PathBuf::from("c.xlsx")).unwrap(), InputFormat::Excel);
        assert_eq!(InputFormat::from_path(&PathBuf::from("d.xls")).unwrap(), InputFormat::Excel);
        assert!(InputFormat::from_path(&PathBuf::from("e.pdf")).is_err());
        assert!(InputFormat::from_path(&PathBuf::from("noext")).is_err());
    }

    #[test]
    fn dispatches_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("past.csv");
        std::fs::write(&path, "MAYOR,MONTO\n1202,5\n").unwrap();
        let table = read_table(&path, Some("ignored")).unwrap();
        assert_eq!(table.len(), 1);
    }
}
