//! Dataset loading from spreadsheets and delimited text

use super::table::ObservationTable;
use crate::config::{FEATURE_COLUMNS, TARGET_COLUMN};
use crate::error::{Result, XaiError};
use calamine::{open_workbook_auto, Data, Reader};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Input file formats understood by [`DatasetLoader`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Excel / OpenDocument workbook; the first worksheet is read
    Spreadsheet,
    /// Delimited text with a header row
    Delimited { separator: u8 },
}

impl InputFormat {
    /// Detect the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(InputFormat::Spreadsheet),
            "csv" => Ok(InputFormat::Delimited { separator: b',' }),
            "tsv" => Ok(InputFormat::Delimited { separator: b'\t' }),
            other => Err(XaiError::DataFormatError(format!(
                "unsupported input format '{}' for {}",
                other,
                path.display()
            ))),
        }
    }
}

/// Loads the plant measurements and validates the fixed schema
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    feature_columns: Vec<String>,
    target_column: String,
    infer_schema_length: usize,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetLoader {
    /// Loader for the `AT, V, AP, RH → PE` schema
    pub fn new() -> Self {
        Self {
            feature_columns: FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
            target_column: TARGET_COLUMN.to_string(),
            infer_schema_length: 1000,
        }
    }

    /// Override the required columns
    pub fn with_columns(mut self, feature_columns: &[String], target_column: &str) -> Self {
        self.feature_columns = feature_columns.to_vec();
        self.target_column = target_column.to_string();
        self
    }

    /// Load `path` and validate it into an [`ObservationTable`]
    pub fn load(&self, path: &Path) -> Result<ObservationTable> {
        let start = Instant::now();
        let df = self.load_frame(path)?;
        info!(
            path = %path.display(),
            rows = df.height(),
            cols = df.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded dataset"
        );

        let table = ObservationTable::from_frame(df, &self.feature_columns, &self.target_column)?;
        debug!("First rows of the dataset:\n{}", table.head(5));
        Ok(table)
    }

    /// Read `path` into a raw frame without schema validation
    pub fn load_frame(&self, path: &Path) -> Result<DataFrame> {
        if !path.exists() {
            return Err(XaiError::DataFormatError(format!(
                "input file {} does not exist",
                path.display()
            )));
        }

        match InputFormat::from_path(path)? {
            InputFormat::Spreadsheet => self.load_spreadsheet(path),
            InputFormat::Delimited { separator } => self.load_delimited(path, separator),
        }
    }

    fn load_delimited(&self, path: &Path, separator: u8) -> Result<DataFrame> {
        let file = File::open(path)?;

        let parse_opts = CsvParseOptions::default().with_separator(separator);

        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| XaiError::DataFormatError(format!("{}: {}", path.display(), e)))
    }

    /// First worksheet; first row is the header. Fully numeric columns become
    /// `Float64`, anything else is kept as text and rejected later if required.
    fn load_spreadsheet(&self, path: &Path) -> Result<DataFrame> {
        let mut workbook = open_workbook_auto(path)?;
        let sheet = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| XaiError::DataFormatError(format!("{} has no worksheets", path.display())))?;
        let range = workbook.worksheet_range(&sheet)?;

        let mut rows = range.rows();
        let header: Vec<String> = rows
            .next()
            .ok_or_else(|| XaiError::DataFormatError(format!("worksheet {} is empty", sheet)))?
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let mut cells: Vec<Vec<&Data>> = vec![Vec::new(); header.len()];
        for row in rows {
            for (j, column) in cells.iter_mut().enumerate() {
                column.push(row.get(j).unwrap_or(&Data::Empty));
            }
        }

        let columns: Vec<Column> = header
            .iter()
            .zip(cells.iter())
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, column)| spreadsheet_column(name, column))
            .collect();

        debug!(sheet = %sheet, columns = columns.len(), "Parsed worksheet");
        Ok(DataFrame::new(columns)?)
    }
}

fn numeric_cell(cell: &Data) -> std::result::Result<Option<f64>, ()> {
    match cell {
        Data::Float(v) => Ok(Some(*v)),
        Data::Int(v) => Ok(Some(*v as f64)),
        Data::Empty => Ok(None),
        Data::String(s) if s.trim().is_empty() => Ok(None),
        Data::String(s) => s.trim().parse::<f64>().map(Some).map_err(|_| ()),
        _ => Err(()),
    }
}

fn spreadsheet_column(name: &str, cells: &[&Data]) -> Column {
    let numeric: std::result::Result<Vec<Option<f64>>, ()> =
        cells.iter().map(|cell| numeric_cell(cell)).collect();

    match numeric {
        Ok(values) => Column::new(name.into(), values),
        Err(()) => {
            let text: Vec<Option<String>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Empty => None,
                    other => Some(other.to_string()),
                })
                .collect();
            Column::new(name.into(), text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    /// Workbook whose first sheet holds `header` and `rows`, followed by an unrelated sheet
    fn write_xlsx(dir: &Path, header: &[&str], rows: &[Vec<f64>]) -> std::path::PathBuf {
        let path = dir.join("plant.xlsx");
        let mut workbook = rust_xlsxwriter::Workbook::new();

        let sheet = workbook.add_worksheet();
        sheet.set_name("Sheet1").unwrap();
        for (j, name) in header.iter().enumerate() {
            sheet.write_string(0, j as u16, *name).unwrap();
        }
        for (i, row) in rows.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                sheet.write_number(i as u32 + 1, j as u16, *value).unwrap();
            }
        }

        let notes = workbook.add_worksheet();
        notes.set_name("Notes").unwrap();
        notes.write_string(0, 0, "source").unwrap();
        notes.write_string(1, 0, "UCI").unwrap();

        workbook.save(&path).unwrap();
        path
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            InputFormat::from_path(Path::new("Folds5x2_pp.xlsx")).unwrap(),
            InputFormat::Spreadsheet
        );
        assert_eq!(
            InputFormat::from_path(Path::new("data.CSV")).unwrap(),
            InputFormat::Delimited { separator: b',' }
        );
        assert!(InputFormat::from_path(Path::new("data.parquet")).is_err());
    }

    #[test]
    fn test_load_csv() {
        let file = write_csv(
            "AT,V,AP,RH,PE\n\
             14.96,41.76,1024.07,73.17,463.26\n\
             25.18,62.96,1020.04,59.08,444.37\n\
             5.11,39.4,1012.16,92.14,488.56\n",
        );

        let table = DatasetLoader::new().load(file.path()).unwrap();
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.feature_names(), &["AT", "V", "AP", "RH"]);
        let x = table.features().unwrap();
        assert!((x[[0, 2]] - 1024.07).abs() < 1e-9);
    }

    #[test]
    fn test_missing_column_fails_before_anything_else() {
        let file = write_csv("AT,V,AP,PE\n1,2,3,4\n5,6,7,8\n");
        let err = DatasetLoader::new().load(file.path()).unwrap_err();
        match err {
            XaiError::DataFormatError(msg) => assert!(msg.contains("RH"), "{}", msg),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_load_spreadsheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_xlsx(
            dir.path(),
            &[" AT ", "V", "AP", "RH", "PE", ""],
            &[
                vec![14.96, 41.76, 1024.07, 73.17, 463.26],
                vec![25.18, 62.96, 1020.04, 59.08, 444.37],
                vec![5.11, 39.4, 1012.16, 92.14, 488.56],
                vec![20.86, 57.32, 1010.24, 76.64, 446.48],
            ],
        );

        let table = DatasetLoader::new().load(&path).unwrap();
        assert_eq!(table.n_rows(), 4);
        assert_eq!(table.feature_names(), &["AT", "V", "AP", "RH"]);

        let x = table.features().unwrap();
        assert_eq!(x.dim(), (4, 4));
        assert!((x[[0, 0]] - 14.96).abs() < 1e-9);
        assert!((x[[2, 3]] - 92.14).abs() < 1e-9);
        let y = table.target().unwrap();
        assert!((y[3] - 446.48).abs() < 1e-9);
    }

    #[test]
    fn test_spreadsheet_without_target_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_xlsx(
            dir.path(),
            &["AT", "V", "AP", "RH"],
            &[vec![14.96, 41.76, 1024.07, 73.17], vec![25.18, 62.96, 1020.04, 59.08]],
        );

        match DatasetLoader::new().load(&path).unwrap_err() {
            XaiError::DataFormatError(msg) => assert!(msg.contains("PE"), "{}", msg),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_nan_in_csv_rejected() {
        let file = write_csv(
            "AT,V,AP,RH,PE\n\
             14.96,41.76,1024.07,73.17,463.26\n\
             NaN,62.96,1020.04,59.08,444.37\n",
        );

        match DatasetLoader::new().load(file.path()).unwrap_err() {
            XaiError::DataFormatError(msg) => assert!(msg.contains("AT"), "{}", msg),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = DatasetLoader::new()
            .load(Path::new("/nonexistent/Folds5x2_pp.xlsx"))
            .unwrap_err();
        assert!(matches!(err, XaiError::DataFormatError(_)));
    }

    #[test]
    fn test_spreadsheet_column_typing() {
        let cells = [Data::Float(1.5), Data::Int(2), Data::String(" 3.25 ".to_string())];
        let refs: Vec<&Data> = cells.iter().collect();
        let column = spreadsheet_column("AT", &refs);
        assert_eq!(column.dtype(), &DataType::Float64);

        let cells = [Data::Float(1.5), Data::String("n/a".to_string())];
        let refs: Vec<&Data> = cells.iter().collect();
        let column = spreadsheet_column("AT", &refs);
        assert_eq!(column.dtype(), &DataType::String);
    }
}
