//! CSV Loader
//!
//! Reads flow records into a [`RawTable`]: trimmed header names, one
//! optional numeric cell per feature column, and the trailing label.
//! Cells that do not parse as numbers are kept as NaN and left for the
//! cleaner to fill.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::logic::error::DataError;

/// Uncleaned table straight from the CSV
#[derive(Debug, Clone)]
pub struct RawTable {
    pub feature_names: Vec<String>,
    pub label_name: String,
    /// Row-major feature cells, NaN where the cell was missing or non-numeric
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<String>,
}

impl RawTable {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }
}

/// Open and read a CSV file from disk
pub fn read_csv_file(path: &Path) -> Result<RawTable, DataError> {
    log::info!("Loading flow records from: {}", path.display());

    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let table = read_csv(file)?;
    log::info!(
        "Loaded {} rows x {} feature columns (label column '{}')",
        table.n_rows(),
        table.n_features(),
        table.label_name
    );
    Ok(table)
}

/// Read CSV records from any reader. The last column is the label.
pub fn read_csv<R: Read>(reader: R) -> Result<RawTable, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let width = headers.len();
    if width == 0 {
        return Err(DataError::MissingHeader);
    }
    if width < 2 {
        return Err(DataError::TooFewColumns(width));
    }

    let mut names: Vec<String> = headers.iter().map(str::to_string).collect();
    let label_name = names.pop().unwrap_or_default();

    let mut rows = Vec::new();
    let mut labels = Vec::new();

    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        if record.len() != width {
            return Err(DataError::RowWidth {
                row,
                expected: width,
                found: record.len(),
            });
        }

        let values: Vec<f64> = record.iter().take(width - 1).map(parse_cell).collect();
        let label = record.get(width - 1).unwrap_or("");
        if label.is_empty() {
            return Err(DataError::EmptyLabel { row });
        }

        rows.push(values);
        labels.push(label.to_string());
    }

    if rows.is_empty() {
        return Err(DataError::Empty);
    }

    Ok(RawTable {
        feature_names: names,
        label_name,
        rows,
        labels,
    })
}

/// Numeric coercion: anything unparseable is missing
fn parse_cell(cell: &str) -> f64 {
    cell.parse::<f64>().unwrap_or(f64::NAN)
}
