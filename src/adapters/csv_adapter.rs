//! Local data-link CSV files.
//!
//! One file per symbol under a base directory; `/` in the symbol becomes `_`
//! in the file name, so `WIKI/IBM` reads `WIKI_IBM.csv`.

use crate::adapters::datalink_reader::parse_rows;
use crate::domain::data_row::DataRow;
use crate::domain::error::LinkError;
use crate::domain::value_column::DataDescriptor;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(file_name(symbol))
    }
}

pub fn file_name(symbol: &str) -> String {
    format!("{}.csv", symbol.replace('/', "_"))
}

impl DataPort for CsvAdapter {
    fn fetch_rows(
        &self,
        symbol: &str,
        descriptor: &DataDescriptor,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DataRow>, LinkError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| LinkError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let rows = parse_rows(symbol, &content, descriptor).map_err(|source| {
            LinkError::Reader {
                symbol: symbol.to_string(),
                source,
            }
        })?;
        let total = rows.len();

        let rows: Vec<DataRow> = rows
            .into_iter()
            .filter(|r| r.date >= start_date && r.date <= end_date)
            .collect();
        debug!(symbol, file = %path.display(), total, kept = rows.len(), "loaded rows");
        Ok(rows)
    }
}
