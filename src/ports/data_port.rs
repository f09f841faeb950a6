//! Data access port trait.

use crate::domain::data_row::DataRow;
use crate::domain::error::LinkError;
use crate::domain::value_column::DataDescriptor;
use chrono::NaiveDate;

pub trait DataPort {
    /// Rows for `symbol` dated within `[start_date, end_date]`, ascending,
    /// with `value` taken from the column `descriptor` selects.
    fn fetch_rows(
        &self,
        symbol: &str,
        descriptor: &DataDescriptor,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DataRow>, LinkError>;
}
