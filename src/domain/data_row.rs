//! A single row of data-link custom data.

use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl Field {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Field::Number(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataRow {
    pub symbol: String,
    pub date: NaiveDate,
    /// Column name (normalised) to parsed cell. Empty cells are absent.
    pub fields: BTreeMap<String, Field>,
    pub value: Option<f64>,
}

impl DataRow {
    pub fn get(&self, column: &str) -> Option<&Field> {
        self.fields.get(&crate::domain::value_column::normalise(column))
    }

    /// Rows cover one day.
    pub fn end_date(&self) -> NaiveDate {
        self.date + Duration::days(1)
    }
}
