//! Custom data descriptor: which column of a data-link row is the trading value.
//!
//! Data-link tables rarely agree on a "close" column. Without a declaration the
//! first of `close`, `price`, `settle`, `value` found in the header is used;
//! a [`ValueColumn`] overrides that and must exist in the header.

use crate::domain::error::DescriptorError;
use std::fmt;
use std::str::FromStr;

const DEFAULT_KEYWORDS: [&str; 4] = ["close", "price", "settle", "value"];

/// A validated, normalised (trimmed, lowercase) column name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueColumn(String);

impl ValueColumn {
    pub fn new(name: &str) -> Result<Self, DescriptorError> {
        let normalised = normalise(name);
        if normalised.is_empty() {
            return Err(DescriptorError::EmptyValueColumn);
        }
        Ok(Self(normalised))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn default_keywords() -> &'static [&'static str] {
        &DEFAULT_KEYWORDS
    }
}

impl fmt::Display for ValueColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DataDescriptor {
    #[default]
    Default,
    Custom(ValueColumn),
}

impl DataDescriptor {
    pub fn custom(name: &str) -> Result<Self, DescriptorError> {
        ValueColumn::new(name).map(DataDescriptor::Custom)
    }

    /// Index of the value column within a normalised header.
    ///
    /// `Ok(None)` only happens for [`DataDescriptor::Default`] when none of the
    /// keywords is present; such rows carry no value.
    pub fn resolve(&self, header: &[String]) -> Result<Option<usize>, DescriptorError> {
        match self {
            DataDescriptor::Custom(column) => header
                .iter()
                .position(|h| h == column.as_str())
                .map(Some)
                .ok_or_else(|| DescriptorError::MissingValueColumn {
                    column: column.to_string(),
                    header: header.join(","),
                }),
            DataDescriptor::Default => Ok(DEFAULT_KEYWORDS
                .iter()
                .find_map(|kw| header.iter().position(|h| h == kw))),
        }
    }
}

impl fmt::Display for DataDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataDescriptor::Default => f.write_str("default"),
            DataDescriptor::Custom(column) => write!(f, "{}", column),
        }
    }
}

impl FromStr for DataDescriptor {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("default") {
            Ok(DataDescriptor::Default)
        } else {
            DataDescriptor::custom(trimmed)
        }
    }
}

pub(crate) fn normalise(name: &str) -> String {
    name.trim().to_lowercase()
}
