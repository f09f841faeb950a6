//! Domain error types.

use chrono::NaiveDate;

/// Rejected value-column declarations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error("value column name cannot be empty")]
    EmptyValueColumn,

    #[error("value column '{column}' not found in header [{header}]")]
    MissingValueColumn { column: String, header: String },
}

/// Errors raised while parsing a data-link CSV.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReaderError {
    #[error("empty source: no header record")]
    EmptySource,

    #[error("no date column (expected one of date, year, report_month) in [{header}]")]
    MissingDateColumn { header: String },

    #[error("line {line}: invalid date '{value}' (expected {format})")]
    InvalidDate {
        line: usize,
        value: String,
        format: &'static str,
    },

    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

/// Errors raised while maintaining indicator state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SignalError {
    #[error("{indicator}: denominator is zero on {date}")]
    DivideByZero { indicator: String, date: NaiveDate },

    #[error("unknown indicator handle #{0}")]
    UnknownIndicator(usize),

    #[error("invalid indicator period {0}: must be at least 1")]
    InvalidPeriod(usize),
}

/// Top-level error type for linktrader.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("duplicate subscription for {symbol}")]
    DuplicateSubscription { symbol: String },

    #[error("{symbol} is not subscribed")]
    NotSubscribed { symbol: String },

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error("{symbol}: {source}")]
    Reader {
        symbol: String,
        #[source]
        source: ReaderError,
    },

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&LinkError> for std::process::ExitCode {
    fn from(err: &LinkError) -> Self {
        let code: u8 = match err {
            LinkError::Io(_) => 1,
            LinkError::ConfigParse { .. }
            | LinkError::ConfigMissing { .. }
            | LinkError::ConfigInvalid { .. }
            | LinkError::DuplicateSubscription { .. }
            | LinkError::NotSubscribed { .. } => 2,
            LinkError::DataSource { .. } | LinkError::NoData { .. } => 3,
            LinkError::Descriptor(_) | LinkError::Reader { .. } => 4,
            LinkError::Signal(_) => 5,
        };
        std::process::ExitCode::from(code)
    }
}
