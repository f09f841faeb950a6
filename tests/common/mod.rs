#![allow(dead_code)]

use chrono::NaiveDate;
use linktrader::domain::data_row::{DataRow, Field};
use linktrader::domain::error::LinkError;
use linktrader::domain::resolution::Resolution;
use linktrader::domain::session::SessionConfig;
use linktrader::domain::strategy::{BuyAndHoldParams, RatioParams, ValueMomentumParams};
use linktrader::domain::value_column::DataDescriptor;
use linktrader::ports::data_port::DataPort;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

pub struct MockDataPort {
    pub data: HashMap<String, Vec<DataRow>>,
    pub errors: HashMap<String, String>,
    pub requests: RefCell<Vec<(String, DataDescriptor)>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_rows(mut self, symbol: &str, rows: Vec<DataRow>) -> Self {
        self.data.insert(symbol.to_string(), rows);
        self
    }

    pub fn with_values(self, symbol: &str, values: &[(&str, f64)]) -> Self {
        let rows = values
            .iter()
            .map(|(d, v)| make_row(symbol, d, Some(*v)))
            .collect();
        self.with_rows(symbol, rows)
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_rows(
        &self,
        symbol: &str,
        descriptor: &DataDescriptor,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DataRow>, LinkError> {
        self.requests
            .borrow_mut()
            .push((symbol.to_string(), descriptor.clone()));
        if let Some(reason) = self.errors.get(symbol) {
            return Err(LinkError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|rows| {
                rows.iter()
                    .filter(|r| r.date >= start_date && r.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub fn make_row(symbol: &str, date: &str, value: Option<f64>) -> DataRow {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    let mut fields = BTreeMap::new();
    fields.insert("date".to_string(), Field::Date(date));
    if let Some(v) = value {
        fields.insert("close".to_string(), Field::Number(v));
    }
    DataRow {
        symbol: symbol.to_string(),
        date,
        fields,
        value,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn sample_session() -> SessionConfig {
    SessionConfig::new(date(2014, 1, 1), date(2018, 1, 1), 25_000.0).unwrap()
}

pub fn ratio_params() -> RatioParams {
    RatioParams {
        numerator: "WIKI/FB".into(),
        numerator_descriptor: DataDescriptor::custom("adj. close").unwrap(),
        denominator: "WIKI/IBM".into(),
        denominator_descriptor: DataDescriptor::Default,
        period: 1,
        threshold: 1.0,
        quantity: 100,
        resolution: Resolution::Daily,
    }
}

pub fn buy_and_hold_params(symbol: &str) -> BuyAndHoldParams {
    BuyAndHoldParams {
        symbol: symbol.into(),
        descriptor: DataDescriptor::custom("settle").unwrap(),
        fraction: 1.0,
        sma_period: None,
        resolution: Resolution::Daily,
    }
}

pub fn value_momentum_params() -> ValueMomentumParams {
    ValueMomentumParams {
        signal: "UMICH/SOC1".into(),
        signal_descriptor: DataDescriptor::Default,
        symbol: "SPY".into(),
        descriptor: DataDescriptor::Default,
        history: 10,
        resolution: Resolution::Daily,
    }
}

/// A data-link CSV with `date,open,close,adj. close` columns.
pub fn datalink_csv(rows: &[(&str, f64, f64)]) -> String {
    let mut out = String::from("Date,Open,Close,Adj. Close\n");
    for (d, close, adj) in rows {
        out.push_str(&format!("{},{},{},{}\n", d, close, close, adj));
    }
    out
}
