//! Streaming indicators.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: the latest output of an indicator, gated by `valid`
//! - `IndicatorId`: a handle into an [`registry::IndicatorRegistry`]
//! - `IndicatorType`: indicator identity + parameters
//! - `IndicatorSeries`: a time series of indicator points

pub mod ratio;
pub mod registry;
pub mod sma;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: f64,
}

impl IndicatorPoint {
    pub fn invalid(date: NaiveDate) -> Self {
        IndicatorPoint {
            date,
            valid: false,
            value: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndicatorId(pub(crate) usize);

impl IndicatorId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for IndicatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma { symbol: String, period: usize },
    Over {
        numerator: IndicatorId,
        denominator: IndicatorId,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma { symbol, period } => write!(f, "SMA({},{})", symbol, period),
            IndicatorType::Over {
                numerator,
                denominator,
            } => write!(f, "OVER({},{})", numerator, denominator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_type_display_sma() {
        let sma = IndicatorType::Sma {
            symbol: "WIKI/IBM".into(),
            period: 14,
        };
        assert_eq!(sma.to_string(), "SMA(WIKI/IBM,14)");
    }

    #[test]
    fn indicator_type_display_over() {
        let over = IndicatorType::Over {
            numerator: IndicatorId(1),
            denominator: IndicatorId(0),
        };
        assert_eq!(over.to_string(), "OVER(#1,#0)");
    }

    #[test]
    fn invalid_point_is_zero() {
        let p = IndicatorPoint::invalid(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(!p.valid);
        assert_eq!(p.value, 0.0);
    }
}
