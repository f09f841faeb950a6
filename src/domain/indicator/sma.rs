//! Simple Moving Average indicator.
//!
//! SMA[i] = mean(V[i-n+1..=i]). Warmup: the first (n-1) updates are invalid.
//! With n = 1 the indicator is the identity of the value stream.

use std::collections::VecDeque;

use chrono::NaiveDate;

use crate::domain::error::SignalError;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    window: VecDeque<f64>,
    sum: f64,
    current: Option<IndicatorPoint>,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, SignalError> {
        if period == 0 {
            return Err(SignalError::InvalidPeriod(period));
        }
        Ok(Sma {
            period,
            window: VecDeque::with_capacity(period),
            sum: 0.0,
            current: None,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn update(&mut self, date: NaiveDate, value: f64) -> IndicatorPoint {
        self.window.push_back(value);
        self.sum += value;
        if self.window.len() > self.period {
            if let Some(old) = self.window.pop_front() {
                self.sum -= old;
            }
        }

        let point = if self.window.len() == self.period {
            IndicatorPoint {
                date,
                valid: true,
                value: self.sum / self.period as f64,
            }
        } else {
            IndicatorPoint::invalid(date)
        };
        self.current = Some(point);
        point
    }

    pub fn current(&self) -> Option<&IndicatorPoint> {
        self.current.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.current.is_some_and(|p| p.valid)
    }
}

/// Batch SMA over a dated value stream.
pub fn calculate_sma(
    symbol: &str,
    values: &[(NaiveDate, f64)],
    period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Sma {
        symbol: symbol.to_string(),
        period,
    };
    let Ok(mut sma) = Sma::new(period) else {
        return IndicatorSeries {
            indicator_type,
            values: Vec::new(),
        };
    };

    IndicatorSeries {
        indicator_type,
        values: values
            .iter()
            .map(|&(date, value)| sma.update(date, value))
            .collect(),
    }
}
