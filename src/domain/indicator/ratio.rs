//! Ratio of two indicators: numerator / denominator.
//!
//! Ready only when both inputs are ready. A ready zero denominator is an error.

use chrono::NaiveDate;

use crate::domain::error::SignalError;
use crate::domain::indicator::IndicatorPoint;

#[derive(Debug, Clone)]
pub struct Ratio {
    label: String,
    current: Option<IndicatorPoint>,
}

impl Ratio {
    pub fn new(label: impl Into<String>) -> Self {
        Ratio {
            label: label.into(),
            current: None,
        }
    }

    pub fn update(
        &mut self,
        date: NaiveDate,
        numerator: Option<&IndicatorPoint>,
        denominator: Option<&IndicatorPoint>,
    ) -> Result<IndicatorPoint, SignalError> {
        let point = compute(&self.label, date, numerator, denominator)?;
        self.current = Some(point);
        Ok(point)
    }

    pub fn current(&self) -> Option<&IndicatorPoint> {
        self.current.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.current.is_some_and(|p| p.valid)
    }
}

pub fn compute(
    label: &str,
    date: NaiveDate,
    numerator: Option<&IndicatorPoint>,
    denominator: Option<&IndicatorPoint>,
) -> Result<IndicatorPoint, SignalError> {
    match (numerator, denominator) {
        (Some(a), Some(b)) if a.valid && b.valid => {
            if b.value == 0.0 {
                return Err(SignalError::DivideByZero {
                    indicator: label.to_string(),
                    date,
                });
            }
            Ok(IndicatorPoint {
                date,
                valid: true,
                value: a.value / b.value,
            })
        }
        _ => Ok(IndicatorPoint::invalid(date)),
    }
}
