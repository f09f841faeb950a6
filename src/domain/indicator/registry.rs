//! Indicator registry: owns every indicator of a session and keeps derived
//! indicators in step with their inputs.
//!
//! Indicators live in an arena addressed by [`IndicatorId`]. A derived
//! indicator can only reference ids created before it, so a single pass in
//! creation order recomputes everything downstream of an update.

use chrono::NaiveDate;

use crate::domain::error::SignalError;
use crate::domain::indicator::ratio::Ratio;
use crate::domain::indicator::sma::Sma;
use crate::domain::indicator::{IndicatorId, IndicatorPoint, IndicatorType};
use crate::domain::resolution::Resolution;

#[derive(Debug, Clone)]
enum Node {
    Sma {
        symbol: String,
        resolution: Resolution,
        sma: Sma,
    },
    Over {
        numerator: IndicatorId,
        denominator: IndicatorId,
        ratio: Ratio,
    },
}

#[derive(Debug, Clone, Default)]
pub struct IndicatorRegistry {
    nodes: Vec<Node>,
}

impl IndicatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Register a simple moving average over `symbol`'s value stream.
    pub fn sma(
        &mut self,
        symbol: &str,
        period: usize,
        resolution: Resolution,
    ) -> Result<IndicatorId, SignalError> {
        let sma = Sma::new(period)?;
        self.nodes.push(Node::Sma {
            symbol: symbol.to_string(),
            resolution,
            sma,
        });
        Ok(IndicatorId(self.nodes.len() - 1))
    }

    /// Register `numerator / denominator`.
    pub fn over(
        &mut self,
        numerator: IndicatorId,
        denominator: IndicatorId,
    ) -> Result<IndicatorId, SignalError> {
        for id in [numerator, denominator] {
            if id.0 >= self.nodes.len() {
                return Err(SignalError::UnknownIndicator(id.0));
            }
        }
        let label = IndicatorType::Over {
            numerator,
            denominator,
        }
        .to_string();
        self.nodes.push(Node::Over {
            numerator,
            denominator,
            ratio: Ratio::new(label),
        });
        Ok(IndicatorId(self.nodes.len() - 1))
    }

    /// Feed a new value for `symbol`. Returns the ids that changed, in
    /// creation order.
    pub fn update(
        &mut self,
        symbol: &str,
        date: NaiveDate,
        value: f64,
    ) -> Result<Vec<IndicatorId>, SignalError> {
        let mut changed = vec![false; self.nodes.len()];

        for i in 0..self.nodes.len() {
            let inputs = match &self.nodes[i] {
                Node::Sma { .. } => None,
                Node::Over {
                    numerator,
                    denominator,
                    ..
                } => Some((*numerator, *denominator)),
            };

            match inputs {
                None => {
                    if let Node::Sma {
                        symbol: s, sma, ..
                    } = &mut self.nodes[i]
                    {
                        if s.as_str() == symbol {
                            sma.update(date, value);
                            changed[i] = true;
                        }
                    }
                }
                Some((num, den)) => {
                    if !(changed[num.0] || changed[den.0]) {
                        continue;
                    }
                    let a = self.point(num);
                    let b = self.point(den);
                    if let Node::Over { ratio, .. } = &mut self.nodes[i] {
                        ratio.update(date, a.as_ref(), b.as_ref())?;
                        changed[i] = true;
                    }
                }
            }
        }

        Ok(changed
            .iter()
            .enumerate()
            .filter(|(_, c)| **c)
            .map(|(i, _)| IndicatorId(i))
            .collect())
    }

    fn point(&self, id: IndicatorId) -> Option<IndicatorPoint> {
        self.current(id).copied()
    }

    pub fn current(&self, id: IndicatorId) -> Option<&IndicatorPoint> {
        match self.nodes.get(id.0)? {
            Node::Sma { sma, .. } => sma.current(),
            Node::Over { ratio, .. } => ratio.current(),
        }
    }

    /// Latest value, only when ready.
    pub fn value(&self, id: IndicatorId) -> Option<f64> {
        self.current(id).filter(|p| p.valid).map(|p| p.value)
    }

    pub fn is_ready(&self, id: IndicatorId) -> bool {
        self.current(id).is_some_and(|p| p.valid)
    }

    pub fn all_ready(&self, ids: &[IndicatorId]) -> bool {
        ids.iter().all(|&id| self.is_ready(id))
    }

    pub fn indicator_type(&self, id: IndicatorId) -> Option<IndicatorType> {
        Some(match self.nodes.get(id.0)? {
            Node::Sma { symbol, sma, .. } => IndicatorType::Sma {
                symbol: symbol.clone(),
                period: sma.period(),
            },
            Node::Over {
                numerator,
                denominator,
                ..
            } => IndicatorType::Over {
                numerator: *numerator,
                denominator: *denominator,
            },
        })
    }

    pub fn resolution(&self, id: IndicatorId) -> Option<Resolution> {
        match self.nodes.get(id.0)? {
            Node::Sma { resolution, .. } => Some(*resolution),
            Node::Over { .. } => None,
        }
    }

    pub fn label(&self, id: IndicatorId) -> String {
        self.indicator_type(id)
            .map(|t| t.to_string())
            .unwrap_or_else(|| id.to_string())
    }
}
