//! Plot registrations and recorded samples.
//!
//! Purely cosmetic: the session samples ready indicators that changed on a
//! date. Samples never feed back into decisions.

use chrono::NaiveDate;

use crate::domain::indicator::IndicatorId;
use crate::domain::indicator::registry::IndicatorRegistry;

#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub chart: String,
    pub series: String,
    pub indicator: IndicatorId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotSample {
    pub chart: String,
    pub series: String,
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Plots {
    series: Vec<PlotSeries>,
    samples: Vec<PlotSample>,
}

impl Plots {
    pub fn new() -> Self {
        Self::default()
    }

    /// One series per indicator, named by its label.
    pub fn plot_indicators(
        &mut self,
        chart: &str,
        indicators: &[IndicatorId],
        registry: &IndicatorRegistry,
    ) {
        for &id in indicators {
            self.plot_series(chart, &registry.label(id), id);
        }
    }

    pub fn plot_series(&mut self, chart: &str, series: &str, indicator: IndicatorId) {
        self.series.push(PlotSeries {
            chart: chart.to_string(),
            series: series.to_string(),
            indicator,
        });
    }

    pub fn series(&self) -> &[PlotSeries] {
        &self.series
    }

    pub fn samples(&self) -> &[PlotSample] {
        &self.samples
    }

    pub fn record(&mut self, date: NaiveDate, changed: &[IndicatorId], registry: &IndicatorRegistry) {
        for s in &self.series {
            if !changed.contains(&s.indicator) {
                continue;
            }
            if let Some(value) = registry.value(s.indicator) {
                self.samples.push(PlotSample {
                    chart: s.chart.clone(),
                    series: s.series.clone(),
                    date,
                    value,
                });
            }
        }
    }
}
