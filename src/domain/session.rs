//! Strategy session: configuration, subscriptions and the replay loop.
//!
//! The session owns every piece of state a strategy reads (indicators,
//! subscriptions, plots) and hands it to the decision callback explicitly
//! through a [`DecisionContext`]. Portfolio state comes from the broker port.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use crate::domain::data_row::DataRow;
use crate::domain::error::{LinkError, SignalError};
use crate::domain::execution::FillResult;
use crate::domain::indicator::IndicatorId;
use crate::domain::indicator::registry::IndicatorRegistry;
use crate::domain::order::OrderIntent;
use crate::domain::plot::{PlotSample, Plots};
use crate::domain::resolution::Resolution;
use crate::domain::strategy::{Algorithm, DecisionContext};
use crate::domain::value_column::DataDescriptor;
use crate::ports::broker_port::BrokerPort;
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    start_date: NaiveDate,
    end_date: NaiveDate,
    cash: f64,
}

impl SessionConfig {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, cash: f64) -> Result<Self, LinkError> {
        if !(cash.is_finite() && cash > 0.0) {
            return Err(LinkError::ConfigInvalid {
                section: "session".into(),
                key: "cash".into(),
                reason: "cash must be positive".into(),
            });
        }
        if start_date >= end_date {
            return Err(LinkError::ConfigInvalid {
                section: "session".into(),
                key: "start_date".into(),
                reason: "start_date must be before end_date".into(),
            });
        }
        Ok(SessionConfig {
            start_date,
            end_date,
            cash,
        })
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub symbol: String,
    pub descriptor: DataDescriptor,
    pub resolution: Resolution,
}

/// Rows to load from before the session start.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRequest {
    pub symbol: String,
    pub periods: usize,
}

/// Registration surface handed to [`Algorithm::initialize`].
#[derive(Debug)]
pub struct SessionBuilder {
    config: SessionConfig,
    subscriptions: Vec<Subscription>,
    history: Vec<HistoryRequest>,
    indicators: IndicatorRegistry,
    plots: Plots,
}

impl SessionBuilder {
    pub fn new(config: SessionConfig) -> Self {
        SessionBuilder {
            config,
            subscriptions: Vec::new(),
            history: Vec::new(),
            indicators: IndicatorRegistry::new(),
            plots: Plots::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn add_data(
        &mut self,
        symbol: &str,
        descriptor: DataDescriptor,
        resolution: Resolution,
    ) -> Result<(), LinkError> {
        if self.is_subscribed(symbol) {
            return Err(LinkError::DuplicateSubscription {
                symbol: symbol.to_string(),
            });
        }
        self.subscriptions.push(Subscription {
            symbol: symbol.to_string(),
            descriptor,
            resolution,
        });
        Ok(())
    }

    pub fn is_subscribed(&self, symbol: &str) -> bool {
        self.subscriptions.iter().any(|s| s.symbol == symbol)
    }

    pub fn sma(
        &mut self,
        symbol: &str,
        period: usize,
        resolution: Resolution,
    ) -> Result<IndicatorId, LinkError> {
        if !self.is_subscribed(symbol) {
            return Err(LinkError::NotSubscribed {
                symbol: symbol.to_string(),
            });
        }
        Ok(self.indicators.sma(symbol, period, resolution)?)
    }

    pub fn over(
        &mut self,
        numerator: IndicatorId,
        denominator: IndicatorId,
    ) -> Result<IndicatorId, LinkError> {
        Ok(self.indicators.over(numerator, denominator)?)
    }

    /// Ask for the last `periods` valued rows of `symbol` dated before the
    /// session start. They warm up indicators and are handed to
    /// [`Algorithm::on_history`] before the first data event.
    pub fn history(&mut self, symbol: &str, periods: usize) -> Result<(), LinkError> {
        if !self.is_subscribed(symbol) {
            return Err(LinkError::NotSubscribed {
                symbol: symbol.to_string(),
            });
        }
        if periods == 0 {
            return Err(SignalError::InvalidPeriod(0).into());
        }
        self.history.push(HistoryRequest {
            symbol: symbol.to_string(),
            periods,
        });
        Ok(())
    }

    pub fn plot_indicator(&mut self, chart: &str, indicators: &[IndicatorId]) {
        self.plots.plot_indicators(chart, indicators, &self.indicators);
    }

    pub fn plot(&mut self, chart: &str, series: &str, indicator: IndicatorId) {
        self.plots.plot_series(chart, series, indicator);
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn indicators(&self) -> &IndicatorRegistry {
        &self.indicators
    }

    pub fn history_requests(&self) -> &[HistoryRequest] {
        &self.history
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    pub history_rows: usize,
    pub events: usize,
    pub intents: Vec<(NaiveDate, OrderIntent)>,
    pub plots: Vec<PlotSample>,
}

/// An initialized strategy, ready for one replay.
pub struct Session {
    config: SessionConfig,
    subscriptions: Vec<Subscription>,
    history: Vec<HistoryRequest>,
    indicators: IndicatorRegistry,
    plots: Plots,
    algorithm: Box<dyn Algorithm>,
}

impl Session {
    /// Run the algorithm's initialization hook and freeze the configuration.
    pub fn initialize(
        config: SessionConfig,
        mut algorithm: Box<dyn Algorithm>,
    ) -> Result<Self, LinkError> {
        let mut builder = SessionBuilder::new(config);
        algorithm.initialize(&mut builder)?;
        info!(
            algorithm = algorithm.name(),
            subscriptions = builder.subscriptions.len(),
            indicators = builder.indicators.len(),
            "session initialized"
        );
        Ok(Session {
            config: builder.config,
            subscriptions: builder.subscriptions,
            history: builder.history,
            indicators: builder.indicators,
            plots: builder.plots,
            algorithm,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn indicators(&self) -> &IndicatorRegistry {
        &self.indicators
    }

    pub fn algorithm_name(&self) -> &str {
        self.algorithm.name()
    }

    /// Replay every subscribed row in date order, one decision per date.
    ///
    /// Consumes the session: indicators, plots and strategy state only
    /// describe a single pass. The broker must start with the configured cash.
    pub fn run(
        mut self,
        data_port: &dyn DataPort,
        broker: &mut dyn BrokerPort,
    ) -> Result<SessionResult, LinkError> {
        let broker_cash = broker.portfolio().initial_capital;
        if (broker_cash - self.config.cash).abs() > f64::EPSILON {
            return Err(LinkError::ConfigInvalid {
                section: "session".into(),
                key: "cash".into(),
                reason: format!(
                    "broker starts with {:.2}, session is configured with {:.2}",
                    broker_cash, self.config.cash
                ),
            });
        }

        let history_rows = self.warm_up(data_port)?;
        let timeline = self.load_timeline(data_port)?;
        info!(dates = timeline.len(), "replaying");

        let mut prices: HashMap<String, f64> = HashMap::new();
        let mut intents = Vec::new();
        let mut events = 0usize;

        for (date, slice) in &timeline {
            let mut changed: Vec<IndicatorId> = Vec::new();
            for row in slice {
                let Some(value) = row.value else {
                    debug!(symbol = %row.symbol, %date, "row has no value, skipping");
                    continue;
                };
                prices.insert(row.symbol.clone(), value);
                for id in self.indicators.update(&row.symbol, *date, value)? {
                    if !changed.contains(&id) {
                        changed.push(id);
                    }
                }
            }
            // sampled once all rows of the date are in
            self.plots.record(*date, &changed, &self.indicators);

            let state = broker.state();
            let ctx = DecisionContext {
                date: *date,
                slice,
                indicators: &self.indicators,
                portfolio: &state,
            };

            if let Some(intent) = self.algorithm.on_data(&ctx) {
                debug!(%date, %intent, "order intent");
                for fill in broker.submit(&intent, *date, &prices) {
                    if let FillResult::Rejected { reason } = fill {
                        warn!(%date, %intent, "order rejected: {}", reason);
                    }
                }
                intents.push((*date, intent));
            }

            broker.mark(*date, &prices);
            events += 1;
        }

        Ok(SessionResult {
            history_rows,
            events,
            intents,
            plots: self.plots.samples().to_vec(),
        })
    }

    /// Feed requested pre-start rows to the indicators and the algorithm.
    fn warm_up(&mut self, data_port: &dyn DataPort) -> Result<usize, LinkError> {
        let Some(before) = self.config.start_date.pred_opt() else {
            return Ok(0);
        };

        let mut total = 0;
        for request in &self.history {
            let Some(sub) = self.subscriptions.iter().find(|s| s.symbol == request.symbol) else {
                continue;
            };
            let mut rows: Vec<DataRow> = data_port
                .fetch_rows(&sub.symbol, &sub.descriptor, NaiveDate::MIN, before)?
                .into_iter()
                .filter(|r| r.value.is_some())
                .collect();
            rows.sort_by_key(|r| r.date);
            let rows = rows.split_off(rows.len().saturating_sub(request.periods));

            for row in &rows {
                if let Some(value) = row.value {
                    self.indicators.update(&row.symbol, row.date, value)?;
                }
            }
            info!(
                symbol = %sub.symbol,
                requested = request.periods,
                received = rows.len(),
                "history loaded"
            );
            self.algorithm.on_history(&rows);
            total += rows.len();
        }
        Ok(total)
    }

    fn load_timeline(
        &self,
        data_port: &dyn DataPort,
    ) -> Result<BTreeMap<NaiveDate, Vec<DataRow>>, LinkError> {
        let mut timeline: BTreeMap<NaiveDate, Vec<DataRow>> = BTreeMap::new();

        for sub in &self.subscriptions {
            let rows = data_port.fetch_rows(
                &sub.symbol,
                &sub.descriptor,
                self.config.start_date,
                self.config.end_date,
            )?;
            if rows.is_empty() {
                warn!(symbol = %sub.symbol, "no rows in session window");
            }
            for row in rows {
                timeline.entry(row.date).or_default().push(row);
            }
        }

        if timeline.is_empty() {
            return Err(LinkError::NoData {
                symbol: self
                    .subscriptions
                    .iter()
                    .map(|s| s.symbol.as_str())
                    .collect::<Vec<_>>()
                    .join(","),
            });
        }
        Ok(timeline)
    }
}
