//! Decision callbacks and the built-in strategies.

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::data_row::DataRow;
use crate::domain::error::LinkError;
use crate::domain::indicator::IndicatorId;
use crate::domain::indicator::registry::IndicatorRegistry;
use crate::domain::order::OrderIntent;
use crate::domain::portfolio::PortfolioState;
use crate::domain::resolution::Resolution;
use crate::domain::session::SessionBuilder;
use crate::domain::value_column::DataDescriptor;

/// Everything a decision may read, passed in explicitly.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    pub date: NaiveDate,
    pub slice: &'a [DataRow],
    pub indicators: &'a IndicatorRegistry,
    pub portfolio: &'a PortfolioState,
}

pub trait Algorithm {
    fn name(&self) -> &str;

    /// Register subscriptions, indicators and plots. Called once before any
    /// data event.
    fn initialize(&mut self, session: &mut SessionBuilder) -> Result<(), LinkError>;

    /// Called once per data event in ascending date order. Returns at most
    /// one order intent.
    fn on_data(&mut self, ctx: &DecisionContext<'_>) -> Option<OrderIntent>;

    /// Rows asked for through [`SessionBuilder::history`], oldest first,
    /// delivered before the first data event.
    fn on_history(&mut self, _rows: &[DataRow]) {}
}

/// Two-state threshold rule: flat and ratio above threshold buys, ratio below
/// threshold liquidates whatever is held.
pub fn ratio_decision(
    ratio: f64,
    invested: bool,
    threshold: f64,
    symbol: &str,
    quantity: i64,
) -> Option<OrderIntent> {
    if !invested && ratio > threshold {
        Some(OrderIntent::buy(symbol, quantity))
    } else if ratio < threshold {
        Some(OrderIntent::Liquidate)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatioParams {
    pub numerator: String,
    pub numerator_descriptor: DataDescriptor,
    pub denominator: String,
    pub denominator_descriptor: DataDescriptor,
    pub period: usize,
    pub threshold: f64,
    pub quantity: i64,
    pub resolution: Resolution,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RatioHandles {
    numerator: IndicatorId,
    denominator: IndicatorId,
    ratio: IndicatorId,
}

/// Compares two series through `SMA(numerator) / SMA(denominator)` and trades
/// the denominator symbol.
#[derive(Debug, Clone)]
pub struct RatioStrategy {
    params: RatioParams,
    handles: Option<RatioHandles>,
}

impl RatioStrategy {
    pub fn new(params: RatioParams) -> Self {
        RatioStrategy {
            params,
            handles: None,
        }
    }

    pub fn params(&self) -> &RatioParams {
        &self.params
    }

    pub fn ratio_id(&self) -> Option<IndicatorId> {
        self.handles.map(|h| h.ratio)
    }
}

impl Algorithm for RatioStrategy {
    fn name(&self) -> &str {
        "ratio"
    }

    fn initialize(&mut self, session: &mut SessionBuilder) -> Result<(), LinkError> {
        let p = &self.params;
        session.add_data(&p.denominator, p.denominator_descriptor.clone(), p.resolution)?;
        session.add_data(&p.numerator, p.numerator_descriptor.clone(), p.resolution)?;

        let denominator = session.sma(&p.denominator, p.period, p.resolution)?;
        let numerator = session.sma(&p.numerator, p.period, p.resolution)?;
        let ratio = session.over(numerator, denominator)?;

        session.plot_indicator("Ratio", &[ratio]);
        session.plot_indicator("Data", &[denominator, numerator]);

        self.handles = Some(RatioHandles {
            numerator,
            denominator,
            ratio,
        });
        Ok(())
    }

    fn on_data(&mut self, ctx: &DecisionContext<'_>) -> Option<OrderIntent> {
        let h = self.handles?;
        if !ctx
            .indicators
            .all_ready(&[h.numerator, h.denominator, h.ratio])
        {
            return None;
        }
        let ratio = ctx.indicators.value(h.ratio)?;
        ratio_decision(
            ratio,
            ctx.portfolio.invested(),
            self.params.threshold,
            &self.params.denominator,
            self.params.quantity,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuyAndHoldParams {
    pub symbol: String,
    pub descriptor: DataDescriptor,
    pub fraction: f64,
    pub sma_period: Option<usize>,
    pub resolution: Resolution,
}

/// Allocates `fraction` of equity to one symbol whenever nothing is held.
#[derive(Debug, Clone)]
pub struct BuyAndHoldStrategy {
    params: BuyAndHoldParams,
    sma: Option<IndicatorId>,
}

impl BuyAndHoldStrategy {
    pub fn new(params: BuyAndHoldParams) -> Self {
        BuyAndHoldStrategy { params, sma: None }
    }

    pub fn params(&self) -> &BuyAndHoldParams {
        &self.params
    }

    pub fn sma_id(&self) -> Option<IndicatorId> {
        self.sma
    }
}

impl Algorithm for BuyAndHoldStrategy {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn initialize(&mut self, session: &mut SessionBuilder) -> Result<(), LinkError> {
        let p = &self.params;
        session.add_data(&p.symbol, p.descriptor.clone(), p.resolution)?;
        if let Some(period) = p.sma_period {
            let id = session.sma(&p.symbol, period, p.resolution)?;
            session.plot(&p.symbol, "PriceSMA", id);
            self.sma = Some(id);
        }
        Ok(())
    }

    fn on_data(&mut self, ctx: &DecisionContext<'_>) -> Option<OrderIntent> {
        if ctx.portfolio.invested() {
            return None;
        }
        Some(OrderIntent::set_holdings(
            &self.params.symbol,
            self.params.fraction,
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueMomentumParams {
    /// Custom-data series whose value drives the allocation.
    pub signal: String,
    pub signal_descriptor: DataDescriptor,
    /// Traded symbol.
    pub symbol: String,
    pub descriptor: DataDescriptor,
    /// Pre-start rows of the signal to load; 0 skips the request.
    pub history: usize,
    pub resolution: Resolution,
}

/// Goes fully long `symbol` while the signal value rises from one data row to
/// the next and asks for a full short otherwise.
#[derive(Debug, Clone)]
pub struct ValueMomentumStrategy {
    params: ValueMomentumParams,
    last: Option<f64>,
}

impl ValueMomentumStrategy {
    pub fn new(params: ValueMomentumParams) -> Self {
        ValueMomentumStrategy { params, last: None }
    }

    pub fn params(&self) -> &ValueMomentumParams {
        &self.params
    }

    pub fn last_value(&self) -> Option<f64> {
        self.last
    }
}

impl Algorithm for ValueMomentumStrategy {
    fn name(&self) -> &str {
        "value_momentum"
    }

    fn initialize(&mut self, session: &mut SessionBuilder) -> Result<(), LinkError> {
        let p = &self.params;
        session.add_data(&p.symbol, p.descriptor.clone(), p.resolution)?;
        session.add_data(&p.signal, p.signal_descriptor.clone(), p.resolution)?;
        if p.history > 0 {
            session.history(&p.signal, p.history)?;
        }
        Ok(())
    }

    fn on_history(&mut self, rows: &[DataRow]) {
        if let Some(value) = rows
            .iter()
            .rev()
            .filter(|r| r.symbol == self.params.signal)
            .find_map(|r| r.value)
        {
            self.last = Some(value);
        }
    }

    fn on_data(&mut self, ctx: &DecisionContext<'_>) -> Option<OrderIntent> {
        let value = ctx
            .slice
            .iter()
            .find(|r| r.symbol == self.params.signal)
            .and_then(|r| r.value)?;
        debug!(date = %ctx.date, signal = %self.params.signal, value, previous = ?self.last, "signal");

        let rising = self.last.is_some_and(|last| value > last);
        self.last = Some(value);
        let fraction = if rising { 1.0 } else { -1.0 };
        Some(OrderIntent::set_holdings(&self.params.symbol, fraction))
    }
}
