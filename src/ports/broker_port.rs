//! Order routing port trait.

use crate::domain::execution::FillResult;
use crate::domain::order::OrderIntent;
use crate::domain::portfolio::{Portfolio, PortfolioState};
use chrono::NaiveDate;
use std::collections::HashMap;

pub trait BrokerPort {
    /// Route an intent. `prices` holds the latest value per symbol.
    fn submit(
        &mut self,
        intent: &OrderIntent,
        date: NaiveDate,
        prices: &HashMap<String, f64>,
    ) -> Vec<FillResult>;

    /// Record end-of-event equity.
    fn mark(&mut self, date: NaiveDate, prices: &HashMap<String, f64>);

    fn state(&self) -> PortfolioState;

    fn portfolio(&self) -> &Portfolio;
}
