//! Simulated broker over an in-memory portfolio.

use crate::domain::execution::{fill_market, liquidate_all, target_delta, FillResult};
use crate::domain::order::OrderIntent;
use crate::domain::portfolio::{Portfolio, PortfolioState};
use crate::ports::broker_port::BrokerPort;
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::info;

pub struct PaperBroker {
    portfolio: Portfolio,
}

impl PaperBroker {
    pub fn new(cash: f64) -> Self {
        Self {
            portfolio: Portfolio::new(cash),
        }
    }

    pub fn into_portfolio(self) -> Portfolio {
        self.portfolio
    }
}

fn no_price(symbol: &str) -> FillResult {
    FillResult::Rejected {
        reason: format!("no price for {}", symbol),
    }
}

/// Long only: a negative allocation closes any long position in `symbol`,
/// then the short leg is rejected.
fn short_allocation(
    portfolio: &mut Portfolio,
    symbol: &str,
    fraction: f64,
    date: NaiveDate,
    prices: &HashMap<String, f64>,
) -> Vec<FillResult> {
    let mut fills = Vec::with_capacity(2);
    let held = portfolio.get_position(symbol).map(|p| p.quantity).unwrap_or(0);
    if held > 0 {
        fills.push(match prices.get(symbol) {
            Some(&price) => fill_market(portfolio, symbol, -held, price, date),
            None => no_price(symbol),
        });
    }
    fills.push(FillResult::Rejected {
        reason: format!("short allocation {} of {} not supported", fraction, symbol),
    });
    fills
}

impl BrokerPort for PaperBroker {
    fn submit(
        &mut self,
        intent: &OrderIntent,
        date: NaiveDate,
        prices: &HashMap<String, f64>,
    ) -> Vec<FillResult> {
        let (fills, symbol) = match intent {
            OrderIntent::Buy { symbol, quantity } => {
                let fills = match prices.get(symbol) {
                    Some(&price) => {
                        vec![fill_market(&mut self.portfolio, symbol, *quantity, price, date)]
                    }
                    None => vec![no_price(symbol)],
                };
                (fills, Some(symbol.as_str()))
            }
            OrderIntent::SetHoldings { symbol, fraction } if *fraction < 0.0 => (
                short_allocation(&mut self.portfolio, symbol, *fraction, date, prices),
                Some(symbol.as_str()),
            ),
            OrderIntent::SetHoldings { symbol, fraction } => {
                let fills = match prices.get(symbol) {
                    Some(&price) => {
                        let delta = target_delta(&self.portfolio, symbol, *fraction, price, prices);
                        if delta == 0 {
                            Vec::new()
                        } else {
                            vec![fill_market(&mut self.portfolio, symbol, delta, price, date)]
                        }
                    }
                    None => vec![no_price(symbol)],
                };
                (fills, Some(symbol.as_str()))
            }
            OrderIntent::Liquidate => (liquidate_all(&mut self.portfolio, prices, date), None),
        };

        for fill in &fills {
            if let FillResult::Filled { quantity, price } = fill {
                info!(%date, %intent, quantity, price, cash = self.portfolio.cash, "filled");
                if let Some(symbol) = symbol.filter(|_| *quantity > 0) {
                    info!("{} Purchased {}", date, symbol);
                }
            }
        }
        fills
    }

    fn mark(&mut self, date: NaiveDate, prices: &HashMap<String, f64>) {
        let equity = self.portfolio.total_equity(prices);
        self.portfolio.record_equity(date, equity);
    }

    fn state(&self) -> PortfolioState {
        self.portfolio.state()
    }

    fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }
}
