//! Market-order fill simulation.
//!
//! Orders fill at the current value price, whole shares only, long only.
//! No slippage or commission is modelled.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::portfolio::Portfolio;
use super::position::{ClosedTrade, Position};

#[derive(Debug, Clone, PartialEq)]
pub enum FillResult {
    Filled { quantity: i64, price: f64 },
    Rejected { reason: String },
}

/// Fill a market order for `quantity` shares (negative sells).
pub fn fill_market(
    portfolio: &mut Portfolio,
    symbol: &str,
    quantity: i64,
    price: f64,
    date: NaiveDate,
) -> FillResult {
    if quantity == 0 {
        return FillResult::Rejected {
            reason: "zero quantity".into(),
        };
    }
    if !(price.is_finite() && price > 0.0) {
        return FillResult::Rejected {
            reason: format!("no valid price for {} ({})", symbol, price),
        };
    }

    if quantity > 0 {
        let cost = quantity as f64 * price;
        if cost > portfolio.cash {
            return FillResult::Rejected {
                reason: format!(
                    "insufficient cash: need {:.2}, have {:.2}",
                    cost, portfolio.cash
                ),
            };
        }
        portfolio.cash -= cost;
        if let Some(pos) = portfolio.get_position_mut(symbol) {
            pos.add(quantity, price);
        } else {
            portfolio.add_position(Position {
                symbol: symbol.to_string(),
                quantity,
                entry_price: price,
                entry_date: date,
            });
        }
        return FillResult::Filled { quantity, price };
    }

    let held = portfolio.get_position(symbol).map(|p| p.quantity).unwrap_or(0);
    let sell = -quantity;
    if sell > held {
        return FillResult::Rejected {
            reason: format!("cannot sell {} of {}, holding {}", sell, symbol, held),
        };
    }

    portfolio.cash += sell as f64 * price;
    if let Some(pos) = portfolio.get_position(symbol).cloned() {
        portfolio.record_trade(ClosedTrade {
            symbol: pos.symbol.clone(),
            quantity: sell,
            entry_price: pos.entry_price,
            exit_price: price,
            entry_date: pos.entry_date,
            exit_date: date,
            pnl: sell as f64 * (price - pos.entry_price),
        });
        if sell == held {
            portfolio.remove_position(symbol);
        } else if let Some(pos) = portfolio.get_position_mut(symbol) {
            pos.quantity -= sell;
        }
    }
    FillResult::Filled { quantity, price }
}

/// Shares to trade so that `symbol` makes up `fraction` of total equity.
pub fn target_delta(
    portfolio: &Portfolio,
    symbol: &str,
    fraction: f64,
    price: f64,
    price_map: &HashMap<String, f64>,
) -> i64 {
    if !(price.is_finite() && price > 0.0) {
        return 0;
    }
    let equity = portfolio.total_equity(price_map);
    let target = (equity * fraction / price).floor() as i64;
    let held = portfolio.get_position(symbol).map(|p| p.quantity).unwrap_or(0);
    target - held
}

/// Close every position, in symbol order. Positions without a price are
/// closed at their entry price.
pub fn liquidate_all(
    portfolio: &mut Portfolio,
    price_map: &HashMap<String, f64>,
    date: NaiveDate,
) -> Vec<FillResult> {
    let mut symbols: Vec<String> = portfolio.positions.keys().cloned().collect();
    symbols.sort();

    let mut fills = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let Some(pos) = portfolio.get_position(&symbol) else {
            continue;
        };
        let quantity = pos.quantity;
        let price = price_map.get(&symbol).copied().unwrap_or(pos.entry_price);
        fills.push(fill_market(portfolio, &symbol, -quantity, price, date));
    }
    fills
}
