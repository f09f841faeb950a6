//! Order intents emitted by decision callbacks.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum OrderIntent {
    /// Market order for a fixed number of shares (negative sells).
    Buy { symbol: String, quantity: i64 },
    /// Rebalance `symbol` to `fraction` of total equity.
    SetHoldings { symbol: String, fraction: f64 },
    /// Close every open position.
    Liquidate,
}

impl OrderIntent {
    pub fn buy(symbol: &str, quantity: i64) -> Self {
        OrderIntent::Buy {
            symbol: symbol.to_string(),
            quantity,
        }
    }

    pub fn set_holdings(symbol: &str, fraction: f64) -> Self {
        OrderIntent::SetHoldings {
            symbol: symbol.to_string(),
            fraction,
        }
    }
}

impl fmt::Display for OrderIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderIntent::Buy { symbol, quantity } => write!(f, "buy({}, {})", symbol, quantity),
            OrderIntent::SetHoldings { symbol, fraction } => {
                write!(f, "set_holdings({}, {})", symbol, fraction)
            }
            OrderIntent::Liquidate => write!(f, "liquidate()"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(OrderIntent::buy("WIKI/IBM", 100).to_string(), "buy(WIKI/IBM, 100)");
        assert_eq!(
            OrderIntent::set_holdings("SHFE/SCF2021", 1.0).to_string(),
            "set_holdings(SHFE/SCF2021, 1)"
        );
        assert_eq!(OrderIntent::Liquidate.to_string(), "liquidate()");
    }
}
