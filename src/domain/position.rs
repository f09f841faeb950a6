//! Position tracking.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub quantity: i64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    /// Add shares at `price`, keeping a quantity-weighted entry price.
    pub fn add(&mut self, quantity: i64, price: f64) {
        let total = self.quantity + quantity;
        if total != 0 {
            self.entry_price = (self.quantity as f64 * self.entry_price
                + quantity as f64 * price)
                / total as f64;
        }
        self.quantity = total;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub symbol: String,
    pub quantity: i64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub pnl: f64,
}
