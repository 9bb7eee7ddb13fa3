use serde::{Deserialize, Serialize};

use super::AssetClass;
use crate::values::{Quantity, Symbol};

/// Static description of a tradeable symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    /// Unique symbol (e.g., "BTC-USD", "AAPL", "ES")
    pub symbol: Symbol,
    pub asset_class: AssetClass,
    /// Minimum quantity increment; also the smallest tradable size
    pub lot_size: Quantity,
}

impl InstrumentSpec {
    pub fn new(symbol: impl Into<Symbol>, asset_class: AssetClass, lot_size: Quantity) -> Self {
        Self {
            symbol: symbol.into(),
            asset_class,
            lot_size,
        }
    }

    /// Round a quantity down to the nearest lot
    ///
    /// `None` when the lot count overflows the decimal range.
    pub fn floor_to_lot(&self, quantity: Quantity) -> Option<Quantity> {
        if self.lot_size <= Quantity::ZERO {
            return Some(quantity);
        }
        quantity
            .checked_div(self.lot_size)?
            .floor()
            .checked_mul(self.lot_size)
    }

    /// Validate that a quantity is a positive multiple of the lot size
    pub fn validate_quantity(&self, quantity: Quantity) -> bool {
        if quantity <= Quantity::ZERO {
            return false;
        }
        if self.lot_size <= Quantity::ZERO {
            return true;
        }
        (quantity % self.lot_size).is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_floor_to_lot() {
        let spec = InstrumentSpec::new("BTC-USD", AssetClass::Crypto, dec!(0.001));
        assert_eq!(spec.floor_to_lot(dec!(1.23456)), Some(dec!(1.234)));
        assert!(spec.validate_quantity(dec!(1.234)));
        assert!(!spec.validate_quantity(dec!(1.2345)));

        let equity = InstrumentSpec::new("AAPL", AssetClass::Equity, dec!(1));
        assert_eq!(equity.floor_to_lot(dec!(7.9)), Some(dec!(7)));
    }

    #[test]
    fn test_floor_to_lot_overflow() {
        let dust = InstrumentSpec::new("DUST", AssetClass::Crypto, dec!(0.0000000001));
        assert_eq!(dust.floor_to_lot(Quantity::MAX), None);
    }
}
