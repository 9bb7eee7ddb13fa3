use serde::{Deserialize, Serialize};

/// Order side (Buy or Sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Returns the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Position side - long (bought) or short (sold)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionSide {
    /// Profit when price rises
    Long,
    /// Profit when price falls
    Short,
}

impl PositionSide {
    /// Returns the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            PositionSide::Long => PositionSide::Short,
            PositionSide::Short => PositionSide::Long,
        }
    }

    /// Order side that opens a position on this side
    pub fn entry_side(&self) -> Side {
        match self {
            PositionSide::Long => Side::Buy,
            PositionSide::Short => Side::Sell,
        }
    }

    /// Order side that closes a position on this side
    pub fn exit_side(&self) -> Side {
        self.entry_side().opposite()
    }

    /// +1 for long, -1 for short
    pub fn sign(&self) -> i32 {
        match self {
            PositionSide::Long => 1,
            PositionSide::Short => -1,
        }
    }
}

impl std::fmt::Display for PositionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionSide::Long => write!(f, "LONG"),
            PositionSide::Short => write!(f, "SHORT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_and_exit_sides() {
        assert_eq!(PositionSide::Long.entry_side(), Side::Buy);
        assert_eq!(PositionSide::Long.exit_side(), Side::Sell);
        assert_eq!(PositionSide::Short.entry_side(), Side::Sell);
        assert_eq!(PositionSide::Short.exit_side(), Side::Buy);
    }
}
