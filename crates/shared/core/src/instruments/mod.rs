//! Instrument definitions for tradeable assets

mod asset_class;
mod spec;

pub use asset_class::AssetClass;
pub use spec::InstrumentSpec;
