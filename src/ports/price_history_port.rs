//! Price-history provider port.

use chrono::NaiveDate;

use crate::domain::error::FlagtraderError;
use crate::domain::ohlcv::OhlcvBar;

/// Source of daily bars. Implementations return bars inside the inclusive
/// date range in the order they are stored; ordering is validated when the
/// bars become a `PriceSeries`.
pub trait PriceHistoryPort {
    fn fetch_series(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, FlagtraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, FlagtraderError>;
}
