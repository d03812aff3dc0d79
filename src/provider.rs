pub mod yahoo;

use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::ProviderError;
use crate::model::{History, HistoryRange, Interval, Quote, SymbolMatch, SymbolSummary};

/// Abstraction over the external market-data source.
///
/// Uses `BoxFuture` (from `futures`) instead of `async fn` in trait to keep
/// the trait object-safe (`dyn DataProvider`). The provider does not retry
/// and does not cache; it only shapes remote data into engine-ready arrays
/// and enforces its own request-rate budget.
pub trait DataProvider: Send + Sync {
    /// Fetch historical OHLCV bars for one symbol.
    fn fetch_history(
        &self,
        symbol: &str,
        range: HistoryRange,
        interval: Interval,
    ) -> BoxFuture<'_, Result<History, Report<ProviderError>>>;

    /// Fetch current quote snapshots for one or more symbols.
    fn fetch_quotes(
        &self,
        symbols: &[String],
    ) -> BoxFuture<'_, Result<Vec<Quote>, Report<ProviderError>>>;

    /// Search symbols by name or ticker fragment.
    fn search(&self, query: &str)
    -> BoxFuture<'_, Result<Vec<SymbolMatch>, Report<ProviderError>>>;

    /// Fetch profile plus valuation/dividend/earnings metadata.
    fn fetch_summary(
        &self,
        symbol: &str,
    ) -> BoxFuture<'_, Result<SymbolSummary, Report<ProviderError>>>;
}
