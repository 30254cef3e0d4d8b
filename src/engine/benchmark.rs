//! Point-in-time market benchmark resolution with tiered fallback.

use crate::domain::{normalize_length, Decimal, MarketReport, ProductCode, Region, Trade};
use chrono::NaiveDate;

/// Inputs for one benchmark lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkQuery {
    pub region: Region,
    pub product: ProductCode,
    /// Raw length spec; normalized to digits internally.
    pub length: String,
    /// Trade date; only reports on or before it are consulted.
    pub date: NaiveDate,
    /// Manually-verified base price, returned unchanged when present.
    pub override_price: Option<Decimal>,
}

impl BenchmarkQuery {
    pub fn for_trade(trade: &Trade) -> Self {
        BenchmarkQuery {
            region: trade.region,
            product: trade.product.clone(),
            length: trade.length.clone(),
            date: trade.date,
            override_price: trade.benchmark_override,
        }
    }

    /// Same trade, benchmarked as of a different date (e.g. a week's end).
    pub fn for_trade_at(trade: &Trade, date: NaiveDate) -> Self {
        BenchmarkQuery {
            date,
            ..Self::for_trade(trade)
        }
    }
}

/// Resolves a market reference price against the report history.
///
/// Pure: never mutates its inputs, and identical queries always produce
/// identical results, so the match engine and aggregator can both call it
/// freely on every refresh.
#[derive(Debug, Clone, Copy)]
pub struct BenchmarkResolver<'a> {
    /// Report history, sorted ascending by date.
    reports: &'a [MarketReport],
}

impl<'a> BenchmarkResolver<'a> {
    pub fn new(reports: &'a [MarketReport]) -> Self {
        Self { reports }
    }

    /// Latest report dated on or before `date`, never a future one.
    ///
    /// The cutoff is what keeps every downstream deviation statistic free of
    /// lookahead bias.
    pub fn report_on_or_before(&self, date: NaiveDate) -> Option<&'a MarketReport> {
        self.reports.iter().rev().find(|r| r.date <= date)
    }

    /// Best-available reference price for the query, or `None`.
    ///
    /// "None" is a frequent, valid outcome: aggregates must exclude the
    /// trade rather than substitute a zero.
    pub fn resolve(&self, query: &BenchmarkQuery) -> Option<Decimal> {
        if let Some(price) = query.override_price {
            return Some(price);
        }

        let report = self.report_on_or_before(query.date)?;
        let length = normalize_length(&query.length);

        let price = if query.product.is_msr() {
            resolve_msr(report, query.region, &query.product, &length)
        } else {
            resolve_standard(report, query.region, &query.product, &length)
        };

        if let Some(p) = price {
            tracing::debug!(
                region = %query.region,
                product = %query.product,
                report_date = %report.date,
                price = %p,
                "benchmark resolved"
            );
        }
        price
    }

    /// Resolve using the trade's own region/product/length/date.
    pub fn resolve_for_trade(&self, trade: &Trade) -> Option<Decimal> {
        self.resolve(&BenchmarkQuery::for_trade(trade))
    }
}

/// Standard (non-MSR) lookup, first hit wins:
/// exact length, composite, size-only composite, size-only at length.
fn resolve_standard(
    report: &MarketReport,
    region: Region,
    product: &ProductCode,
    length: &str,
) -> Option<Decimal> {
    let canonical = product.canonical();
    let base = product.base_dimension();

    if !length.is_empty() {
        if let Some(price) = report.length_price(region, &canonical, length) {
            return Some(price);
        }
    }
    if let Some(price) = report.composite_price(region, &canonical) {
        return Some(price);
    }
    if let Some(price) = report.composite_price(region, &base) {
        return Some(price);
    }
    if !length.is_empty() {
        if let Some(price) = report.length_price(region, &base, length) {
            return Some(price);
        }
    }
    None
}

/// MSR lookup: MSR stock prices to the #1 grade card for its dimension,
/// falling back to #2 when no #1 price exists.
fn resolve_msr(
    report: &MarketReport,
    region: Region,
    product: &ProductCode,
    length: &str,
) -> Option<Decimal> {
    let dim = product.dimension()?;

    for grade in ["#1", "#2"] {
        let graded = format!("{dim}{grade}");
        if !length.is_empty() {
            if let Some(price) = report.length_price(region, &graded, length) {
                return Some(price);
            }
        }
        if let Some(price) = report.composite_price(region, &graded) {
            return Some(price);
        }
    }
    None
}
