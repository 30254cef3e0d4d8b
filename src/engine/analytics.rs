//! Reporting rollups composed from the match engine and benchmark resolver.
//!
//! Every view takes the caller's already-filtered working set as an
//! argument; cross-window joins (matching, aging) always consult the
//! unfiltered collections carried by the [`EngineContext`].

use crate::domain::{Decimal, Side, Trade, TradeId};
use crate::engine::benchmark::BenchmarkQuery;
use crate::engine::matching::{BuyIndex, MatchedPair};
use crate::engine::EngineContext;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

/// Number of trailing weekly windows in the rollup views.
const ROLLUP_WEEKS: i64 = 8;

/// Volume/value sums over the working set, with blended averages.
///
/// "Blended" means simple weighted sums over every record, matched or not;
/// the order-matched notion of margin lives in
/// [`MatchedTotals`](crate::engine::matching::MatchedTotals).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BlendedTotals {
    pub buy_volume: Decimal,
    pub buy_value: Decimal,
    pub sell_volume: Decimal,
    pub sell_value: Decimal,
    pub sell_fob_value: Decimal,
    pub avg_buy_price: Decimal,
    pub avg_sell_fob: Decimal,
    pub avg_freight_per_mbf: Decimal,
    /// `avg_sell_fob - avg_buy_price`.
    pub blended_margin: Decimal,
}

/// One `[start, end)` weekly window of the trailing rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekBucket {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub buy_volume: Decimal,
    pub sell_volume: Decimal,
    /// Order-matched profit restricted to this week's Sells.
    pub realized_profit: Decimal,
}

/// Volume-weighted buy-price deviation from the market for one week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekDeviation {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// `None` when no Buy in the week had a resolvable benchmark; absent
    /// entries never degrade to zero.
    pub avg_deviation: Option<Decimal>,
}

/// Unsold Buy volume bucketed by age in days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AgingBuckets {
    pub up_to_7: Decimal,
    pub up_to_14: Decimal,
    pub up_to_30: Decimal,
    pub over_30: Decimal,
}

impl AgingBuckets {
    pub fn total(&self) -> Decimal {
        self.up_to_7 + self.up_to_14 + self.up_to_30 + self.over_30
    }
}

/// Per-group rollup for top-products / top-customers views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupStat {
    pub key: String,
    pub volume: Decimal,
    /// Quick margin from the blended price differential:
    /// group FOB value minus the working set's average buy price times the
    /// group volume. A screening figure, not realized profit.
    pub quick_margin: Decimal,
    /// Order-matched realized profit for this group's Sells.
    pub matched_profit: Decimal,
}

/// Per-trade benchmark annotation for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BenchmarkAnnotation {
    pub trade_id: TradeId,
    pub benchmark: Option<Decimal>,
    /// Signed `price - benchmark`, when resolvable.
    pub deviation: Option<Decimal>,
    /// MSR Buys are annotated but excluded from aggregate deviation views.
    pub is_msr: bool,
}

/// Aggregator over a working set, with the global context for joins.
#[derive(Debug, Clone, Copy)]
pub struct Analytics<'a> {
    ctx: EngineContext<'a>,
}

impl<'a> Analytics<'a> {
    pub fn new(ctx: EngineContext<'a>) -> Self {
        Self { ctx }
    }

    /// Straightforward weighted sums over the working set. Every division
    /// is guarded; a zero-volume working set yields all-zero averages.
    pub fn blended_totals(&self, trades: &[Trade]) -> BlendedTotals {
        let mut totals = BlendedTotals::default();
        let mut sell_freight = Decimal::zero();

        for trade in trades {
            match trade.side {
                Side::Buy => {
                    totals.buy_volume += trade.volume;
                    totals.buy_value += trade.notional();
                }
                Side::Sell => {
                    totals.sell_volume += trade.volume;
                    totals.sell_value += trade.notional();
                    totals.sell_fob_value += trade.fob_price() * trade.volume;
                    sell_freight += trade.freight;
                }
            }
        }

        totals.avg_buy_price = totals.buy_value.div_or_zero(totals.buy_volume);
        totals.avg_sell_fob = totals.sell_fob_value.div_or_zero(totals.sell_volume);
        totals.avg_freight_per_mbf = sell_freight.div_or_zero(totals.sell_volume);
        totals.blended_margin = totals.avg_sell_fob - totals.avg_buy_price;
        totals
    }

    /// Fixed trailing window of weekly buckets ending at `as_of`, ascending.
    ///
    /// Realized profit per week re-runs the per-pair computation for that
    /// week's Sells against the full Buy index, so a week's figure is exact
    /// rather than a share of the pre-aggregated total.
    pub fn weekly_rollup(&self, trades: &[Trade], as_of: NaiveDate) -> Vec<WeekBucket> {
        let index = self.ctx.buy_index();

        week_windows(as_of)
            .into_iter()
            .map(|(start, end)| {
                let mut bucket = WeekBucket {
                    start,
                    end,
                    buy_volume: Decimal::zero(),
                    sell_volume: Decimal::zero(),
                    realized_profit: Decimal::zero(),
                };

                for trade in trades.iter().filter(|t| in_window(t, start, end)) {
                    match trade.side {
                        Side::Buy => bucket.buy_volume += trade.volume,
                        Side::Sell => {
                            bucket.sell_volume += trade.volume;
                            if let Some(pair) = join_sell(&index, trade) {
                                if pair.has_volume() {
                                    bucket.realized_profit += pair.realized_profit;
                                }
                            }
                        }
                    }
                }
                bucket
            })
            .collect()
    }

    /// Weekly volume-weighted deviation of Buy prices from the market.
    ///
    /// Benchmarks resolve as of the last date inside each window; MSR Buys
    /// and Buys with no resolvable benchmark are excluded from both the
    /// numerator and the denominator.
    pub fn weekly_vs_market(&self, trades: &[Trade], as_of: NaiveDate) -> Vec<WeekDeviation> {
        let resolver = self.ctx.resolver();

        week_windows(as_of)
            .into_iter()
            .map(|(start, end)| {
                let bench_date = end - Duration::days(1);
                let mut weighted = Decimal::zero();
                let mut volume = Decimal::zero();

                for buy in trades.iter().filter(|t| {
                    t.side == Side::Buy && !t.is_msr() && in_window(t, start, end)
                }) {
                    let query = BenchmarkQuery::for_trade_at(buy, bench_date);
                    let Some(benchmark) = resolver.resolve(&query) else {
                        continue;
                    };
                    weighted += (buy.price - benchmark) * buy.volume;
                    volume += buy.volume;
                }

                let avg_deviation = if volume.is_zero() {
                    None
                } else {
                    Some(weighted / volume)
                };
                WeekDeviation {
                    start,
                    end,
                    avg_deviation,
                }
            })
            .collect()
    }

    /// Unsold Buy volume by age, as of the injected `now`.
    ///
    /// Sold volume joins across the *entire* Sell history, not the working
    /// set, so a Buy consumed by an out-of-window Sell does not resurface.
    /// Fully consumed Buys (`available <= 0`) are excluded.
    pub fn aging_buckets(&self, buys: &[Trade], now: NaiveDate) -> AgingBuckets {
        let mut sold_by_order: HashMap<&str, Decimal> = HashMap::new();
        for sell in self.ctx.all_sells {
            if let Some(order_id) = sell.order_identifier() {
                *sold_by_order.entry(order_id).or_insert_with(Decimal::zero) += sell.volume;
            }
        }

        let mut buckets = AgingBuckets::default();
        for buy in buys.iter().filter(|t| t.side == Side::Buy) {
            let sold = buy
                .order_identifier()
                .and_then(|id| sold_by_order.get(id).copied())
                .unwrap_or_else(Decimal::zero);
            let available = buy.volume - sold;
            if !available.is_positive() {
                continue;
            }

            let age_days = (now - buy.date).num_days();
            let slot = match age_days {
                d if d <= 7 => &mut buckets.up_to_7,
                d if d <= 14 => &mut buckets.up_to_14,
                d if d <= 30 => &mut buckets.up_to_30,
                _ => &mut buckets.over_30,
            };
            *slot += available;
        }
        buckets
    }

    /// Top `n` products by Sell volume.
    pub fn top_products(&self, trades: &[Trade], n: usize) -> Vec<GroupStat> {
        self.top_groups(trades, n, |sell| sell.product.as_str().to_string())
    }

    /// Top `n` customers by Sell volume.
    pub fn top_customers(&self, trades: &[Trade], n: usize) -> Vec<GroupStat> {
        self.top_groups(trades, n, |sell| sell.counterparty.clone())
    }

    fn top_groups(
        &self,
        trades: &[Trade],
        n: usize,
        key_of: impl Fn(&Trade) -> String,
    ) -> Vec<GroupStat> {
        let avg_buy_price = self.blended_totals(trades).avg_buy_price;
        let index = self.ctx.buy_index();

        let mut groups: HashMap<String, (Decimal, Decimal, Decimal)> = HashMap::new();
        for sell in trades.iter().filter(|t| t.side == Side::Sell) {
            let entry = groups.entry(key_of(sell)).or_insert((
                Decimal::zero(),
                Decimal::zero(),
                Decimal::zero(),
            ));
            entry.0 += sell.volume;
            entry.1 += sell.fob_price() * sell.volume;
            if let Some(pair) = join_sell(&index, sell) {
                if pair.has_volume() {
                    entry.2 += pair.realized_profit;
                }
            }
        }

        let mut stats: Vec<GroupStat> = groups
            .into_iter()
            .map(|(key, (volume, fob_value, matched_profit))| GroupStat {
                key,
                volume,
                quick_margin: fob_value - avg_buy_price * volume,
                matched_profit,
            })
            .collect();

        // Volume descending, key ascending for a deterministic order.
        stats.sort_by(|a, b| b.volume.cmp(&a.volume).then_with(|| a.key.cmp(&b.key)));
        stats.truncate(n);
        stats
    }

    /// Per-Buy benchmark annotation for display. MSR Buys are flagged so
    /// aggregate views can keep excluding them.
    pub fn annotate_buys(&self, buys: &[Trade]) -> Vec<BenchmarkAnnotation> {
        let resolver = self.ctx.resolver();

        buys.iter()
            .filter(|t| t.side == Side::Buy)
            .map(|buy| {
                let benchmark = resolver.resolve_for_trade(buy);
                BenchmarkAnnotation {
                    trade_id: buy.id,
                    benchmark,
                    deviation: benchmark.map(|b| buy.price - b),
                    is_msr: buy.is_msr(),
                }
            })
            .collect()
    }
}

fn in_window(trade: &Trade, start: NaiveDate, end: NaiveDate) -> bool {
    trade.date >= start && trade.date < end
}

fn join_sell<'a>(index: &BuyIndex<'a>, sell: &'a Trade) -> Option<MatchedPair<'a>> {
    let order_id = sell.order_identifier()?;
    index.lookup(order_id).map(|buy| MatchedPair::new(buy, sell))
}

/// The trailing weekly `[start, end)` windows, ascending, the most recent
/// ending exactly at `as_of`.
fn week_windows(as_of: NaiveDate) -> Vec<(NaiveDate, NaiveDate)> {
    (0..ROLLUP_WEEKS)
        .rev()
        .map(|weeks_back| {
            let end = as_of - Duration::days(7 * weeks_back);
            (end - Duration::days(7), end)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_windows_are_contiguous_and_ascending() {
        let as_of = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let windows = week_windows(as_of);

        assert_eq!(windows.len(), 8);
        assert_eq!(windows[7].1, as_of);
        for pair in windows.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
        for (start, end) in &windows {
            assert_eq!((*end - *start).num_days(), 7);
        }
    }
}
