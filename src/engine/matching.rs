//! Pairing Buy and Sell records into round-trip trades by order identifier.

use crate::domain::{Decimal, Trade};
use serde::Serialize;
use std::collections::HashMap;

/// Index of Buy records by trimmed order identifier.
///
/// Built from the *full* Buy collection, never a filtered window: a Sell
/// booked this week can close out a Buy from months back.
///
/// Duplicate identifiers resolve last-scanned-wins. That policy is explicit
/// and tested; each overwrite is logged so dirty data stays visible.
#[derive(Debug)]
pub struct BuyIndex<'a> {
    by_order: HashMap<&'a str, &'a Trade>,
}

impl<'a> BuyIndex<'a> {
    pub fn new(buys: &'a [Trade]) -> Self {
        let mut by_order: HashMap<&str, &Trade> = HashMap::new();

        for buy in buys {
            let Some(order_id) = buy.order_identifier() else {
                continue;
            };
            if let Some(previous) = by_order.insert(order_id, buy) {
                tracing::warn!(
                    order_id,
                    kept = %buy.id,
                    replaced = %previous.id,
                    "duplicate buy order identifier, keeping last scanned"
                );
            }
        }

        Self { by_order }
    }

    pub fn lookup(&self, order_id: &str) -> Option<&'a Trade> {
        self.by_order.get(order_id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_order.is_empty()
    }
}

/// A Sell joined to the Buy sharing its order identifier.
#[derive(Debug, Clone, Copy)]
pub struct MatchedPair<'a> {
    pub buy: &'a Trade,
    pub sell: &'a Trade,
    /// Matched volume, equal to the Sell volume.
    pub volume: Decimal,
    pub buy_landed_cost: Decimal,
    pub sell_fob: Decimal,
    /// `(sell_fob - buy_landed_cost) * volume`.
    pub realized_profit: Decimal,
}

impl<'a> MatchedPair<'a> {
    pub fn new(buy: &'a Trade, sell: &'a Trade) -> Self {
        let buy_landed_cost = buy.landed_cost();
        let sell_fob = sell.fob_price();
        MatchedPair {
            buy,
            sell,
            volume: sell.volume,
            buy_landed_cost,
            sell_fob,
            realized_profit: (sell_fob - buy_landed_cost) * sell.volume,
        }
    }

    /// A zero-volume side makes the pair's economics undefined; such pairs
    /// are listed but contribute nothing to any aggregate.
    pub fn has_volume(&self) -> bool {
        !self.sell.volume.is_zero() && !self.buy.volume.is_zero()
    }
}

/// Join each Sell to its Buy via the index. Unmatched Sells are a normal
/// outcome and are simply absent from the result.
pub fn match_pairs<'a>(index: &BuyIndex<'a>, sells: &'a [Trade]) -> Vec<MatchedPair<'a>> {
    sells
        .iter()
        .filter_map(|sell| {
            let order_id = sell.order_identifier()?;
            let buy = index.lookup(order_id)?;
            Some(MatchedPair::new(buy, sell))
        })
        .collect()
}

/// Aggregate statistics over matched pairs.
///
/// Averages are volume-weighted. This is the *order-matched* notion of
/// margin; the blended (non-matched) notion lives in
/// [`analytics::BlendedTotals`](crate::engine::analytics::BlendedTotals) and
/// the two are reported separately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchedTotals {
    pub realized_profit: Decimal,
    pub matched_volume: Decimal,
    pub avg_buy_landed_cost: Decimal,
    pub avg_sell_fob: Decimal,
    /// `avg_sell_fob - avg_buy_landed_cost`.
    pub margin: Decimal,
    /// `margin / avg_buy_landed_cost * 100`, 0 when the average cost is 0.
    pub margin_pct: Decimal,
}

impl MatchedTotals {
    pub fn from_pairs(pairs: &[MatchedPair<'_>]) -> Self {
        let mut realized_profit = Decimal::zero();
        let mut matched_volume = Decimal::zero();
        let mut buy_cost_value = Decimal::zero();
        let mut sell_fob_value = Decimal::zero();

        for pair in pairs.iter().filter(|p| p.has_volume()) {
            realized_profit += pair.realized_profit;
            matched_volume += pair.volume;
            buy_cost_value += pair.buy_landed_cost * pair.volume;
            sell_fob_value += pair.sell_fob * pair.volume;
        }

        let avg_buy_landed_cost = buy_cost_value.div_or_zero(matched_volume);
        let avg_sell_fob = sell_fob_value.div_or_zero(matched_volume);
        let margin = avg_sell_fob - avg_buy_landed_cost;
        let margin_pct = margin.div_or_zero(avg_buy_landed_cost) * Decimal::hundred();

        MatchedTotals {
            realized_profit,
            matched_volume,
            avg_buy_landed_cost,
            avg_sell_fob,
            margin,
            margin_pct,
        }
    }

    /// Convenience: index, join, and aggregate in one call.
    pub fn compute(buys: &[Trade], sells: &[Trade]) -> Self {
        let index = BuyIndex::new(buys);
        Self::from_pairs(&match_pairs(&index, sells))
    }
}
