//! Market (RL) report: one dated snapshot of reference prices.

use crate::domain::{Decimal, Region};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One dated snapshot of reference prices.
///
/// `composite` holds a single blanket price per region/product;
/// `specified_lengths` holds a more granular price per cut length where the
/// publication carries one. Product keys are canonical codes
/// ([`ProductCode::canonical`](crate::domain::ProductCode::canonical));
/// length keys are normalized digit strings. A collection of reports is
/// assumed sorted ascending by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketReport {
    pub date: NaiveDate,
    pub composite: HashMap<Region, HashMap<String, Decimal>>,
    pub specified_lengths: HashMap<Region, HashMap<String, HashMap<String, Decimal>>>,
}

impl MarketReport {
    pub fn new(date: NaiveDate) -> Self {
        MarketReport {
            date,
            composite: HashMap::new(),
            specified_lengths: HashMap::new(),
        }
    }

    pub fn with_composite(
        mut self,
        region: Region,
        product: impl Into<String>,
        price: Decimal,
    ) -> Self {
        self.composite
            .entry(region)
            .or_default()
            .insert(product.into(), price);
        self
    }

    pub fn with_length_price(
        mut self,
        region: Region,
        product: impl Into<String>,
        length: impl Into<String>,
        price: Decimal,
    ) -> Self {
        self.specified_lengths
            .entry(region)
            .or_default()
            .entry(product.into())
            .or_default()
            .insert(length.into(), price);
        self
    }

    /// Blanket reference price for a region/product, if published.
    pub fn composite_price(&self, region: Region, product: &str) -> Option<Decimal> {
        self.composite.get(&region)?.get(product).copied()
    }

    /// Length-specific reference price, if published.
    pub fn length_price(&self, region: Region, product: &str, length: &str) -> Option<Decimal> {
        self.specified_lengths
            .get(&region)?
            .get(product)?
            .get(length)
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_composite_lookup() {
        let report = MarketReport::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .with_composite(Region::West, "2x4#2", d("420"));

        assert_eq!(report.composite_price(Region::West, "2x4#2"), Some(d("420")));
        assert_eq!(report.composite_price(Region::East, "2x4#2"), None);
        assert_eq!(report.composite_price(Region::West, "2x6#2"), None);
    }

    #[test]
    fn test_length_lookup() {
        let report = MarketReport::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .with_length_price(Region::Central, "2x4#2", "16", d("435"));

        assert_eq!(
            report.length_price(Region::Central, "2x4#2", "16"),
            Some(d("435"))
        );
        assert_eq!(report.length_price(Region::Central, "2x4#2", "20"), None);
    }

    #[test]
    fn test_serde_roundtrip() {
        let report = MarketReport::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .with_composite(Region::West, "2x4#2", d("420"))
            .with_length_price(Region::West, "2x4#2", "16", d("432"));
        let json = serde_json::to_string(&report).unwrap();
        let back: MarketReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report, back);
    }
}
