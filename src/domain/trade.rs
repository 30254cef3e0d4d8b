//! Trade record: one booked Buy (from a mill) or Sell (to a customer).

use crate::domain::{normalize_length, Decimal, ProductCode, Region, Side, TradeId, RANDOM_LENGTH};
use crate::error::LedgerError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single booked trade.
///
/// `price` is currency per MBF; for a Sell it is the all-in delivered
/// (DLVD) price, not yet freight-netted. `volume` is MBF. `freight` is the
/// total shipment freight in currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub side: Side,
    /// Calendar date the trade was booked.
    pub date: NaiveDate,
    /// Mill name (Buy) or customer name (Sell).
    pub counterparty: String,
    pub product: ProductCode,
    pub region: Region,
    pub price: Decimal,
    pub volume: Decimal,
    pub freight: Decimal,
    /// Nominal length in feet as a string, or the `RL` sentinel.
    pub length: String,
    /// Free-text order identifier joining Buy and Sell sides of a shipment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_num: Option<String>,
    /// Legacy alias for `order_num`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_po: Option<String>,
    /// Legacy alias for `order_num`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oc: Option<String>,
    /// Legacy alias for `order_num` (Buy-side purchase order).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub po: Option<String>,
    /// Manually-verified benchmark base price; takes priority over the
    /// resolver's computed lookup when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark_override: Option<Decimal>,
}

impl Trade {
    /// Create a Trade, validating that price, volume, and freight are
    /// non-negative.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: TradeId,
        side: Side,
        date: NaiveDate,
        counterparty: impl Into<String>,
        product: ProductCode,
        region: Region,
        price: Decimal,
        volume: Decimal,
        freight: Decimal,
    ) -> Result<Self, LedgerError> {
        for (field, value) in [("price", price), ("volume", volume), ("freight", freight)] {
            if value.is_negative() {
                return Err(LedgerError::NegativeField {
                    field,
                    value: value.to_canonical_string(),
                });
            }
        }

        Ok(Trade {
            id,
            side,
            date,
            counterparty: counterparty.into(),
            product,
            region,
            price,
            volume,
            freight,
            length: RANDOM_LENGTH.to_string(),
            order_num: None,
            linked_po: None,
            oc: None,
            po: None,
            benchmark_override: None,
        })
    }

    pub fn with_length(mut self, length: impl Into<String>) -> Self {
        self.length = length.into();
        self
    }

    pub fn with_order_num(mut self, order_num: impl Into<String>) -> Self {
        self.order_num = Some(order_num.into());
        self
    }

    pub fn with_linked_po(mut self, linked_po: impl Into<String>) -> Self {
        self.linked_po = Some(linked_po.into());
        self
    }

    pub fn with_oc(mut self, oc: impl Into<String>) -> Self {
        self.oc = Some(oc.into());
        self
    }

    pub fn with_po(mut self, po: impl Into<String>) -> Self {
        self.po = Some(po.into());
        self
    }

    pub fn with_benchmark_override(mut self, price: Decimal) -> Self {
        self.benchmark_override = Some(price);
        self
    }

    /// The order identifier joining this trade to its counterpart shipment:
    /// first non-empty of `order_num`, `linked_po`, `oc`, `po`, trimmed.
    ///
    /// This encodes the alias-field fallback priority once; trimmed-string
    /// equality on the result is the Buy/Sell join key.
    pub fn order_identifier(&self) -> Option<&str> {
        [&self.order_num, &self.linked_po, &self.oc, &self.po]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .map(str::trim)
            .find(|id| !id.is_empty())
    }

    /// Length reduced to digits only (`"16'"` -> `"16"`, `RL` -> `""`).
    pub fn normalized_length(&self) -> String {
        normalize_length(&self.length)
    }

    /// Per-MBF price net of outbound freight (Sell side).
    ///
    /// `price - freight/volume` when volume > 0, else `price`. For a Buy
    /// this is just `price` (Buy freight is inbound, handled by
    /// `landed_cost`).
    pub fn fob_price(&self) -> Decimal {
        match self.side {
            Side::Sell if !self.volume.is_zero() => self.price - self.freight / self.volume,
            _ => self.price,
        }
    }

    /// Per-MBF cost including inbound freight (Buy side).
    ///
    /// Freight share is 0 when volume is 0.
    pub fn landed_cost(&self) -> Decimal {
        self.price + self.freight.div_or_zero(self.volume)
    }

    /// Total currency value: `price * volume`.
    pub fn notional(&self) -> Decimal {
        self.price * self.volume
    }

    pub fn is_msr(&self) -> bool {
        self.product.is_msr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::from_str(s).unwrap()
    }

    fn sell(price: &str, volume: &str, freight: &str) -> Trade {
        Trade::new(
            TradeId::new(2),
            Side::Sell,
            date("2024-01-15"),
            "Acme Truss",
            ProductCode::new("2x4#2"),
            Region::West,
            d(price),
            d(volume),
            d(freight),
        )
        .unwrap()
    }

    #[test]
    fn test_negative_field_rejected() {
        let err = Trade::new(
            TradeId::new(1),
            Side::Buy,
            date("2024-01-10"),
            "Pine Ridge Mill",
            ProductCode::new("2x4#2"),
            Region::West,
            d("-400"),
            d("20"),
            d("0"),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::NegativeField { field: "price", .. }));
    }

    #[test]
    fn test_fob_nets_freight_per_mbf() {
        // 460 - 200/20 = 450
        assert_eq!(sell("460", "20", "200").fob_price(), d("450"));
    }

    #[test]
    fn test_fob_zero_volume_falls_back_to_price() {
        assert_eq!(sell("460", "0", "200").fob_price(), d("460"));
    }

    #[test]
    fn test_landed_cost_allocates_freight() {
        let buy = Trade::new(
            TradeId::new(1),
            Side::Buy,
            date("2024-01-10"),
            "Pine Ridge Mill",
            ProductCode::new("2x4#2"),
            Region::West,
            d("400"),
            d("25"),
            d("250"),
        )
        .unwrap();
        assert_eq!(buy.landed_cost(), d("410"));
    }

    #[test]
    fn test_order_identifier_fallback_chain() {
        let t = sell("460", "20", "0").with_oc("  OC-9 ");
        assert_eq!(t.order_identifier(), Some("OC-9"));

        let t = sell("460", "20", "0").with_linked_po("PO-5").with_oc("OC-9");
        assert_eq!(t.order_identifier(), Some("PO-5"));

        let t = sell("460", "20", "0").with_order_num("ORD-1").with_linked_po("PO-5");
        assert_eq!(t.order_identifier(), Some("ORD-1"));

        // Blank entries are skipped, not matched.
        let t = sell("460", "20", "0").with_order_num("   ").with_po("PO-2");
        assert_eq!(t.order_identifier(), Some("PO-2"));

        assert_eq!(sell("460", "20", "0").order_identifier(), None);
    }

    #[test]
    fn test_default_length_is_random() {
        let t = sell("460", "20", "0");
        assert_eq!(t.length, RANDOM_LENGTH);
        assert_eq!(t.normalized_length(), "");
        assert_eq!(t.with_length("16'").normalized_length(), "16");
    }

    #[test]
    fn test_serde_roundtrip() {
        let t = sell("460", "20", "200")
            .with_order_num("PO1")
            .with_benchmark_override(d("455"));
        let json = serde_json::to_string(&t).unwrap();
        let back: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(t, back);
    }
}
