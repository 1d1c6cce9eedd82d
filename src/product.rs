// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Product stock records.
//!
//! A record only ever grows its two counters; `stock` is derived from them
//! and recomputed on every mutation.
//!
//! # Example
//!
//! ```
//! use inventory_ledger::ProductRecord;
//!
//! let mut record = ProductRecord::new(100);
//! record.receive(50).unwrap();
//! record.consume(30).unwrap();
//! assert_eq!(record.stock, 120);
//! assert_eq!(record.available(), 120);
//! ```

use crate::LedgerError;
use crate::base::ProductKey;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The stock document: every registered product by canonical key.
pub type StockMap = BTreeMap<ProductKey, ProductRecord>;

/// Finds the canonical key matching `name`, ignoring case.
pub fn find_key(stock: &StockMap, name: &str) -> Option<ProductKey> {
    let wanted = name.to_lowercase();
    stock.keys().find(|key| key.normalized() == wanted).cloned()
}

/// Stock counters for a single product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub stock: u64,
    pub purchased: u64,
    pub consumption: u64,
    /// Volume of one unit in millilitres, used for report conversion.
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub volume_per_unit: Option<Decimal>,
    /// Density in grams per millilitre.
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub density: Option<Decimal>,
}

impl ProductRecord {
    /// Creates a record holding `initial` purchased units and nothing consumed.
    pub fn new(initial: u64) -> Self {
        Self {
            stock: initial,
            purchased: initial,
            consumption: 0,
            volume_per_unit: None,
            density: None,
        }
    }

    /// Attaches unit conversion factors. Both must be positive when present.
    pub fn with_conversion(
        mut self,
        volume_per_unit: Option<Decimal>,
        density: Option<Decimal>,
    ) -> Result<Self, LedgerError> {
        for (label, value) in [("volumePerUnit", volume_per_unit), ("density", density)] {
            if let Some(value) = value {
                if value <= Decimal::ZERO {
                    return Err(LedgerError::InvalidConversion(format!(
                        "{label} must be positive, got {value}"
                    )));
                }
            }
        }
        self.volume_per_unit = volume_per_unit;
        self.density = density;
        Ok(self)
    }

    /// Returns `purchased - consumption`.
    pub fn available(&self) -> u64 {
        self.purchased.saturating_sub(self.consumption)
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.consumption <= self.purchased,
            "Invariant violated: consumption {} exceeds purchased {}",
            self.consumption,
            self.purchased
        );
        debug_assert_eq!(
            self.stock,
            self.purchased - self.consumption,
            "Invariant violated: stock out of sync with counters"
        );
    }

    /// Adds purchased units.
    pub fn receive(&mut self, quantity: u64) -> Result<(), LedgerError> {
        if quantity == 0 {
            return Err(LedgerError::InvalidQuantity(
                "movement quantity must be positive".into(),
            ));
        }
        self.purchased = self.purchased.checked_add(quantity).ok_or_else(|| {
            LedgerError::InvalidQuantity(format!("purchased total overflows adding {quantity}"))
        })?;
        self.stock = self.available();
        self.assert_invariants();
        Ok(())
    }

    /// Adds consumed units. Fails without touching the record if fewer than
    /// `quantity` units are available.
    pub fn consume(&mut self, quantity: u64) -> Result<(), LedgerError> {
        if quantity == 0 {
            return Err(LedgerError::InvalidQuantity(
                "movement quantity must be positive".into(),
            ));
        }
        let available = self.available();
        if available < quantity {
            return Err(LedgerError::InsufficientStock {
                available,
                requested: quantity,
            });
        }
        self.consumption += quantity;
        self.stock = self.available();
        self.assert_invariants();
        Ok(())
    }
}

/// A product record together with its `pending` quantity.
///
/// `pending` always equals `stock`; it is kept for clients of the HTTP API
/// that read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub record: ProductRecord,
    pub pending: u64,
}

impl From<ProductRecord> for ProductView {
    fn from(record: ProductRecord) -> Self {
        let pending = record.available();
        Self { record, pending }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn new_record_has_everything_in_stock() {
        let record = ProductRecord::new(100);
        assert_eq!(record.purchased, 100);
        assert_eq!(record.consumption, 0);
        assert_eq!(record.stock, 100);
    }

    #[test]
    fn receive_and_consume_keep_stock_in_sync() {
        let mut record = ProductRecord::new(10);
        record.receive(5).unwrap();
        assert_eq!(record.stock, 15);
        record.consume(15).unwrap();
        assert_eq!(record.stock, 0);
        assert_eq!(record.consumption, 15);
    }

    #[test]
    fn consume_insufficient_leaves_record_untouched() {
        let mut record = ProductRecord::new(10);
        let before = record.clone();
        let result = record.consume(11);
        assert_eq!(
            result,
            Err(LedgerError::InsufficientStock {
                available: 10,
                requested: 11
            })
        );
        assert_eq!(record, before);
    }

    #[test]
    fn zero_movements_are_rejected() {
        let mut record = ProductRecord::new(10);
        assert!(matches!(record.receive(0), Err(LedgerError::InvalidQuantity(_))));
        assert!(matches!(record.consume(0), Err(LedgerError::InvalidQuantity(_))));
    }

    #[test]
    fn receive_overflow_is_rejected() {
        let mut record = ProductRecord::new(u64::MAX);
        assert!(matches!(record.receive(1), Err(LedgerError::InvalidQuantity(_))));
        assert_eq!(record.purchased, u64::MAX);
    }

    #[test]
    fn conversion_factors_must_be_positive() {
        let ok = ProductRecord::new(1).with_conversion(Some(dec!(500)), Some(dec!(0.92)));
        assert!(ok.is_ok());

        let bad = ProductRecord::new(1).with_conversion(Some(dec!(0)), None);
        assert!(matches!(bad, Err(LedgerError::InvalidConversion(_))));

        let bad = ProductRecord::new(1).with_conversion(None, Some(dec!(-1)));
        assert!(matches!(bad, Err(LedgerError::InvalidConversion(_))));
    }

    #[test]
    fn find_key_is_case_insensitive() {
        let mut stock = StockMap::new();
        stock.insert(ProductKey::from("Olive Oil"), ProductRecord::new(1));
        assert_eq!(find_key(&stock, "OLIVE oil"), Some(ProductKey::from("Olive Oil")));
        assert_eq!(find_key(&stock, "olive"), None);
    }

    // === Serialization Tests ===

    #[test]
    fn serializes_document_shape() {
        let record = ProductRecord::new(100);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"stock": 100, "purchased": 100, "consumption": 0})
        );
    }

    #[test]
    fn deserializes_conversion_factors_from_numbers() {
        let json = r#"{"stock": 2, "purchased": 5, "consumption": 3, "volumePerUnit": 250, "density": 0.92}"#;
        let record: ProductRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.volume_per_unit, Some(dec!(250)));
        assert_eq!(record.density, Some(dec!(0.92)));
    }

    #[test]
    fn view_flattens_record_and_adds_pending() {
        let mut record = ProductRecord::new(100);
        record.consume(30).unwrap();
        let json = serde_json::to_value(ProductView::from(record)).unwrap();
        assert_eq!(json["stock"], 70);
        assert_eq!(json["pending"], 70);
        assert_eq!(json["consumption"], 30);
    }
}
