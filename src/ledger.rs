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

//! Stock ledger.
//!
//! The [`Ledger`] is the central component that applies stock movements and
//! answers queries over a [`Store`].
//!
//! # Movements
//!
//! - **Add product**: Registers a new product with an initial quantity.
//! - **Stock IN**: Adds purchased units to an existing product.
//! - **Stock OUT**: Removes units (fails if insufficient stock).
//!
//! Each successful movement appends exactly one [`HistoryEntry`].
//!
//! # Thread Safety
//!
//! Mutations are read-modify-write cycles over whole store documents. The
//! ledger runs every cycle, history append included, under one mutex, so
//! concurrent movements never lose updates. Reads go straight to the store.

use crate::LedgerError;
use crate::base::{MovementType, ProductKey};
use crate::history::HistoryEntry;
use crate::product::{ProductRecord, ProductView, StockMap, find_key};
use crate::report::{self, DateRange, Report};
use crate::store::Store;
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

/// Stock ledger over a document store.
///
/// # Invariants
///
/// - Product names are unique ignoring case.
/// - `stock == purchased - consumption` for every product after every mutation.
/// - `purchased` and `consumption` never decrease.
/// - A rejected movement changes neither the stock document nor the history.
pub struct Ledger<S> {
    store: S,
    /// Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl<S: Store> Ledger<S> {
    pub fn new(store: S) -> Self {
        Ledger {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the whole stock document.
    pub fn products(&self) -> Result<StockMap, LedgerError> {
        Ok(self.store.read_stock()?)
    }

    /// Resolves `name` to the canonical product key, ignoring case and
    /// surrounding whitespace.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ProductNotFound`] - No registered product matches.
    pub fn resolve_product(&self, name: &str) -> Result<ProductKey, LedgerError> {
        let stock = self.store.read_stock()?;
        resolve_in(&stock, name)
    }

    /// Returns the record for a canonical key with its `pending` quantity.
    pub fn get_product(&self, key: &ProductKey) -> Result<ProductView, LedgerError> {
        let stock = self.store.read_stock()?;
        stock
            .get(key)
            .cloned()
            .map(ProductView::from)
            .ok_or_else(|| LedgerError::ProductNotFound(key.to_string()))
    }

    /// Resolves `name` and returns its record with `pending`.
    pub fn find_product(&self, name: &str) -> Result<(ProductKey, ProductView), LedgerError> {
        let stock = self.store.read_stock()?;
        let key = resolve_in(&stock, name)?;
        let view = stock
            .get(&key)
            .cloned()
            .map(ProductView::from)
            .ok_or_else(|| LedgerError::ProductNotFound(key.to_string()))?;
        Ok((key, view))
    }

    /// Registers a new product holding `quantity` purchased units.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidName`] - Name is empty after trimming.
    /// - [`LedgerError::AlreadyExists`] - A product with that name exists, ignoring case.
    pub fn add_product(&self, name: &str, quantity: u64) -> Result<ProductRecord, LedgerError> {
        self.add_product_with_conversion(name, quantity, None, None)
    }

    /// Like [`add_product`](Self::add_product), also storing unit conversion
    /// factors used by reports.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidConversion`] - A factor is zero or negative.
    pub fn add_product_with_conversion(
        &self,
        name: &str,
        quantity: u64,
        volume_per_unit: Option<Decimal>,
        density: Option<Decimal>,
    ) -> Result<ProductRecord, LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidName);
        }
        let record = ProductRecord::new(quantity).with_conversion(volume_per_unit, density)?;

        let _guard = self.write_lock.lock();
        let mut stock = self.store.read_stock()?;
        if let Some(existing) = find_key(&stock, name) {
            warn!(product = %name, %existing, "rejecting duplicate product");
            return Err(LedgerError::AlreadyExists(existing.to_string()));
        }

        let key = ProductKey::from(name);
        let before = stock.clone();
        stock.insert(key.clone(), record.clone());
        self.commit(
            &before,
            &stock,
            HistoryEntry::new(MovementType::In, key.clone(), quantity, Utc::now()),
        )?;

        info!(product = %key, quantity, "product added");
        Ok(record)
    }

    /// Adds `quantity` purchased units to an existing product.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ProductNotFound`] - No product matches `name`.
    /// - [`LedgerError::InvalidQuantity`] - Quantity is zero or overflows.
    pub fn stock_in(&self, name: &str, quantity: u64) -> Result<ProductRecord, LedgerError> {
        self.apply(MovementType::In, name, quantity)
    }

    /// Removes `quantity` units from an existing product.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ProductNotFound`] - No product matches `name`.
    /// - [`LedgerError::InsufficientStock`] - Fewer than `quantity` units available.
    /// - [`LedgerError::InvalidQuantity`] - Quantity is zero.
    pub fn stock_out(&self, name: &str, quantity: u64) -> Result<ProductRecord, LedgerError> {
        self.apply(MovementType::Out, name, quantity)
    }

    fn apply(
        &self,
        kind: MovementType,
        name: &str,
        quantity: u64,
    ) -> Result<ProductRecord, LedgerError> {
        let _guard = self.write_lock.lock();
        let mut stock = self.store.read_stock()?;
        let before = stock.clone();
        let key = resolve_in(&stock, name)?;

        let record = stock
            .get_mut(&key)
            .ok_or_else(|| LedgerError::ProductNotFound(key.to_string()))?;
        let outcome = match kind {
            MovementType::In => record.receive(quantity),
            MovementType::Out => record.consume(quantity),
        };
        if let Err(e) = outcome {
            warn!(product = %key, %kind, quantity, error = %e, "movement rejected");
            return Err(e);
        }
        let updated = record.clone();

        self.commit(
            &before,
            &stock,
            HistoryEntry::new(kind, key.clone(), quantity, Utc::now()),
        )?;

        info!(product = %key, %kind, quantity, stock = updated.stock, "stock updated");
        Ok(updated)
    }

    /// Writes `after` and appends `entry`. If the append fails, `before` is
    /// written back so the stock document never holds a movement the history
    /// lacks. Must be called with `write_lock` held.
    fn commit(
        &self,
        before: &StockMap,
        after: &StockMap,
        entry: HistoryEntry,
    ) -> Result<(), LedgerError> {
        self.store.write_stock(after)?;
        if let Err(e) = self.store.append_history(entry) {
            match self.store.write_stock(before) {
                Ok(()) => warn!(error = %e, "history append failed, stock change reverted"),
                Err(restore) => {
                    error!(error = %e, %restore, "history append failed and stock could not be restored")
                }
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Returns the full history log in insertion order.
    pub fn history(&self) -> Result<Vec<HistoryEntry>, LedgerError> {
        Ok(self.store.read_history()?)
    }

    /// Returns the history of one product, in insertion order.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ProductNotFound`] - No product matches `name`.
    pub fn product_history(&self, name: &str) -> Result<Vec<HistoryEntry>, LedgerError> {
        let key = self.resolve_product(name)?;
        let history = self.store.read_history()?;
        Ok(history
            .into_iter()
            .filter(|entry| key.matches(entry.product.as_str()))
            .collect())
    }

    /// Renders the stock report of a product, optionally limited to a date range.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ProductNotFound`] - No product matches `name`.
    pub fn generate_report(
        &self,
        name: &str,
        range: Option<DateRange>,
    ) -> Result<Report, LedgerError> {
        let stock = self.store.read_stock()?;
        let key = resolve_in(&stock, name)?;
        let record = stock
            .get(&key)
            .ok_or_else(|| LedgerError::ProductNotFound(key.to_string()))?;
        let history = self.store.read_history()?;

        debug!(product = %key, ?range, entries = history.len(), "rendering report");
        Ok(report::render(&key, record, history, range.as_ref(), Utc::now()))
    }
}

fn resolve_in(stock: &StockMap, name: &str) -> Result<ProductKey, LedgerError> {
    let name = name.trim();
    let key = find_key(stock, name).ok_or_else(|| LedgerError::ProductNotFound(name.to_string()))?;
    debug!(requested = %name, resolved = %key, "product resolved");
    Ok(key)
}
