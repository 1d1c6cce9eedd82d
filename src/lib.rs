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

//! # Inventory Ledger
//!
//! This library tracks stock levels for named products: IN movements add
//! purchased units, OUT movements consume them, every movement lands in an
//! append-only history, and per-product text reports replay that history.
//!
//! ## Core Components
//!
//! - [`Ledger`]: Applies movements and answers queries over a [`Store`]
//! - [`ProductRecord`]: Purchased/consumed counters and derived stock
//! - [`HistoryEntry`]: One recorded IN or OUT movement
//! - [`report`]: Running-balance text reports
//! - [`api`]: axum router exposing the ledger over HTTP
//! - [`LedgerError`]: Error types for ledger failures
//!
//! ## Example
//!
//! ```
//! use inventory_ledger::{Ledger, LedgerError, MemoryStore};
//!
//! let ledger = Ledger::new(MemoryStore::new());
//!
//! ledger.add_product("Olive Oil", 100).unwrap();
//! ledger.stock_in("olive oil", 50).unwrap();
//! let record = ledger.stock_out("OLIVE OIL", 30).unwrap();
//! assert_eq!(record.stock, 120);
//!
//! // Consuming more than is available is rejected
//! let result = ledger.stock_out("Olive Oil", 200);
//! assert_eq!(
//!     result,
//!     Err(LedgerError::InsufficientStock { available: 120, requested: 200 })
//! );
//! ```
//!
//! ## Thread Safety
//!
//! The ledger serializes its read-modify-write cycles, so it can be shared
//! across threads (e.g. behind an `Arc` in the HTTP server) without losing
//! updates.

pub mod api;
mod base;
pub mod error;
mod history;
mod ledger;
pub mod product;
pub mod report;
pub mod store;

pub use base::{MovementType, ProductKey};
pub use error::LedgerError;
pub use history::HistoryEntry;
pub use ledger::Ledger;
pub use product::{ProductRecord, ProductView, StockMap};
pub use report::{DateRange, Report};
pub use store::{JsonFileStore, MemoryStore, Store, StoreError};
