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

//! Error types for ledger operations.

use crate::store::StoreError;
use thiserror::Error;

/// Ledger operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// No product matches the requested name, ignoring case
    #[error("product not found: {0}")]
    ProductNotFound(String),

    /// A store document is missing
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// A product with the same name (ignoring case) is already registered
    #[error("product already exists: {0}")]
    AlreadyExists(String),

    /// OUT movement would exceed the available stock
    #[error("not enough stock: {available} available, {requested} requested")]
    InsufficientStock { available: u64, requested: u64 },

    /// Quantity is negative, zero where a movement is required, non-numeric or overflows
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Product name is empty
    #[error("invalid product name (must not be empty)")]
    InvalidName,

    /// Volume per unit or density is not a positive number
    #[error("invalid unit conversion: {0}")]
    InvalidConversion(String),

    /// Report date bound could not be parsed
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// The store could not be read or written
    #[error("store failure: {0}")]
    Io(String),
}

impl LedgerError {
    /// Returns `true` for malformed caller input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidQuantity(_)
                | LedgerError::InvalidName
                | LedgerError::InvalidConversion(_)
                | LedgerError::InvalidDate(_)
        )
    }

    /// Returns `true` for either kind of missing resource.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LedgerError::ProductNotFound(_) | LedgerError::DocumentNotFound(_)
        )
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(document) => LedgerError::DocumentNotFound(document.to_string()),
            other => LedgerError::Io(other.to_string()),
        }
    }
}
