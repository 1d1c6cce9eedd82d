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

//! Core identifier types for products and stock movements.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical product key.
///
/// Holds the product name exactly as it was registered. Lookups compare
/// keys case-insensitively through [`ProductKey::matches`], but the stored
/// casing is what ends up in the stock document and in history entries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ProductKey(pub String);

impl ProductKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased form used for case-insensitive comparison.
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }

    /// Returns `true` if `name` refers to this product, ignoring case.
    pub fn matches(&self, name: &str) -> bool {
        self.0.to_lowercase() == name.to_lowercase()
    }

    /// Display form: first letter of each space-separated word upper-cased.
    pub fn capitalized(&self) -> String {
        self.0
            .split(' ')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductKey {
    fn from(name: &str) -> Self {
        ProductKey(name.to_string())
    }
}

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum MovementType {
    /// Stock addition (purchase or receipt).
    #[serde(rename = "IN")]
    In,
    /// Stock removal (consumption or shipment).
    #[serde(rename = "OUT")]
    Out,
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementType::In => f.write_str("IN"),
            MovementType::Out => f.write_str("OUT"),
        }
    }
}
