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

//! Movement history entries.
//!
//! The history log is append-only and kept in insertion order. Entry dates
//! are stored as strings so that a log written by other tools, possibly
//! holding dates that do not parse, still loads; such entries are skipped
//! by date filters.

use crate::base::{MovementType, ProductKey};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A single IN or OUT movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "type")]
    pub kind: MovementType,
    pub product: ProductKey,
    pub quantity: u64,
    /// ISO-8601 timestamp, e.g. `2025-01-15T10:00:00.000Z`.
    pub date: String,
}

impl HistoryEntry {
    pub fn new(kind: MovementType, product: ProductKey, quantity: u64, at: DateTime<Utc>) -> Self {
        Self {
            kind,
            product,
            quantity,
            date: format_timestamp(at),
        }
    }

    /// Parsed movement time, or `None` if the stored date is malformed.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .ok()
            .map(|date| date.with_timezone(&Utc))
    }
}

/// Formats a timestamp the way history dates are persisted.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
