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

//! Plain-text stock reports.
//!
//! A report replays a product's history in chronological order and prints
//! the running balance after each movement. Balances start from zero and
//! only count the movements that survive the date filter, so a ranged
//! report shows stock relative to the range, not absolute stock.
//!
//! ```text
//! |Product             |Date                     |IN Quantity    |OUT Quantity   |Remaining Stock     |
//! +--------------------+-------------------------+---------------+---------------+--------------------+
//! |Olive Oil           |1/15/2025, 10:00:00 AM   |10             |               |10                  |
//! |Olive Oil           |1/16/2025, 9:30:00 AM    |               |4              |6                   |
//! ```

use crate::LedgerError;
use crate::base::{MovementType, ProductKey};
use crate::history::HistoryEntry;
use crate::product::ProductRecord;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::fmt::Write;

const HEADERS: [&str; 5] = [
    "Product",
    "Date",
    "IN Quantity",
    "OUT Quantity",
    "Remaining Stock",
];
const COLUMN_WIDTHS: [usize; 5] = [20, 25, 15, 15, 20];
const WEIGHT_PRECISION: u32 = 2;

/// 23:59:59.999, the inclusive end of a report day. Evaluated at compile time.
const LAST_MILLI_OF_DAY: NaiveTime = match NaiveTime::from_hms_milli_opt(23, 59, 59, 999) {
    Some(time) => time,
    None => panic!("23:59:59.999 is a valid time"),
};

/// Inclusive calendar-day range, evaluated in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// Parses both bounds. Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp,
    /// of which only the (UTC) calendar day is kept.
    pub fn parse(from: &str, to: &str) -> Result<Self, LedgerError> {
        Ok(Self::new(parse_day(from)?, parse_day(to)?))
    }

    /// Builds a range only when both bounds are present; a lone bound means
    /// no filtering. Blank bounds count as absent.
    pub fn from_bounds(from: Option<&str>, to: Option<&str>) -> Result<Option<Self>, LedgerError> {
        fn present(bound: Option<&str>) -> Option<&str> {
            bound.filter(|b| !b.trim().is_empty())
        }
        match (present(from), present(to)) {
            (Some(from), Some(to)) => Self::parse(from, to).map(Some),
            _ => Ok(None),
        }
    }

    /// First instant of the range: `from` at 00:00:00.000.
    pub fn start(&self) -> DateTime<Utc> {
        self.from.and_time(NaiveTime::MIN).and_utc()
    }

    /// Last instant of the range: `to` at 23:59:59.999.
    pub fn end(&self) -> DateTime<Utc> {
        self.to.and_time(LAST_MILLI_OF_DAY).and_utc()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start() && at <= self.end()
    }
}

fn parse_day(raw: &str) -> Result<NaiveDate, LedgerError> {
    let raw = raw.trim();
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(day);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc).date_naive())
        .map_err(|_| LedgerError::InvalidDate(raw.to_string()))
}

/// A rendered report and the file name it should be saved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub filename: String,
    pub body: String,
}

/// Suggested file name: `Stock_Report_<key>_<YYYY-MM-DD>.txt`.
pub fn report_filename(key: &ProductKey, generated_at: DateTime<Utc>) -> String {
    format!("Stock_Report_{}_{}.txt", key, generated_at.format("%Y-%m-%d"))
}

/// Renders the report for `key`.
///
/// `history` may contain entries of other products and in any order; it is
/// filtered to `key` (ignoring case), to `range` if given, and sorted by
/// date before the running balance is computed.
pub fn render(
    key: &ProductKey,
    record: &ProductRecord,
    history: Vec<HistoryEntry>,
    range: Option<&DateRange>,
    generated_at: DateTime<Utc>,
) -> Report {
    let mut entries: Vec<(Option<DateTime<Utc>>, HistoryEntry)> = history
        .into_iter()
        .filter(|entry| key.matches(entry.product.as_str()))
        .map(|entry| (entry.timestamp(), entry))
        .filter(|(at, _)| match range {
            Some(range) => at.is_some_and(|at| range.contains(at)),
            None => true,
        })
        .collect();

    // Stable, so equal dates keep insertion order.
    entries.sort_by_key(|(at, _)| *at);

    let mut body = String::new();
    push_row(&mut body, HEADERS.iter().map(|h| h.to_string()));
    body.push('+');
    body.push_str(
        &COLUMN_WIDTHS
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("+"),
    );
    body.push_str("+\n");

    let product = key.capitalized();
    let mut running_purchased: i128 = 0;
    let mut running_consumption: i128 = 0;

    for (at, entry) in &entries {
        match entry.kind {
            MovementType::In => running_purchased += i128::from(entry.quantity),
            MovementType::Out => running_consumption += i128::from(entry.quantity),
        }
        let remaining = running_purchased - running_consumption;

        let (in_qty, out_qty) = match entry.kind {
            MovementType::In => (entry.quantity.to_string(), String::new()),
            MovementType::Out => (String::new(), entry.quantity.to_string()),
        };
        let date = match at {
            Some(at) => format_locale(*at),
            None => "Invalid Date".to_string(),
        };

        push_row(
            &mut body,
            [
                product.clone(),
                date,
                in_qty,
                out_qty,
                format!("{remaining}{}", volume_note(remaining, record)),
            ]
            .into_iter(),
        );
    }

    Report {
        filename: report_filename(key, generated_at),
        body,
    }
}

/// ` (<volume> ml)` or ` (<volume> ml, <weight> g)` for products with unit
/// conversion factors, empty otherwise or when the volume is zero.
fn volume_note(remaining: i128, record: &ProductRecord) -> String {
    let Some(volume_per_unit) = record.volume_per_unit.filter(|v| *v > Decimal::ZERO) else {
        return String::new();
    };
    let Ok(remaining) = i64::try_from(remaining) else {
        return String::new();
    };
    let Some(total_volume) = Decimal::from(remaining).checked_mul(volume_per_unit) else {
        return String::new();
    };
    if total_volume.is_zero() {
        return String::new();
    }

    let total_volume = total_volume.normalize();
    match record.density.and_then(|d| total_volume.checked_mul(d)) {
        Some(weight) => {
            let weight = weight.round_dp_with_strategy(
                WEIGHT_PRECISION,
                rust_decimal::RoundingStrategy::MidpointAwayFromZero,
            );
            format!(" ({total_volume} ml, {weight:.2} g)")
        }
        None => format!(" ({total_volume} ml)"),
    }
}

/// en-US style date: `1/15/2025, 10:00:00 AM`.
fn format_locale(at: DateTime<Utc>) -> String {
    at.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

fn push_row(out: &mut String, cells: impl Iterator<Item = String>) {
    out.push('|');
    for (cell, width) in cells.zip(COLUMN_WIDTHS) {
        // Cells wider than the column are kept whole.
        let _ = write!(out, "{cell:<width$}|");
    }
    out.push('\n');
}
