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

//! Durable storage for the stock document and the history log.
//!
//! The ledger only needs whole-document reads and writes of the stock map
//! plus an append-only history log. [`Store`] captures exactly that, with
//! two implementations:
//!
//! - [`MemoryStore`]: process-local, used by tests and benches.
//! - [`JsonFileStore`]: `stock.json` (an object keyed by product name) and
//!   `history.json` (an array of entries) in a data directory.

use crate::history::HistoryEntry;
use crate::product::StockMap;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const STOCK_DOCUMENT: &str = "stock";
pub const HISTORY_DOCUMENT: &str = "history";

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Document store backing a [`Ledger`](crate::Ledger).
///
/// Each call must be atomic with respect to the document it touches. The
/// ledger serializes its own read-modify-write cycles, so implementations
/// need no cross-call coordination.
pub trait Store: Send + Sync {
    /// Reads the whole stock document.
    fn read_stock(&self) -> Result<StockMap, StoreError>;

    /// Replaces the whole stock document.
    fn write_stock(&self, stock: &StockMap) -> Result<(), StoreError>;

    /// Reads the history log in insertion order.
    fn read_history(&self) -> Result<Vec<HistoryEntry>, StoreError>;

    /// Appends one entry to the end of the history log.
    fn append_history(&self, entry: HistoryEntry) -> Result<(), StoreError>;
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    stock: RwLock<StockMap>,
    history: RwLock<Vec<HistoryEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-loaded with documents.
    pub fn with_documents(stock: StockMap, history: Vec<HistoryEntry>) -> Self {
        Self {
            stock: RwLock::new(stock),
            history: RwLock::new(history),
        }
    }
}

impl Store for MemoryStore {
    fn read_stock(&self) -> Result<StockMap, StoreError> {
        Ok(self.stock.read().clone())
    }

    fn write_stock(&self, stock: &StockMap) -> Result<(), StoreError> {
        *self.stock.write() = stock.clone();
        Ok(())
    }

    fn read_history(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        Ok(self.history.read().clone())
    }

    fn append_history(&self, entry: HistoryEntry) -> Result<(), StoreError> {
        self.history.write().push(entry);
        Ok(())
    }
}

/// JSON-file store.
///
/// Documents are rewritten through a temporary file and renamed into place,
/// so readers never observe a partially written document.
#[derive(Debug)]
pub struct JsonFileStore {
    stock_path: PathBuf,
    history_path: PathBuf,
    /// Guards the read-append-write of the history document.
    history_lock: Mutex<()>,
}

impl JsonFileStore {
    pub const STOCK_FILE: &'static str = "stock.json";
    pub const HISTORY_FILE: &'static str = "history.json";

    /// Opens the store in `dir`, creating the directory and empty documents
    /// if they do not exist yet.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let store = Self {
            stock_path: dir.join(Self::STOCK_FILE),
            history_path: dir.join(Self::HISTORY_FILE),
            history_lock: Mutex::new(()),
        };

        if !store.stock_path.exists() {
            tracing::info!(path = %store.stock_path.display(), "creating empty stock document");
            store.write_stock(&StockMap::new())?;
        }
        if !store.history_path.exists() {
            tracing::info!(path = %store.history_path.display(), "creating empty history document");
            write_document(&store.history_path, &Vec::<HistoryEntry>::new())?;
        }

        Ok(store)
    }

    pub fn stock_path(&self) -> &Path {
        &self.stock_path
    }

    pub fn history_path(&self) -> &Path {
        &self.history_path
    }

    fn load_history(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        // A missing log is an empty log.
        let file = match File::open(&self.history_path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

impl Store for JsonFileStore {
    fn read_stock(&self) -> Result<StockMap, StoreError> {
        let file = match File::open(&self.stock_path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(STOCK_DOCUMENT));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    fn write_stock(&self, stock: &StockMap) -> Result<(), StoreError> {
        write_document(&self.stock_path, stock)
    }

    fn read_history(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        self.load_history()
    }

    fn append_history(&self, entry: HistoryEntry) -> Result<(), StoreError> {
        let _guard = self.history_lock.lock();
        let mut history = self.load_history()?;
        history.push(entry);
        write_document(&self.history_path, &history)
    }
}

/// Serializes `value` with 4-space indentation and atomically replaces `path`.
fn write_document<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;

    let tmp = path.with_extension("json.tmp");
    let mut file = File::create(&tmp)?;
    file.write_all(&buf)?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}
