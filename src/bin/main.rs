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

use clap::{Parser, Subcommand};
use csv::{ReaderBuilder, Trim, Writer};
use inventory_ledger::{DateRange, JsonFileStore, Ledger, Store, api};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Inventory Ledger - Track product stock, movements and reports
///
/// Stock and history are kept as JSON documents in the data directory.
#[derive(Parser, Debug)]
#[command(name = "inventory-ledger")]
#[command(about = "A stock ledger service with movement history and text reports", long_about = None)]
struct Args {
    /// Directory holding stock.json and history.json
    #[arg(long, env = "INVENTORY_DATA_DIR", default_value = "./data", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        #[arg(long, env = "HOST", default_value = "127.0.0.1")]
        host: String,
        #[arg(long, env = "PORT", default_value_t = 3000)]
        port: u16,
    },
    /// Apply movements from a CSV file
    ///
    /// Expected format: type,product,quantity (type is add, in or out)
    Import {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
    /// Write the stock map as CSV to stdout
    Export,
    /// Render a product stock report
    Report {
        product: String,
        /// First day to include (YYYY-MM-DD); requires --to
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Last day to include (YYYY-MM-DD); requires --from
        #[arg(long, requires = "from")]
        to: Option<String>,
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn main() {
    // A missing .env file is fine.
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let store = match JsonFileStore::open(&args.data_dir) {
        Ok(store) => store,
        Err(e) => {
            error!("Error opening data directory '{}': {}", args.data_dir.display(), e);
            process::exit(1);
        }
    };
    let ledger = Ledger::new(store);

    let result = match args.command {
        Command::Serve { host, port } => serve(ledger, &host, port),
        Command::Import { input } => import(&ledger, &input),
        Command::Export => write_stock(&ledger, std::io::stdout()).map_err(|e| e.to_string()),
        Command::Report {
            product,
            from,
            to,
            output,
        } => report(&ledger, &product, from.as_deref(), to.as_deref(), output),
    };

    if let Err(e) = result {
        error!("{e}");
        process::exit(1);
    }
}

fn serve(ledger: Ledger<JsonFileStore>, host: &str, port: u16) -> Result<(), String> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| format!("invalid listen address {host}:{port}: {e}"))?;
    let runtime = tokio::runtime::Runtime::new().map_err(|e| e.to_string())?;

    runtime.block_on(async move {
        let app = api::create_router(Arc::new(ledger));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| format!("binding {addr}: {e}"))?;
        info!("Inventory API server running on http://{addr}");
        axum::serve(listener, app).await.map_err(|e| e.to_string())
    })
}

fn import<S: Store>(ledger: &Ledger<S>, input: &Path) -> Result<(), String> {
    let file = File::open(input)
        .map_err(|e| format!("Error opening file '{}': {}", input.display(), e))?;
    let summary = process_movements(ledger, BufReader::new(file))
        .map_err(|e| format!("Error processing movements: {e}"))?;
    info!(applied = summary.applied, skipped = summary.skipped, "import finished");
    Ok(())
}

fn report<S: Store>(
    ledger: &Ledger<S>,
    product: &str,
    from: Option<&str>,
    to: Option<&str>,
    output: Option<PathBuf>,
) -> Result<(), String> {
    let range = DateRange::from_bounds(from, to).map_err(|e| e.to_string())?;
    let report = ledger
        .generate_report(product, range)
        .map_err(|e| e.to_string())?;

    match output {
        Some(path) => {
            std::fs::write(&path, report.body).map_err(|e| e.to_string())?;
            info!("Report written to {}", path.display());
        }
        None => {
            info!("Suggested file name: {}", report.filename);
            std::io::stdout()
                .write_all(report.body.as_bytes())
                .map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}

/// Raw CSV record matching the import format.
///
/// Fields: `type, product, quantity`
#[derive(Debug, Deserialize)]
struct CsvMovement {
    #[serde(rename = "type")]
    kind: String,
    product: String,
    quantity: u64,
}

/// Outcome of an import run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub applied: usize,
    pub skipped: usize,
}

/// Apply movements from a CSV reader.
///
/// Rows are applied in file order. Malformed rows and movements the ledger
/// rejects are logged and skipped.
///
/// # CSV Format
///
/// ```csv
/// type,product,quantity
/// add,Olive Oil,100
/// in,olive oil,50
/// out,Olive Oil,30
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails.
pub fn process_movements<S: Store, R: Read>(
    ledger: &Ledger<S>,
    reader: R,
) -> Result<ImportSummary, csv::Error> {
    let mut summary = ImportSummary::default();

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .has_headers(true)
        .from_reader(reader);

    for (line, result) in rdr.deserialize::<CsvMovement>().enumerate() {
        let row = line + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(row, error = %e, "skipping malformed row");
                summary.skipped += 1;
                continue;
            }
        };

        let outcome = match record.kind.to_lowercase().as_str() {
            "add" => ledger.add_product(&record.product, record.quantity),
            "in" => ledger.stock_in(&record.product, record.quantity),
            "out" => ledger.stock_out(&record.product, record.quantity),
            other => {
                warn!(row, kind = other, "skipping unknown movement type");
                summary.skipped += 1;
                continue;
            }
        };

        match outcome {
            Ok(_) => summary.applied += 1,
            Err(e) => {
                warn!(row, error = %e, "skipping rejected movement");
                summary.skipped += 1;
            }
        }
    }

    Ok(summary)
}

/// Stock row written by `export`.
#[derive(Debug, Serialize)]
struct CsvStock<'a> {
    product: &'a str,
    purchased: u64,
    consumption: u64,
    stock: u64,
}

/// Write the stock map to a CSV writer.
///
/// # CSV Format
///
/// ```csv
/// product,purchased,consumption,stock
/// Olive Oil,150,30,120
/// ```
pub fn write_stock<S: Store, W: Write>(
    ledger: &Ledger<S>,
    writer: W,
) -> Result<(), Box<dyn std::error::Error>> {
    let stock = ledger.products()?;
    let mut wtr = Writer::from_writer(writer);

    for (key, record) in &stock {
        wtr.serialize(CsvStock {
            product: key.as_str(),
            purchased: record.purchased,
            consumption: record.consumption,
            stock: record.stock,
        })?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use inventory_ledger::{MemoryStore, MovementType};
    use std::io::Cursor;

    #[test]
    fn import_applies_movements_in_order() {
        let ledger = Ledger::new(MemoryStore::new());
        let csv = "type,product,quantity\n\
                   add,Olive Oil,100\n\
                   in,olive oil,50\n\
                   out,OLIVE OIL,30\n";

        let summary = process_movements(&ledger, Cursor::new(csv)).unwrap();

        assert_eq!(summary, ImportSummary { applied: 3, skipped: 0 });
        let (_, view) = ledger.find_product("olive oil").unwrap();
        assert_eq!(view.record.stock, 120);
        let kinds: Vec<_> = ledger.history().unwrap().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![MovementType::In, MovementType::In, MovementType::Out]);
    }

    #[test]
    fn import_with_whitespace() {
        let ledger = Ledger::new(MemoryStore::new());
        let csv = "type,product,quantity\n add , Salt , 5 \n";

        let summary = process_movements(&ledger, Cursor::new(csv)).unwrap();

        assert_eq!(summary.applied, 1);
        assert_eq!(ledger.find_product("salt").unwrap().1.record.stock, 5);
    }

    #[test]
    fn import_skips_malformed_and_rejected_rows() {
        let ledger = Ledger::new(MemoryStore::new());
        let csv = "type,product,quantity\n\
                   add,Salt,5\n\
                   in,Salt,-3\n\
                   transfer,Salt,1\n\
                   out,Salt,50\n\
                   in,Pepper,1\n\
                   add,SALT,1\n\
                   out,Salt,2\n";

        let summary = process_movements(&ledger, Cursor::new(csv)).unwrap();

        assert_eq!(summary, ImportSummary { applied: 2, skipped: 5 });
        assert_eq!(ledger.find_product("salt").unwrap().1.record.stock, 3);
    }

    /// Log sink shared with the subscriber under test.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn rejected_movements_are_logged_at_default_level() {
        let logs = CapturedLogs::default();
        let sink = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("info"))
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();

        let ledger = Ledger::new(MemoryStore::new());
        let csv = "type,product,quantity\n\
                   add,Salt,5\n\
                   out,Salt,50\n";
        let summary = tracing::subscriber::with_default(subscriber, || {
            process_movements(&ledger, Cursor::new(csv)).unwrap()
        });

        assert_eq!(summary, ImportSummary { applied: 1, skipped: 1 });
        let output = String::from_utf8(logs.0.lock().clone()).unwrap();
        assert!(output.contains("WARN"), "{output}");
        assert!(output.contains("skipping rejected movement"), "{output}");
    }

    #[test]
    fn write_stock_to_csv() {
        let ledger = Ledger::new(MemoryStore::new());
        ledger.add_product("Olive Oil", 150).unwrap();
        ledger.stock_out("Olive Oil", 30).unwrap();

        let mut output = Vec::new();
        write_stock(&ledger, &mut output).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_eq!(output, "product,purchased,consumption,stock\nOlive Oil,150,30,120\n");
    }
}
