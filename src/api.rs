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

//! REST API over the stock ledger.
//!
//! ## Endpoints
//!
//! - `GET /` - Welcome text
//! - `GET /stock` - Full product map
//! - `GET /stock/{product}` - One product with `pending`
//! - `GET /stock/report/{product}` - Same as `GET /stock/{product}`
//! - `GET /stock/history` - Full movement history
//! - `GET /stock/history/{product}` - Movement history of one product
//! - `POST /stock/in` - `{"product": "...", "quantity": 5}`
//! - `POST /stock/out` - `{"product": "...", "quantity": 5}`
//! - `POST /stock/addProduct` - `{"name": "...", "quantity": 5, "volumePerUnit": 250, "density": 0.92}`
//! - `GET /stock/report/download/{product}?fromDate=YYYY-MM-DD&toDate=YYYY-MM-DD` - Text report
//!
//! ## Example Usage
//!
//! ```bash
//! curl -X POST http://localhost:3000/stock/addProduct \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Olive Oil", "quantity": 100}'
//!
//! curl -X POST http://localhost:3000/stock/out \
//!   -H "Content-Type: application/json" \
//!   -d '{"product": "olive oil", "quantity": 30}'
//!
//! curl -OJ "http://localhost:3000/stock/report/download/Olive%20Oil?fromDate=2025-01-01&toDate=2025-01-31"
//! ```

use crate::LedgerError;
use crate::history::HistoryEntry;
use crate::ledger::Ledger;
use crate::product::{ProductRecord, ProductView, StockMap};
use crate::report::DateRange;
use crate::store::Store;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Request body for `POST /stock/in` and `POST /stock/out`.
///
/// `quantity` is kept as raw JSON so that a negative or non-numeric value
/// surfaces as a validation error rather than a body rejection.
#[derive(Debug, Deserialize, Serialize)]
pub struct MovementRequest {
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub quantity: Value,
}

/// Request body for `POST /stock/addProduct`.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddProductRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quantity: Value,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub volume_per_unit: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub density: Option<Decimal>,
}

/// Query string of the report download.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

/// Response body for successful mutations.
#[derive(Debug, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    pub message: String,
    pub data: ProductRecord,
}

/// Response body for errors.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

/// Parses a JSON quantity into a non-negative integer.
///
/// Accepts JSON integers, floats with no fractional part and numeric strings.
pub fn parse_quantity(value: &Value) -> Result<u64, LedgerError> {
    let invalid = || LedgerError::InvalidQuantity(format!("expected a non-negative integer, got {value}"));
    match value {
        Value::Number(n) => {
            if let Some(q) = n.as_u64() {
                Ok(q)
            } else {
                match n.as_f64() {
                    Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
                    _ => Err(invalid()),
                }
            }
        }
        Value::String(s) => s.trim().parse::<u64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// Shared application state containing the ledger.
pub struct AppState<S> {
    pub ledger: Arc<Ledger<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
        }
    }
}

/// Wrapper for converting `LedgerError` into HTTP responses.
#[derive(Debug)]
pub struct AppError(LedgerError);

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            LedgerError::ProductNotFound(_) => (StatusCode::NOT_FOUND, "PRODUCT_NOT_FOUND"),
            LedgerError::DocumentNotFound(_) => (StatusCode::NOT_FOUND, "DOCUMENT_NOT_FOUND"),
            LedgerError::AlreadyExists(_) => (StatusCode::BAD_REQUEST, "ALREADY_EXISTS"),
            LedgerError::InsufficientStock { .. } => {
                (StatusCode::BAD_REQUEST, "INSUFFICIENT_STOCK")
            }
            LedgerError::InvalidQuantity(_) => (StatusCode::BAD_REQUEST, "INVALID_QUANTITY"),
            LedgerError::InvalidName => (StatusCode::BAD_REQUEST, "INVALID_NAME"),
            LedgerError::InvalidConversion(_) => (StatusCode::BAD_REQUEST, "INVALID_CONVERSION"),
            LedgerError::InvalidDate(_) => (StatusCode::BAD_REQUEST, "INVALID_DATE"),
            LedgerError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let error = match &self.0 {
            LedgerError::Io(detail) => {
                tracing::error!(%detail, "store failure");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

/// Runs a ledger call on the blocking pool; store I/O and the ledger's write
/// lock must not stall Tokio worker threads.
async fn with_ledger<S, T, F>(state: AppState<S>, call: F) -> Result<T, AppError>
where
    S: Store + 'static,
    T: Send + 'static,
    F: FnOnce(&Ledger<S>) -> Result<T, LedgerError> + Send + 'static,
{
    let ledger = state.ledger;
    tokio::task::spawn_blocking(move || call(&ledger))
        .await
        .map_err(|e| AppError(LedgerError::Io(format!("ledger task failed: {e}"))))?
        .map_err(AppError::from)
}

/// GET / - Liveness text.
async fn welcome() -> &'static str {
    "Welcome to the Inventory Server!"
}

/// GET /stock - Full product map.
async fn list_products<S: Store + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<StockMap>, AppError> {
    with_ledger(state, |ledger| ledger.products()).await.map(Json)
}

/// GET /stock/{product} - One product with `pending`.
async fn get_product<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(product): Path<String>,
) -> Result<Json<ProductView>, AppError> {
    let (_, view) = with_ledger(state, move |ledger| ledger.find_product(&product)).await?;
    Ok(Json(view))
}

/// GET /stock/history - Full history.
async fn list_history<S: Store + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    with_ledger(state, |ledger| ledger.history()).await.map(Json)
}

/// GET /stock/history/{product} - History of one product.
async fn product_history<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(product): Path<String>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    with_ledger(state, move |ledger| ledger.product_history(&product))
        .await
        .map(Json)
}

/// POST /stock/in - Record purchased units.
async fn stock_in<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Json(request): Json<MovementRequest>,
) -> Result<Json<MutationResponse>, AppError> {
    let quantity = parse_quantity(&request.quantity)?;
    let (key, record) = with_ledger(state, move |ledger| {
        let key = ledger.resolve_product(&request.product)?;
        let record = ledger.stock_in(key.as_str(), quantity)?;
        Ok((key, record))
    })
    .await?;
    Ok(Json(MutationResponse {
        success: true,
        message: format!("Stock IN updated for {key}"),
        data: record,
    }))
}

/// POST /stock/out - Record consumed units.
async fn stock_out<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Json(request): Json<MovementRequest>,
) -> Result<Json<MutationResponse>, AppError> {
    let quantity = parse_quantity(&request.quantity)?;
    let (key, record) = with_ledger(state, move |ledger| {
        let key = ledger.resolve_product(&request.product)?;
        let record = ledger.stock_out(key.as_str(), quantity)?;
        Ok((key, record))
    })
    .await?;
    Ok(Json(MutationResponse {
        success: true,
        message: format!("Stock OUT updated for {key}"),
        data: record,
    }))
}

/// POST /stock/addProduct - Register a new product.
async fn add_product<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Json(request): Json<AddProductRequest>,
) -> Result<(StatusCode, Json<MutationResponse>), AppError> {
    let quantity = parse_quantity(&request.quantity)?;
    let record = with_ledger(state, move |ledger| {
        ledger.add_product_with_conversion(
            &request.name,
            quantity,
            request.volume_per_unit,
            request.density,
        )
    })
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(MutationResponse {
            success: true,
            message: "Product added".to_string(),
            data: record,
        }),
    ))
}

/// GET /stock/report/download/{product} - Text report attachment.
async fn download_report<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(product): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    let range = DateRange::from_bounds(query.from_date.as_deref(), query.to_date.as_deref())?;
    let report = with_ledger(state, move |ledger| ledger.generate_report(&product, range)).await?;
    let disposition = format!("attachment; filename=\"{}\"", report.filename);

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.body,
    )
        .into_response())
}

/// Builds the router. Product names in paths are percent-decoded by axum.
pub fn create_router<S: Store + 'static>(ledger: Arc<Ledger<S>>) -> Router {
    let state = AppState { ledger };
    Router::new()
        .route("/", get(welcome))
        .route("/stock", get(list_products::<S>))
        .route("/stock/history", get(list_history::<S>))
        .route("/stock/history/{product}", get(product_history::<S>))
        .route("/stock/in", post(stock_in::<S>))
        .route("/stock/out", post(stock_out::<S>))
        .route("/stock/addProduct", post(add_product::<S>))
        .route("/stock/report/download/{product}", get(download_report::<S>))
        .route("/stock/report/{product}", get(get_product::<S>))
        .route("/stock/{product}", get(get_product::<S>))
        .with_state(state)
}
