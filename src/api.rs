//! HTTP surface: the `/cut-stock` endpoint and its JSON contract.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::{PackConfig, ScanOrder};
use crate::error::PackError;
use crate::layout::Layout;
use crate::plot::layout_to_svg;
use crate::solver::Solver;
use crate::supply::Supply;
use crate::types::{PieceDemand, SheetStock};

/// Shared, read-only context for every request.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub pack: PackConfig,
}

pub type ApiError = (StatusCode, String);

/// Integer that also accepts numeric strings and whole floats, since form-built
/// clients often send `"12"` or `12.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Int(pub i64);

impl<'de> Deserialize<'de> for Int {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Float(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(v) => Ok(Int(v)),
            Raw::Float(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Ok(Int(v as i64)),
            Raw::Float(v) => Err(serde::de::Error::custom(format!(
                "expected an integer, got {v}"
            ))),
            Raw::Text(s) => s.trim().parse().map(Int).map_err(|_| {
                serde::de::Error::custom(format!("expected an integer, got '{s}'"))
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CutStockRequest {
    /// `[width, height, demand]` per piece type.
    pub demand: Vec<[Int; 3]>,
    /// `[width, height]` of the sheet, opened as often as needed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<[Int; 2]>,
    /// `[width, height, quantity]` per sheet type, used in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Vec<[Int; 3]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_order: Option<ScanOrder>,
}

impl CutStockRequest {
    pub fn demands(&self) -> Vec<PieceDemand> {
        self.demand
            .iter()
            .map(|[w, h, q]| PieceDemand::new(w.0, h.0, q.0))
            .collect()
    }

    pub fn supply(&self) -> Result<Supply, String> {
        match (&self.stock, &self.inventory) {
            (Some([w, h]), None) => Ok(Supply::unbounded(w.0, h.0)),
            (None, Some(lines)) => Ok(Supply::Inventory(
                lines
                    .iter()
                    .map(|[w, h, q]| SheetStock::new(w.0, h.0, q.0))
                    .collect(),
            )),
            (Some(_), Some(_)) => Err("give either 'stock' or 'inventory', not both".to_string()),
            (None, None) => Err("one of 'stock' or 'inventory' is required".to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CutStockResponse {
    /// `[x1, y1, x2, y2]` per placed piece, in placement order.
    pub placements: Vec<[u32; 4]>,
    /// `[width, height]` of each placed piece as cut.
    pub sizes: Vec<[u32; 2]>,
    pub sheet_indices: Vec<usize>,
    pub parent_count: usize,
    pub layout: Layout,
    /// SVG document with one panel per sheet.
    pub image: String,
}

impl CutStockResponse {
    pub fn from_layout(layout: Layout) -> Self {
        let image = layout_to_svg(&layout).to_string();
        Self {
            placements: layout.placements.iter().map(|p| p.region().corners()).collect(),
            sizes: layout.placements.iter().map(|p| [p.rect.w, p.rect.h]).collect(),
            sheet_indices: layout.placements.iter().map(|p| p.sheet_index).collect(),
            parent_count: layout.sheet_count(),
            layout,
            image,
        }
    }
}

pub fn status_for(err: &PackError) -> StatusCode {
    if err.is_input_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    }
}

pub async fn cut_stock(
    State(state): State<AppState>,
    Json(req): Json<CutStockRequest>,
) -> Result<Json<CutStockResponse>, ApiError> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /cut-stock"
    );

    let supply = req.supply().map_err(|e| (StatusCode::BAD_REQUEST, e))?;
    let mut config = state.pack;
    if let Some(order) = req.scan_order {
        config.scan_order = order;
    }
    let solver = Solver::new(supply, req.demands(), config);

    // The scan is CPU-bound; keep it off the async workers.
    let layout = tokio::task::spawn_blocking(move || solver.solve())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "pack task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error while packing".to_string(),
            )
        })?
        .map_err(|e| (status_for(&e), e.to_string()))?;

    Ok(Json(CutStockResponse::from_layout(layout)))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/cut-stock", post(cut_stock))
        .with_state(state)
}
