//! Batch lifecycle handlers: reconciliation and balance correction

use axum::{
    extract::{Path, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use shared::models::{CorrectionResult, ReconcileOutcome};

use crate::error::AppResult;
use crate::services::NegativeInventoryService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReconcileInput {
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CorrectionInput {
    pub new_balance: Decimal,
}

/// POST /batches/:batch_id/reconcile
pub async fn reconcile_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    Json(input): Json<ReconcileInput>,
) -> AppResult<Json<ReconcileOutcome>> {
    let service = NegativeInventoryService::new(state.source.clone());
    let outcome = service.reconcile(batch_id, input.notes.as_deref()).await?;
    Ok(Json(outcome))
}

/// POST /batches/:batch_id/correction
pub async fn correct_batch_balance(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    Json(input): Json<CorrectionInput>,
) -> AppResult<Json<CorrectionResult>> {
    let service = NegativeInventoryService::new(state.source.clone());
    let result = service.correct_quantity(batch_id, input.new_balance).await?;
    Ok(Json(result))
}
