//! Transaction handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use billwise_core::error::Error;
use billwise_core::models::{NewTransaction, TransactionRecord};
use billwise_core::storage::TransactionStore;

use crate::{AppError, AppState, DataResponse, SuccessResponse};

/// GET /api/transactions - List all transactions
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DataResponse<Vec<TransactionRecord>>>, AppError> {
    let records = state.store.load()?;
    Ok(Json(DataResponse::new(records)))
}

/// POST /api/transactions - Record a transaction (manual entry or confirmed bill)
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Json(tx): Json<NewTransaction>,
) -> Result<Json<DataResponse<TransactionRecord>>, AppError> {
    let record = state.store.save(tx).map_err(|e| match e {
        Error::InvalidData(msg) => AppError::bad_request(&msg),
        other => AppError::from(other),
    })?;

    info!(
        id = record.id,
        amount = record.amount(),
        category = record.category_label(),
        "Transaction saved"
    );

    Ok(Json(DataResponse::new(record)))
}

/// GET /api/transactions/:id - Get a single transaction
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DataResponse<TransactionRecord>>, AppError> {
    let record = state
        .store
        .get(id)?
        .ok_or_else(|| AppError::not_found("Transaction not found"))?;

    Ok(Json(DataResponse::new(record)))
}

/// DELETE /api/transactions/:id - Delete a transaction
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.store.delete(id)? {
        return Err(AppError::not_found("Transaction not found"));
    }

    info!(id, "Transaction deleted");
    Ok(Json(SuccessResponse { success: true }))
}
