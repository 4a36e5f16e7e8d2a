//! Insights and dashboard handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use billwise_core::insights::{compute_insights, InsightsSummary};
use billwise_core::models::TransactionRecord;
use billwise_core::storage::TransactionStore;

use crate::{AppError, AppState};

/// Dashboard payload: the summary plus the ledger it was computed from
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub insights: InsightsSummary,
    pub transactions: Vec<TransactionRecord>,
}

/// GET /api/insights - Spending summary over the stored ledger
pub async fn get_insights(
    State(state): State<Arc<AppState>>,
) -> Result<Json<InsightsSummary>, AppError> {
    let records = state.store.load()?;
    Ok(Json(compute_insights(&records)))
}

/// GET /api/dashboard - Summary and transactions in one call
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardResponse>, AppError> {
    let transactions = state.store.load()?;
    let insights = compute_insights(&transactions);

    Ok(Json(DashboardResponse {
        success: true,
        insights,
        transactions,
    }))
}
