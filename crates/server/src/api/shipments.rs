//! Shipment API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;
use parcelwatch_core::{NewShipment, ShipmentRecord, SyncError};

use super::{api_error, ApiError};
use crate::state::AppState;

/// Response for a delete request
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub tracking_number: String,
    /// `false` when the shipment was not tracked.
    pub deleted: bool,
}

fn sync_error(e: SyncError) -> ApiError {
    let status = match &e {
        SyncError::NotFound(_) => StatusCode::NOT_FOUND,
        SyncError::AlreadyExists(_) => StatusCode::CONFLICT,
        SyncError::InvalidTrackingNumber(_) => StatusCode::BAD_REQUEST,
        SyncError::Carrier { .. } => StatusCode::BAD_GATEWAY,
        SyncError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e)
}

/// GET /api/shipments
pub async fn list_shipments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ShipmentRecord>>, ApiError> {
    state
        .coordinator()
        .list_all()
        .map(Json)
        .map_err(sync_error)
}

/// POST /api/shipments
///
/// The initial status check runs in the background when `sync.check_on_add`
/// is set; the response carries the freshly added record.
pub async fn create_shipment(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewShipment>,
) -> Result<(StatusCode, Json<ShipmentRecord>), ApiError> {
    let record = state.coordinator().add_direct(body).map_err(sync_error)?;

    if state.config().sync.check_on_add {
        let coordinator = Arc::clone(state.coordinator());
        let tracking_number = record.tracking_number.clone();
        tokio::spawn(async move {
            if let Err(e) = coordinator.check_one(&tracking_number).await {
                warn!(
                    tracking_number = %tracking_number,
                    error = %e,
                    "Initial status check failed"
                );
            }
        });
    }

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/shipments/{tracking_number}
pub async fn get_shipment(
    State(state): State<Arc<AppState>>,
    Path(tracking_number): Path<String>,
) -> Result<Json<ShipmentRecord>, ApiError> {
    state
        .coordinator()
        .get(&tracking_number)
        .map(Json)
        .map_err(sync_error)
}

/// DELETE /api/shipments/{tracking_number}
pub async fn delete_shipment(
    State(state): State<Arc<AppState>>,
    Path(tracking_number): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let deleted = state
        .coordinator()
        .delete(&tracking_number)
        .map_err(sync_error)?;

    Ok(Json(DeleteResponse {
        tracking_number,
        deleted,
    }))
}

/// POST /api/shipments/{tracking_number}/check
pub async fn check_shipment(
    State(state): State<Arc<AppState>>,
    Path(tracking_number): Path<String>,
) -> Result<Json<ShipmentRecord>, ApiError> {
    state
        .coordinator()
        .check_one(&tracking_number)
        .await
        .map(Json)
        .map_err(sync_error)
}
