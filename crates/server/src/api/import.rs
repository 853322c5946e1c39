//! Ticket portal import handler.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;
use parcelwatch_core::{ImportError, ImportReport, PortalCredentials};

use super::{api_error, ApiError};
use crate::state::AppState;

/// Request body for an import. Both fields may be left out to use the
/// configured default credentials.
#[derive(Debug, Default, Deserialize)]
pub struct ImportBody {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl ImportBody {
    fn credentials(self) -> Option<PortalCredentials> {
        match (self.email, self.password) {
            (Some(email), Some(password)) if !email.trim().is_empty() => {
                Some(PortalCredentials::new(email.trim(), password))
            }
            _ => None,
        }
    }
}

/// POST /api/import
pub async fn import_from_portal(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ImportBody>,
) -> Result<Json<ImportReport>, ApiError> {
    let Some(importer) = state.importer() else {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Ticket portal is not configured",
        ));
    };

    importer
        .import_detached(body.credentials())
        .await
        .map(Json)
        .map_err(|e| {
            let status = match &e {
                ImportError::MissingCredentials => StatusCode::BAD_REQUEST,
                ImportError::Authentication(_) => StatusCode::UNAUTHORIZED,
                ImportError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            api_error(status, e)
        })
}
