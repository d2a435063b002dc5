//! Dashboard statistics and reservation audit endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::stats::{RentalStats, ReservationAudit},
};

use super::AuthenticatedUser;

/// Inventory and request figures
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard statistics", body = RentalStats),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<RentalStats>> {
    claims.actor().require_admin("read statistics")?;
    let stats = state.services.stats.summary().await?;
    Ok(Json(stats))
}

/// Equipment whose reserved units disagree with outstanding requests
#[utoipa::path(
    get,
    path = "/audit",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Inconsistent equipment (empty when healthy)", body = Vec<ReservationAudit>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn get_audit(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<ReservationAudit>>> {
    claims.actor().require_admin("audit reservations")?;
    let broken = state.services.requests.audit().await?;
    Ok(Json(broken))
}
