//! Rental request endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::request::{ConfirmReturn, CreateRentalRequest, ProcessRentalRequest, RentalRequest},
};

use super::AuthenticatedUser;

/// List every rental request
#[utoipa::path(
    get,
    path = "/requests",
    tag = "requests",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All requests", body = Vec<RentalRequest>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_requests(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<RentalRequest>>> {
    claims.actor().require_admin("list all requests")?;
    let requests = state.services.requests.list().await?;
    Ok(Json(requests))
}

/// Open a rental request for the calling account
#[utoipa::path(
    post,
    path = "/requests",
    tag = "requests",
    security(("bearer_auth" = [])),
    request_body = CreateRentalRequest,
    responses(
        (status = 201, description = "Request created", body = RentalRequest),
        (status = 400, description = "Invalid quantity or duration"),
        (status = 404, description = "Equipment not found"),
        (status = 409, description = "Not enough units available")
    )
)]
pub async fn create_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateRentalRequest>,
) -> AppResult<(StatusCode, Json<RentalRequest>)> {
    let request = state.services.requests.create(&claims.actor(), &data).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// Requests of the calling account
#[utoipa::path(
    get,
    path = "/requests/mine",
    tag = "requests",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's requests", body = Vec<RentalRequest>)
    )
)]
pub async fn list_my_requests(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<RentalRequest>>> {
    let requests = state.services.requests.list_for_borrower(&claims.sub).await?;
    Ok(Json(requests))
}

/// Requests of one borrower
#[utoipa::path(
    get,
    path = "/borrowers/{account}/requests",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("account" = String, Path, description = "Borrower account")),
    responses(
        (status = 200, description = "Borrower's requests", body = Vec<RentalRequest>),
        (status = 403, description = "Not this borrower and not an administrator")
    )
)]
pub async fn list_borrower_requests(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(account): Path<String>,
) -> AppResult<Json<Vec<RentalRequest>>> {
    claims.actor().require_self_or_admin(&account)?;
    let requests = state.services.requests.list_for_borrower(&account).await?;
    Ok(Json(requests))
}

/// Get a request by ID
#[utoipa::path(
    get,
    path = "/requests/{id}",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request details", body = RentalRequest),
        (status = 404, description = "Request not found")
    )
)]
pub async fn get_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<RentalRequest>> {
    let request = state.services.requests.get(&claims.actor(), id).await?;
    Ok(Json(request))
}

/// Approve or reject a pending request
#[utoipa::path(
    post,
    path = "/requests/{id}/process",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Request ID")),
    request_body = ProcessRentalRequest,
    responses(
        (status = 200, description = "Request approved or rejected", body = RentalRequest),
        (status = 403, description = "Administrator privileges required"),
        (status = 409, description = "Request is not pending")
    )
)]
pub async fn process_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<ProcessRentalRequest>,
) -> AppResult<Json<RentalRequest>> {
    let request = state
        .services
        .requests
        .process(&claims.actor(), id, &data)
        .await?;
    Ok(Json(request))
}

/// Borrower asks to return an approved rental
#[utoipa::path(
    post,
    path = "/requests/{id}/return",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Return requested", body = RentalRequest),
        (status = 403, description = "Request belongs to another borrower"),
        (status = 409, description = "Request is not approved")
    )
)]
pub async fn request_return(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<RentalRequest>> {
    let request = state
        .services
        .requests
        .request_return(&claims.actor(), id)
        .await?;
    Ok(Json(request))
}

/// Admin confirms the returned units are back
#[utoipa::path(
    post,
    path = "/requests/{id}/confirm-return",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Request ID")),
    request_body = ConfirmReturn,
    responses(
        (status = 200, description = "Rental completed", body = RentalRequest),
        (status = 403, description = "Administrator privileges required"),
        (status = 409, description = "No return was requested")
    )
)]
pub async fn confirm_return(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    data: Option<Json<ConfirmReturn>>,
) -> AppResult<Json<RentalRequest>> {
    let data = data.map(|Json(d)| d).unwrap_or_default();
    let request = state
        .services
        .requests
        .confirm_return(&claims.actor(), id, &data)
        .await?;
    Ok(Json(request))
}
