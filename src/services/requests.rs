//! Rental request lifecycle service

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{
        account::Actor,
        request::{
            ConfirmReturn, CreateRentalRequest, ProcessRentalRequest, RentalRequest,
            RequestCommand, RequestDraft, RequestEvent,
        },
        stats::ReservationAudit,
    },
    repository::Repository,
};

/// Request lifecycle engine.
///
/// Owns the request state machine and drives reservations and releases
/// into the inventory through the store's atomic units of work.
#[derive(Clone)]
pub struct RequestService {
    repository: Repository,
}

impl RequestService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Open a pending request on behalf of the calling account
    pub async fn create(&self, actor: &Actor, data: &CreateRentalRequest) -> AppResult<RentalRequest> {
        let draft = RequestDraft {
            equipment_id: data.equipment_id,
            borrower: actor.account.clone(),
            quantity: data.quantity,
            duration_days: data.duration_days,
            requested_at: Utc::now(),
        };
        let request = self
            .repository
            .requests_create(draft)
            .await
            .inspect_err(AppError::log)?;
        tracing::info!(
            request_id = request.id,
            equipment_id = request.equipment_id,
            quantity = request.quantity,
            total_price = request.total_price,
            "Request opened by {}",
            request.borrower
        );
        Ok(request)
    }

    /// Approve or reject a pending request
    pub async fn process(
        &self,
        actor: &Actor,
        id: i32,
        data: &ProcessRentalRequest,
    ) -> AppResult<RentalRequest> {
        actor
            .require_admin("process requests")
            .inspect_err(AppError::log)?;
        let event = if data.approve {
            RequestEvent::Approve
        } else {
            RequestEvent::Reject
        };
        self.apply(id, event, actor, data.comment.clone()).await
    }

    /// Borrower announces the units are coming back
    pub async fn request_return(&self, actor: &Actor, id: i32) -> AppResult<RentalRequest> {
        self.apply(id, RequestEvent::RequestReturn, actor, None).await
    }

    /// Admin confirms the units are back in stock
    pub async fn confirm_return(
        &self,
        actor: &Actor,
        id: i32,
        data: &ConfirmReturn,
    ) -> AppResult<RentalRequest> {
        actor
            .require_admin("confirm returns")
            .inspect_err(AppError::log)?;
        self.apply(id, RequestEvent::ConfirmReturn, actor, data.comment.clone())
            .await
    }

    async fn apply(
        &self,
        id: i32,
        event: RequestEvent,
        actor: &Actor,
        comment: Option<String>,
    ) -> AppResult<RentalRequest> {
        let command = RequestCommand {
            event,
            actor: actor.clone(),
            comment,
        };
        let (request, equipment) = self
            .repository
            .requests_apply(id, command)
            .await
            .inspect_err(AppError::log)?;
        tracing::info!(
            request_id = id,
            equipment_id = equipment.id,
            available = equipment.available(),
            "Request is now {} ({} by {})",
            request.status,
            event,
            actor.account
        );
        Ok(request)
    }

    /// Request by ID, visible to admins and to its borrower
    pub async fn get(&self, actor: &Actor, id: i32) -> AppResult<RentalRequest> {
        let request = self
            .repository
            .requests_get(id)
            .await
            .inspect_err(AppError::log)?;
        actor
            .require_self_or_admin(&request.borrower)
            .inspect_err(AppError::log)?;
        Ok(request)
    }

    pub async fn list(&self) -> AppResult<Vec<RentalRequest>> {
        self.repository
            .requests_list()
            .await
            .inspect_err(AppError::log)
    }

    pub async fn list_for_borrower(&self, borrower: &str) -> AppResult<Vec<RentalRequest>> {
        self.repository
            .requests_list_for_borrower(borrower)
            .await
            .inspect_err(AppError::log)
    }

    /// Equipment whose reserved count disagrees with its outstanding requests
    pub async fn audit(&self) -> AppResult<Vec<ReservationAudit>> {
        let rows = self
            .repository
            .reservation_audit()
            .await
            .inspect_err(AppError::log)?;
        let broken: Vec<ReservationAudit> = rows.into_iter().filter(|r| !r.is_consistent()).collect();
        for row in &broken {
            AppError::InvariantViolation(format!(
                "Equipment {} has {} units reserved for {} outstanding (quantity {})",
                row.equipment_id, row.reserved, row.outstanding, row.quantity
            ))
            .log();
        }
        Ok(broken)
    }
}
