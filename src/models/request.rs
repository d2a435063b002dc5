//! Rental request model and lifecycle rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::{
    account::Actor,
    equipment::Equipment,
    pricing::{due_date, rental_price},
};
use crate::error::{AppError, AppResult};

/// Request lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    ReturnRequested,
    Completed,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 5] = [
        RequestStatus::Pending,
        RequestStatus::Approved,
        RequestStatus::Rejected,
        RequestStatus::ReturnRequested,
        RequestStatus::Completed,
    ];

    /// No event is accepted once a request is rejected or completed
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Rejected | RequestStatus::Completed)
    }

    /// Whether a request in this status keeps its units reserved
    pub fn holds_stock(self) -> bool {
        !self.is_terminal()
    }

    /// Transition table of the request lifecycle
    pub fn next(self, event: RequestEvent) -> AppResult<Transition> {
        use RequestEvent::{Approve, Reject, RequestReturn};
        use RequestStatus::*;

        let (to, releases_stock) = match (self, event) {
            (Pending, Approve) => (Approved, false),
            (Pending, Reject) => (Rejected, true),
            (Approved, RequestReturn) => (ReturnRequested, false),
            (ReturnRequested, RequestEvent::ConfirmReturn) => (Completed, true),
            (from, event) => return Err(AppError::InvalidTransition { from, event }),
        };
        Ok(Transition { to, releases_stock })
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::ReturnRequested => "return-requested",
            RequestStatus::Completed => "completed",
        };
        write!(f, "{}", label)
    }
}

/// Lifecycle events a request can receive after creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestEvent {
    Approve,
    Reject,
    RequestReturn,
    ConfirmReturn,
}

impl RequestEvent {
    /// Events decided by an administrator rather than by the borrower
    pub fn is_admin_decision(self) -> bool {
        !matches!(self, RequestEvent::RequestReturn)
    }
}

impl std::fmt::Display for RequestEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RequestEvent::Approve => "approve",
            RequestEvent::Reject => "reject",
            RequestEvent::RequestReturn => "request return of",
            RequestEvent::ConfirmReturn => "confirm return of",
        };
        write!(f, "{}", label)
    }
}

/// Outcome of a legal lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub to: RequestStatus,
    /// The request's units go back to the equipment's available stock
    pub releases_stock: bool,
}

/// A lifecycle event together with who issued it
#[derive(Debug, Clone)]
pub struct RequestCommand {
    pub event: RequestEvent,
    pub actor: Actor,
    /// Admin comment stored with the transition; `None` keeps the previous one
    pub comment: Option<String>,
}

/// Rental request record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RentalRequest {
    pub id: i32,
    pub equipment_id: i32,
    /// Borrower account identifier
    pub borrower: String,
    pub quantity: i32,
    pub duration_days: i32,
    /// daily price x quantity x duration, frozen at creation (minor units)
    pub total_price: i64,
    pub status: RequestStatus,
    pub admin_comment: Option<String>,
    pub requested_at: DateTime<Utc>,
    /// Informational only, nothing happens automatically when it passes
    pub due_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RentalRequest {
    fn authorize(&self, command: &RequestCommand) -> AppResult<()> {
        if command.event.is_admin_decision() {
            command.actor.require_admin(&format!("{} a request", command.event))
        } else if command.actor.account != self.borrower {
            Err(AppError::Unauthorized(format!(
                "Request {} belongs to another borrower",
                self.id
            )))
        } else {
            Ok(())
        }
    }

    /// Run `command` against this request and the equipment it references.
    ///
    /// Either both are updated or neither is.
    pub fn apply(
        &mut self,
        command: &RequestCommand,
        equipment: &mut Equipment,
        now: DateTime<Utc>,
    ) -> AppResult<Transition> {
        self.authorize(command)?;
        let transition = self.status.next(command.event)?;

        if equipment.id != self.equipment_id {
            return Err(AppError::InvariantViolation(format!(
                "Request {} references equipment {}, got {}",
                self.id, self.equipment_id, equipment.id
            )));
        }
        if transition.releases_stock {
            equipment.release(self.quantity)?;
        }

        self.status = transition.to;
        if command.event.is_admin_decision() {
            if let Some(comment) = &command.comment {
                self.admin_comment = Some(comment.clone());
            }
        }
        self.updated_at = now;
        Ok(transition)
    }
}

/// A borrower's request before validation
#[derive(Debug, Clone)]
pub struct RequestDraft {
    pub equipment_id: i32,
    pub borrower: String,
    pub quantity: i32,
    pub duration_days: i32,
    pub requested_at: DateTime<Utc>,
}

/// A validated and priced request whose units are already reserved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRentalRequest {
    pub equipment_id: i32,
    pub borrower: String,
    pub quantity: i32,
    pub duration_days: i32,
    pub total_price: i64,
    pub requested_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
}

impl RequestDraft {
    /// Validate the draft against `equipment`, price it and reserve its units.
    ///
    /// The caller has already resolved the equipment; checks then run as
    /// quantity, stock, duration. Nothing is reserved unless all of them pass.
    pub fn admit(self, equipment: &mut Equipment) -> AppResult<NewRentalRequest> {
        if equipment.id != self.equipment_id {
            return Err(AppError::InvariantViolation(format!(
                "Draft targets equipment {}, got {}",
                self.equipment_id, equipment.id
            )));
        }
        if self.quantity <= 0 {
            return Err(AppError::InvalidInput(format!(
                "Requested quantity must be positive, got {}",
                self.quantity
            )));
        }
        let available = equipment.available();
        if self.quantity > available {
            return Err(AppError::InsufficientStock {
                requested: self.quantity,
                available,
            });
        }
        if self.duration_days <= 0 {
            return Err(AppError::InvalidInput(format!(
                "Duration must be a positive number of days, got {}",
                self.duration_days
            )));
        }
        if self.borrower.trim().is_empty() {
            return Err(AppError::InvalidInput("Borrower account is required".to_string()));
        }

        let total_price = rental_price(equipment.daily_price, self.quantity, self.duration_days)?;
        let due_at = due_date(self.requested_at, self.duration_days)?;
        equipment.reserve(self.quantity)?;

        Ok(NewRentalRequest {
            equipment_id: self.equipment_id,
            borrower: self.borrower,
            quantity: self.quantity,
            duration_days: self.duration_days,
            total_price,
            requested_at: self.requested_at,
            due_at,
        })
    }
}

impl NewRentalRequest {
    pub fn into_request(self, id: i32) -> RentalRequest {
        RentalRequest {
            id,
            equipment_id: self.equipment_id,
            borrower: self.borrower,
            quantity: self.quantity,
            duration_days: self.duration_days,
            total_price: self.total_price,
            status: RequestStatus::Pending,
            admin_comment: None,
            requested_at: self.requested_at,
            due_at: self.due_at,
            updated_at: self.requested_at,
        }
    }
}

/// Create rental request body
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateRentalRequest {
    pub equipment_id: i32,
    pub quantity: i32,
    pub duration_days: i32,
}

/// Admin decision on a pending request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProcessRentalRequest {
    pub approve: bool,
    pub comment: Option<String>,
}

/// Admin confirmation that returned units are back in stock
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ConfirmReturn {
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::equipment::CreateEquipment;

    fn projector() -> Equipment {
        let data = CreateEquipment {
            name: "Projector".to_string(),
            quantity: 3,
            daily_price: 2,
        };
        Equipment::new(7, &data, Utc::now())
    }

    fn draft(quantity: i32, duration_days: i32) -> RequestDraft {
        RequestDraft {
            equipment_id: 7,
            borrower: "alice".to_string(),
            quantity,
            duration_days,
            requested_at: "2024-05-01T09:00:00Z".parse().unwrap(),
        }
    }

    fn command(event: RequestEvent, actor: Actor) -> RequestCommand {
        RequestCommand {
            event,
            actor,
            comment: None,
        }
    }

    #[test]
    fn transition_table() {
        use RequestEvent::{Approve, Reject, RequestReturn};
        use RequestStatus::*;

        let legal = [
            (Pending, Approve, Approved, false),
            (Pending, Reject, Rejected, true),
            (Approved, RequestReturn, ReturnRequested, false),
            (ReturnRequested, RequestEvent::ConfirmReturn, Completed, true),
        ];
        for (from, event, to, releases_stock) in legal {
            assert_eq!(from.next(event).unwrap(), Transition { to, releases_stock });
        }

        for from in RequestStatus::ALL {
            for event in [Approve, Reject, RequestReturn, RequestEvent::ConfirmReturn] {
                if legal.iter().any(|(f, e, _, _)| *f == from && *e == event) {
                    continue;
                }
                assert!(matches!(
                    from.next(event),
                    Err(AppError::InvalidTransition { .. })
                ));
            }
        }
    }

    #[test]
    fn return_requested_only_accepts_confirmation() {
        for event in [RequestEvent::Approve, RequestEvent::Reject, RequestEvent::RequestReturn] {
            assert!(matches!(
                RequestStatus::ReturnRequested.next(event),
                Err(AppError::InvalidTransition {
                    from: RequestStatus::ReturnRequested,
                    ..
                })
            ));
        }
        assert_eq!(
            RequestStatus::ReturnRequested
                .next(RequestEvent::ConfirmReturn)
                .unwrap(),
            Transition {
                to: RequestStatus::Completed,
                releases_stock: true
            }
        );
    }

    #[test]
    fn terminal_states() {
        assert!(RequestStatus::Rejected.is_terminal());
        assert!(RequestStatus::Completed.is_terminal());
        assert!(RequestStatus::ReturnRequested.holds_stock());
    }

    #[test]
    fn admit_prices_and_reserves() {
        let mut equipment = projector();
        let admitted = draft(2, 4).admit(&mut equipment).unwrap();
        assert_eq!(admitted.total_price, 16);
        assert_eq!(admitted.due_at.to_rfc3339(), "2024-05-05T09:00:00+00:00");
        assert_eq!(equipment.available(), 1);

        let request = admitted.into_request(1);
        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.admin_comment.is_none());
    }

    #[test]
    fn admit_checks_quantity_before_stock_before_duration() {
        let mut equipment = projector();
        assert!(matches!(
            draft(0, 0).admit(&mut equipment),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            draft(4, 0).admit(&mut equipment),
            Err(AppError::InsufficientStock {
                requested: 4,
                available: 3
            })
        ));
        assert!(matches!(
            draft(1, 0).admit(&mut equipment),
            Err(AppError::InvalidInput(_))
        ));
        assert_eq!(equipment.reserved, 0);
    }

    #[test]
    fn reject_releases_units_and_stores_comment() {
        let mut equipment = projector();
        let mut request = draft(2, 1).admit(&mut equipment).unwrap().into_request(1);

        let mut reject = command(RequestEvent::Reject, Actor::admin("root"));
        reject.comment = Some("Out for repair".to_string());
        request.apply(&reject, &mut equipment, Utc::now()).unwrap();

        assert_eq!(request.status, RequestStatus::Rejected);
        assert_eq!(request.admin_comment.as_deref(), Some("Out for repair"));
        assert_eq!(equipment.available(), 3);
    }

    #[test]
    fn borrower_cannot_decide_and_stranger_cannot_return() {
        let mut equipment = projector();
        let mut request = draft(1, 1).admit(&mut equipment).unwrap().into_request(1);

        let err = request
            .apply(
                &command(RequestEvent::Approve, Actor::borrower("alice")),
                &mut equipment,
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        request
            .apply(
                &command(RequestEvent::Approve, Actor::admin("root")),
                &mut equipment,
                Utc::now(),
            )
            .unwrap();
        let err = request
            .apply(
                &command(RequestEvent::RequestReturn, Actor::borrower("mallory")),
                &mut equipment,
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert_eq!(request.status, RequestStatus::Approved);
    }

    #[test]
    fn illegal_event_changes_nothing() {
        let mut equipment = projector();
        let mut request = draft(2, 1).admit(&mut equipment).unwrap().into_request(1);
        let before = (request.clone(), equipment.clone());

        let err = request
            .apply(
                &command(RequestEvent::ConfirmReturn, Actor::admin("root")),
                &mut equipment,
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition {
                from: RequestStatus::Pending,
                event: RequestEvent::ConfirmReturn
            }
        ));
        assert_eq!((request, equipment), before);
    }
}
