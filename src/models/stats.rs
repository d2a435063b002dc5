//! Dashboard and reservation audit read models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Reservation bookkeeping of one equipment item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ReservationAudit {
    pub equipment_id: i32,
    pub quantity: i32,
    pub reserved: i32,
    /// Sum of the quantities of pending, approved and return-requested requests
    pub outstanding: i32,
}

impl ReservationAudit {
    pub fn is_consistent(&self) -> bool {
        self.reserved == self.outstanding && self.reserved >= 0 && self.reserved <= self.quantity
    }
}

/// Request counts per lifecycle status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RequestCounts {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub return_requested: i64,
    pub completed: i64,
}

/// Figures for the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RentalStats {
    /// Equipment items currently in the catalog
    pub equipment: i64,
    pub total_units: i64,
    pub reserved_units: i64,
    pub available_units: i64,
    pub requests: RequestCounts,
    /// Sum of the prices of completed rentals (minor units)
    pub completed_revenue: i64,
}
