//! Repository layer for equipment and rental request storage

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{
        equipment::{CreateEquipment, Equipment, UpdateEquipment},
        request::{RentalRequest, RequestCommand, RequestDraft},
        stats::ReservationAudit,
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage backend for the catalog and the request collection.
///
/// Every method is one atomic unit of work: a request insert and the
/// reservation it takes, or a transition and the stock it releases, are
/// committed together under the lock of the equipment involved.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RentalStore: Send + Sync {
    /// Check the backend answers without touching any equipment lock
    async fn ping(&self) -> AppResult<()>;

    /// Equipment still in the catalog, by id
    async fn equipment_list(&self) -> AppResult<Vec<Equipment>>;

    /// Any equipment ever created, removed ones included
    async fn equipment_get(&self, id: i32) -> AppResult<Equipment>;

    async fn equipment_create(&self, data: &CreateEquipment) -> AppResult<Equipment>;

    async fn equipment_update(&self, id: i32, data: &UpdateEquipment) -> AppResult<Equipment>;

    /// Soft delete; refused while units are reserved
    async fn equipment_remove(&self, id: i32) -> AppResult<Equipment>;

    /// Validate, price and persist a new pending request, reserving its units
    async fn requests_create(&self, draft: RequestDraft) -> AppResult<RentalRequest>;

    /// Apply a lifecycle event, returning the request and its equipment afterwards
    async fn requests_apply(
        &self,
        id: i32,
        command: RequestCommand,
    ) -> AppResult<(RentalRequest, Equipment)>;

    async fn requests_get(&self, id: i32) -> AppResult<RentalRequest>;

    async fn requests_list(&self) -> AppResult<Vec<RentalRequest>>;

    async fn requests_list_for_borrower(&self, borrower: &str) -> AppResult<Vec<RentalRequest>>;

    /// Reserved units against outstanding request quantities, per equipment
    async fn reservation_audit(&self) -> AppResult<Vec<ReservationAudit>>;
}

/// Shared handle on the configured backend
pub type Repository = Arc<dyn RentalStore>;
