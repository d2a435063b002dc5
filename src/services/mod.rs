//! Business logic services

pub mod inventory;
pub mod requests;
pub mod stats;

use crate::repository::Repository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub inventory: inventory::InventoryService,
    pub requests: requests::RequestService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services on top of the given store
    pub fn new(repository: Repository) -> Self {
        Self {
            inventory: inventory::InventoryService::new(repository.clone()),
            requests: requests::RequestService::new(repository.clone()),
            stats: stats::StatsService::new(repository),
        }
    }
}
