//! Inventory ledger service

use crate::{
    error::{AppError, AppResult},
    models::{
        account::Actor,
        equipment::{CreateEquipment, Equipment, UpdateEquipment},
    },
    repository::Repository,
};

/// Catalog of equipment and its available-vs-reserved unit counts.
///
/// Reservations are only ever taken or released by the request engine;
/// this service exposes the admin edits and the reads.
#[derive(Clone)]
pub struct InventoryService {
    repository: Repository,
}

impl InventoryService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Whether the store answers, for readiness probes
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await.inspect_err(AppError::log)
    }

    /// Equipment currently in the catalog
    pub async fn list(&self) -> AppResult<Vec<Equipment>> {
        self.repository
            .equipment_list()
            .await
            .inspect_err(AppError::log)
    }

    /// Equipment by ID, removed items included
    pub async fn get(&self, id: i32) -> AppResult<Equipment> {
        self.repository
            .equipment_get(id)
            .await
            .inspect_err(AppError::log)
    }

    /// Units that can still be requested
    pub async fn available(&self, id: i32) -> AppResult<i32> {
        let equipment = self.get(id).await?;
        if equipment.is_removed() {
            return Err(AppError::NotFound(format!("Equipment {} not found", id)));
        }
        Ok(equipment.available())
    }

    pub async fn create(&self, actor: &Actor, data: &CreateEquipment) -> AppResult<Equipment> {
        actor
            .require_admin("create equipment")
            .inspect_err(AppError::log)?;
        let equipment = self
            .repository
            .equipment_create(data)
            .await
            .inspect_err(AppError::log)?;
        tracing::info!(
            equipment_id = equipment.id,
            quantity = equipment.quantity,
            daily_price = equipment.daily_price,
            "Equipment {} created by {}",
            equipment.name,
            actor.account
        );
        Ok(equipment)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: i32,
        data: &UpdateEquipment,
    ) -> AppResult<Equipment> {
        actor
            .require_admin("update equipment")
            .inspect_err(AppError::log)?;
        let equipment = self
            .repository
            .equipment_update(id, data)
            .await
            .inspect_err(AppError::log)?;
        tracing::info!(
            equipment_id = id,
            quantity = equipment.quantity,
            reserved = equipment.reserved,
            "Equipment updated by {}",
            actor.account
        );
        Ok(equipment)
    }

    pub async fn remove(&self, actor: &Actor, id: i32) -> AppResult<Equipment> {
        actor
            .require_admin("remove equipment")
            .inspect_err(AppError::log)?;
        let equipment = self
            .repository
            .equipment_remove(id)
            .await
            .inspect_err(AppError::log)?;
        tracing::info!(equipment_id = id, "Equipment removed by {}", actor.account);
        Ok(equipment)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::repository::MockRentalStore;

    #[tokio::test]
    async fn borrowers_cannot_edit_the_catalog() {
        // no expectations: touching the store would panic
        let service = InventoryService::new(Arc::new(MockRentalStore::new()));
        let alice = Actor::borrower("alice");
        let data = CreateEquipment {
            name: "Drill".to_string(),
            quantity: 1,
            daily_price: 1,
        };

        assert!(matches!(
            service.create(&alice, &data).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            service.remove(&alice, 1).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn readiness_only_pings_the_store() {
        let mut store = MockRentalStore::new();
        store.expect_ping().times(1).returning(|| Ok(()));
        store.expect_equipment_list().never();

        let service = InventoryService::new(Arc::new(store));
        service.ping().await.unwrap();
    }
}
