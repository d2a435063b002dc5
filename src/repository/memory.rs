//! In-process storage backend

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicI32, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use super::RentalStore;
use crate::{
    error::{AppError, AppResult},
    models::{
        equipment::{CreateEquipment, Equipment, UpdateEquipment},
        request::{RentalRequest, RequestCommand, RequestDraft},
        stats::ReservationAudit,
    },
};

/// One equipment item with every request that references it.
///
/// Reservations and the requests holding them only change together, under
/// the shard's own lock.
#[derive(Debug)]
struct Shard {
    equipment: Equipment,
    requests: BTreeMap<i32, RentalRequest>,
}

impl Shard {
    fn outstanding(&self) -> i32 {
        self.requests
            .values()
            .filter(|r| r.status.holds_stock())
            .map(|r| r.quantity)
            .sum()
    }
}

/// Memory-backed store with per-equipment locking
#[derive(Debug)]
pub struct MemoryStore {
    shards: RwLock<BTreeMap<i32, Arc<Mutex<Shard>>>>,
    /// Request id to equipment id
    owners: RwLock<HashMap<i32, i32>>,
    next_equipment_id: AtomicI32,
    next_request_id: AtomicI32,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            shards: RwLock::new(BTreeMap::new()),
            owners: RwLock::new(HashMap::new()),
            next_equipment_id: AtomicI32::new(1),
            next_request_id: AtomicI32::new(1),
        }
    }

    async fn shard(&self, equipment_id: i32) -> AppResult<Arc<Mutex<Shard>>> {
        self.shards
            .read()
            .await
            .get(&equipment_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", equipment_id)))
    }

    async fn all_shards(&self) -> Vec<Arc<Mutex<Shard>>> {
        self.shards.read().await.values().cloned().collect()
    }

    async fn owner_of(&self, request_id: i32) -> AppResult<i32> {
        self.owners
            .read()
            .await
            .get(&request_id)
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", request_id)))
    }

    async fn collect_requests<F>(&self, keep: F) -> Vec<RentalRequest>
    where
        F: Fn(&RentalRequest) -> bool,
    {
        let mut requests = Vec::new();
        for shard in self.all_shards().await {
            let shard = shard.lock().await;
            requests.extend(shard.requests.values().filter(|&r| keep(r)).cloned());
        }
        requests.sort_by_key(|r| r.id);
        requests
    }
}

fn not_found(equipment_id: i32) -> AppError {
    AppError::NotFound(format!("Equipment {} not found", equipment_id))
}

#[async_trait]
impl RentalStore for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn equipment_list(&self) -> AppResult<Vec<Equipment>> {
        let mut equipment = Vec::new();
        for shard in self.all_shards().await {
            let shard = shard.lock().await;
            if !shard.equipment.is_removed() {
                equipment.push(shard.equipment.clone());
            }
        }
        Ok(equipment)
    }

    async fn equipment_get(&self, id: i32) -> AppResult<Equipment> {
        let shard = self.shard(id).await?;
        let shard = shard.lock().await;
        Ok(shard.equipment.clone())
    }

    async fn equipment_create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        data.validate()?;
        let mut shards = self.shards.write().await;
        let id = self.next_equipment_id.fetch_add(1, Ordering::SeqCst);
        let equipment = Equipment::new(id, data, Utc::now());
        shards.insert(
            id,
            Arc::new(Mutex::new(Shard {
                equipment: equipment.clone(),
                requests: BTreeMap::new(),
            })),
        );
        Ok(equipment)
    }

    async fn equipment_update(&self, id: i32, data: &UpdateEquipment) -> AppResult<Equipment> {
        let shard = self.shard(id).await?;
        let mut shard = shard.lock().await;
        if shard.equipment.is_removed() {
            return Err(not_found(id));
        }
        let mut equipment = shard.equipment.clone();
        equipment.apply_update(data, Utc::now())?;
        shard.equipment = equipment.clone();
        Ok(equipment)
    }

    async fn equipment_remove(&self, id: i32) -> AppResult<Equipment> {
        let shard = self.shard(id).await?;
        let mut shard = shard.lock().await;
        if shard.equipment.is_removed() {
            return Err(not_found(id));
        }
        let mut equipment = shard.equipment.clone();
        equipment.mark_removed(Utc::now())?;
        shard.equipment = equipment.clone();
        Ok(equipment)
    }

    async fn requests_create(&self, draft: RequestDraft) -> AppResult<RentalRequest> {
        let equipment_id = draft.equipment_id;
        let shard = self.shard(equipment_id).await?;
        let mut shard = shard.lock().await;
        if shard.equipment.is_removed() {
            return Err(not_found(equipment_id));
        }

        let mut equipment = shard.equipment.clone();
        let admitted = draft.admit(&mut equipment)?;
        let id = self.next_request_id.fetch_add(1, Ordering::SeqCst);
        let request = admitted.into_request(id);

        // owners first: a request visible in the shard must resolve by id
        self.owners.write().await.insert(id, equipment_id);
        shard.equipment = equipment;
        shard.requests.insert(id, request.clone());
        Ok(request)
    }

    async fn requests_apply(
        &self,
        id: i32,
        command: RequestCommand,
    ) -> AppResult<(RentalRequest, Equipment)> {
        let equipment_id = self.owner_of(id).await?;
        let shard = self.shard(equipment_id).await?;
        let mut shard = shard.lock().await;

        let mut request = shard
            .requests
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))?;
        let mut equipment = shard.equipment.clone();
        request.apply(&command, &mut equipment, Utc::now())?;

        shard.equipment = equipment.clone();
        shard.requests.insert(id, request.clone());
        Ok((request, equipment))
    }

    async fn requests_get(&self, id: i32) -> AppResult<RentalRequest> {
        let equipment_id = self.owner_of(id).await?;
        let shard = self.shard(equipment_id).await?;
        let shard = shard.lock().await;
        shard
            .requests
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))
    }

    async fn requests_list(&self) -> AppResult<Vec<RentalRequest>> {
        Ok(self.collect_requests(|_| true).await)
    }

    async fn requests_list_for_borrower(&self, borrower: &str) -> AppResult<Vec<RentalRequest>> {
        Ok(self.collect_requests(|r| r.borrower == borrower).await)
    }

    async fn reservation_audit(&self) -> AppResult<Vec<ReservationAudit>> {
        let mut rows = Vec::new();
        for shard in self.all_shards().await {
            let shard = shard.lock().await;
            rows.push(ReservationAudit {
                equipment_id: shard.equipment.id,
                quantity: shard.equipment.quantity,
                reserved: shard.equipment.reserved,
                outstanding: shard.outstanding(),
            });
        }
        Ok(rows)
    }
}
