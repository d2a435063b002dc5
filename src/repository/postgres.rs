//! Postgres storage backend

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgConnection, Pool, Postgres};

use super::RentalStore;
use crate::{
    error::{AppError, AppResult},
    models::{
        equipment::{CreateEquipment, Equipment, UpdateEquipment},
        request::{RentalRequest, RequestCommand, RequestDraft},
        stats::ReservationAudit,
    },
};

/// Postgres-backed store.
///
/// Each unit of work runs in one transaction holding a row lock on the
/// equipment involved, then on the request. Rows are always locked in that
/// order.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Lock an equipment row for the rest of the transaction
    async fn lock_equipment(conn: &mut PgConnection, id: i32) -> AppResult<Equipment> {
        sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Lock an equipment row that must still be in the catalog
    async fn lock_listed_equipment(conn: &mut PgConnection, id: i32) -> AppResult<Equipment> {
        let equipment = Self::lock_equipment(conn, id).await?;
        if equipment.is_removed() {
            return Err(AppError::NotFound(format!("Equipment {} not found", id)));
        }
        Ok(equipment)
    }

    async fn save_equipment(conn: &mut PgConnection, equipment: &Equipment) -> AppResult<Equipment> {
        let row = sqlx::query_as::<_, Equipment>(
            r#"
            UPDATE equipment
            SET name = $2, quantity = $3, reserved = $4, daily_price = $5,
                updated_at = $6, removed_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(equipment.id)
        .bind(&equipment.name)
        .bind(equipment.quantity)
        .bind(equipment.reserved)
        .bind(equipment.daily_price)
        .bind(equipment.updated_at)
        .bind(equipment.removed_at)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl RentalStore for PgStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn equipment_list(&self) -> AppResult<Vec<Equipment>> {
        let rows = sqlx::query_as::<_, Equipment>(
            "SELECT * FROM equipment WHERE removed_at IS NULL ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn equipment_get(&self, id: i32) -> AppResult<Equipment> {
        sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    async fn equipment_create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        data.validate()?;
        let now = Utc::now();
        let row = sqlx::query_as::<_, Equipment>(
            r#"
            INSERT INTO equipment (name, quantity, reserved, daily_price, created_at, updated_at)
            VALUES ($1, $2, 0, $3, $4, $4)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(data.quantity)
        .bind(data.daily_price)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn equipment_update(&self, id: i32, data: &UpdateEquipment) -> AppResult<Equipment> {
        let mut tx = self.pool.begin().await?;
        let mut equipment = Self::lock_listed_equipment(&mut tx, id).await?;
        equipment.apply_update(data, Utc::now())?;
        let row = Self::save_equipment(&mut tx, &equipment).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn equipment_remove(&self, id: i32) -> AppResult<Equipment> {
        let mut tx = self.pool.begin().await?;
        let mut equipment = Self::lock_listed_equipment(&mut tx, id).await?;
        equipment.mark_removed(Utc::now())?;
        let row = Self::save_equipment(&mut tx, &equipment).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn requests_create(&self, draft: RequestDraft) -> AppResult<RentalRequest> {
        let mut tx = self.pool.begin().await?;
        let mut equipment = Self::lock_listed_equipment(&mut tx, draft.equipment_id).await?;
        let admitted = draft.admit(&mut equipment)?;

        Self::save_equipment(&mut tx, &equipment).await?;
        let request = sqlx::query_as::<_, RentalRequest>(
            r#"
            INSERT INTO rental_requests (
                equipment_id, borrower, quantity, duration_days, total_price,
                status, requested_at, due_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7, $6)
            RETURNING *
            "#,
        )
        .bind(admitted.equipment_id)
        .bind(&admitted.borrower)
        .bind(admitted.quantity)
        .bind(admitted.duration_days)
        .bind(admitted.total_price)
        .bind(admitted.requested_at)
        .bind(admitted.due_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(request)
    }

    async fn requests_apply(
        &self,
        id: i32,
        command: RequestCommand,
    ) -> AppResult<(RentalRequest, Equipment)> {
        // equipment_id never changes, so it can be read before taking locks
        let equipment_id: i32 =
            sqlx::query_scalar("SELECT equipment_id FROM rental_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))?;

        let mut tx = self.pool.begin().await?;
        let mut equipment = Self::lock_equipment(&mut tx, equipment_id).await?;
        let mut request = sqlx::query_as::<_, RentalRequest>(
            "SELECT * FROM rental_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let transition = request.apply(&command, &mut equipment, Utc::now())?;
        if transition.releases_stock {
            equipment = Self::save_equipment(&mut tx, &equipment).await?;
        }
        let request = sqlx::query_as::<_, RentalRequest>(
            r#"
            UPDATE rental_requests
            SET status = $2, admin_comment = $3, updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(request.id)
        .bind(request.status)
        .bind(&request.admin_comment)
        .bind(request.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((request, equipment))
    }

    async fn requests_get(&self, id: i32) -> AppResult<RentalRequest> {
        sqlx::query_as::<_, RentalRequest>("SELECT * FROM rental_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))
    }

    async fn requests_list(&self) -> AppResult<Vec<RentalRequest>> {
        let rows = sqlx::query_as::<_, RentalRequest>("SELECT * FROM rental_requests ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn requests_list_for_borrower(&self, borrower: &str) -> AppResult<Vec<RentalRequest>> {
        let rows = sqlx::query_as::<_, RentalRequest>(
            "SELECT * FROM rental_requests WHERE borrower = $1 ORDER BY id",
        )
        .bind(borrower)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn reservation_audit(&self) -> AppResult<Vec<ReservationAudit>> {
        let rows = sqlx::query_as::<_, ReservationAudit>(
            r#"
            SELECT e.id AS equipment_id, e.quantity, e.reserved,
                   COALESCE(SUM(r.quantity) FILTER (
                       WHERE r.status IN ('pending', 'approved', 'return_requested')
                   ), 0)::INTEGER AS outstanding
            FROM equipment e
            LEFT JOIN rental_requests r ON r.equipment_id = e.id
            GROUP BY e.id
            ORDER BY e.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
