//! Equipment model and inventory ledger rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// Equipment record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Equipment {
    pub id: i32,
    /// Display name
    pub name: String,
    /// Number of units owned
    pub quantity: i32,
    /// Units held by pending, approved or return-requested requests
    pub reserved: i32,
    /// Rental price per unit and per day, in minor currency units
    pub daily_price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the equipment was withdrawn from the catalog
    pub removed_at: Option<DateTime<Utc>>,
}

impl Equipment {
    /// Build a fresh catalog entry with nothing reserved
    pub fn new(id: i32, data: &CreateEquipment, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: data.name.clone(),
            quantity: data.quantity,
            reserved: 0,
            daily_price: data.daily_price,
            created_at: now,
            updated_at: now,
            removed_at: None,
        }
    }

    pub fn available(&self) -> i32 {
        self.quantity - self.reserved
    }

    pub fn is_available(&self) -> bool {
        self.available() > 0
    }

    pub fn is_removed(&self) -> bool {
        self.removed_at.is_some()
    }

    /// Hold `qty` units. Fails without side effect when fewer are available.
    pub fn reserve(&mut self, qty: i32) -> AppResult<()> {
        if qty <= 0 {
            return Err(AppError::InvalidInput(format!(
                "Reservation quantity must be positive, got {}",
                qty
            )));
        }
        let available = self.available();
        if qty > available {
            return Err(AppError::InsufficientStock {
                requested: qty,
                available,
            });
        }
        self.reserved += qty;
        Ok(())
    }

    /// Give back `qty` previously reserved units.
    pub fn release(&mut self, qty: i32) -> AppResult<()> {
        if qty <= 0 {
            return Err(AppError::InvalidInput(format!(
                "Release quantity must be positive, got {}",
                qty
            )));
        }
        if qty > self.reserved {
            return Err(AppError::InvariantViolation(format!(
                "Equipment {} cannot release {} units, only {} reserved",
                self.id, qty, self.reserved
            )));
        }
        self.reserved -= qty;
        Ok(())
    }

    /// Overwrite the editable fields, keeping current reservations satisfiable
    pub fn apply_update(&mut self, data: &UpdateEquipment, now: DateTime<Utc>) -> AppResult<()> {
        validate_fields(&data.name, data.quantity, data.daily_price)?;
        if data.quantity < self.reserved {
            return Err(AppError::InvariantViolation(format!(
                "Equipment {} has {} units reserved, quantity cannot drop to {}",
                self.id, self.reserved, data.quantity
            )));
        }
        self.name = data.name.clone();
        self.quantity = data.quantity;
        self.daily_price = data.daily_price;
        self.updated_at = now;
        Ok(())
    }

    /// Withdraw from the catalog. Outstanding reservations block removal.
    pub fn mark_removed(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        if self.reserved > 0 {
            return Err(AppError::InvariantViolation(format!(
                "Equipment {} still has {} units reserved by outstanding requests",
                self.id, self.reserved
            )));
        }
        self.removed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }
}

/// Equipment as shown to callers, with derived availability
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EquipmentDetails {
    pub id: i32,
    pub name: String,
    pub quantity: i32,
    pub reserved: i32,
    /// Units that can still be requested
    pub available: i32,
    pub is_available: bool,
    pub daily_price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub removed_at: Option<DateTime<Utc>>,
}

impl From<Equipment> for EquipmentDetails {
    fn from(e: Equipment) -> Self {
        Self {
            available: e.available(),
            is_available: e.is_available(),
            id: e.id,
            name: e.name,
            quantity: e.quantity,
            reserved: e.reserved,
            daily_price: e.daily_price,
            created_at: e.created_at,
            updated_at: e.updated_at,
            removed_at: e.removed_at,
        }
    }
}

/// Create equipment request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateEquipment {
    pub name: String,
    /// Number of units owned (must be positive)
    pub quantity: i32,
    /// Price per unit and per day, in minor currency units
    pub daily_price: i64,
}

impl CreateEquipment {
    pub fn validate(&self) -> AppResult<()> {
        validate_fields(&self.name, self.quantity, self.daily_price)
    }
}

/// Update equipment request (full overwrite of the editable fields)
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateEquipment {
    pub name: String,
    pub quantity: i32,
    pub daily_price: i64,
}

fn validate_fields(name: &str, quantity: i32, daily_price: i64) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::InvalidInput("Equipment name must not be empty".to_string()));
    }
    if quantity <= 0 {
        return Err(AppError::InvalidInput(format!(
            "Equipment quantity must be positive, got {}",
            quantity
        )));
    }
    if daily_price < 0 {
        return Err(AppError::InvalidInput(format!(
            "Daily price must not be negative, got {}",
            daily_price
        )));
    }
    Ok(())
}
