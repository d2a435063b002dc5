//! Data models for Equipool

pub mod account;
pub mod equipment;
pub mod pricing;
pub mod request;
pub mod stats;

// Re-export commonly used types
pub use account::{AccountClaims, Actor, Role};
pub use equipment::{CreateEquipment, Equipment, EquipmentDetails, UpdateEquipment};
pub use request::{RentalRequest, RequestDraft, RequestEvent, RequestStatus};
pub use stats::{RentalStats, ReservationAudit};
