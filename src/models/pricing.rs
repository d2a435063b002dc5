//! Rental price computation in integer minor units

use chrono::{DateTime, Duration, Utc};

use crate::error::{AppError, AppResult};

/// Total price of renting `quantity` units for `duration_days` days.
///
/// Computed in checked integer arithmetic; a product that does not fit in
/// an `i64` is refused rather than wrapped.
pub fn rental_price(daily_price: i64, quantity: i32, duration_days: i32) -> AppResult<i64> {
    daily_price
        .checked_mul(i64::from(quantity))
        .and_then(|p| p.checked_mul(i64::from(duration_days)))
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "Price of {} units for {} days at {} per day is out of range",
                quantity, duration_days, daily_price
            ))
        })
}

/// Due date of a rental starting at `requested_at`
pub fn due_date(requested_at: DateTime<Utc>, duration_days: i32) -> AppResult<DateTime<Utc>> {
    Duration::try_days(i64::from(duration_days))
        .and_then(|d| requested_at.checked_add_signed(d))
        .ok_or_else(|| {
            AppError::InvalidInput(format!("Duration of {} days is out of range", duration_days))
        })
}
