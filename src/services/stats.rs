//! Dashboard statistics service

use crate::{
    error::{AppError, AppResult},
    models::{
        request::RequestStatus,
        stats::{RentalStats, RequestCounts},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Inventory and request figures for the admin dashboard
    pub async fn summary(&self) -> AppResult<RentalStats> {
        let equipment = self
            .repository
            .equipment_list()
            .await
            .inspect_err(AppError::log)?;
        let requests = self
            .repository
            .requests_list()
            .await
            .inspect_err(AppError::log)?;

        let mut stats = RentalStats {
            equipment: equipment.len() as i64,
            ..Default::default()
        };
        for e in &equipment {
            stats.total_units += i64::from(e.quantity);
            stats.reserved_units += i64::from(e.reserved);
            stats.available_units += i64::from(e.available());
        }

        let mut counts = RequestCounts::default();
        for request in &requests {
            match request.status {
                RequestStatus::Pending => counts.pending += 1,
                RequestStatus::Approved => counts.approved += 1,
                RequestStatus::Rejected => counts.rejected += 1,
                RequestStatus::ReturnRequested => counts.return_requested += 1,
                RequestStatus::Completed => {
                    counts.completed += 1;
                    stats.completed_revenue = stats.completed_revenue.saturating_add(request.total_price);
                }
            }
        }
        stats.requests = counts;

        Ok(stats)
    }
}
