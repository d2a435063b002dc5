//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{equipment, health, requests, stats};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Equipool API",
        version = "0.1.0",
        description = "Shared equipment rental REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Equipment
        equipment::list_equipment,
        equipment::get_equipment,
        equipment::create_equipment,
        equipment::update_equipment,
        equipment::remove_equipment,
        // Requests
        requests::list_requests,
        requests::create_request,
        requests::list_my_requests,
        requests::list_borrower_requests,
        requests::get_request,
        requests::process_request,
        requests::request_return,
        requests::confirm_return,
        // Stats
        stats::get_stats,
        stats::get_audit,
    ),
    components(
        schemas(
            // Equipment
            crate::models::equipment::EquipmentDetails,
            crate::models::equipment::CreateEquipment,
            crate::models::equipment::UpdateEquipment,
            // Requests
            crate::models::request::RentalRequest,
            crate::models::request::RequestStatus,
            crate::models::request::CreateRentalRequest,
            crate::models::request::ProcessRentalRequest,
            crate::models::request::ConfirmReturn,
            // Stats
            crate::models::stats::RentalStats,
            crate::models::stats::RequestCounts,
            crate::models::stats::ReservationAudit,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "equipment", description = "Equipment inventory"),
        (name = "requests", description = "Rental request lifecycle"),
        (name = "stats", description = "Statistics and audit")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by the secured paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
