use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::interventions::{
    affectations::AssignmentSyncError, dtos as interventions_dtos,
    handlers as interventions_handlers, models as interventions_models,
};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Interventions
        interventions_handlers::create_intervention,
        interventions_handlers::update_intervention,
        interventions_handlers::get_intervention,
        interventions_handlers::list_assignments,
        interventions_handlers::list_chantier_interventions,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Interventions
            interventions_models::InterventionStatus,
            interventions_models::AssignmentRole,
            interventions_models::DocumentKind,
            AssignmentSyncError,
            interventions_dtos::InterventionFormDto,
            interventions_dtos::AssignmentChangesDto,
            ApiResponse<interventions_dtos::InterventionSavedResponseDto>,
            ApiResponse<interventions_dtos::InterventionDetailResponseDto>,
            ApiResponse<Vec<interventions_dtos::InterventionResponseDto>>,
            ApiResponse<Vec<interventions_dtos::AssignmentResponseDto>>,
        )
    ),
    tags(
        (name = "interventions", description = "Job site interventions and crew assignments"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Chantier API",
        version = "0.1.0",
        description = "API documentation for job site interventions",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
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

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
