use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::interventions::handlers::{
    create_intervention, get_intervention, list_assignments, list_chantier_interventions,
    update_intervention,
};
use crate::features::interventions::services::InterventionService;

/// Create routes for the interventions feature
pub fn routes(service: Arc<InterventionService>) -> Router {
    Router::new()
        .route("/api/interventions", post(create_intervention))
        .route(
            "/api/interventions/{id}",
            get(get_intervention).put(update_intervention),
        )
        .route("/api/interventions/{id}/affectations", get(list_assignments))
        .route(
            "/api/chantiers/{chantier_id}/interventions",
            get(list_chantier_interventions),
        )
        .with_state(service)
}
