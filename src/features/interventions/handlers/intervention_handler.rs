use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::{AppPath, AppQuery};
use crate::features::auth::guards::{
    CreateInterventions, EditInterventions, Require, ViewInterventions,
};
use crate::features::interventions::dtos::{
    AssignmentHistoryQuery, AssignmentResponseDto, InterventionDetailResponseDto,
    InterventionFormDto, InterventionInput, InterventionResponseDto, InterventionSavedResponseDto,
};
use crate::features::interventions::services::InterventionService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// Create an intervention
///
/// Accepts multipart/form-data. The optional `affectations` field carries the
/// crew as JSON; if it cannot be applied the intervention is still created and
/// `assignment_sync_error` explains why.
#[utoipa::path(
    post,
    path = "/api/interventions",
    tag = "interventions",
    request_body(
        content = InterventionFormDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 201, description = "Intervention created", body = ApiResponse<InterventionSavedResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Role not allowed to create interventions"),
        (status = 404, description = "Job site not found"),
        (status = 413, description = "Request body too large")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_intervention(
    Require(user, ..): Require<CreateInterventions>,
    State(service): State<Arc<InterventionService>>,
    input: InterventionInput,
) -> Result<(StatusCode, Json<ApiResponse<InterventionSavedResponseDto>>)> {
    let saved = service.create(input, &user.sub).await?;
    let message = match &saved.assignment_sync_error {
        Some(_) => "Intervention created, crew not updated",
        None => "Intervention created",
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(saved.into()),
            Some(message.to_string()),
            None,
        )),
    ))
}

/// Update an intervention
///
/// Replaces the editable fields, recomputes the status and appends any
/// uploaded attachments. Omitting `affectations` leaves the crew unchanged;
/// `[]` releases everyone.
#[utoipa::path(
    put,
    path = "/api/interventions/{id}",
    tag = "interventions",
    params(
        ("id" = Uuid, Path, description = "Intervention ID")
    ),
    request_body(
        content = InterventionFormDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 200, description = "Intervention updated", body = ApiResponse<InterventionSavedResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Role not allowed to update interventions"),
        (status = 404, description = "Intervention or job site not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_intervention(
    Require(user, ..): Require<EditInterventions>,
    State(service): State<Arc<InterventionService>>,
    AppPath(id): AppPath<Uuid>,
    input: InterventionInput,
) -> Result<Json<ApiResponse<InterventionSavedResponseDto>>> {
    let saved = service.update(id, input, &user.sub).await?;
    let message = match &saved.assignment_sync_error {
        Some(_) => "Intervention updated, crew not updated",
        None => "Intervention updated",
    };

    Ok(Json(ApiResponse::success(
        Some(saved.into()),
        Some(message.to_string()),
        None,
    )))
}

/// Get intervention by ID with its active crew and attachments
#[utoipa::path(
    get,
    path = "/api/interventions/{id}",
    tag = "interventions",
    params(
        ("id" = Uuid, Path, description = "Intervention ID")
    ),
    responses(
        (status = 200, description = "Intervention found", body = ApiResponse<InterventionDetailResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Intervention not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_intervention(
    _guard: Require<ViewInterventions>,
    State(service): State<Arc<InterventionService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<InterventionDetailResponseDto>>> {
    let detail = service.get_detail(id).await?;
    Ok(Json(ApiResponse::success(Some(detail.into()), None, None)))
}

/// List the assignments of an intervention
#[utoipa::path(
    get,
    path = "/api/interventions/{id}/affectations",
    tag = "interventions",
    params(
        ("id" = Uuid, Path, description = "Intervention ID"),
        AssignmentHistoryQuery
    ),
    responses(
        (status = 200, description = "Assignments of the intervention", body = ApiResponse<Vec<AssignmentResponseDto>>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Intervention not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_assignments(
    _guard: Require<ViewInterventions>,
    State(service): State<Arc<InterventionService>>,
    AppPath(id): AppPath<Uuid>,
    AppQuery(query): AppQuery<AssignmentHistoryQuery>,
) -> Result<Json<ApiResponse<Vec<AssignmentResponseDto>>>> {
    let assignments = service
        .list_assignments(id, query.include_inactive)
        .await?;
    let dtos: Vec<AssignmentResponseDto> = assignments.into_iter().map(|a| a.into()).collect();
    Ok(Json(ApiResponse::success(Some(dtos), None, None)))
}

/// List interventions of a job site
#[utoipa::path(
    get,
    path = "/api/chantiers/{chantier_id}/interventions",
    tag = "interventions",
    params(
        ("chantier_id" = Uuid, Path, description = "Job site ID"),
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Paginated interventions", body = ApiResponse<Vec<InterventionResponseDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_chantier_interventions(
    _guard: Require<ViewInterventions>,
    State(service): State<Arc<InterventionService>>,
    AppPath(chantier_id): AppPath<Uuid>,
    AppQuery(pagination): AppQuery<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<InterventionResponseDto>>>> {
    let (interventions, total) = service
        .list_by_chantier(chantier_id, pagination.offset(), pagination.limit())
        .await?;
    let dtos: Vec<InterventionResponseDto> = interventions.into_iter().map(|i| i.into()).collect();

    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta { total }),
    )))
}
