use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::features::interventions::affectations::AssignmentSyncError;
use crate::features::interventions::models::{
    Assignment, AssignmentRole, DocumentKind, Intervention, InterventionDocument,
    InterventionStatus,
};
use crate::features::interventions::services::{AssignmentChanges, InterventionDetail, InterventionSaved};

/// Response DTO for intervention
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InterventionResponseDto {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub planned_start: Option<DateTime<Utc>>,
    pub planned_end: Option<DateTime<Utc>>,
    pub status: InterventionStatus,
    pub chantier_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Intervention> for InterventionResponseDto {
    fn from(i: Intervention) -> Self {
        Self {
            id: i.id,
            title: i.title,
            description: i.description,
            planned_start: i.planned_start,
            planned_end: i.planned_end,
            status: i.status,
            chantier_id: i.chantier_id,
            created_at: i.created_at,
            updated_at: i.updated_at,
        }
    }
}

/// Response DTO for crew assignment
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignmentResponseDto {
    pub id: Uuid,
    pub worker_id: Uuid,
    pub role: AssignmentRole,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub active: bool,
}

impl From<Assignment> for AssignmentResponseDto {
    fn from(a: Assignment) -> Self {
        Self {
            id: a.id,
            worker_id: a.worker_id,
            role: a.role,
            start_at: a.start_at,
            end_at: a.end_at,
            active: a.active,
        }
    }
}

/// Response DTO for intervention attachment
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponseDto {
    pub id: Uuid,
    pub kind: DocumentKind,
    pub original_filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl From<InterventionDocument> for DocumentResponseDto {
    fn from(d: InterventionDocument) -> Self {
        Self {
            id: d.id,
            kind: d.kind,
            original_filename: d.original_filename,
            content_type: d.content_type,
            file_size: d.file_size,
            url: d.url,
            created_at: d.created_at,
        }
    }
}

/// Intervention with its active crew and attachments
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InterventionDetailResponseDto {
    #[serde(flatten)]
    pub intervention: InterventionResponseDto,
    pub assignments: Vec<AssignmentResponseDto>,
    pub documents: Vec<DocumentResponseDto>,
}

impl From<InterventionDetail> for InterventionDetailResponseDto {
    fn from(d: InterventionDetail) -> Self {
        Self {
            intervention: d.intervention.into(),
            assignments: d.assignments.into_iter().map(Into::into).collect(),
            documents: d.documents.into_iter().map(Into::into).collect(),
        }
    }
}

/// Counts of crew writes applied by a create or update
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct AssignmentChangesDto {
    pub deactivated: usize,
    pub updated: usize,
    pub created: usize,
}

impl From<AssignmentChanges> for AssignmentChangesDto {
    fn from(c: AssignmentChanges) -> Self {
        Self {
            deactivated: c.deactivated,
            updated: c.updated,
            created: c.created,
        }
    }
}

/// Result of a create or update.
///
/// `assignment_sync_error` is set when the crew list could not be applied;
/// the intervention itself was saved regardless.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InterventionSavedResponseDto {
    pub intervention: InterventionDetailResponseDto,
    pub assignment_changes: Option<AssignmentChangesDto>,
    pub assignment_sync_error: Option<AssignmentSyncError>,
}

impl From<InterventionSaved> for InterventionSavedResponseDto {
    fn from(s: InterventionSaved) -> Self {
        Self {
            intervention: s.detail.into(),
            assignment_changes: s.assignment_changes.map(Into::into),
            assignment_sync_error: s.assignment_sync_error,
        }
    }
}

/// Query parameters for assignment history
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AssignmentHistoryQuery {
    /// Include deactivated assignments (default: false)
    #[serde(default)]
    pub include_inactive: bool,
}
