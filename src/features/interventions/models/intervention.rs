use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Intervention lifecycle status matching the `intervention_status` database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "intervention_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InterventionStatus {
    Awaiting,
    Planned,
    InProgress,
    Done,
    Cancelled,
    Diagnosing,
}

impl std::fmt::Display for InterventionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterventionStatus::Awaiting => write!(f, "awaiting"),
            InterventionStatus::Planned => write!(f, "planned"),
            InterventionStatus::InProgress => write!(f, "in_progress"),
            InterventionStatus::Done => write!(f, "done"),
            InterventionStatus::Cancelled => write!(f, "cancelled"),
            InterventionStatus::Diagnosing => write!(f, "diagnosing"),
        }
    }
}

/// Database model for intervention
#[derive(Debug, Clone, FromRow)]
pub struct Intervention {
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
