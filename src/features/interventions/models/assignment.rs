use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Role a worker holds on an intervention crew
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "assignment_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssignmentRole {
    /// Crew lead
    #[serde(alias = "CHEF_EQUIPE")]
    ChefEquipe,
    /// Laborer
    #[serde(alias = "OUVRIER")]
    Ouvrier,
}

impl std::fmt::Display for AssignmentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignmentRole::ChefEquipe => write!(f, "chef_equipe"),
            AssignmentRole::Ouvrier => write!(f, "ouvrier"),
        }
    }
}

/// Database model for a crew assignment (affectation).
///
/// Rows are never deleted: a worker leaving the crew flips `active` to false.
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)]
pub struct Assignment {
    pub id: Uuid,
    pub intervention_id: Uuid,
    pub worker_id: Uuid,
    pub role: AssignmentRole,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
