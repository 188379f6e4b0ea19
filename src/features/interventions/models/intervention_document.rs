use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Kind of file attached to an intervention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "document_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Document,
    Photo,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Document => write!(f, "document"),
            DocumentKind::Photo => write!(f, "photo"),
        }
    }
}

/// Database model for a stored intervention attachment
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)]
pub struct InterventionDocument {
    pub id: Uuid,
    pub intervention_id: Uuid,
    pub kind: DocumentKind,
    pub file_key: String,
    pub url: String,
    pub original_filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub uploaded_by: String,
    pub created_at: DateTime<Utc>,
}
