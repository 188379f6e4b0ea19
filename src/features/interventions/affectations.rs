//! Wire format of the `affectations` form field.
//!
//! Clients send the crew as a JSON array of
//! `{ "salarieId": "<uuid>", "role": "chef_equipe" | "ouvrier", "dateDebut": ..., "dateFin": ... }`.
//! Per-entry dates are accepted but ignored: assignments take their
//! intervention's dates.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::interventions::models::AssignmentRole;
use crate::features::interventions::reconciler::SubmittedAssignment;

/// Why crew synchronization was skipped or abandoned.
///
/// Never fails the request: it is returned next to the saved intervention.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssignmentSyncError {
    #[error("affectations payload is malformed: {message}")]
    MalformedPayload { message: String },

    #[error("affectations entry {index} has an invalid salarieId {value:?}")]
    InvalidWorkerId { index: usize, value: String },

    #[error("failed to apply assignment changes: {message}")]
    ApplyFailed { message: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AffectationEntry {
    #[serde(default)]
    salarie_id: Option<String>,
    role: AssignmentRole,
}

/// Parse the raw `affectations` JSON into a crew list.
///
/// The payload is accepted or rejected as a whole. An entry with a missing or
/// blank `salarieId` is kept with no worker so reconciliation can skip it;
/// a non-blank id that is not a UUID rejects the payload.
pub fn parse_affectations(raw: &str) -> Result<Vec<SubmittedAssignment>, AssignmentSyncError> {
    let entries: Vec<AffectationEntry> =
        serde_json::from_str(raw).map_err(|e| AssignmentSyncError::MalformedPayload {
            message: e.to_string(),
        })?;

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let worker_id = match entry.salarie_id.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(value) => Some(Uuid::parse_str(value).map_err(|_| {
                    AssignmentSyncError::InvalidWorkerId {
                        index,
                        value: value.to_string(),
                    }
                })?),
            };
            Ok(SubmittedAssignment {
                worker_id,
                role: entry.role,
            })
        })
        .collect()
}
