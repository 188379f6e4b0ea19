use std::sync::Arc;

use chrono::Utc;
use sqlx::{Connection, PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::database::map_constraint_error;
use crate::core::error::{AppError, Result};
use crate::features::interventions::affectations::{parse_affectations, AssignmentSyncError};
use crate::features::interventions::dtos::{extension_for, InterventionInput, UploadedFile};
use crate::features::interventions::models::{
    Assignment, Intervention, InterventionDocument, InterventionStatus,
};
use crate::features::interventions::reconciler::{
    reconcile, AssignmentPeriod, ReconciliationPlan, SubmittedAssignment,
};
use crate::features::interventions::status::derive_status;
use crate::modules::storage::ObjectStorage;

/// Intervention with its active crew and attachments
#[derive(Debug, Clone)]
pub struct InterventionDetail {
    pub intervention: Intervention,
    pub assignments: Vec<Assignment>,
    pub documents: Vec<InterventionDocument>,
}

/// Number of assignment rows written by one synchronization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignmentChanges {
    pub deactivated: usize,
    pub updated: usize,
    pub created: usize,
}

impl From<&ReconciliationPlan> for AssignmentChanges {
    fn from(plan: &ReconciliationPlan) -> Self {
        Self {
            deactivated: plan.to_deactivate.len(),
            updated: plan.to_update.len(),
            created: plan.to_create.len(),
        }
    }
}

/// Outcome of a create or update
#[derive(Debug, Clone)]
pub struct InterventionSaved {
    pub detail: InterventionDetail,
    /// `None` when no crew list was submitted or it could not be applied
    pub assignment_changes: Option<AssignmentChanges>,
    pub assignment_sync_error: Option<AssignmentSyncError>,
}

type SubmittedCrew = Option<std::result::Result<Vec<SubmittedAssignment>, AssignmentSyncError>>;

/// Service for intervention operations
pub struct InterventionService {
    pool: PgPool,
    storage: Arc<dyn ObjectStorage>,
}

impl InterventionService {
    pub fn new(pool: PgPool, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { pool, storage }
    }

    /// Create an intervention with its crew and attachments
    pub async fn create(&self, input: InterventionInput, uploaded_by: &str) -> Result<InterventionSaved> {
        let mut uploaded_keys = Vec::new();
        let result = self
            .create_in_transaction(input, uploaded_by, &mut uploaded_keys)
            .await;

        if result.is_err() {
            self.discard_uploads(&uploaded_keys).await;
        }
        result
    }

    /// Update an intervention, resynchronize its crew and append attachments
    pub async fn update(
        &self,
        id: Uuid,
        input: InterventionInput,
        uploaded_by: &str,
    ) -> Result<InterventionSaved> {
        let mut uploaded_keys = Vec::new();
        let result = self
            .update_in_transaction(id, input, uploaded_by, &mut uploaded_keys)
            .await;

        if result.is_err() {
            self.discard_uploads(&uploaded_keys).await;
        }
        result
    }

    /// Get an intervention with its active crew and attachments
    pub async fn get_detail(&self, id: Uuid) -> Result<InterventionDetail> {
        let mut conn = self.pool.acquire().await?;
        let intervention = Self::find(&mut conn, id).await?;
        Self::load_detail(&mut conn, intervention).await
    }

    /// Assignment history of an intervention, oldest first
    pub async fn list_assignments(&self, id: Uuid, include_inactive: bool) -> Result<Vec<Assignment>> {
        let mut conn = self.pool.acquire().await?;
        Self::find(&mut conn, id).await?;

        let assignments = sqlx::query_as::<_, Assignment>(
            r#"
            SELECT * FROM assignments
            WHERE intervention_id = $1 AND ($2 OR active)
            ORDER BY created_at, id
            "#,
        )
        .bind(id)
        .bind(include_inactive)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list assignments: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(assignments)
    }

    /// Interventions of a job site, most recent first
    pub async fn list_by_chantier(
        &self,
        chantier_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Intervention>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM interventions WHERE chantier_id = $1")
                .bind(chantier_id)
                .fetch_one(&self.pool)
                .await?;

        let interventions = sqlx::query_as::<_, Intervention>(
            r#"
            SELECT * FROM interventions
            WHERE chantier_id = $1
            ORDER BY created_at DESC, id
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(chantier_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list interventions: {:?}", e);
            AppError::Database(e)
        })?;

        Ok((interventions, total))
    }

    async fn create_in_transaction(
        &self,
        input: InterventionInput,
        uploaded_by: &str,
        uploaded_keys: &mut Vec<String>,
    ) -> Result<InterventionSaved> {
        let crew = input.affectations.as_deref().map(parse_affectations);
        let status = derive_status(input.planned_start.is_some(), InterventionStatus::Awaiting);

        let mut tx = self.pool.begin().await?;

        let intervention = sqlx::query_as::<_, Intervention>(
            r#"
            INSERT INTO interventions (title, description, planned_start, planned_end, status, chantier_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.planned_start)
        .bind(input.planned_end)
        .bind(status)
        .bind(input.chantier_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint_error(e, "Failed to create intervention"))?;

        // A new intervention has no assignments: the plan only creates
        let (assignment_changes, assignment_sync_error) =
            Self::sync_assignments(&mut tx, &intervention, crew).await;

        self.store_attachments(
            &mut tx,
            intervention.id,
            &input.attachments,
            uploaded_by,
            uploaded_keys,
        )
        .await?;

        let detail = Self::load_detail(&mut tx, intervention).await?;
        tx.commit().await?;

        info!(
            "Intervention created: id={}, status={}, attachments={}",
            detail.intervention.id,
            detail.intervention.status,
            detail.documents.len()
        );

        Ok(InterventionSaved {
            detail,
            assignment_changes,
            assignment_sync_error,
        })
    }

    async fn update_in_transaction(
        &self,
        id: Uuid,
        input: InterventionInput,
        uploaded_by: &str,
        uploaded_keys: &mut Vec<String>,
    ) -> Result<InterventionSaved> {
        let crew = input.affectations.as_deref().map(parse_affectations);

        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Intervention>(
            "SELECT * FROM interventions WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Intervention {} not found", id)))?;

        let status = derive_status(input.planned_start.is_some(), current.status);

        let intervention = sqlx::query_as::<_, Intervention>(
            r#"
            UPDATE interventions
            SET title = $2,
                description = $3,
                planned_start = $4,
                planned_end = $5,
                status = $6,
                chantier_id = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.planned_start)
        .bind(input.planned_end)
        .bind(status)
        .bind(input.chantier_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint_error(e, "Failed to update intervention"))?;

        let (assignment_changes, assignment_sync_error) =
            Self::sync_assignments(&mut tx, &intervention, crew).await;

        self.store_attachments(&mut tx, id, &input.attachments, uploaded_by, uploaded_keys)
            .await?;

        let detail = Self::load_detail(&mut tx, intervention).await?;
        tx.commit().await?;

        info!(
            "Intervention updated: id={}, status {} -> {}",
            id, current.status, detail.intervention.status
        );

        Ok(InterventionSaved {
            detail,
            assignment_changes,
            assignment_sync_error,
        })
    }

    /// Converge the stored crew onto the submitted one.
    ///
    /// Never fails the surrounding transaction: parse and write failures are
    /// returned as an [`AssignmentSyncError`] and the assignment writes are
    /// rolled back to the savepoint.
    async fn sync_assignments(
        tx: &mut Transaction<'_, Postgres>,
        intervention: &Intervention,
        crew: SubmittedCrew,
    ) -> (Option<AssignmentChanges>, Option<AssignmentSyncError>) {
        let submitted = match crew {
            None => {
                debug!("No affectations submitted for {}, crew unchanged", intervention.id);
                return (None, None);
            }
            Some(Err(e)) => {
                warn!("Skipping crew sync for {}: {}", intervention.id, e);
                return (None, Some(e));
            }
            Some(Ok(submitted)) => submitted,
        };

        match Self::apply_in_savepoint(tx, intervention, &submitted).await {
            Ok(changes) => (Some(changes), None),
            Err(e) => {
                tracing::error!("Crew sync failed for {}: {:?}", intervention.id, e);
                let message = match e.as_database_error() {
                    Some(db) => db.message().to_string(),
                    None => e.to_string(),
                };
                (None, Some(AssignmentSyncError::ApplyFailed { message }))
            }
        }
    }

    async fn apply_in_savepoint(
        tx: &mut Transaction<'_, Postgres>,
        intervention: &Intervention,
        submitted: &[SubmittedAssignment],
    ) -> std::result::Result<AssignmentChanges, sqlx::Error> {
        let mut savepoint = Connection::begin(&mut **tx).await?;

        match Self::apply_plan(&mut savepoint, intervention, submitted).await {
            Ok(changes) => {
                savepoint.commit().await?;
                Ok(changes)
            }
            Err(e) => {
                if let Err(rollback) = savepoint.rollback().await {
                    warn!("Failed to roll back crew savepoint: {:?}", rollback);
                }
                Err(e)
            }
        }
    }

    async fn apply_plan(
        conn: &mut PgConnection,
        intervention: &Intervention,
        submitted: &[SubmittedAssignment],
    ) -> std::result::Result<AssignmentChanges, sqlx::Error> {
        let existing = sqlx::query_as::<_, Assignment>(
            "SELECT * FROM assignments WHERE intervention_id = $1 FOR UPDATE",
        )
        .bind(intervention.id)
        .fetch_all(&mut *conn)
        .await?;

        let plan = reconcile(&existing, submitted, AssignmentPeriod::of(intervention));
        if plan.is_empty() {
            return Ok(AssignmentChanges::default());
        }

        // Deactivations first so reactivated or new rows never collide with
        // the one-active-per-worker index
        if !plan.to_deactivate.is_empty() {
            sqlx::query(
                "UPDATE assignments SET active = false, updated_at = NOW() WHERE id = ANY($1)",
            )
            .bind(&plan.to_deactivate)
            .execute(&mut *conn)
            .await?;
        }

        for update in &plan.to_update {
            sqlx::query(
                r#"
                UPDATE assignments
                SET role = $3, start_at = COALESCE($4, start_at), end_at = $5,
                    active = true, updated_at = NOW()
                WHERE id = $1 AND worker_id = $2
                "#,
            )
            .bind(update.assignment_id)
            .bind(update.worker_id)
            .bind(update.role)
            .bind(update.period.start)
            .bind(update.period.end)
            .execute(&mut *conn)
            .await?;
        }

        for new in &plan.to_create {
            sqlx::query(
                r#"
                INSERT INTO assignments (intervention_id, worker_id, role, start_at, end_at, active)
                VALUES ($1, $2, $3, $4, $5, true)
                "#,
            )
            .bind(intervention.id)
            .bind(new.worker_id)
            .bind(new.role)
            .bind(new.period.start_or(Utc::now()))
            .bind(new.period.end)
            .execute(&mut *conn)
            .await?;
        }

        let changes = AssignmentChanges::from(&plan);
        info!(
            "Crew synced for {}: deactivated={}, updated={}, created={}",
            intervention.id, changes.deactivated, changes.updated, changes.created
        );
        Ok(changes)
    }

    /// Upload attachments and record them.
    ///
    /// Keys are pushed to `uploaded_keys` as soon as the object exists so the
    /// caller can remove them if the transaction does not commit.
    async fn store_attachments(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        intervention_id: Uuid,
        attachments: &[UploadedFile],
        uploaded_by: &str,
        uploaded_keys: &mut Vec<String>,
    ) -> Result<()> {
        for file in attachments {
            let path = format!(
                "{}/{}/{}.{}",
                intervention_id,
                file.kind,
                Uuid::new_v4(),
                extension_for(file)
            );
            let file_key = self.storage.key_for(&path);

            self.storage
                .upload(&file_key, file.data.clone(), &file.content_type)
                .await?;
            uploaded_keys.push(file_key.clone());

            let url = self.storage.url_for(&file_key);

            sqlx::query(
                r#"
                INSERT INTO intervention_documents
                    (intervention_id, kind, file_key, url, original_filename, content_type, file_size, uploaded_by)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(intervention_id)
            .bind(file.kind)
            .bind(&file_key)
            .bind(&url)
            .bind(&file.file_name)
            .bind(&file.content_type)
            .bind(file.data.len() as i64)
            .bind(uploaded_by)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_constraint_error(e, "Failed to record attachment"))?;

            debug!("Attachment stored: key={}, size={}", file_key, file.data.len());
        }

        Ok(())
    }

    async fn discard_uploads(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.storage.delete(key).await {
                warn!("Failed to remove orphaned upload {}: {}", key, e);
            }
        }
    }

    async fn find(conn: &mut PgConnection, id: Uuid) -> Result<Intervention> {
        sqlx::query_as::<_, Intervention>("SELECT * FROM interventions WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Intervention {} not found", id)))
    }

    async fn load_detail(
        conn: &mut PgConnection,
        intervention: Intervention,
    ) -> Result<InterventionDetail> {
        let assignments = sqlx::query_as::<_, Assignment>(
            r#"
            SELECT * FROM assignments
            WHERE intervention_id = $1 AND active
            ORDER BY created_at, id
            "#,
        )
        .bind(intervention.id)
        .fetch_all(&mut *conn)
        .await?;

        let documents = sqlx::query_as::<_, InterventionDocument>(
            r#"
            SELECT * FROM intervention_documents
            WHERE intervention_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(intervention.id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(InterventionDetail {
            intervention,
            assignments,
            documents,
        })
    }
}
