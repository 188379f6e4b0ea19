//! Crew assignment reconciliation.
//!
//! Given every stored assignment of one intervention and the crew list a
//! client just submitted, [`reconcile`] computes the writes that converge the
//! stored set onto the submitted one. The computation is pure; applying the
//! plan is the service's job.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::features::interventions::models::{Assignment, AssignmentRole, Intervention};

/// One entry of a submitted crew list.
///
/// `worker_id` is `None` when the client sent an empty worker; such entries
/// are ignored by reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedAssignment {
    pub worker_id: Option<Uuid>,
    pub role: AssignmentRole,
}

/// Validity period given to every assignment touched by a plan.
///
/// Assignments follow their intervention's dates, not per-entry input.
/// `start` is `None` for an unscheduled intervention: refreshed assignments
/// then keep their stored start and new ones start when inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentPeriod {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl AssignmentPeriod {
    /// Period of an intervention
    pub fn of(intervention: &Intervention) -> Self {
        Self {
            start: intervention.planned_start,
            end: intervention.planned_end,
        }
    }

    /// Start given to a newly inserted assignment
    pub fn start_or(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.start.unwrap_or(now)
    }
}

/// Refresh of an existing assignment; applying it also forces `active = true`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentUpdate {
    pub assignment_id: Uuid,
    pub worker_id: Uuid,
    pub role: AssignmentRole,
    pub period: AssignmentPeriod,
}

/// Assignment to insert as active
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssignment {
    pub worker_id: Uuid,
    pub role: AssignmentRole,
    pub period: AssignmentPeriod,
}

/// Writes converging stored assignments onto a submitted crew list.
///
/// The three lists never share an assignment id. Nothing here deletes a
/// row: `to_deactivate` only clears the `active` flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub to_deactivate: Vec<Uuid>,
    pub to_update: Vec<AssignmentUpdate>,
    pub to_create: Vec<NewAssignment>,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.to_deactivate.is_empty() && self.to_update.is_empty() && self.to_create.is_empty()
    }
}

/// Plan the assignment writes for one intervention.
///
/// - active assignments whose worker is absent from `submitted` are deactivated
/// - a submitted worker with any stored assignment, active or not, gets that
///   assignment updated (role, period, reactivated)
/// - any other submitted worker gets a new assignment, in submission order
///
/// Entries without a worker id are skipped. When a worker is submitted more
/// than once, the first occurrence fixes its position and the last one its
/// role.
pub fn reconcile(
    existing: &[Assignment],
    submitted: &[SubmittedAssignment],
    period: AssignmentPeriod,
) -> ReconciliationPlan {
    let mut order: Vec<Uuid> = Vec::new();
    let mut roles: HashMap<Uuid, AssignmentRole> = HashMap::new();
    for entry in submitted {
        let Some(worker_id) = entry.worker_id else {
            continue;
        };
        if roles.insert(worker_id, entry.role).is_none() {
            order.push(worker_id);
        } else {
            tracing::warn!("Worker {} submitted more than once, keeping last role", worker_id);
        }
    }
    let submitted_ids: HashSet<Uuid> = order.iter().copied().collect();

    let mut plan = ReconciliationPlan::default();

    for assignment in existing {
        if assignment.active && !submitted_ids.contains(&assignment.worker_id) {
            plan.to_deactivate.push(assignment.id);
        }
    }

    for worker_id in order {
        let role = roles[&worker_id];
        match representative(existing, worker_id) {
            Some(kept) => {
                plan.to_update.push(AssignmentUpdate {
                    assignment_id: kept.id,
                    worker_id,
                    role,
                    period,
                });
                // At most one active row per worker: extra active duplicates go
                plan.to_deactivate.extend(
                    existing
                        .iter()
                        .filter(|a| a.worker_id == worker_id && a.active && a.id != kept.id)
                        .map(|a| a.id),
                );
            }
            None => plan.to_create.push(NewAssignment {
                worker_id,
                role,
                period,
            }),
        }
    }

    plan
}

/// The stored assignment that stands for a worker: the active one if any,
/// else the most recently touched.
fn representative(existing: &[Assignment], worker_id: Uuid) -> Option<&Assignment> {
    existing
        .iter()
        .filter(|a| a.worker_id == worker_id)
        .max_by_key(|a| (a.active, a.updated_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn period() -> AssignmentPeriod {
        AssignmentPeriod {
            start: Some(Utc.with_ymd_and_hms(2025, 3, 10, 7, 30, 0).unwrap()),
            end: Some(Utc.with_ymd_and_hms(2025, 3, 12, 17, 0, 0).unwrap()),
        }
    }

    fn stored(worker_id: Uuid, role: AssignmentRole, active: bool) -> Assignment {
        let now = Utc::now();
        Assignment {
            id: Uuid::new_v4(),
            intervention_id: Uuid::nil(),
            worker_id,
            role,
            start_at: now,
            end_at: None,
            active,
            created_at: now,
            updated_at: now,
        }
    }

    fn submit(worker_id: Uuid, role: AssignmentRole) -> SubmittedAssignment {
        SubmittedAssignment {
            worker_id: Some(worker_id),
            role,
        }
    }

    /// Applies a plan the way the service does, on an in-memory copy
    fn apply(existing: &[Assignment], plan: &ReconciliationPlan) -> Vec<Assignment> {
        let mut rows = existing.to_vec();
        for row in rows.iter_mut() {
            if plan.to_deactivate.contains(&row.id) {
                row.active = false;
            }
            if let Some(update) = plan.to_update.iter().find(|u| u.assignment_id == row.id) {
                row.role = update.role;
                row.start_at = update.period.start.unwrap_or(row.start_at);
                row.end_at = update.period.end;
                row.active = true;
            }
        }
        for new in &plan.to_create {
            let mut row = stored(new.worker_id, new.role, true);
            row.start_at = new.period.start_or(row.created_at);
            row.end_at = new.period.end;
            rows.push(row);
        }
        rows
    }

    #[test]
    fn test_crew_change_deactivates_updates_and_creates() {
        let (w1, w2, w3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let a1 = stored(w1, AssignmentRole::ChefEquipe, true);
        let a2 = stored(w2, AssignmentRole::Ouvrier, true);
        let existing = vec![a1.clone(), a2.clone()];

        let plan = reconcile(
            &existing,
            &[
                submit(w1, AssignmentRole::Ouvrier),
                submit(w3, AssignmentRole::Ouvrier),
            ],
            period(),
        );

        assert_eq!(plan.to_deactivate, vec![a2.id]);
        assert_eq!(
            plan.to_update,
            vec![AssignmentUpdate {
                assignment_id: a1.id,
                worker_id: w1,
                role: AssignmentRole::Ouvrier,
                period: period(),
            }]
        );
        assert_eq!(
            plan.to_create,
            vec![NewAssignment {
                worker_id: w3,
                role: AssignmentRole::Ouvrier,
                period: period(),
            }]
        );
    }

    #[test]
    fn test_resubmitting_same_list_only_updates() {
        let (w1, w2) = (Uuid::new_v4(), Uuid::new_v4());
        let submitted = vec![
            submit(w1, AssignmentRole::ChefEquipe),
            submit(w2, AssignmentRole::Ouvrier),
        ];

        let first = reconcile(&[], &submitted, period());
        assert_eq!(first.to_create.len(), 2);

        let stored_rows = apply(&[], &first);
        let second = reconcile(&stored_rows, &submitted, period());

        assert!(second.to_deactivate.is_empty());
        assert!(second.to_create.is_empty());
        assert_eq!(second.to_update.len(), 2);

        // Second application changes nothing observable
        let after = apply(&stored_rows, &second);
        for (before, after) in stored_rows.iter().zip(after.iter()) {
            assert_eq!(before.role, after.role);
            assert_eq!(before.start_at, after.start_at);
            assert_eq!(before.end_at, after.end_at);
            assert_eq!(before.active, after.active);
        }
    }

    #[test]
    fn test_every_worker_lands_in_exactly_one_list() {
        let workers: Vec<Uuid> = (0..6).map(|_| Uuid::new_v4()).collect();
        let existing = vec![
            stored(workers[0], AssignmentRole::ChefEquipe, true),
            stored(workers[1], AssignmentRole::Ouvrier, true),
            stored(workers[2], AssignmentRole::Ouvrier, false),
            stored(workers[3], AssignmentRole::Ouvrier, true),
        ];
        let submitted = vec![
            submit(workers[0], AssignmentRole::Ouvrier),
            submit(workers[2], AssignmentRole::ChefEquipe),
            submit(workers[4], AssignmentRole::Ouvrier),
            submit(workers[5], AssignmentRole::Ouvrier),
        ];

        let plan = reconcile(&existing, &submitted, period());

        for entry in &submitted {
            let id = entry.worker_id.unwrap();
            let updated = plan.to_update.iter().filter(|u| u.worker_id == id).count();
            let created = plan.to_create.iter().filter(|c| c.worker_id == id).count();
            assert_eq!(updated + created, 1, "worker {id}");
        }

        let deactivated: HashSet<Uuid> = plan.to_deactivate.iter().copied().collect();
        let expected: HashSet<Uuid> = [existing[1].id, existing[3].id].into_iter().collect();
        assert_eq!(deactivated, expected);

        let updated: HashSet<Uuid> = plan.to_update.iter().map(|u| u.assignment_id).collect();
        assert!(deactivated.is_disjoint(&updated));
    }

    #[test]
    fn test_inactive_assignment_is_reactivated_not_duplicated() {
        let w1 = Uuid::new_v4();
        let old = stored(w1, AssignmentRole::Ouvrier, false);

        let plan = reconcile(
            std::slice::from_ref(&old),
            &[submit(w1, AssignmentRole::ChefEquipe)],
            period(),
        );

        assert!(plan.to_create.is_empty());
        assert_eq!(plan.to_update.len(), 1);
        assert_eq!(plan.to_update[0].assignment_id, old.id);

        let rows = apply(&[old], &plan);
        assert!(rows[0].active);
        assert_eq!(rows[0].role, AssignmentRole::ChefEquipe);
    }

    #[test]
    fn test_empty_worker_id_is_skipped() {
        let (w1, w2) = (Uuid::new_v4(), Uuid::new_v4());
        let existing = vec![
            stored(w1, AssignmentRole::ChefEquipe, true),
            stored(w2, AssignmentRole::Ouvrier, true),
        ];
        let submitted = vec![
            submit(w1, AssignmentRole::ChefEquipe),
            SubmittedAssignment {
                worker_id: None,
                role: AssignmentRole::Ouvrier,
            },
            submit(w2, AssignmentRole::Ouvrier),
        ];

        let plan = reconcile(&existing, &submitted, period());

        assert!(plan.to_deactivate.is_empty());
        assert!(plan.to_create.is_empty());
        assert_eq!(plan.to_update.len(), 2);
    }

    #[test]
    fn test_empty_submission_deactivates_everyone_active() {
        let existing = vec![
            stored(Uuid::new_v4(), AssignmentRole::ChefEquipe, true),
            stored(Uuid::new_v4(), AssignmentRole::Ouvrier, false),
        ];

        let plan = reconcile(&existing, &[], period());

        assert_eq!(plan.to_deactivate, vec![existing[0].id]);
        assert!(plan.to_update.is_empty());
        assert!(plan.to_create.is_empty());
    }

    #[test]
    fn test_plan_never_removes_rows() {
        let existing = vec![
            stored(Uuid::new_v4(), AssignmentRole::ChefEquipe, true),
            stored(Uuid::new_v4(), AssignmentRole::Ouvrier, true),
        ];

        let plan = reconcile(&existing, &[], period());
        let rows = apply(&existing, &plan);

        assert_eq!(rows.len(), existing.len());
        assert!(rows.iter().all(|r| !r.active));
    }

    #[test]
    fn test_creations_follow_submission_order() {
        let workers: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let submitted: Vec<SubmittedAssignment> = workers
            .iter()
            .map(|w| submit(*w, AssignmentRole::Ouvrier))
            .collect();

        let plan = reconcile(&[], &submitted, period());

        let created: Vec<Uuid> = plan.to_create.iter().map(|c| c.worker_id).collect();
        assert_eq!(created, workers);
    }

    #[test]
    fn test_duplicate_worker_keeps_first_position_and_last_role() {
        let (w1, w2) = (Uuid::new_v4(), Uuid::new_v4());
        let plan = reconcile(
            &[],
            &[
                submit(w1, AssignmentRole::Ouvrier),
                submit(w2, AssignmentRole::Ouvrier),
                submit(w1, AssignmentRole::ChefEquipe),
            ],
            period(),
        );

        assert_eq!(plan.to_create.len(), 2);
        assert_eq!(plan.to_create[0].worker_id, w1);
        assert_eq!(plan.to_create[0].role, AssignmentRole::ChefEquipe);
        assert_eq!(plan.to_create[1].worker_id, w2);
    }

    #[test]
    fn test_active_row_preferred_over_history() {
        let w1 = Uuid::new_v4();
        let mut old = stored(w1, AssignmentRole::Ouvrier, false);
        old.updated_at = Utc::now() + Duration::hours(1);
        let current = stored(w1, AssignmentRole::Ouvrier, true);

        let plan = reconcile(
            &[old, current.clone()],
            &[submit(w1, AssignmentRole::ChefEquipe)],
            period(),
        );

        assert_eq!(plan.to_update.len(), 1);
        assert_eq!(plan.to_update[0].assignment_id, current.id);
        assert!(plan.to_deactivate.is_empty());
    }

    #[test]
    fn test_duplicate_active_rows_are_collapsed() {
        let w1 = Uuid::new_v4();
        let a = stored(w1, AssignmentRole::Ouvrier, true);
        let mut b = stored(w1, AssignmentRole::Ouvrier, true);
        b.updated_at = a.updated_at + Duration::minutes(5);

        let plan = reconcile(
            &[a.clone(), b.clone()],
            &[submit(w1, AssignmentRole::Ouvrier)],
            period(),
        );

        assert_eq!(plan.to_update[0].assignment_id, b.id);
        assert_eq!(plan.to_deactivate, vec![a.id]);
    }

    fn unscheduled() -> Intervention {
        Intervention {
            id: Uuid::new_v4(),
            title: "Reprise étanchéité".to_string(),
            description: None,
            planned_start: None,
            planned_end: None,
            status: crate::features::interventions::models::InterventionStatus::Awaiting,
            chantier_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_unscheduled_period_has_no_start() {
        let p = AssignmentPeriod::of(&unscheduled());
        assert!(p.start.is_none());
        assert!(p.end.is_none());

        let now = Utc::now();
        assert_eq!(p.start_or(now), now);
        assert_eq!(period().start_or(now), period().start.unwrap());
    }

    #[test]
    fn test_resaving_unscheduled_crew_keeps_join_date() {
        let intervention = unscheduled();
        let (w1, w2) = (Uuid::new_v4(), Uuid::new_v4());
        let submitted = vec![
            submit(w1, AssignmentRole::ChefEquipe),
            submit(w2, AssignmentRole::Ouvrier),
        ];

        let first = reconcile(&[], &submitted, AssignmentPeriod::of(&intervention));
        let stored_rows = apply(&[], &first);

        // A later save recomputes the period from scratch
        let second = reconcile(&stored_rows, &submitted, AssignmentPeriod::of(&intervention));
        assert!(second.to_create.is_empty());
        assert!(second.to_deactivate.is_empty());
        assert!(second.to_update.iter().all(|u| u.period.start.is_none()));

        let after = apply(&stored_rows, &second);
        for (before, after) in stored_rows.iter().zip(after.iter()) {
            assert_eq!(before.start_at, after.start_at);
            assert_eq!(before.end_at, after.end_at);
            assert_eq!(before.role, after.role);
        }
    }
}
