//! Capability-based authorization for the application.
//!
//! Every gated endpoint names the [`Operation`] it performs; the allow-list
//! for each operation lives in [`Operation::permits`] so endpoints sharing an
//! operation can never drift apart.
//!
//! Handlers take a [`Require`] extractor parameterized by a marker type:
//!
//! ```ignore
//! pub async fn handler(Require(user, ..): Require<EditInterventions>) { ... }
//! ```

use std::marker::PhantomData;

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use crate::shared::constants::INTERVENTION_EDITOR_ROLES;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Operations gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateIntervention,
    UpdateIntervention,
    ViewIntervention,
}

impl Operation {
    /// Whether a caller holding `role` may perform this operation
    pub fn permits(self, role: &str) -> bool {
        match self {
            Operation::CreateIntervention | Operation::UpdateIntervention => {
                INTERVENTION_EDITOR_ROLES.contains(&role)
            }
            Operation::ViewIntervention => true,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Operation::CreateIntervention => "create interventions",
            Operation::UpdateIntervention => "update interventions",
            Operation::ViewIntervention => "view interventions",
        }
    }
}

/// Marker type binding an extractor to an [`Operation`]
pub trait Capability {
    const OPERATION: Operation;
}

pub struct CreateInterventions;
pub struct EditInterventions;
pub struct ViewInterventions;

impl Capability for CreateInterventions {
    const OPERATION: Operation = Operation::CreateIntervention;
}

impl Capability for EditInterventions {
    const OPERATION: Operation = Operation::UpdateIntervention;
}

impl Capability for ViewInterventions {
    const OPERATION: Operation = Operation::ViewIntervention;
}

/// Guard extracting the authenticated user and checking the capability `C`.
///
/// Rejects with 401 when no user is attached to the request and 403 when
/// none of the user's roles is allowed to perform `C::OPERATION`.
pub struct Require<C: Capability>(pub AuthenticatedUser, pub PhantomData<C>);

impl<C, S> FromRequestParts<S> for Require<C>
where
    C: Capability,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))?;

        if !user.can(C::OPERATION) {
            tracing::debug!(
                "Roles {:?} of {} denied: {:?}",
                user.roles,
                user.sub,
                C::OPERATION
            );
            return Err(AppError::Forbidden(format!(
                "Your role is not allowed to {}",
                C::OPERATION.describe()
            )));
        }

        Ok(Require(user.clone(), PhantomData))
    }
}
