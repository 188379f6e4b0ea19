use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::auth::guards::Operation;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub sub: String,
    /// Roles issued by the identity provider (PREPA, CE, RDC, CAFF, ADMIN, ...)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    /// Check if any of the user's roles is allowed to perform the operation
    pub fn can(&self, operation: Operation) -> bool {
        self.roles.iter().any(|role| operation.permits(role))
    }
}
