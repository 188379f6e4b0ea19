/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Préparateur - plans interventions and prepares job files
pub const ROLE_PREPA: &str = "PREPA";

/// Chef d'équipe - leads a field crew
pub const ROLE_CE: &str = "CE";

/// Responsable de chantier - accountable for a job site
pub const ROLE_RDC: &str = "RDC";

/// Chargé d'affaires - owns the customer relationship for an affaire
pub const ROLE_CAFF: &str = "CAFF";

/// Administrator - unrestricted
pub const ROLE_ADMIN: &str = "ADMIN";

/// Roles allowed to create and edit interventions
pub const INTERVENTION_EDITOR_ROLES: &[&str] =
    &[ROLE_PREPA, ROLE_CE, ROLE_RDC, ROLE_CAFF, ROLE_ADMIN];
