mod assignment;
mod intervention;
mod intervention_document;

pub use assignment::{Assignment, AssignmentRole};
pub use intervention::{Intervention, InterventionStatus};
pub use intervention_document::{DocumentKind, InterventionDocument};
