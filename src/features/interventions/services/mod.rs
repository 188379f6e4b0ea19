mod intervention_service;

pub use intervention_service::{
    AssignmentChanges, InterventionDetail, InterventionSaved, InterventionService,
};
