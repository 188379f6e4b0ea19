pub mod auth;
pub mod interventions;
