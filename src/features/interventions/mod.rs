//! Interventions on job sites (chantiers).
//!
//! | Method | Path                                         | Capability |
//! |--------|----------------------------------------------|------------|
//! | POST   | `/api/interventions`                         | create     |
//! | PUT    | `/api/interventions/{id}`                    | update     |
//! | GET    | `/api/interventions/{id}`                    | view       |
//! | GET    | `/api/interventions/{id}/affectations`       | view       |
//! | GET    | `/api/chantiers/{chantier_id}/interventions` | view       |
//!
//! Create and update take a multipart form. Saving an intervention also
//! synchronizes its crew from the `affectations` field (see [`reconciler`]);
//! a crew that cannot be applied is reported in the response and never
//! blocks the intervention itself.

pub mod affectations;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod reconciler;
pub mod routes;
pub mod services;
pub mod status;

pub use routes::routes;
pub use services::InterventionService;
