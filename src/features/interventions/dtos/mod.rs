mod intervention_dto;
mod intervention_form;

pub use intervention_dto::*;
pub use intervention_form::*;
