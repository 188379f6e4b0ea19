mod intervention_handler;

pub use intervention_handler::*;
