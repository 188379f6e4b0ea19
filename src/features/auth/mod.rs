//! Bearer token authentication and role capabilities.
//!
//! The identity provider issues RS256 JWTs; [`JwtValidator`] checks them
//! against the provider's JWKS and attaches an [`model::AuthenticatedUser`]
//! to the request. Handlers gate themselves with [`guards::Require`].

mod jwks;
mod validator;

pub mod guards;
pub mod model;

pub use jwks::JwksClient;
pub use validator::JwtValidator;
