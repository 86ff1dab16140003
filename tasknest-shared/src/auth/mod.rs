/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Access token issuing and validation
/// - [`middleware`]: The request authorization gate for axum
/// - [`authorization`]: Role checks applied after authentication
///
/// The gate is stateless: every request presents a bearer token which is
/// re-validated and resolved to a live user row before any handler runs.

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
