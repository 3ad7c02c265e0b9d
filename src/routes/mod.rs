/// Router Module Index
///
/// Organizes routing into security-segregated modules. Access control is applied
/// per module with Axum route layers in `create_router`, so a handler cannot be
/// exposed without its guard by accident.

/// Routes accessible to anyone: browsing, search, and the login/signup gateways.
pub mod public;

/// Routes behind the user session guard (`catchpedia_user` cookie).
pub mod authenticated;

/// Routes behind the admin guard (`catchpedia_admin` sentinel cookie).
pub mod admin;
