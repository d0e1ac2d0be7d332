//! HTTP middleware for axum.
//!
//! - `auth` - gateway-forwarded user identity extractor

pub mod auth;

pub use auth::{AuthRejection, RequireUser, USER_ID_HEADER};
