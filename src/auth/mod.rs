//! Request authentication
//!
//! Every backend call goes through [`RequestAuthenticator`], which attaches
//! the bearer token and, when a call fails with 401/403, decides whether the
//! session is really dead before handing the error back.
//!
//! # Module Layout
//!
//! - [`classify`]    -- the keyword heuristic shared with the import flow
//! - [`interceptor`] -- the HTTP wrapper

pub mod classify;
pub mod interceptor;

pub use classify::{
    classify_failure, error_message, mentions_auth_failure, EndpointKind, FailureDisposition,
    AUTH_FAILURE_PHRASES,
};
pub use interceptor::{AuthEvent, RequestAuthenticator};
