//! Client-side session lifecycle
//!
//! The session is the bearer token issued by the backend at login or
//! registration, the absolute time after which the client stops using it,
//! and the name shown to the user.
//!
//! # Module Layout
//!
//! - [`backend`] -- where a session lives between reads (OS keyring or memory)
//! - [`clock`]   -- time source used for expiry checks
//! - [`store`]   -- [`SessionStore`], the expiry-checked accessor

pub mod backend;
pub mod clock;
pub mod store;

pub use backend::{KeyringBackend, MemoryBackend, SessionBackend};
pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{Session, SessionStore};
