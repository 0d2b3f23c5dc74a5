//! Session management for a single Yggdrasil account.
//!
//! `SessionManager` owns the credentials and the session they produce
//! (access token, user id, profiles, properties) and drives the
//! authenticate / refresh / validate / invalidate exchange.

pub mod session;

pub use session::SessionManager;
