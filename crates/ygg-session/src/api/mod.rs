//! Wire layer for the Yggdrasil authentication server.
//!
//! This module provides the `HttpPoster` transport seam with its default
//! reqwest implementation, and the JSON payloads for the `authenticate`,
//! `refresh`, `validate` and `invalidate` routes.

pub mod client;
pub mod error;
pub mod protocol;

pub use client::{HttpPoster, ReqwestPoster, DEFAULT_TIMEOUT_SECS};
pub use error::TransportError;
pub use protocol::{Route, YGG_PROD};
