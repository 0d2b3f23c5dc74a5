//! Client-side session manager for the Yggdrasil authentication protocol.
//!
//! ```no_run
//! use ygg_session::SessionManager;
//!
//! # async fn example() -> Result<(), ygg_session::SessionError> {
//! let mut session = SessionManager::with_host("https://authserver.mojang.com", "")?;
//! session.set_username(Some("alice@example.com".into()))?;
//! session.set_password(Some("secret".into()))?;
//! session.login().await?;
//!
//! if let Some(profile) = session.current_profile() {
//!     println!("Playing as {}", profile.name);
//! }
//! assert!(session.validate().await);
//! session.logout().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;

pub use api::{HttpPoster, ReqwestPoster, Route, TransportError, YGG_PROD};
pub use auth::SessionManager;
pub use config::AuthConfig;
pub use error::SessionError;
pub use models::{GameProfile, Property};
