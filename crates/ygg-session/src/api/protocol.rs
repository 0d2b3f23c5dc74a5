//! Request and response payloads for the four Yggdrasil routes.
//!
//! Every response shares the optional `error`/`errorMessage`/`cause`
//! triple, modeled once as [`ErrorPayload`] and flattened into the richer
//! authenticate/refresh response.

use serde::{Deserialize, Serialize};

use crate::models::{GameProfile, Property};

/// Production Yggdrasil authentication server.
pub const YGG_PROD: &str = "https://authserver.mojang.com/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Authenticate,
    Refresh,
    Validate,
    Invalidate,
}

impl Route {
    pub fn as_str(self) -> &'static str {
        match self {
            Route::Authenticate => "authenticate",
            Route::Refresh => "refresh",
            Route::Validate => "validate",
            Route::Invalidate => "invalidate",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Agent {
    pub name: &'static str,
    pub version: u32,
}

impl Agent {
    pub const MINECRAFT: Agent = Agent {
        name: "Minecraft",
        version: 1,
    };
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateRequest<'a> {
    pub agent: Agent,
    pub username: &'a str,
    pub password: &'a str,
    pub client_token: &'a str,
    pub request_user: bool,
}

impl<'a> AuthenticateRequest<'a> {
    pub fn new(username: &'a str, password: &'a str, client_token: &'a str) -> Self {
        Self {
            agent: Agent::MINECRAFT,
            username,
            password,
            client_token,
            request_user: true,
        }
    }
}

/// `selectedProfile` is always sent, as `null` when no profile is chosen.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub client_token: &'a str,
    pub access_token: &'a str,
    pub selected_profile: Option<&'a GameProfile>,
    pub request_user: bool,
}

impl<'a> RefreshRequest<'a> {
    pub fn new(client_token: &'a str, access_token: &'a str) -> Self {
        Self {
            client_token,
            access_token,
            selected_profile: None,
            request_user: true,
        }
    }
}

/// Body shared by the `validate` and `invalidate` routes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest<'a> {
    pub client_token: &'a str,
    pub access_token: Option<&'a str>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub error: Option<String>,
    pub error_message: Option<String>,
    pub cause: Option<String>,
}

impl ErrorPayload {
    pub fn is_error(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct User {
    pub id: Option<String>,
    pub properties: Option<Vec<Property>>,
}

/// Response of both `authenticate` and `refresh`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateResponse {
    #[serde(flatten)]
    pub status: ErrorPayload,
    pub access_token: Option<String>,
    pub client_token: Option<String>,
    pub selected_profile: Option<GameProfile>,
    pub available_profiles: Option<Vec<GameProfile>>,
    pub user: Option<User>,
}
