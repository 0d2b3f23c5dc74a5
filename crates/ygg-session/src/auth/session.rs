use chrono::{DateTime, Duration, Utc};
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::protocol::{
    AuthenticateRequest, AuthenticateResponse, ErrorPayload, RefreshRequest, TokenRequest, User,
};
use crate::api::{HttpPoster, ReqwestPoster, Route, YGG_PROD};
use crate::config::AuthConfig;
use crate::models::{GameProfile, Property};
use crate::SessionError;

/// Session state for one Yggdrasil account.
///
/// `login` authenticates with the password, or refreshes when an access
/// token is already set. `logout` invalidates the token server side and
/// resets the session. `validate` only asks the server whether the current
/// token is still good.
///
/// A failed `login` or `logout` leaves every field as it was.
pub struct SessionManager<T = ReqwestPoster> {
    base_url: Url,
    client_token: String,
    transport: T,

    username: Option<String>,
    password: Option<String>,
    access_token: Option<String>,
    user_id: Option<String>,

    logged_in: bool,
    selected_profile: Option<GameProfile>,
    properties: Vec<Property>,
    profiles: Vec<GameProfile>,
    authenticated_at: Option<DateTime<Utc>>,
}

impl SessionManager<ReqwestPoster> {
    /// Production server, empty client token, direct connection
    pub fn new() -> Result<Self, SessionError> {
        Self::with_host(YGG_PROD, "")
    }

    pub fn with_host(auth_host: &str, client_token: &str) -> Result<Self, SessionError> {
        Self::with_transport(Some(auth_host), Some(client_token), ReqwestPoster::new()?)
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let transport =
            ReqwestPoster::with_options(config.request_timeout(), config.proxy.as_deref())?;
        Self::with_transport(
            Some(config.auth_host.as_str()),
            Some(config.client_token.as_str()),
            transport,
        )
    }
}

impl<T: HttpPoster> SessionManager<T> {
    /// Validate and store the configuration. No request is made here.
    ///
    /// A missing host or client token is a configuration error; an empty
    /// client token is allowed and means no client binding was requested.
    pub fn with_transport(
        auth_host: Option<&str>,
        client_token: Option<&str>,
        transport: T,
    ) -> Result<Self, SessionError> {
        let base_url = Self::parse_base_url(auth_host)?;
        let client_token = client_token
            .ok_or_else(|| SessionError::Configuration("Client token is missing".into()))?
            .to_string();

        Ok(Self {
            base_url,
            client_token,
            transport,
            username: None,
            password: None,
            access_token: None,
            user_id: None,
            logged_in: false,
            selected_profile: None,
            properties: Vec::new(),
            profiles: Vec::new(),
            authenticated_at: None,
        })
    }

    fn parse_base_url(auth_host: Option<&str>) -> Result<Url, SessionError> {
        let host = auth_host
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| SessionError::Configuration("Authentication host is missing".into()))?;

        // Routes are resolved relative to the base, so it must end with '/'
        let mut host = host.to_string();
        if !host.ends_with('/') {
            host.push('/');
        }

        let url = Url::parse(&host).map_err(|e| {
            SessionError::Configuration(format!("Invalid authentication host {}: {}", host, e))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(SessionError::Configuration(format!(
                "Unsupported scheme {} for authentication host",
                scheme
            ))),
        }
    }

    fn route_url(&self, route: Route) -> Result<Url, SessionError> {
        self.base_url.join(route.as_str()).map_err(|e| {
            SessionError::Configuration(format!("Cannot resolve route {}: {}", route, e))
        })
    }

    fn encode<B: Serialize>(route: Route, body: &B) -> Result<Value, SessionError> {
        serde_json::to_value(body)
            .map_err(|e| SessionError::protocol(format!("Failed to encode {} request: {}", route, e)))
    }

    /// Log in with the stored credentials.
    ///
    /// Refreshes when an access token is set, otherwise authenticates with
    /// the password.
    pub async fn login(&mut self) -> Result<(), SessionError> {
        let username = match self.username.as_deref() {
            Some(username) if !username.is_empty() => username,
            _ => return Err(SessionError::InvalidCredentials("Invalid username".into())),
        };
        let access_token = self.access_token.as_deref().filter(|t| !t.is_empty());
        let password = self.password.as_deref().filter(|p| !p.is_empty());

        let (route, body) = match (access_token, password) {
            (Some(token), _) => (
                Route::Refresh,
                Self::encode(Route::Refresh, &RefreshRequest::new(&self.client_token, token))?,
            ),
            (None, Some(password)) => (
                Route::Authenticate,
                Self::encode(
                    Route::Authenticate,
                    &AuthenticateRequest::new(username, password, &self.client_token),
                )?,
            ),
            (None, None) => {
                return Err(SessionError::InvalidCredentials(
                    "Invalid password or access token".into(),
                ))
            }
        };

        debug!(route = %route, username = username, "Logging in");
        let url = self.route_url(route)?;
        let response = self
            .transport
            .post(url, body)
            .await?
            .ok_or_else(|| SessionError::protocol("Server didn't send a response"))?;
        let response: AuthenticateResponse = serde_json::from_value(response).map_err(|e| {
            SessionError::protocol(format!("Malformed {} response: {}", route, e))
        })?;

        self.apply_login(response)?;
        info!(
            route = %route,
            user_id = self.user_id.as_deref().unwrap_or_default(),
            profiles = self.profiles.len(),
            "Logged in"
        );
        Ok(())
    }

    /// Check the response, then commit it in one go.
    fn apply_login(&mut self, response: AuthenticateResponse) -> Result<(), SessionError> {
        let AuthenticateResponse {
            status,
            access_token,
            client_token,
            selected_profile,
            available_profiles,
            user,
        } = response;

        if let Some(err) = SessionError::from_payload(status) {
            return Err(err);
        }
        if client_token.as_deref() != Some(self.client_token.as_str()) {
            warn!("Server client token does not match the configured one");
            return Err(SessionError::protocol(
                "Server token and provided token don't match",
            ));
        }
        let access_token = access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SessionError::protocol("Server didn't send an access token"))?;
        let (user_id, properties) = match user {
            Some(User { id, properties }) => (id, properties.unwrap_or_default()),
            None => (None, Vec::new()),
        };

        self.user_id = user_id.or_else(|| self.username.clone());
        self.access_token = Some(access_token);
        self.profiles = available_profiles.unwrap_or_default();
        self.selected_profile = selected_profile;
        self.properties = properties;
        self.logged_in = true;
        self.authenticated_at = Some(Utc::now());
        Ok(())
    }

    /// Ask the server whether the current access token is still valid.
    /// Any failure, transport or protocol, reads as `false`.
    pub async fn validate(&self) -> bool {
        let request = TokenRequest {
            client_token: &self.client_token,
            access_token: self.access_token.as_deref(),
        };

        let result = match Self::encode(Route::Validate, &request) {
            Ok(body) => self.post_status(Route::Validate, body).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "Access token is not valid");
                false
            }
        }
    }

    /// Invalidate the access token and reset the session.
    ///
    /// Fails without contacting the server when not logged in.
    pub async fn logout(&mut self) -> Result<(), SessionError> {
        if !self.logged_in {
            return Err(SessionError::IllegalState(
                "Cannot log out while not logged in".into(),
            ));
        }

        let request = TokenRequest {
            client_token: &self.client_token,
            access_token: self.access_token.as_deref(),
        };
        let body = Self::encode(Route::Invalidate, &request)?;
        self.post_status(Route::Invalidate, body).await?;

        self.access_token = None;
        self.logged_in = false;
        self.selected_profile = None;
        self.properties = Vec::new();
        self.profiles = Vec::new();
        self.authenticated_at = None;
        info!("Logged out");
        Ok(())
    }

    /// POST to a route whose only meaningful answer is "no error".
    async fn post_status(&self, route: Route, body: Value) -> Result<(), SessionError> {
        let url = self.route_url(route)?;
        let Some(response) = self.transport.post(url, body).await? else {
            return Ok(());
        };
        let payload: ErrorPayload = serde_json::from_value(response).map_err(|e| {
            SessionError::protocol(format!("Malformed {} response: {}", route, e))
        })?;
        match SessionError::from_payload(payload) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Logged in with an active profile; credentials are frozen.
    pub fn is_online(&self) -> bool {
        self.logged_in && self.selected_profile.is_some()
    }

    fn ensure_offline(&self, field: &str) -> Result<(), SessionError> {
        if self.is_online() {
            return Err(SessionError::IllegalState(format!(
                "Cannot change {} whilst logged in & online",
                field
            )));
        }
        Ok(())
    }

    pub fn set_username(&mut self, username: Option<String>) -> Result<(), SessionError> {
        self.ensure_offline("username")?;
        self.username = username;
        Ok(())
    }

    pub fn set_password(&mut self, password: Option<String>) -> Result<(), SessionError> {
        self.ensure_offline("password")?;
        self.password = password;
        Ok(())
    }

    /// Set a saved access token; the next `login` will refresh it.
    pub fn set_access_token(&mut self, access_token: Option<String>) -> Result<(), SessionError> {
        self.ensure_offline("access token")?;
        self.access_token = access_token;
        Ok(())
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    pub fn current_profile(&self) -> Option<&GameProfile> {
        self.selected_profile.as_ref()
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn profiles(&self) -> &[GameProfile] {
        &self.profiles
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn client_token(&self) -> &str {
        &self.client_token
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// When the current session was last authenticated or refreshed
    pub fn authenticated_at(&self) -> Option<DateTime<Utc>> {
        self.authenticated_at
    }

    pub fn session_age(&self) -> Option<Duration> {
        self.authenticated_at.map(|at| Utc::now() - at)
    }
}

impl<T> std::fmt::Debug for SessionManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn redact(secret: &Option<String>) -> Option<&'static str> {
            secret.as_ref().map(|_| "<redacted>")
        }

        f.debug_struct("SessionManager")
            .field("base_url", &self.base_url.as_str())
            .field("client_token", &self.client_token)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("access_token", &redact(&self.access_token))
            .field("user_id", &self.user_id)
            .field("logged_in", &self.logged_in)
            .field("selected_profile", &self.selected_profile)
            .field("properties", &self.properties)
            .field("profiles", &self.profiles)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TransportError;

    /// Never answers; these tests must not reach the network.
    struct Unreachable;

    impl HttpPoster for Unreachable {
        async fn post(&self, url: Url, _body: Value) -> Result<Option<Value>, TransportError> {
            panic!("unexpected request to {}", url);
        }
    }

    fn manager() -> SessionManager<Unreachable> {
        SessionManager::with_transport(Some("https://auth.example.com"), Some(""), Unreachable)
            .expect("valid configuration")
    }

    fn go_online(manager: &mut SessionManager<Unreachable>) {
        manager.logged_in = true;
        manager.access_token = Some("tok".into());
        manager.selected_profile = Some(GameProfile::new("p1", "Alice"));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let manager = manager();
        assert_eq!(manager.base_url().as_str(), "https://auth.example.com/");
        assert_eq!(
            manager.route_url(Route::Refresh).unwrap().as_str(),
            "https://auth.example.com/refresh"
        );
    }

    #[test]
    fn test_base_url_with_path_prefix() {
        let manager = SessionManager::with_transport(
            Some("https://example.com/api/yggdrasil/authserver"),
            Some("ct"),
            Unreachable,
        )
        .unwrap();
        assert_eq!(
            manager.route_url(Route::Authenticate).unwrap().as_str(),
            "https://example.com/api/yggdrasil/authserver/authenticate"
        );
    }

    #[test]
    fn test_missing_configuration_rejected() {
        let err = SessionManager::with_transport(None, Some(""), Unreachable).unwrap_err();
        assert!(matches!(err, SessionError::Configuration(_)));

        let err = SessionManager::with_transport(Some("   "), Some(""), Unreachable).unwrap_err();
        assert!(matches!(err, SessionError::Configuration(_)));

        let err = SessionManager::with_transport(Some("https://auth.example.com"), None, Unreachable)
            .unwrap_err();
        assert!(matches!(err, SessionError::Configuration(_)));
    }

    #[test]
    fn test_invalid_host_rejected() {
        let err = SessionManager::with_transport(Some("not a url"), Some(""), Unreachable).unwrap_err();
        assert!(matches!(err, SessionError::Configuration(_)));

        let err = SessionManager::with_transport(Some("ftp://auth.example.com"), Some(""), Unreachable)
            .unwrap_err();
        assert!(matches!(err, SessionError::Configuration(_)));
    }

    #[test]
    fn test_from_config_rejects_unusable_transport_settings() {
        let zero_timeout = AuthConfig {
            request_timeout_secs: 0,
            ..AuthConfig::default()
        };
        assert!(matches!(
            SessionManager::from_config(&zero_timeout),
            Err(SessionError::Configuration(_))
        ));

        let bad_proxy = AuthConfig {
            proxy: Some("not a proxy url".into()),
            ..AuthConfig::default()
        };
        assert!(matches!(
            SessionManager::from_config(&bad_proxy),
            Err(SessionError::Configuration(_))
        ));
    }

    #[test]
    fn test_from_config_with_blank_proxy_env() {
        let mut config = AuthConfig::default();
        config
            .apply_env(|key| (key == "YGG_PROXY").then(String::new))
            .unwrap();
        let manager = SessionManager::from_config(&config).unwrap();
        assert_eq!(manager.base_url().as_str(), "https://authserver.mojang.com/");
    }

    #[test]
    fn test_new_session_is_empty() {
        let manager = manager();
        assert!(!manager.is_logged_in());
        assert!(!manager.is_online());
        assert!(manager.access_token().is_none());
        assert!(manager.user_id().is_none());
        assert!(manager.current_profile().is_none());
        assert!(manager.properties().is_empty());
        assert!(manager.profiles().is_empty());
        assert!(manager.session_age().is_none());
    }

    #[test]
    fn test_setters_frozen_while_online() {
        let mut manager = manager();
        go_online(&mut manager);

        assert!(matches!(
            manager.set_username(Some("bob".into())),
            Err(SessionError::IllegalState(_))
        ));
        assert!(matches!(
            manager.set_password(Some("hunter2".into())),
            Err(SessionError::IllegalState(_))
        ));
        assert!(matches!(
            manager.set_access_token(None),
            Err(SessionError::IllegalState(_))
        ));
        assert_eq!(manager.access_token(), Some("tok"));
        assert!(manager.username().is_none());
    }

    #[test]
    fn test_setters_allowed_when_logged_in_without_profile() {
        let mut manager = manager();
        go_online(&mut manager);
        manager.selected_profile = None;

        manager.set_username(Some("bob".into())).unwrap();
        assert_eq!(manager.username(), Some("bob"));
    }

    #[test]
    fn test_setters_store_values_verbatim() {
        let mut manager = manager();
        manager.set_username(Some(String::new())).unwrap();
        manager.set_password(Some("secret".into())).unwrap();
        manager.set_access_token(Some("saved".into())).unwrap();

        assert_eq!(manager.username(), Some(""));
        assert_eq!(manager.password(), Some("secret"));
        assert_eq!(manager.access_token(), Some("saved"));
    }

    #[tokio::test]
    async fn test_logout_when_logged_out_sends_nothing() {
        let mut manager = manager();
        let err = manager.logout().await.unwrap_err();
        assert!(matches!(err, SessionError::IllegalState(_)));
    }

    #[tokio::test]
    async fn test_login_credential_checks_precede_network() {
        let mut manager = manager();
        manager.set_password(Some("secret".into())).unwrap();
        assert!(matches!(
            manager.login().await,
            Err(SessionError::InvalidCredentials(_))
        ));

        manager.set_username(Some("alice".into())).unwrap();
        manager.set_password(Some(String::new())).unwrap();
        manager.set_access_token(Some(String::new())).unwrap();
        assert!(matches!(
            manager.login().await,
            Err(SessionError::InvalidCredentials(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut manager = manager();
        manager.set_password(Some("hunter2".into())).unwrap();
        manager.set_access_token(Some("tok-secret".into())).unwrap();

        let debug = format!("{:?}", manager);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("tok-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
