//! ygg - drive a Yggdrasil session from the command line.
//!
//! Logs in (or refreshes a saved token), prints the resulting session as
//! JSON, and optionally validates and invalidates it before exiting.

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use ygg_session::{AuthConfig, SessionManager};

/// Environment variable checked before prompting for a password
const PASSWORD_ENV: &str = "YGG_PASSWORD";

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "ygg", version, about = "Drive a Yggdrasil session", subcommand_required = true)]
struct Args {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in with a password, or refresh a saved access token
    Login(LoginArgs),
    /// Check whether an access token is still valid
    Validate {
        /// Access token to check
        access_token: String,
    },
}

#[derive(ClapArgs, Debug)]
struct LoginArgs {
    /// Account username (usually an email address)
    username: String,
    /// Refresh this access token instead of authenticating with a password
    #[arg(long)]
    access_token: Option<String>,
    /// Validate the token after logging in
    #[arg(long)]
    validate: bool,
    /// Invalidate the session before exiting
    #[arg(long)]
    logout: bool,
    /// Include the access token in the printed session
    #[arg(long)]
    show_token: bool,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=ygg_session=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<AuthConfig> {
    let config = match path {
        Some(path) => {
            let mut config = AuthConfig::load_from(path)?;
            config.apply_env(|key| std::env::var(key).ok())?;
            config
        }
        None => AuthConfig::load()?,
    };
    Ok(config)
}

fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    rpassword::prompt_password("Password: ").context("Failed to read password")
}

async fn run_login(config: &AuthConfig, args: LoginArgs) -> Result<()> {
    let mut session = SessionManager::from_config(config)?;
    session.set_username(Some(args.username))?;
    match args.access_token {
        Some(token) => session.set_access_token(Some(token))?,
        None => session.set_password(Some(read_password()?))?,
    }

    session.login().await.context("Login failed")?;

    let mut output = json!({
        "userId": session.user_id(),
        "selectedProfile": session.current_profile(),
        "availableProfiles": session.profiles(),
        "properties": session.properties(),
    });
    if args.show_token {
        output["accessToken"] = json!(session.access_token());
    }
    println!("{}", serde_json::to_string_pretty(&output)?);

    if args.validate {
        let valid = session.validate().await;
        println!("Token valid: {}", valid);
    }
    if args.logout {
        session.logout().await.context("Logout failed")?;
        println!("Logged out");
    }
    Ok(())
}

async fn run_validate(config: &AuthConfig, access_token: String) -> Result<()> {
    let mut session = SessionManager::from_config(config)?;
    session.set_access_token(Some(access_token))?;

    if session.validate().await {
        println!("Token valid");
        Ok(())
    } else {
        bail!("Token invalid")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;
    info!(auth_host = %config.auth_host, "Using authentication server");

    match args.command {
        Command::Login(login) => run_login(&config, login).await,
        Command::Validate { access_token } => run_validate(&config, access_token).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("ygg").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_login_with_flags() {
        let args = parse(&["--config", "/tmp/ygg.json", "login", "alice", "--validate", "--logout"])
            .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/ygg.json")));
        match args.command {
            Command::Login(login) => {
                assert_eq!(login.username, "alice");
                assert!(login.validate);
                assert!(login.logout);
                assert!(!login.show_token);
                assert!(login.access_token.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_after_subcommand() {
        let args = parse(&["validate", "tok", "--config", "/tmp/ygg.json"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/ygg.json")));
        assert!(matches!(args.command, Command::Validate { ref access_token } if access_token == "tok"));
    }

    #[test]
    fn test_parse_refresh_login() {
        let args = parse(&["login", "alice", "--access-token", "saved"]).unwrap();
        match args.command {
            Command::Login(login) => assert_eq!(login.access_token.as_deref(), Some("saved")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_help_is_not_a_failure() {
        let err = parse(&["--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["login"]).is_err());
        assert!(parse(&["login", "alice", "--frobnicate"]).is_err());
        assert!(parse(&["login", "alice", "--access-token"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
