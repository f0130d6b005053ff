//! Loads [`Settings`] from environment variables.
//!
//! Required: `XENFORO_SITE_URL`, `XENFORO_CLIENT_ID`, `XENFORO_CLIENT_SECRET`,
//! `XENFORO_SCOPES` (space separated), `XENFORO_REDIRECT_URI`, `SESSION_SECRET`.
//!
//! Optional: `XENFORO_TOKEN_URL`, `XENFORO_HTTP_TIMEOUT_SECS`, `SESSION_MAX_AGE_SECS`.

// self
use crate::{
	_prelude::*,
	config::{ProviderConfig, SessionConfig, Settings},
	error::ConfigError,
};

/// Forum base URL.
pub const SITE_URL: &str = "XENFORO_SITE_URL";
/// OAuth client identifier.
pub const CLIENT_ID: &str = "XENFORO_CLIENT_ID";
/// OAuth client secret.
pub const CLIENT_SECRET: &str = "XENFORO_CLIENT_SECRET";
/// Space-separated scopes.
pub const SCOPES: &str = "XENFORO_SCOPES";
/// Registered redirect URI.
pub const REDIRECT_URI: &str = "XENFORO_REDIRECT_URI";
/// Token endpoint override.
pub const TOKEN_URL: &str = "XENFORO_TOKEN_URL";
/// Outbound request timeout in seconds.
pub const HTTP_TIMEOUT_SECS: &str = "XENFORO_HTTP_TIMEOUT_SECS";
/// Session signing secret.
pub const SESSION_SECRET: &str = "SESSION_SECRET";
/// Session lifetime in seconds.
pub const SESSION_MAX_AGE_SECS: &str = "SESSION_MAX_AGE_SECS";

impl Settings {
	/// Loads settings from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Loads settings through an arbitrary key lookup.
	///
	/// Blank values count as missing. Tests use this entry point so they never mutate the
	/// process environment.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
		let mut builder = ProviderConfig::builder();

		builder.site_url = get(SITE_URL);
		builder.client_id = get(CLIENT_ID);
		builder.client_secret = get(CLIENT_SECRET);
		builder.scopes = get(SCOPES);
		builder.redirect_uri = get(REDIRECT_URI);
		builder.token_endpoint = get(TOKEN_URL);
		builder.http_timeout_secs = get(HTTP_TIMEOUT_SECS)
			.map(|raw| parse_number::<u64>(HTTP_TIMEOUT_SECS, &raw))
			.transpose()?;

		let provider = builder.build()?;
		let mut session =
			SessionConfig::new(get(SESSION_SECRET).ok_or(ConfigError::MissingSetting {
				key: SESSION_SECRET,
			})?)?;

		if let Some(raw) = get(SESSION_MAX_AGE_SECS) {
			let secs = parse_number::<i64>(SESSION_MAX_AGE_SECS, &raw)?;

			session = session.with_max_age(Duration::seconds(secs))?;
		}

		Ok(Self { provider, session })
	}
}

fn parse_number<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
	T: FromStr,
{
	raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidNumber { key, value: raw.to_owned() })
}
