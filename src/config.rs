//! Immutable provider and session configuration.
//!
//! A [`Settings`] value is assembled once at process start, either through
//! [`ProviderConfigBuilder`] or from the environment via [`Settings::from_env`], and then
//! shared by reference with every component of the sign-in flow. Validation happens while
//! building so a missing client identifier, secret, or site URL is reported at startup
//! rather than on the first callback.

/// Builder API for assembling provider configuration.
pub mod builder;
/// Environment-variable loading.
pub mod env;

pub use builder::*;
pub use env::*;

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret},
	error::ConfigError,
};

/// Endpoint set derived from the forum's site URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Browser-facing authorization endpoint (`{site}/oauth2/authorize`).
	pub authorization: Url,
	/// Token endpoint used for the code exchange (`{site}/oauth2/token`).
	pub token: Url,
	/// Authenticated "current user" endpoint (`{site}/api/me`).
	pub profile: Url,
}

/// Validated XenForo OAuth client configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderConfig {
	/// Base URL of the forum installation.
	pub site_url: Url,
	/// Provider endpoints.
	pub endpoints: ProviderEndpoints,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// OAuth 2.0 client secret, sent in the token request body.
	pub client_secret: TokenSecret,
	/// Scopes requested during authorization.
	pub scope: ScopeSet,
	/// Redirect URI registered with the forum for this client.
	pub redirect_uri: Url,
	/// Upper bound applied to every outbound provider request.
	pub http_timeout: StdDuration,
}
impl ProviderConfig {
	/// Default timeout applied to outbound provider calls.
	pub const DEFAULT_HTTP_TIMEOUT: StdDuration = StdDuration::from_secs(10);

	/// Creates a new builder.
	pub fn builder() -> ProviderConfigBuilder {
		ProviderConfigBuilder::default()
	}
}

/// Signing configuration for issued session tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
	/// HMAC secret used to sign session tokens.
	pub secret: TokenSecret,
	/// Lifetime of an issued session.
	pub max_age: Duration,
}
impl SessionConfig {
	/// Default session lifetime (30 days).
	pub const DEFAULT_MAX_AGE: Duration = Duration::days(30);

	/// Creates a session configuration with the default lifetime.
	pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
		let secret = TokenSecret::new(secret);

		if secret.is_blank() {
			return Err(ConfigError::MissingSetting { key: env::SESSION_SECRET });
		}

		Ok(Self { secret, max_age: Self::DEFAULT_MAX_AGE })
	}

	/// Overrides the session lifetime; non-positive values are rejected.
	pub fn with_max_age(mut self, max_age: Duration) -> Result<Self, ConfigError> {
		if !max_age.is_positive() {
			return Err(ConfigError::InvalidNumber {
				key: env::SESSION_MAX_AGE_SECS,
				value: max_age.whole_seconds().to_string(),
			});
		}

		self.max_age = max_age;

		Ok(self)
	}
}

/// Complete runtime configuration: provider client plus session signing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
	/// Provider client configuration.
	pub provider: ProviderConfig,
	/// Session signing configuration.
	pub session: SessionConfig,
}
