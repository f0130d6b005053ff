// std
use std::time::Duration as StdDuration;
// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret},
	config::{ProviderConfig, ProviderEndpoints, env},
	error::ConfigError,
};

const AUTHORIZATION_PATH: &str = "oauth2/authorize";
const TOKEN_PATH: &str = "oauth2/token";
const PROFILE_PATH: &str = "api/me";

/// Builder for [`ProviderConfig`] values.
///
/// Fields hold raw strings so configuration files can be deserialized straight into the
/// builder; every value is parsed and validated by [`build`](Self::build). Endpoint
/// overrides are optional and default to paths under the site URL.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProviderConfigBuilder {
	/// Base URL of the forum installation.
	pub site_url: Option<String>,
	/// OAuth 2.0 client identifier.
	pub client_id: Option<String>,
	/// OAuth 2.0 client secret.
	pub client_secret: Option<String>,
	/// Space-separated scopes.
	pub scopes: Option<String>,
	/// Redirect URI registered for the client.
	pub redirect_uri: Option<String>,
	/// Optional authorization endpoint override.
	pub authorization_endpoint: Option<String>,
	/// Optional token endpoint override (some installs expose `/api/oauth2/token`).
	pub token_endpoint: Option<String>,
	/// Optional profile endpoint override.
	pub profile_endpoint: Option<String>,
	/// Optional outbound request timeout in seconds.
	pub http_timeout_secs: Option<u64>,
	#[serde(skip)]
	http_timeout: Option<StdDuration>,
}
impl ProviderConfigBuilder {
	/// Sets the forum's base URL.
	pub fn site_url(mut self, url: impl Into<String>) -> Self {
		self.site_url = Some(url.into());

		self
	}

	/// Sets the client identifier.
	pub fn client_id(mut self, id: impl Into<String>) -> Self {
		self.client_id = Some(id.into());

		self
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Sets the requested scopes from a space-separated string.
	pub fn scopes(mut self, scopes: impl Into<String>) -> Self {
		self.scopes = Some(scopes.into());

		self
	}

	/// Sets the redirect URI.
	pub fn redirect_uri(mut self, url: impl Into<String>) -> Self {
		self.redirect_uri = Some(url.into());

		self
	}

	/// Overrides the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: impl Into<String>) -> Self {
		self.authorization_endpoint = Some(url.into());

		self
	}

	/// Overrides the token endpoint.
	pub fn token_endpoint(mut self, url: impl Into<String>) -> Self {
		self.token_endpoint = Some(url.into());

		self
	}

	/// Overrides the profile endpoint.
	pub fn profile_endpoint(mut self, url: impl Into<String>) -> Self {
		self.profile_endpoint = Some(url.into());

		self
	}

	/// Overrides the outbound request timeout; takes precedence over `http_timeout_secs`.
	pub fn http_timeout(mut self, timeout: StdDuration) -> Self {
		self.http_timeout = Some(timeout);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ProviderConfig, ConfigError> {
		let site_url = parse_url(env::SITE_URL, required(env::SITE_URL, self.site_url)?)?;

		validate_endpoint(env::SITE_URL, &site_url)?;

		let client_id = required(env::CLIENT_ID, self.client_id)?;
		let client_secret = TokenSecret::new(required(env::CLIENT_SECRET, self.client_secret)?);
		let scope = ScopeSet::from_str(&required(env::SCOPES, self.scopes)?)?;
		let redirect_uri =
			parse_url(env::REDIRECT_URI, required(env::REDIRECT_URI, self.redirect_uri)?)?;
		let endpoints = ProviderEndpoints {
			authorization: endpoint(
				"authorization",
				&site_url,
				self.authorization_endpoint,
				AUTHORIZATION_PATH,
			)?,
			token: endpoint("token", &site_url, self.token_endpoint, TOKEN_PATH)?,
			profile: endpoint("profile", &site_url, self.profile_endpoint, PROFILE_PATH)?,
		};
		let http_timeout = self.http_timeout.or(self.http_timeout_secs.map(StdDuration::from_secs));
		let http_timeout = match http_timeout {
			Some(timeout) if timeout.is_zero() =>
				return Err(ConfigError::InvalidNumber {
					key: env::HTTP_TIMEOUT_SECS,
					value: format!("{timeout:?}"),
				}),
			Some(timeout) => timeout,
			None => ProviderConfig::DEFAULT_HTTP_TIMEOUT,
		};

		Ok(ProviderConfig {
			site_url,
			endpoints,
			client_id,
			client_secret,
			scope,
			redirect_uri,
			http_timeout,
		})
	}
}

fn required(key: &'static str, value: Option<String>) -> Result<String, ConfigError> {
	value
		.map(|raw| raw.trim().to_owned())
		.filter(|raw| !raw.is_empty())
		.ok_or(ConfigError::MissingSetting { key })
}

fn parse_url(key: &'static str, raw: String) -> Result<Url, ConfigError> {
	Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { key, source })
}

fn endpoint(
	key: &'static str,
	site_url: &Url,
	custom: Option<String>,
	path: &str,
) -> Result<Url, ConfigError> {
	let url = match custom.filter(|raw| !raw.trim().is_empty()) {
		Some(raw) => parse_url(key, raw)?,
		None => derive_endpoint(site_url, path)
			.map_err(|source| ConfigError::InvalidUrl { key, source })?,
	};

	validate_endpoint(key, &url)?;

	Ok(url)
}

/// Joins `path` under the site URL, keeping any sub-directory the forum is mounted on.
fn derive_endpoint(site_url: &Url, path: &str) -> Result<Url, url::ParseError> {
	let mut base = site_url.clone();

	base.set_query(None);
	base.set_fragment(None);

	if !base.path().ends_with('/') {
		let with_slash = format!("{}/", base.path());

		base.set_path(&with_slash);
	}

	base.join(path)
}

fn validate_endpoint(key: &'static str, url: &Url) -> Result<(), ConfigError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(ConfigError::InsecureEndpoint { key, url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => ip.is_loopback(),
		Some(Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn complete() -> ProviderConfigBuilder {
		ProviderConfig::builder()
			.site_url("https://forum.example.com/community")
			.client_id("client-123")
			.client_secret("secret-456")
			.scopes("user:read alert:read profile_post:read")
			.redirect_uri("https://app.example.com/api/auth/callback/xenforo")
	}

	#[test]
	fn endpoints_derive_from_site_url() {
		let config = complete().build().expect("Complete configuration should build.");

		assert_eq!(
			config.endpoints.authorization.as_str(),
			"https://forum.example.com/community/oauth2/authorize"
		);
		assert_eq!(config.endpoints.token.as_str(), "https://forum.example.com/community/oauth2/token");
		assert_eq!(config.endpoints.profile.as_str(), "https://forum.example.com/community/api/me");
		assert_eq!(config.scope.normalized(), "user:read alert:read profile_post:read");
		assert_eq!(config.http_timeout, ProviderConfig::DEFAULT_HTTP_TIMEOUT);
	}

	#[test]
	fn trailing_slash_and_overrides_are_honored() {
		let config = complete()
			.site_url("https://forum.example.com/")
			.token_endpoint("https://forum.example.com/api/oauth2/token")
			.http_timeout(StdDuration::from_secs(3))
			.build()
			.expect("Configuration with overrides should build.");

		assert_eq!(config.endpoints.authorization.as_str(), "https://forum.example.com/oauth2/authorize");
		assert_eq!(config.endpoints.token.as_str(), "https://forum.example.com/api/oauth2/token");
		assert_eq!(config.http_timeout, StdDuration::from_secs(3));
	}

	#[test]
	fn missing_required_settings_are_rejected() {
		let mut builder = complete();

		builder.site_url = None;

		assert!(matches!(
			builder.build(),
			Err(ConfigError::MissingSetting { key: env::SITE_URL })
		));

		let mut builder = complete();

		builder.client_id = Some("   ".into());

		assert!(matches!(
			builder.build(),
			Err(ConfigError::MissingSetting { key: env::CLIENT_ID })
		));

		let mut builder = complete();

		builder.client_secret = None;

		assert!(matches!(
			builder.build(),
			Err(ConfigError::MissingSetting { key: env::CLIENT_SECRET })
		));
	}

	#[test]
	fn insecure_endpoints_are_rejected_except_loopback() {
		let err = complete()
			.site_url("http://forum.example.com")
			.build()
			.expect_err("Plain HTTP forums must be rejected.");

		assert!(matches!(err, ConfigError::InsecureEndpoint { .. }));
		assert!(complete().site_url("http://127.0.0.1:8080").build().is_ok());
		assert!(complete().site_url("http://localhost:8080").build().is_ok());
	}

	#[test]
	fn zero_timeout_is_rejected() {
		let err = complete()
			.http_timeout(StdDuration::ZERO)
			.build()
			.expect_err("A zero timeout must be rejected.");

		assert!(matches!(err, ConfigError::InvalidNumber { .. }));

		let mut builder = complete();

		builder.http_timeout_secs = Some(0);

		assert!(matches!(builder.build(), Err(ConfigError::InvalidNumber { .. })));
	}

	#[test]
	fn sub_second_timeouts_are_kept() {
		let mut builder = complete().http_timeout(StdDuration::from_millis(500));

		builder.http_timeout_secs = Some(30);

		let config = builder.build().expect("Sub-second timeouts should build.");

		assert_eq!(config.http_timeout, StdDuration::from_millis(500));
	}

	#[test]
	fn builder_deserializes_from_json() {
		let builder: ProviderConfigBuilder = serde_json::from_str(
			r#"{
				"site_url": "https://forum.example.com",
				"client_id": "cid",
				"client_secret": "secret",
				"scopes": "user:read",
				"redirect_uri": "https://app.example.com/callback"
			}"#,
		)
		.expect("Builder should deserialize from JSON.");
		let config = builder.build().expect("Deserialized builder should build.");

		assert_eq!(config.client_id, "cid");
		assert!(config.scope.contains("user:read"));
	}
}
