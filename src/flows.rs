//! Sign-in orchestration built around [`Authenticator`].

pub mod auth_code_pkce;

pub use auth_code_pkce::*;

// self
use crate::{
	_prelude::*,
	config::{ProviderConfig, Settings},
	http::ProviderHttpClient,
	session::SessionSigner,
};
#[cfg(feature = "reqwest")]
use crate::{error::ConfigError, http::ReqwestHttpClient};

/// Authenticator specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestAuthenticator = Authenticator<ReqwestHttpClient>;

/// Drives the XenForo sign-in flow for a single provider configuration.
///
/// The authenticator only holds immutable configuration, the session signer, and a
/// shareable HTTP client, so one instance can serve every concurrent sign-in. Per-attempt
/// state ([`AuthorizationState`]) is owned by the caller between the redirect and the
/// callback.
pub struct Authenticator<C>
where
	C: ?Sized + ProviderHttpClient,
{
	/// HTTP client used for every outbound provider request.
	pub http_client: Arc<C>,
	/// Provider configuration shared by all attempts.
	pub config: Arc<ProviderConfig>,
	/// Signer for issued session tokens.
	pub signer: SessionSigner,
}
impl<C> Authenticator<C>
where
	C: ?Sized + ProviderHttpClient,
{
	/// Creates an authenticator that reuses the caller-provided transport.
	pub fn with_http_client(settings: Settings, http_client: impl Into<Arc<C>>) -> Self {
		let Settings { provider, session } = settings;

		Self {
			http_client: http_client.into(),
			config: Arc::new(provider),
			signer: SessionSigner::new(&session),
		}
	}
}
#[cfg(feature = "reqwest")]
impl Authenticator<ReqwestHttpClient> {
	/// Creates an authenticator backed by a reqwest client bounded by the configured timeout.
	pub fn new(settings: Settings) -> Result<Self, ConfigError> {
		let http_client = ReqwestHttpClient::with_timeout(settings.provider.http_timeout)?;

		Ok(Self::with_http_client(settings, http_client))
	}

	/// Loads [`Settings`] from the process environment and builds the authenticator.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::new(Settings::from_env()?)
	}
}
impl<C> Clone for Authenticator<C>
where
	C: ?Sized + ProviderHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			config: self.config.clone(),
			signer: self.signer.clone(),
		}
	}
}
impl<C> Debug for Authenticator<C>
where
	C: ?Sized + ProviderHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Authenticator")
			.field("site_url", &self.config.site_url.as_str())
			.field("client_id", &self.config.client_id)
			.field("scope", &self.config.scope)
			.field("signer", &self.signer)
			.finish_non_exhaustive()
	}
}
