//! Current-user lookups against the forum's `/api/me` endpoint.
//!
//! [`fetch_me`] is shared by the opportunistic lookup performed right after the token
//! exchange and by the fallback [`resolve_profile`] lookup. Both issue a single bearer GET
//! without retries; the caller decides whether a failure is fatal.

// crates.io
use oauth2::AsyncHttpClient;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	config::ProviderConfig,
	http::{self, ProviderHttpClient},
	identity::{self, CanonicalProfile},
	oauth,
};

pub(crate) const PROFILE_ENDPOINT: &str = "profile";

/// Fetches the raw `/api/me` payload for an access token.
///
/// Fails with [`Error::MissingCredential`] for a blank token, [`Error::ProfileFetch`] for a
/// non-success status, and [`Error::ProfileResponseParse`] for a body that is not JSON.
pub async fn fetch_me<C>(
	http_client: &C,
	config: &ProviderConfig,
	access_token: &str,
) -> Result<Value>
where
	C: ?Sized + ProviderHttpClient,
{
	if access_token.trim().is_empty() {
		return Err(Error::MissingCredential);
	}

	let request = http::bearer_get(&config.endpoints.profile, access_token)?;
	let handle = http_client.handle();
	let response = handle
		.call(request)
		.await
		.map_err(|e| oauth::map_transport_error(PROFILE_ENDPOINT, e))?;
	let status = response.status().as_u16();

	if !response.status().is_success() {
		return Err(Error::ProfileFetch { status, body: http::body_text(&response) });
	}

	serde_json::from_slice(response.body())
		.map_err(|source| Error::ProfileResponseParse { source, status })
}

/// Resolves the canonical profile for an access token (fallback path).
///
/// A payload without an identity container is not an error: the degraded profile is
/// returned so sign-in never blocks on profile completeness.
pub async fn resolve_profile<C>(
	http_client: &C,
	config: &ProviderConfig,
	access_token: &str,
) -> Result<CanonicalProfile>
where
	C: ?Sized + ProviderHttpClient,
{
	let payload = fetch_me(http_client, config, access_token).await?;

	Ok(identity::normalize(&payload))
}
