//! Authorization-code exchange against the forum's token endpoint.
//!
//! [`exchange_authorization_code`] posts the code and PKCE verifier, turns the JSON answer
//! into a [`TokenBundle`], and then makes one best-effort call to `/api/me`. That second
//! call never fails the exchange: its error is audited and dropped, leaving
//! [`TokenBundle::profile`] unset so the fallback resolver can run later.

pub use oauth2;

// crates.io
use oauth2::{AsyncHttpClient, HttpClientError};
use serde::{Deserializer, de::Error as DeError};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::ProviderConfig,
	error::{ConfigError, TransportError},
	http::{self, ProviderHttpClient},
	identity::{self, CanonicalProfile},
	obs::{self, FlowStage},
	profile,
};

pub(crate) const TOKEN_ENDPOINT: &str = "token";
const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Result of a successful authorization-code exchange.
#[derive(Clone)]
pub struct TokenBundle {
	/// Access token issued by the forum.
	pub access_token: TokenSecret,
	/// Token type reported by the forum (`Bearer` when omitted).
	pub token_type: String,
	/// Lifetime reported by the forum, in seconds.
	pub expires_in: Option<u64>,
	/// Complete token endpoint response.
	pub raw_response: Value,
	/// Profile resolved during the exchange, when the opportunistic lookup succeeded.
	pub profile: Option<CanonicalProfile>,
}
impl Debug for TokenBundle {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenBundle")
			.field("access_token", &self.access_token)
			.field("token_type", &self.token_type)
			.field("expires_in", &self.expires_in)
			.field("profile", &self.profile)
			.finish_non_exhaustive()
	}
}

#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
	#[serde(deserialize_with = "non_blank")]
	access_token: String,
	#[serde(default, deserialize_with = "lenient_string")]
	token_type: Option<String>,
	#[serde(default, deserialize_with = "lenient_seconds")]
	expires_in: Option<u64>,
}

/// Trades an authorization code for tokens, then opportunistically resolves the profile.
///
/// Fails with [`Error::TokenExchange`] (status + verbatim body) when the token endpoint
/// answers with a non-success status, and with [`Error::TokenResponseParse`] when the
/// answer lacks a usable `access_token`.
pub async fn exchange_authorization_code<C>(
	http_client: &C,
	config: &ProviderConfig,
	code: &str,
	code_verifier: &str,
) -> Result<TokenBundle>
where
	C: ?Sized + ProviderHttpClient,
{
	let mut bundle = request_tokens(http_client, config, code, code_verifier).await?;

	bundle.profile = opportunistic_profile(http_client, config, &bundle.access_token).await;

	Ok(bundle)
}

async fn request_tokens<C>(
	http_client: &C,
	config: &ProviderConfig,
	code: &str,
	code_verifier: &str,
) -> Result<TokenBundle>
where
	C: ?Sized + ProviderHttpClient,
{
	let form = [
		("grant_type", "authorization_code"),
		("client_id", config.client_id.as_str()),
		("client_secret", config.client_secret.expose()),
		("redirect_uri", config.redirect_uri.as_str()),
		("code", code),
		("code_verifier", code_verifier),
	];
	let request = http::form_post(&config.endpoints.token, &form)?;
	let handle = http_client.handle();
	let response =
		handle.call(request).await.map_err(|e| map_transport_error(TOKEN_ENDPOINT, e))?;
	let status = response.status().as_u16();

	if !response.status().is_success() {
		return Err(Error::TokenExchange { status, body: http::body_text(&response) });
	}

	parse_token_response(status, response.body())
}

fn parse_token_response(status: u16, body: &[u8]) -> Result<TokenBundle> {
	let mut de = serde_json::Deserializer::from_slice(body);
	let raw_response: Value = serde_path_to_error::deserialize(&mut de)
		.map_err(|source| Error::TokenResponseParse { source, status })?;
	let parsed: TokenEndpointResponse = serde_path_to_error::deserialize(&raw_response)
		.map_err(|source| Error::TokenResponseParse { source, status })?;

	Ok(TokenBundle {
		access_token: TokenSecret::new(parsed.access_token),
		token_type: parsed.token_type.unwrap_or_else(|| DEFAULT_TOKEN_TYPE.into()),
		expires_in: parsed.expires_in,
		raw_response,
		profile: None,
	})
}

/// Best-effort profile lookup; every failure is audited and turned into `None`.
async fn opportunistic_profile<C>(
	http_client: &C,
	config: &ProviderConfig,
	access_token: &TokenSecret,
) -> Option<CanonicalProfile>
where
	C: ?Sized + ProviderHttpClient,
{
	const STAGE: FlowStage = FlowStage::OpportunisticProfile;

	obs::record_flow_outcome(STAGE, obs::FlowOutcome::Attempt);

	match profile::fetch_me(http_client, config, access_token.expose()).await {
		Ok(payload) => match identity::try_normalize(&payload) {
			Some(found) => {
				obs::record_flow_outcome(STAGE, obs::FlowOutcome::Success);

				Some(found)
			},
			None => {
				obs::record_degraded(STAGE, &"profile payload has no `me` container");

				None
			},
		},
		Err(e) => {
			obs::record_degraded(STAGE, &e);

			None
		},
	}
}

/// Maps HTTP transport failures into crate [`Error`] values.
pub(crate) fn map_transport_error<E>(endpoint: &'static str, err: HttpClientError<E>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) => TransportError::network(endpoint, *inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransportError::Other { endpoint, message }.into(),
		_ => TransportError::Other { endpoint, message: "unrecognized client failure".into() }
			.into(),
	}
}

fn non_blank<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	let value = String::deserialize(deserializer)?;

	if value.trim().is_empty() {
		return Err(DeError::custom("value must not be blank"));
	}

	Ok(value)
}

// Optional fields never fail the exchange; unusable values read as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(match Value::deserialize(deserializer)? {
		Value::String(value) if !value.trim().is_empty() => Some(value),
		_ => None,
	})
}

fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(match Value::deserialize(deserializer)? {
		Value::Number(value) => value.as_u64(),
		Value::String(value) => value.trim().parse().ok(),
		_ => None,
	})
}
