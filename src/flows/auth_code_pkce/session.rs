// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use constant_time_eq::constant_time_eq;
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret},
	config::{ProviderConfig, env},
	error::ConfigError,
};

const STATE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;

/// Supported PKCE challenge methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

/// Per-attempt PKCE verifier/challenge pair and anti-forgery `state`.
///
/// The value is owned by the in-flight sign-in attempt. Callers bind it to the browser
/// (typically in a short-lived, encrypted cookie) and hand it back to
/// [`Authenticator::complete_sign_in`](crate::flows::Authenticator::complete_sign_in)
/// when the provider redirects.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationState {
	code_verifier: TokenSecret,
	code_challenge: String,
	state: String,
}
impl AuthorizationState {
	/// Generates a fresh verifier, its S256 challenge, and an independent `state` value.
	pub fn generate() -> Self {
		Self::from_parts(random_string(PKCE_VERIFIER_LEN), random_string(STATE_LEN))
	}

	/// Restores a state previously handed to the caller, recomputing the challenge.
	pub fn from_parts(code_verifier: impl Into<String>, state: impl Into<String>) -> Self {
		let code_verifier = TokenSecret::new(code_verifier);
		let code_challenge = compute_pkce_challenge(code_verifier.expose());

		Self { code_verifier, code_challenge, state: state.into() }
	}

	/// PKCE verifier sent with the code exchange. Never log this value.
	pub fn code_verifier(&self) -> &str {
		self.code_verifier.expose()
	}

	/// PKCE code challenge derived from the verifier.
	pub fn code_challenge(&self) -> &str {
		&self.code_challenge
	}

	/// PKCE challenge method (currently always `S256`).
	pub fn code_challenge_method(&self) -> PkceCodeChallengeMethod {
		PkceCodeChallengeMethod::S256
	}

	/// Opaque value that must round-trip through the provider redirect.
	pub fn state(&self) -> &str {
		&self.state
	}

	/// Validates the `state` returned by the authorization redirect in constant time.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if constant_time_eq(returned_state.as_bytes(), self.state.as_bytes()) {
			Ok(())
		} else {
			Err(Error::StateMismatch)
		}
	}
}
impl Debug for AuthorizationState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationState")
			.field("code_verifier", &self.code_verifier)
			.field("code_challenge", &self.code_challenge)
			.field("state", &self.state)
			.finish()
	}
}

/// Authorization redirect returned by
/// [`Authenticator::start_authorization`](crate::flows::Authenticator::start_authorization).
#[derive(Clone, Debug)]
pub struct AuthorizationSession {
	/// Fully-formed authorize URL the browser should be sent to.
	pub authorize_url: Url,
	/// Attempt-scoped PKCE + state material the caller must keep until the callback.
	pub state: AuthorizationState,
}

pub(crate) fn build_session(config: &ProviderConfig) -> Result<AuthorizationSession> {
	let state = AuthorizationState::generate();
	let authorize_url = build_authorize_url(
		&config.endpoints.authorization,
		&config.client_id,
		&config.redirect_uri,
		&config.scope,
		&state,
	)?;

	Ok(AuthorizationSession { authorize_url, state })
}

/// Builds the provider authorization URL for one attempt.
///
/// Existing query parameters on `endpoint` are preserved and `scope` is always sent, even
/// when the set is empty. An empty client identifier is a configuration error.
pub fn build_authorize_url(
	endpoint: &Url,
	client_id: &str,
	redirect_uri: &Url,
	scope: &ScopeSet,
	state: &AuthorizationState,
) -> Result<Url> {
	if client_id.trim().is_empty() {
		return Err(ConfigError::MissingSetting { key: env::CLIENT_ID }.into());
	}

	let mut url = endpoint.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", client_id);
	pairs.append_pair("redirect_uri", redirect_uri.as_str());
	pairs.append_pair("scope", &scope.normalized());
	pairs.append_pair("state", state.state());
	pairs.append_pair("code_challenge", state.code_challenge());
	pairs.append_pair("code_challenge_method", state.code_challenge_method().as_str());

	drop(pairs);

	Ok(url)
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

fn compute_pkce_challenge(verifier: &str) -> String {
	let mut hasher = Sha256::new();

	hasher.update(verifier.as_bytes());

	let digest = hasher.finalize();

	URL_SAFE_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn fixture_url(raw: &str) -> Url {
		Url::parse(raw).expect("URL fixture should parse successfully.")
	}

	#[test]
	fn challenge_matches_rfc7636_vector() {
		let state = AuthorizationState::from_parts(
			"dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk",
			"state-fixture",
		);

		assert_eq!(state.code_challenge(), "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
		assert_eq!(state.code_challenge_method().as_str(), "S256");
	}

	#[test]
	fn generated_values_are_random_and_well_formed() {
		let first = AuthorizationState::generate();
		let second = AuthorizationState::generate();

		assert_eq!(first.code_verifier().len(), PKCE_VERIFIER_LEN);
		assert_eq!(first.state().len(), STATE_LEN);
		assert!(first.code_verifier().chars().all(|c| c.is_ascii_alphanumeric()));
		assert_ne!(first.code_verifier(), second.code_verifier());
		assert_ne!(first.state(), second.state());
		assert_ne!(first.state(), first.code_verifier());
	}

	#[test]
	fn state_validation_errors_on_mismatch() {
		let state = AuthorizationState::from_parts("verifier", "expected");

		assert!(state.validate_state("expected").is_ok());
		assert!(matches!(state.validate_state("other"), Err(Error::StateMismatch)));
		assert!(matches!(state.validate_state("expecte"), Err(Error::StateMismatch)));
		assert!(matches!(state.validate_state("expectedx"), Err(Error::StateMismatch)));
		assert!(matches!(state.validate_state(""), Err(Error::StateMismatch)));
	}

	#[test]
	fn debug_output_redacts_the_verifier() {
		let state = AuthorizationState::from_parts("very-secret-verifier", "s");
		let rendered = format!("{state:?}");

		assert!(!rendered.contains("very-secret-verifier"));
		assert!(rendered.contains("<redacted>"));
	}

	#[test]
	fn authorize_url_carries_every_parameter() {
		let state = AuthorizationState::from_parts("verifier", "state-123");
		let scope = ScopeSet::new(["user:read", "alert:read"]).expect("Scope fixture is valid.");
		let redirect = fixture_url("https://app.example.com/callback");
		let url = build_authorize_url(
			&fixture_url("https://forum.example.com/oauth2/authorize"),
			"client-1",
			&redirect,
			&scope,
			&state,
		)
		.expect("Authorize URL should build.");
		let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();

		assert_eq!(url.path(), "/oauth2/authorize");
		assert_eq!(pairs.len(), 7);
		assert_eq!(pairs.get("response_type"), Some(&"code".into()));
		assert_eq!(pairs.get("client_id"), Some(&"client-1".into()));
		assert_eq!(pairs.get("redirect_uri"), Some(&redirect.as_str().into()));
		assert_eq!(pairs.get("scope"), Some(&"user:read alert:read".into()));
		assert_eq!(pairs.get("state"), Some(&"state-123".into()));
		assert_eq!(pairs.get("code_challenge"), Some(&state.code_challenge().into()));
		assert_eq!(pairs.get("code_challenge_method"), Some(&"S256".into()));
	}

	#[test]
	fn authorize_url_always_carries_scope() {
		let state = AuthorizationState::from_parts("verifier", "state-123");
		let url = build_authorize_url(
			&fixture_url("https://forum.example.com/oauth2/authorize"),
			"client-1",
			&fixture_url("https://app.example.com/callback"),
			&ScopeSet::default(),
			&state,
		)
		.expect("Authorize URL should build with an empty scope set.");
		let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();

		assert_eq!(pairs.len(), 7);
		assert_eq!(pairs.get("scope"), Some(&String::new()));
	}

	#[test]
	fn authorize_url_requires_client_id() {
		let state = AuthorizationState::generate();
		let err = build_authorize_url(
			&fixture_url("https://forum.example.com/oauth2/authorize"),
			" ",
			&fixture_url("https://app.example.com/callback"),
			&ScopeSet::default(),
			&state,
		)
		.expect_err("An empty client id must be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::MissingSetting { key: env::CLIENT_ID })));
	}

	#[test]
	fn state_survives_serde_round_trip() {
		let state = AuthorizationState::generate();
		let stored = serde_json::to_string(&state).expect("State should serialize.");
		let restored: AuthorizationState =
			serde_json::from_str(&stored).expect("State should deserialize.");

		assert_eq!(restored, state);
		assert_eq!(restored.code_verifier(), state.code_verifier());
	}
}
