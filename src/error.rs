//! Error types shared by configuration, provider calls, and session handling.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Only configuration, callback validation, token endpoint, and session failures abort a
/// sign-in attempt. Profile failures are degraded by the sign-in pipeline instead.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Session signing or verification failure.
	#[error(transparent)]
	Session(#[from] SessionError),

	/// Token endpoint answered with a non-success status.
	#[error("Token endpoint returned HTTP {status}: {body}")]
	TokenExchange {
		/// HTTP status code returned by the provider.
		status: u16,
		/// Response body, verbatim.
		body: String,
	},
	/// Token endpoint answered with JSON that is not a usable token response.
	#[error("Token endpoint returned a malformed response (HTTP {status}).")]
	TokenResponseParse {
		/// Structured parsing failure, including the offending JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Profile endpoint answered with a non-success status.
	#[error("Profile endpoint returned HTTP {status}: {body}")]
	ProfileFetch {
		/// HTTP status code returned by the provider.
		status: u16,
		/// Response body, verbatim.
		body: String,
	},
	/// Profile endpoint answered with a body that is not JSON.
	#[error("Profile endpoint returned malformed JSON (HTTP {status}).")]
	ProfileResponseParse {
		/// Underlying JSON failure.
		#[source]
		source: serde_json::Error,
		/// HTTP status code of the response.
		status: u16,
	},
	/// A profile lookup was attempted without an access token.
	#[error("No access token is available for the profile request.")]
	MissingCredential,
	/// The `state` returned by the provider does not match the pending attempt.
	#[error("Authorization state mismatch.")]
	StateMismatch,
	/// The provider redirected back with an OAuth error instead of a code.
	#[error("Provider denied the authorization request: {error}.")]
	AuthorizationDenied {
		/// OAuth `error` code.
		error: String,
		/// Optional OAuth `error_description`.
		description: Option<String>,
	},
	/// The callback query is missing required parameters.
	#[error("Authorization callback is invalid: {reason}.")]
	InvalidCallback {
		/// Human-readable reason.
		reason: String,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required setting was not supplied.
	#[error("Missing required setting `{key}`.")]
	MissingSetting {
		/// Setting name (environment variable or builder field).
		key: &'static str,
	},
	/// A URL setting cannot be parsed.
	#[error("Setting `{key}` is not a valid URL.")]
	InvalidUrl {
		/// Setting name.
		key: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A provider endpoint does not use HTTPS and is not a loopback address.
	#[error("The {key} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Setting name.
		key: &'static str,
		/// Offending URL.
		url: String,
	},
	/// Requested scopes cannot be parsed.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// A numeric setting is malformed or out of range.
	#[error("Setting `{key}` has an invalid value: {value}.")]
	InvalidNumber {
		/// Setting name.
		key: &'static str,
		/// Raw value that failed to parse.
		value: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Endpoint label (`token` or `profile`).
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling a provider endpoint.")]
	Io(#[from] std::io::Error),
	/// The HTTP client failed without a structured error.
	#[error("HTTP client error occurred while calling the {endpoint} endpoint: {message}.")]
	Other {
		/// Endpoint label (`token` or `profile`).
		endpoint: &'static str,
		/// Client-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}
}

/// Session token signing and verification failures.
#[derive(Debug, ThisError)]
pub enum SessionError {
	/// Session claims could not be signed.
	#[error("Session token could not be signed.")]
	Sign(#[source] jsonwebtoken::errors::Error),
	/// Session token failed verification (bad signature, malformed, or expired).
	#[error("Session token is invalid.")]
	Verify(#[source] jsonwebtoken::errors::Error),
	/// Configured maximum age does not fit in a timestamp.
	#[error("Session max age is out of range.")]
	MaxAgeOutOfRange,
	/// Session claims carry an expiry that is not a valid timestamp.
	#[error("Session expiry {exp} is not a valid timestamp.")]
	InvalidExpiry {
		/// Raw `exp` claim.
		exp: i64,
	},
}
