//! Transport primitives for provider calls.
//!
//! The module exposes [`ProviderHttpClient`] so applications can plug in their own HTTP
//! stack (or a fake in tests) while the flow code keeps building plain
//! [`HttpRequest`] values. The default [`ReqwestHttpClient`] applies the configured
//! timeout to every request and never follows redirects.

// std
use std::{ops::Deref, time::Duration as StdDuration};
// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
	http::{
		HeaderValue, Method,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
// self
use crate::{_prelude::*, error::ConfigError};

/// MIME type the provider is asked to answer with.
pub const MIME_JSON: &str = "application/json";
/// MIME type of the token request body.
pub const MIME_FORM: &str = "application/x-www-form-urlencoded";

/// Abstraction over HTTP transports capable of talking to the forum.
///
/// The trait is the crate's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync + 'static` so one client can be shared by every concurrent sign-in, and
/// the handles they return must own whatever state is required so their request futures
/// stay `Send` for the lifetime of the call.
pub trait ProviderHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle used for a single provider call.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds a handle for one outbound request.
	fn handle(&self) -> Self::Handle;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Provider endpoints answer directly, so redirects are disabled. Every request is bounded
/// by the client-level timeout configured in [`ReqwestHttpClient::with_timeout`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client with the provided request timeout and redirects disabled.
	pub fn with_timeout(timeout: StdDuration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	///
	/// The caller is responsible for configuring a timeout on the wrapped client.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ProviderHttpClient for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn handle(&self) -> Self::Handle {
		ReqwestHandle(self.0.clone())
	}
}

/// Handle returned by [`ReqwestHttpClient`] that satisfies [`ProviderHttpClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHandle(ReqwestClient);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Builds the form-encoded POST sent to the token endpoint.
pub(crate) fn form_post(url: &Url, form: &[(&str, &str)]) -> Result<HttpRequest, ConfigError> {
	let body = url::form_urlencoded::Serializer::new(String::new()).extend_pairs(form).finish();

	oauth2::http::Request::builder()
		.method(Method::POST)
		.uri(url.as_str())
		.header(CONTENT_TYPE, HeaderValue::from_static(MIME_FORM))
		.header(ACCEPT, HeaderValue::from_static(MIME_JSON))
		.body(body.into_bytes())
		.map_err(ConfigError::from)
}

/// Builds the bearer-authenticated GET sent to the profile endpoint.
pub(crate) fn bearer_get(url: &Url, access_token: &str) -> Result<HttpRequest, ConfigError> {
	oauth2::http::Request::builder()
		.method(Method::GET)
		.uri(url.as_str())
		.header(AUTHORIZATION, format!("Bearer {access_token}"))
		.header(ACCEPT, HeaderValue::from_static(MIME_JSON))
		.body(Vec::new())
		.map_err(ConfigError::from)
}

/// Returns the response body as text, replacing invalid UTF-8 sequences.
pub(crate) fn body_text(response: &HttpResponse) -> String {
	String::from_utf8_lossy(response.body()).into_owned()
}
