// std
use std::sync::atomic::{AtomicUsize, Ordering};
// self
use xenforo_auth::{
	_preludet::*,
	error::{Error, TransportError},
	flows::{AuthorizationState, Authenticator, CallbackParams},
	http::ProviderHttpClient,
	oauth::{
		self,
		oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse},
	},
};

#[derive(Debug)]
enum FakeTransportError {
	Unreachable,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Unreachable => write!(f, "Forum is unreachable."),
		}
	}
}
impl StdError for FakeTransportError {}

/// Scripted forum: the token endpoint always succeeds, and the first `profile_failures`
/// profile requests fail at the network layer before the profile becomes reachable.
#[derive(Default)]
struct FakeForum {
	profile_failures: usize,
	token_calls: AtomicUsize,
	profile_calls: AtomicUsize,
}
impl FakeForum {
	fn flaky_profile(profile_failures: usize) -> Arc<Self> {
		Arc::new(Self { profile_failures, ..Default::default() })
	}

	fn respond(
		&self,
		request: &HttpRequest,
	) -> Result<HttpResponse, HttpClientError<FakeTransportError>> {
		let body = match request.uri().path() {
			"/oauth2/token" => {
				self.token_calls.fetch_add(1, Ordering::SeqCst);

				r#"{"access_token":"tok1","token_type":"Bearer"}"#
			},
			"/api/me" => {
				let attempt = self.profile_calls.fetch_add(1, Ordering::SeqCst);

				if attempt < self.profile_failures {
					return Err(HttpClientError::Reqwest(Box::new(
						FakeTransportError::Unreachable,
					)));
				}

				r#"{"me":{"user_id":"7","username":"carol","avatar_urls":{"l":"https://cdn.example.com/l/7.jpg"}}}"#
			},
			other => panic!("Unexpected request path {other}."),
		};
		let mut response = HttpResponse::new(body.as_bytes().to_vec());

		*response.status_mut() = oauth::oauth2::http::StatusCode::OK;

		Ok(response)
	}
}

#[derive(Clone)]
struct FakeHttpClient(Arc<FakeForum>);
impl ProviderHttpClient for FakeHttpClient {
	type Handle = FakeHttpHandle;
	type TransportError = FakeTransportError;

	fn handle(&self) -> Self::Handle {
		FakeHttpHandle(self.0.clone())
	}
}

struct FakeHttpHandle(Arc<FakeForum>);
impl<'a> AsyncHttpClient<'a> for FakeHttpHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, request: HttpRequest) -> Self::Future {
		let forum = self.0.clone();

		Box::pin(async move { forum.respond(&request) })
	}
}

#[tokio::test]
async fn network_failure_on_opportunistic_lookup_falls_back() {
	let forum = FakeForum::flaky_profile(1);
	let settings = test_settings("https://forum.example.com");
	let authenticator: Authenticator<FakeHttpClient> =
		Authenticator::with_http_client(settings, FakeHttpClient(forum.clone()));
	let pending = AuthorizationState::from_parts("v1", "state-1");
	let callback = CallbackParams::from_query("code=abc123&state=state-1");
	let bundle = authenticator
		.exchange_code("abc123", pending.code_verifier())
		.await
		.expect("Exchange should survive a failed profile lookup.");

	assert_eq!(bundle.access_token.expose(), "tok1");
	assert!(bundle.profile.is_none());

	let profile = authenticator
		.resolve_profile(bundle.access_token.expose())
		.await
		.expect("Fallback lookup should reach the forum.");

	assert_eq!(profile.subject_id, "7");
	assert_eq!(profile.display_name, "carol");
	assert_eq!(profile.avatar_url.as_deref(), Some("https://cdn.example.com/l/7.jpg"));

	let forum = FakeForum::flaky_profile(1);
	let authenticator: Authenticator<FakeHttpClient> = Authenticator::with_http_client(
		test_settings("https://forum.example.com"),
		FakeHttpClient(forum.clone()),
	);
	let signed = authenticator
		.complete_sign_in(&pending, &callback)
		.await
		.expect("Sign-in should use the fallback profile.");

	assert_eq!(forum.token_calls.load(Ordering::SeqCst), 1);
	assert_eq!(forum.profile_calls.load(Ordering::SeqCst), 2);
	assert_eq!(signed.session.user.id, "7");
	assert_eq!(signed.session.user.name, "carol");
	assert_eq!(signed.session.user.email, None);
	assert_eq!(signed.session.user.image.as_deref(), Some("https://cdn.example.com/l/7.jpg"));
}

#[tokio::test]
async fn fallback_network_failure_surfaces_transport_error() {
	let forum = FakeForum::flaky_profile(usize::MAX);
	let http_client = FakeHttpClient(forum.clone());
	let settings = test_settings("https://forum.example.com");
	let err = xenforo_auth::profile::resolve_profile(&http_client, &settings.provider, "tok1")
		.await
		.expect_err("Network failures must surface from the resolver.");

	assert!(matches!(err, Error::Transport(TransportError::Network { endpoint: "profile", .. })));

	let authenticator: Authenticator<FakeHttpClient> =
		Authenticator::with_http_client(settings, http_client);
	let profile = authenticator.resolve_profile_or_degraded(None, "tok1").await;

	assert!(profile.is_degraded());
	assert_eq!(forum.profile_calls.load(Ordering::SeqCst), 2);
}
