//! Authorization Code + PKCE sign-in pipeline.
//!
//! [`Authenticator::start_authorization`] produces the redirect and the attempt-scoped
//! [`AuthorizationState`]. When the forum redirects back,
//! [`Authenticator::complete_sign_in`] validates the callback, trades the code for tokens,
//! threads the opportunistically resolved profile (if any) into the fallback lookup, and
//! signs the resulting session. Only callback, token endpoint, and signing failures abort a
//! sign-in; profile failures degrade to the placeholder identity.

mod callback;
mod session;

pub use callback::*;
pub use session::*;

// self
use crate::{
	_prelude::*,
	flows::Authenticator,
	http::ProviderHttpClient,
	identity::CanonicalProfile,
	oauth::{self, TokenBundle},
	obs::{self, FlowOutcome, FlowSpan, FlowStage},
	profile,
	session::{SessionToken, SignInGrant, SignedSession, TokenPayload, expose_session, issue_token},
};

impl<C> Authenticator<C>
where
	C: ?Sized + ProviderHttpClient,
{
	/// Generates PKCE + state material and builds the authorization redirect.
	pub fn start_authorization(&self) -> Result<AuthorizationSession> {
		const STAGE: FlowStage = FlowStage::Authorize;

		let span = FlowSpan::new(STAGE);

		obs::record_flow_outcome(STAGE, FlowOutcome::Attempt);

		let result = span.in_scope(|| session::build_session(&self.config));

		obs::record_result(STAGE, &result);

		result
	}

	/// Trades an authorization code for tokens (plus an opportunistic profile).
	pub async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<TokenBundle> {
		const STAGE: FlowStage = FlowStage::TokenExchange;

		let span = FlowSpan::new(STAGE);

		obs::record_flow_outcome(STAGE, FlowOutcome::Attempt);

		let result = span
			.instrument(oauth::exchange_authorization_code(
				self.http_client.as_ref(),
				&self.config,
				code,
				code_verifier,
			))
			.await;

		obs::record_result(STAGE, &result);

		result
	}

	/// Fetches and normalizes the profile for an access token (fallback lookup).
	pub async fn resolve_profile(&self, access_token: &str) -> Result<CanonicalProfile> {
		const STAGE: FlowStage = FlowStage::FallbackProfile;

		let span = FlowSpan::new(STAGE);

		obs::record_flow_outcome(STAGE, FlowOutcome::Attempt);

		let result = span
			.instrument(profile::resolve_profile(self.http_client.as_ref(), &self.config, access_token))
			.await;

		obs::record_result(STAGE, &result);

		result
	}

	/// Returns `resolved` when present; otherwise runs the fallback lookup and converts every
	/// failure into [`CanonicalProfile::degraded`].
	pub async fn resolve_profile_or_degraded(
		&self,
		resolved: Option<CanonicalProfile>,
		access_token: &str,
	) -> CanonicalProfile {
		const STAGE: FlowStage = FlowStage::FallbackProfile;

		if let Some(profile) = resolved {
			return profile;
		}

		let span = FlowSpan::new(STAGE);

		obs::record_flow_outcome(STAGE, FlowOutcome::Attempt);

		let result = span
			.instrument(profile::resolve_profile(self.http_client.as_ref(), &self.config, access_token))
			.await;

		match result {
			Ok(profile) if profile.is_degraded() => {
				obs::record_degraded(STAGE, &"profile payload carries no usable identity");

				profile
			},
			Ok(profile) => {
				obs::record_flow_outcome(STAGE, FlowOutcome::Success);

				profile
			},
			Err(e) => {
				obs::record_degraded(STAGE, &e);

				CanonicalProfile::degraded()
			},
		}
	}

	/// Completes a sign-in from the forum's redirect and returns the signed session.
	pub async fn complete_sign_in(
		&self,
		pending: &AuthorizationState,
		callback: &CallbackParams,
	) -> Result<SignedSession> {
		const STAGE: FlowStage = FlowStage::SignIn;

		let span = FlowSpan::new(STAGE);

		obs::record_flow_outcome(STAGE, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let code = callback.authorization_code(pending)?;
				let bundle = self.exchange_code(code, pending.code_verifier()).await?;
				let TokenBundle { access_token, profile, .. } = bundle;
				let profile =
					self.resolve_profile_or_degraded(profile, access_token.expose()).await;
				let grant = SignInGrant { access_token, profile: Some(profile) };
				let claims = issue_token(TokenPayload::default(), Some(grant));

				self.signer.issue(claims, OffsetDateTime::now_utc())
			})
			.await;

		obs::record_result(STAGE, &result);

		result
	}

	/// Verifies a previously issued session token and returns its session view.
	pub fn session(&self, token: &str) -> Result<SessionToken> {
		let claims = self.signer.verify(token)?;

		Ok(expose_session(&claims)?)
	}
}
