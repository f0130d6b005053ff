//! Session assembly: folds the sign-in result into signed, stateless session claims.
//!
//! The flow is two pure transitions plus signing:
//!
//! 1. [`issue_token`] merges an optional [`SignInGrant`] into the [`TokenPayload`] claims.
//! 2. [`expose_session`] turns the claims into the [`SessionToken`] view handed to the rest of
//!    the application.
//! 3. [`SessionSigner`] stamps `iat`/`exp`, signs the claims as an HS256 JWT, and verifies
//!    tokens presented later.

// crates.io
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::SessionConfig,
	error::SessionError,
	identity::{CanonicalProfile, UNKNOWN_DISPLAY_NAME, UNKNOWN_SUBJECT},
};

/// Claims carried inside the signed session token.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPayload {
	/// Forum access token obtained during sign-in.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access_token: Option<TokenSecret>,
	/// Forum user id.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sub: Option<String>,
	/// Display name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Email address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Avatar URL.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub picture: Option<String>,
	/// Issued-at, in Unix seconds.
	#[serde(default)]
	pub iat: i64,
	/// Expiry, in Unix seconds.
	#[serde(default)]
	pub exp: i64,
}

/// Data available at the moment the provider account is linked.
#[derive(Clone, Debug)]
pub struct SignInGrant {
	/// Access token returned by the token endpoint.
	pub access_token: TokenSecret,
	/// Resolved profile, if any stage produced one.
	pub profile: Option<CanonicalProfile>,
}

/// User portion of [`SessionToken`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
	/// Forum user id (`"unknown"` when it could not be resolved).
	pub id: String,
	/// Display name (`"Unknown User"` when it could not be resolved).
	pub name: String,
	/// Email address.
	pub email: Option<String>,
	/// Avatar URL.
	pub image: Option<String>,
}

/// Session view exposed to the application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
	/// Forum access token, for calling the forum API on the user's behalf.
	pub access_token: Option<TokenSecret>,
	/// Normalized user identity.
	pub user: SessionUser,
	/// Session expiry.
	#[serde(with = "time::serde::rfc3339")]
	pub expires: OffsetDateTime,
}

/// Compact JWS paired with its decoded session view.
#[derive(Clone, Debug)]
pub struct SignedSession {
	/// Signed session token (HS256 JWT).
	pub token: TokenSecret,
	/// Decoded session view.
	pub session: SessionToken,
}

/// Merges a sign-in grant into the session claims.
///
/// Without a grant the claims are returned untouched. Profile fields are only written when
/// present, and an existing `name` is never replaced by a blank one.
pub fn issue_token(mut token: TokenPayload, grant: Option<SignInGrant>) -> TokenPayload {
	let Some(grant) = grant else {
		return token;
	};

	token.access_token = Some(grant.access_token);

	if let Some(profile) = grant.profile {
		token.sub = Some(profile.subject_id);

		if !profile.display_name.trim().is_empty() {
			token.name = Some(profile.display_name);
		}
		if profile.email.is_some() {
			token.email = profile.email;
		}
		if profile.avatar_url.is_some() {
			token.picture = profile.avatar_url;
		}
	}

	token
}

/// Builds the application-facing session view from signed claims.
pub fn expose_session(token: &TokenPayload) -> Result<SessionToken, SessionError> {
	let expires = OffsetDateTime::from_unix_timestamp(token.exp)
		.map_err(|_| SessionError::InvalidExpiry { exp: token.exp })?;

	Ok(SessionToken {
		access_token: token.access_token.clone(),
		user: SessionUser {
			id: token.sub.clone().unwrap_or_else(|| UNKNOWN_SUBJECT.into()),
			name: token.name.clone().unwrap_or_else(|| UNKNOWN_DISPLAY_NAME.into()),
			email: token.email.clone(),
			image: token.picture.clone(),
		},
		expires,
	})
}

/// HS256 signer/verifier for session tokens.
#[derive(Clone)]
pub struct SessionSigner {
	encoding: EncodingKey,
	decoding: DecodingKey,
	validation: Validation,
	max_age: Duration,
}
impl SessionSigner {
	/// Creates a signer from the session configuration.
	pub fn new(config: &SessionConfig) -> Self {
		let secret = config.secret.expose().as_bytes();

		Self {
			encoding: EncodingKey::from_secret(secret),
			decoding: DecodingKey::from_secret(secret),
			validation: Validation::new(Algorithm::HS256),
			max_age: config.max_age,
		}
	}

	/// Lifetime stamped on newly issued sessions.
	pub fn max_age(&self) -> Duration {
		self.max_age
	}

	/// Stamps `iat`/`exp` relative to `now`, signs the claims, and returns the session view.
	pub fn issue(&self, mut payload: TokenPayload, now: OffsetDateTime) -> Result<SignedSession> {
		let expires = now.checked_add(self.max_age).ok_or(SessionError::MaxAgeOutOfRange)?;

		payload.iat = now.unix_timestamp();
		payload.exp = expires.unix_timestamp();

		let token = self.sign(&payload)?;
		let session = expose_session(&payload)?;

		Ok(SignedSession { token: TokenSecret::new(token), session })
	}

	/// Signs the claims as-is.
	pub fn sign(&self, payload: &TokenPayload) -> Result<String, SessionError> {
		jsonwebtoken::encode(&Header::new(Algorithm::HS256), payload, &self.encoding)
			.map_err(SessionError::Sign)
	}

	/// Verifies a token's signature and expiry, returning its claims.
	pub fn verify(&self, token: &str) -> Result<TokenPayload, SessionError> {
		jsonwebtoken::decode::<TokenPayload>(token, &self.decoding, &self.validation)
			.map(|data| data.claims)
			.map_err(SessionError::Verify)
	}
}
impl Debug for SessionSigner {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionSigner").field("max_age", &self.max_age).finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn signer(secret: &str) -> SessionSigner {
		SessionSigner::new(&SessionConfig::new(secret).expect("Session config should build."))
	}

	fn profile() -> CanonicalProfile {
		CanonicalProfile {
			subject_id: "42".into(),
			display_name: "alice".into(),
			email: Some("a@x.com".into()),
			avatar_url: None,
		}
	}

	#[test]
	fn issue_without_grant_keeps_claims() {
		let token = TokenPayload { name: Some("kept".into()), ..Default::default() };

		assert_eq!(issue_token(token.clone(), None), token);
	}

	#[test]
	fn issue_with_profile_populates_identity() {
		let grant = SignInGrant { access_token: TokenSecret::new("tok1"), profile: Some(profile()) };
		let token = issue_token(TokenPayload::default(), Some(grant));

		assert_eq!(token.access_token.as_ref().map(TokenSecret::expose), Some("tok1"));
		assert_eq!(token.sub.as_deref(), Some("42"));
		assert_eq!(token.name.as_deref(), Some("alice"));
		assert_eq!(token.email.as_deref(), Some("a@x.com"));
		assert_eq!(token.picture, None);
	}

	#[test]
	fn blank_display_name_never_overwrites_name() {
		let grant = SignInGrant {
			access_token: TokenSecret::new("tok1"),
			profile: Some(CanonicalProfile { display_name: " ".into(), ..profile() }),
		};
		let token = TokenPayload { name: Some("existing".into()), ..Default::default() };

		assert_eq!(issue_token(token, Some(grant)).name.as_deref(), Some("existing"));
	}

	#[test]
	fn grant_without_profile_only_stores_access_token() {
		let grant = SignInGrant { access_token: TokenSecret::new("tok1"), profile: None };
		let token = issue_token(TokenPayload::default(), Some(grant));

		assert!(token.access_token.is_some());
		assert_eq!(token.sub, None);
		assert_eq!(token.name, None);
	}

	#[test]
	fn exposed_session_defaults_identity() {
		let session =
			expose_session(&TokenPayload { exp: 1_700_000_000, ..Default::default() })
				.expect("Valid expiry should expose.");

		assert_eq!(session.access_token, None);
		assert_eq!(session.user.id, UNKNOWN_SUBJECT);
		assert_eq!(session.user.name, UNKNOWN_DISPLAY_NAME);
		assert_eq!(session.user.email, None);
		assert_eq!(session.user.image, None);
		assert_eq!(session.expires.unix_timestamp(), 1_700_000_000);
	}

	#[test]
	fn out_of_range_expiry_is_rejected() {
		assert!(matches!(
			expose_session(&TokenPayload { exp: i64::MAX, ..Default::default() }),
			Err(SessionError::InvalidExpiry { .. })
		));
	}

	#[test]
	fn exposed_session_serializes_camel_case() {
		let grant = SignInGrant { access_token: TokenSecret::new("tok1"), profile: Some(profile()) };
		let token = issue_token(TokenPayload { exp: 0, ..Default::default() }, Some(grant));
		let json = serde_json::to_value(expose_session(&token).expect("Expiry should expose."))
			.expect("Session should serialize.");

		assert_eq!(json["accessToken"], "tok1");
		assert_eq!(json["user"]["id"], "42");
		assert_eq!(json["user"]["image"], serde_json::Value::Null);
		assert_eq!(json["expires"], "1970-01-01T00:00:00Z");
	}

	#[test]
	fn issued_sessions_verify_with_the_same_secret_only() {
		let issuer = signer("session-secret");
		let now = OffsetDateTime::now_utc();
		let grant = SignInGrant { access_token: TokenSecret::new("tok1"), profile: Some(profile()) };
		let signed = issuer
			.issue(issue_token(TokenPayload::default(), Some(grant)), now)
			.expect("Session should sign.");

		assert_eq!(
			signed.session.expires.unix_timestamp(),
			(now + SessionConfig::DEFAULT_MAX_AGE).unix_timestamp()
		);

		let claims = issuer.verify(signed.token.expose()).expect("Session should verify.");

		assert_eq!(claims.sub.as_deref(), Some("42"));
		assert_eq!(claims.iat, now.unix_timestamp());
		assert!(matches!(
			signer("other-secret").verify(signed.token.expose()),
			Err(SessionError::Verify(_))
		));
	}

	#[test]
	fn expired_sessions_fail_verification() {
		let issuer = signer("session-secret");
		let now = OffsetDateTime::now_utc().unix_timestamp();
		let token = issuer
			.sign(&TokenPayload { iat: now - 7_200, exp: now - 3_600, ..Default::default() })
			.expect("Claims should sign.");

		assert!(matches!(issuer.verify(&token), Err(SessionError::Verify(_))));
	}

	#[test]
	fn debug_output_hides_key_material() {
		assert!(!format!("{:?}", signer("session-secret")).contains("session-secret"));
	}
}
