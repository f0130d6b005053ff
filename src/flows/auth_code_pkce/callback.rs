// self
use crate::{_prelude::*, flows::auth_code_pkce::AuthorizationState};

/// Query parameters the forum appends to the redirect URI.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackParams {
	/// Authorization code issued on consent.
	pub code: Option<String>,
	/// Echoed anti-forgery state.
	pub state: Option<String>,
	/// OAuth error code when the user or forum refused the request.
	pub error: Option<String>,
	/// Human-readable error detail.
	pub error_description: Option<String>,
}
impl CallbackParams {
	/// Parses a raw query string (with or without the leading `?`). Empty values are ignored.
	pub fn from_query(query: &str) -> Self {
		let mut params = Self::default();

		for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
			if value.trim().is_empty() {
				continue;
			}

			let slot = match &*key {
				"code" => &mut params.code,
				"state" => &mut params.state,
				"error" => &mut params.error,
				"error_description" => &mut params.error_description,
				_ => continue,
			};

			*slot = Some(value.into_owned());
		}

		params
	}

	/// Parses the query component of a full callback URL.
	pub fn from_url(url: &Url) -> Self {
		Self::from_query(url.query().unwrap_or_default())
	}

	/// Validates the callback against the pending attempt and returns the authorization code.
	///
	/// Provider errors take precedence, then the `state` check, then the presence of `code`.
	pub fn authorization_code(&self, pending: &AuthorizationState) -> Result<&str> {
		if let Some(error) = &self.error {
			return Err(Error::AuthorizationDenied {
				error: error.clone(),
				description: self.error_description.clone(),
			});
		}

		let state = self
			.state
			.as_deref()
			.ok_or_else(|| Error::InvalidCallback { reason: "missing `state` parameter".into() })?;

		pending.validate_state(state)?;

		self.code
			.as_deref()
			.ok_or_else(|| Error::InvalidCallback { reason: "missing `code` parameter".into() })
	}
}
