//! Maps XenForo's `/api/me` payload onto the canonical profile shape.
//!
//! XenForo wraps the authenticated user inside a `me` object and uses its own field names
//! (`user_id`, `username`, `avatar_urls`). Everything here is pure and total: a missing or
//! mistyped field degrades to its documented default instead of failing.

// crates.io
use serde_json::{Map, Value};
// self
use crate::_prelude::*;

/// Subject identifier used when the provider does not supply one.
pub const UNKNOWN_SUBJECT: &str = "unknown";
/// Display name used when the provider does not supply one.
pub const UNKNOWN_DISPLAY_NAME: &str = "Unknown User";

const IDENTITY_CONTAINER: &str = "me";
/// Avatar size keys in order of preference (original upload first).
const AVATAR_PREFERENCE: [&str; 2] = ["o", "l"];

/// Provider-agnostic user identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalProfile {
	/// Forum user id rendered as a string; never empty.
	pub subject_id: String,
	/// Forum username; never empty.
	pub display_name: String,
	/// Email address, when the granted scopes expose it.
	pub email: Option<String>,
	/// Preferred avatar URL.
	pub avatar_url: Option<String>,
}
impl CanonicalProfile {
	/// Profile used when the provider's answer is unusable.
	pub fn degraded() -> Self {
		Self {
			subject_id: UNKNOWN_SUBJECT.into(),
			display_name: UNKNOWN_DISPLAY_NAME.into(),
			email: None,
			avatar_url: None,
		}
	}

	/// Returns true when no identifier could be recovered.
	pub fn is_degraded(&self) -> bool {
		self.subject_id == UNKNOWN_SUBJECT
	}
}

/// Returns the `me` container when the payload carries one.
pub fn locate(payload: &Value) -> Option<&Map<String, Value>> {
	payload.get(IDENTITY_CONTAINER)?.as_object()
}

/// Normalizes a payload only when it carries an identity container.
pub fn try_normalize(payload: &Value) -> Option<CanonicalProfile> {
	locate(payload).map(normalize_container)
}

/// Normalizes any payload, falling back to [`CanonicalProfile::degraded`] when the
/// identity container is absent.
pub fn normalize(payload: &Value) -> CanonicalProfile {
	try_normalize(payload).unwrap_or_else(CanonicalProfile::degraded)
}

fn normalize_container(me: &Map<String, Value>) -> CanonicalProfile {
	CanonicalProfile {
		subject_id: me.get("user_id").and_then(subject_id).unwrap_or_else(|| UNKNOWN_SUBJECT.into()),
		display_name: non_empty_str(me.get("username"))
			.unwrap_or_else(|| UNKNOWN_DISPLAY_NAME.into()),
		email: non_empty_str(me.get("email")),
		avatar_url: me.get("avatar_urls").and_then(avatar_url),
	}
}

fn subject_id(value: &Value) -> Option<String> {
	match value {
		Value::Number(number) =>
			if let Some(id) = number.as_u64() {
				Some(id.to_string())
			} else if let Some(id) = number.as_i64() {
				Some(id.to_string())
			} else {
				number.as_f64().map(|id| {
					if id.fract() == 0.0 && id.abs() < 1e15 {
						format!("{id:.0}")
					} else {
						id.to_string()
					}
				})
			},
		Value::String(raw) if !raw.is_empty() => Some(raw.clone()),
		_ => None,
	}
}

fn avatar_url(urls: &Value) -> Option<String> {
	AVATAR_PREFERENCE.iter().find_map(|size| non_empty_str(urls.get(size)))
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
	value.and_then(Value::as_str).filter(|raw| !raw.is_empty()).map(str::to_owned)
}
