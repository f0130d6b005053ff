//! Sign users in with a XenForo forum over OAuth 2.0 Authorization Code + PKCE, normalize the
//! forum's profile payload, and issue signed, stateless session tokens.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod identity;
pub mod oauth;
pub mod obs;
pub mod profile;
pub mod session;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::{ProviderConfig, SessionConfig, Settings},
		flows::{Authenticator, ReqwestAuthenticator},
		http::ReqwestHttpClient,
	};

	/// Client identifier used by test configurations.
	pub const TEST_CLIENT_ID: &str = "client-123";
	/// Client secret used by test configurations.
	pub const TEST_CLIENT_SECRET: &str = "secret-xyz";
	/// Redirect URI used by test configurations.
	pub const TEST_REDIRECT_URI: &str = "https://app.example.com/api/auth/callback/xenforo";
	/// Session signing secret used by test configurations.
	pub const TEST_SESSION_SECRET: &str = "test-session-secret";

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds [`Settings`] pointing every provider endpoint under `site_url`.
	pub fn test_settings(site_url: &str) -> Settings {
		let provider = ProviderConfig::builder()
			.site_url(site_url)
			.client_id(TEST_CLIENT_ID)
			.client_secret(TEST_CLIENT_SECRET)
			.scopes("user:read alert:read profile_post:read")
			.redirect_uri(TEST_REDIRECT_URI)
			.build()
			.expect("Test provider configuration should build.");
		let session =
			SessionConfig::new(TEST_SESSION_SECRET).expect("Test session configuration should build.");

		Settings { provider, session }
	}

	/// Constructs a reqwest-backed [`Authenticator`] for a mock forum at `site_url`.
	pub fn build_reqwest_test_authenticator(site_url: &str) -> ReqwestAuthenticator {
		Authenticator::with_http_client(test_settings(site_url), test_reqwest_http_client())
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, dotenvy as _, httpmock as _, tracing_subscriber as _};
