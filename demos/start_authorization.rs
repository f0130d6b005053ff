//! Builds the XenForo authorization redirect and shows the per-attempt state a web handler
//! would bind to the browser until the callback arrives.
//!
//! Settings come from the environment (a `.env` file is honored). Without them the demo
//! falls back to placeholder values so it can run offline.

// crates.io
use color_eyre::Result;
// self
use xenforo_auth::{
	config::{ProviderConfig, SessionConfig, Settings},
	flows::{AuthorizationState, ReqwestAuthenticator},
};

fn main() -> Result<()> {
	color_eyre::install()?;
	dotenvy::dotenv().ok();

	let settings = match Settings::from_env() {
		Ok(settings) => settings,
		Err(e) => {
			eprintln!("{e} Falling back to demo settings.");

			demo_settings()?
		},
	};
	let authenticator = ReqwestAuthenticator::new(settings)?;
	let session = authenticator.start_authorization()?;

	println!("Send your user to {}.", &session.authorize_url);
	println!(
		"PKCE challenge ({}): {}.",
		session.state.code_challenge_method().as_str(),
		session.state.code_challenge()
	);

	// Store this (encrypted, short-lived) alongside the browser session.
	let stored = serde_json::to_string(&session.state)?;

	println!("Pending attempt payload: {} bytes.", stored.len());

	// Simulate the callback handler restoring the attempt and checking `state`.
	let restored: AuthorizationState = serde_json::from_str(&stored)?;

	restored.validate_state(session.state.state())?;
	println!("Validated state; call Authenticator::complete_sign_in from the callback handler.");

	Ok(())
}

fn demo_settings() -> Result<Settings> {
	let provider = ProviderConfig::builder()
		.site_url("https://forum.example.com")
		.client_id("demo-client")
		.client_secret("demo-secret")
		.scopes("user:read alert:read profile_post:read")
		.redirect_uri("https://app.example.com/api/auth/callback/xenforo")
		.build()?;
	let session = SessionConfig::new("demo-session-secret")?;

	Ok(Settings { provider, session })
}
