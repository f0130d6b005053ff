//! Interactive XenForo sign-in against a real forum.
//!
//! Reads `XENFORO_*` and `SESSION_SECRET` settings from the environment (or `.env`), prints
//! the authorize URL, waits for the full callback URL to be pasted on stdin, and then runs
//! the complete callback pipeline. Set `RUST_LOG=xenforo_auth=debug` to watch the flow spans.

// std
use std::io::{self, Write};
// crates.io
use color_eyre::Result;
use tracing_subscriber::EnvFilter;
use url::Url;
// self
use xenforo_auth::flows::{CallbackParams, ReqwestAuthenticator};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	dotenvy::dotenv().ok();
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("xenforo_auth=info")),
		)
		.with_target(false)
		.init();

	let authenticator = ReqwestAuthenticator::from_env()?;
	let pending = authenticator.start_authorization()?;

	println!("Authorize URL: {}", &pending.authorize_url);
	println!("After the forum redirects back, paste the full callback URL here.");
	print!("Callback URL: ");
	io::stdout().flush()?;

	let mut input = String::new();

	io::stdin().read_line(&mut input)?;

	let callback = CallbackParams::from_url(&Url::parse(input.trim())?);
	let signed = authenticator.complete_sign_in(&pending.state, &callback).await?;

	println!("Signed in as {} (id {}).", signed.session.user.name, signed.session.user.id);
	println!("Session expires at {}.", signed.session.expires);
	println!("Session token: {} bytes.", signed.token.expose().len());

	let verified = authenticator.session(signed.token.expose())?;

	println!("{}", serde_json::to_string_pretty(&verified.user)?);

	Ok(())
}
