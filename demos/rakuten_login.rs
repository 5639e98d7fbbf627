//! Prints a Rakuten authorization URL, then completes the login when handed the callback URL.
//!
//! ```sh
//! RAKUTEN_CLIENT_ID=... RAKUTEN_CLIENT_SECRET=... cargo run --example rakuten_login
//! RAKUTEN_CLIENT_ID=... RAKUTEN_CLIENT_SECRET=... cargo run --example rakuten_login -- \
//!     'https://app.example.com/auth/rakuten/callback?code=...'
//! ```

// std
use std::{convert::Infallible, env};
// crates.io
use color_eyre::{Result, eyre::WrapErr};
// self
use oauth2_rakuten::{
	auth::{ScopeList, TokenPair},
	config::StrategyOptions,
	flows::{Authentication, CallbackParams},
	oauth::AuthorizationOptions,
	provider::{Profile, ReqwestRakutenStrategy},
	url::Url,
};

const DEFAULT_CALLBACK: &str = "http://localhost:3000/auth/rakuten/callback";

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let client_id = env::var("RAKUTEN_CLIENT_ID").wrap_err("RAKUTEN_CLIENT_ID is not set")?;
	let client_secret =
		env::var("RAKUTEN_CLIENT_SECRET").wrap_err("RAKUTEN_CLIENT_SECRET is not set")?;
	let callback = env::var("RAKUTEN_CALLBACK_URL").unwrap_or_else(|_| DEFAULT_CALLBACK.into());
	let options = StrategyOptions::new(client_id, client_secret)
		.callback_url(callback)
		.scope(ScopeList::new(["rakuten_favoritebookmarks_read"])?);
	let strategy = ReqwestRakutenStrategy::new(options)?;
	let Some(returned) = env::args().nth(1) else {
		let request = strategy
			.authorization_url(&AuthorizationOptions::default().with_display("page"))?;

		println!("Send your user to {}.", request.url);
		println!("Rerun with the callback URL Rakuten redirects to.");

		return Ok(());
	};
	let params = CallbackParams::from_url(&Url::parse(&returned)?);
	let verify = |tokens: TokenPair, profile: Profile| async move {
		println!("Access token expires at {:?}.", tokens.expires_at);

		Ok::<_, Infallible>(Some(profile))
	};

	match strategy.authenticate(params, &AuthorizationOptions::default(), &verify).await? {
		Authentication::Success(profile) => println!("{}", serde_json::to_string_pretty(&profile)?),
		Authentication::Fail { message } =>
			eprintln!("Login failed: {}.", message.as_deref().unwrap_or("no reason given")),
		Authentication::Redirect(request) => println!("Send your user to {}.", request.url),
	}

	Ok(())
}
