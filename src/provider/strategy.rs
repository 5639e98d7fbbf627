//! The Rakuten strategy: validated configuration plus the OAuth core.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	auth::{TokenPair, TokenSecret},
	config::{StrategyConfig, StrategyOptions},
	error::{ConfigError, ProfileParseError},
	http::OAuthHttpClient,
	oauth::{
		self, AuthorizationOptions, AuthorizationRequest, OAuth2Client, RawProfileResponse,
		TransportErrorMapper,
	},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{self, DEFAULTS, PROVIDER_NAME, Profile},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

const STATE_LEN: usize = 24;

#[cfg(feature = "reqwest")]
/// Strategy specialized for the crate's default reqwest transport stack.
pub type ReqwestRakutenStrategy = RakutenStrategy<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Authenticates users by delegating to Rakuten's OAuth 2.0 authorization-code flow.
///
/// The strategy holds nothing mutable: one instance (or its clones, which share the same
/// configuration and transport) serves every concurrent authentication attempt.
pub struct RakutenStrategy<C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	client: OAuth2Client<C, M>,
	config: Arc<StrategyConfig>,
}
impl<C, M> RakutenStrategy<C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Validates `options` against the Rakuten defaults and binds the caller's transport.
	///
	/// Fails before any I/O when `client_id` or `client_secret` is absent.
	pub fn with_http_client(
		options: StrategyOptions,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self, ConfigError> {
		let config = StrategyConfig::from_options(options, &DEFAULTS)?;

		Ok(Self::from_config(config, OAuth2Client::new(http_client, mapper)))
	}

	/// Wraps an already-validated configuration.
	pub fn from_config(config: impl Into<Arc<StrategyConfig>>, client: OAuth2Client<C, M>) -> Self {
		Self { client, config: config.into() }
	}

	/// Name hosts register the strategy under.
	pub fn name(&self) -> &'static str {
		PROVIDER_NAME
	}

	/// Validated configuration.
	pub fn config(&self) -> &StrategyConfig {
		&self.config
	}

	/// Underlying OAuth core.
	pub fn client(&self) -> &OAuth2Client<C, M> {
		&self.client
	}

	/// Rakuten-specific authorization parameters: the `display` hint when supplied.
	pub fn extra_authorization_params(
		&self,
		options: &AuthorizationOptions,
	) -> BTreeMap<String, String> {
		let mut params = BTreeMap::new();

		if let Some(display) = options.display.as_deref() {
			params.insert("display".into(), display.to_owned());
		}

		params
	}

	/// Builds the redirect for a new attempt.
	///
	/// With state checking enabled and no state in `options`, a fresh random state is generated
	/// and returned in [`AuthorizationRequest::state`] for the host to stash.
	pub fn authorization_url(&self, options: &AuthorizationOptions) -> Result<AuthorizationRequest> {
		const KIND: FlowKind = FlowKind::Authorization;

		FlowSpan::new(KIND, "authorization_url").in_scope(|| {
			obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

			let generated;
			let options = if self.config.state && options.state.is_none() {
				generated = options.clone().with_state(random_state());

				&generated
			} else {
				options
			};
			let result = oauth::build_authorization_url(
				&self.config,
				options,
				&self.extra_authorization_params(options),
			)
			.map_err(Error::from);

			match &result {
				Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
				Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
			}

			result
		})
	}

	/// Maps a raw Rakuten payload into a [`Profile`].
	pub fn normalize_profile(&self, raw: &RawProfileResponse) -> Result<Profile, ProfileParseError> {
		provider::normalize_profile(raw)
	}

	/// Exchanges `code`, sending the same `redirect_uri` the authorization redirect used.
	pub async fn exchange_code(&self, code: &str, options: &AuthorizationOptions) -> Result<TokenPair> {
		let redirect_uri = options.callback_url.as_ref().or(self.config.callback_url.as_ref());

		self.client.exchange_code(&self.config, code, redirect_uri, &BTreeMap::new()).await
	}

	/// Fetches the configured profile endpoint and normalizes the answer.
	///
	/// Fetch failures stay [`ResourceFetchError`](crate::error::ResourceFetchError)s; undecodable
	/// bodies become [`ProfileParseError`]s.
	pub async fn get_profile(&self, access_token: &TokenSecret) -> Result<Profile> {
		let raw = self
			.client
			.fetch_protected_resource(
				&self.config.profile_url,
				access_token,
				self.config.access_token_placement,
			)
			.await?;

		Ok(self.normalize_profile(&raw)?)
	}
}
#[cfg(feature = "reqwest")]
impl RakutenStrategy<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a strategy backed by a default reqwest transport.
	pub fn new(options: StrategyOptions) -> Result<Self, ConfigError> {
		Self::with_http_client(options, ReqwestHttpClient::new()?, ReqwestTransportErrorMapper)
	}
}
impl<C, M> Clone for RakutenStrategy<C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self { client: self.client.clone(), config: self.config.clone() }
	}
}
impl<C, M> Debug for RakutenStrategy<C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RakutenStrategy")
			.field("name", &PROVIDER_NAME)
			.field("config", &self.config)
			.finish()
	}
}

fn random_state() -> String {
	rand::rng().sample_iter(Alphanumeric).take(STATE_LEN).map(char::from).collect()
}
