//! Authorization redirect construction.

// self
use crate::{_prelude::*, auth::ScopeList, config::StrategyConfig, error::ConfigError};

/// Query keys owned by the core; provider extras never override them.
pub const RESERVED_AUTHORIZATION_PARAMS: [&str; 5] =
	["response_type", "client_id", "redirect_uri", "scope", "state"];

/// Per-request options supplied by the host when starting or completing an attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthorizationOptions {
	/// Scopes replacing the configured defaults for this request.
	pub scope: Option<ScopeList>,
	/// Redirect URI replacing the configured callback for this request.
	pub callback_url: Option<Url>,
	/// Provider `display` hint, forwarded verbatim.
	pub display: Option<String>,
	/// State to send on redirect, or the state expected back on callback.
	pub state: Option<String>,
}
impl AuthorizationOptions {
	/// Overrides the requested scopes.
	pub fn with_scope(mut self, scope: ScopeList) -> Self {
		self.scope = Some(scope);

		self
	}

	/// Overrides the redirect URI.
	pub fn with_callback_url(mut self, url: Url) -> Self {
		self.callback_url = Some(url);

		self
	}

	/// Sets the `display` hint.
	pub fn with_display(mut self, display: impl Into<String>) -> Self {
		self.display = Some(display.into());

		self
	}

	/// Sets the state value.
	pub fn with_state(mut self, state: impl Into<String>) -> Self {
		self.state = Some(state.into());

		self
	}
}

/// One redirect attempt: the URL to send the user agent to and the state to stash, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationRequest {
	/// Fully-formed authorization URL.
	pub url: Url,
	/// State value the host must keep to validate the callback.
	pub state: Option<String>,
}
impl AuthorizationRequest {
	/// Decoded query parameters in wire order.
	pub fn query_pairs(&self) -> Vec<(String, String)> {
		self.url.query_pairs().into_owned().collect()
	}

	/// Returns the value of the first query parameter named `key`.
	pub fn query_param(&self, key: &str) -> Option<String> {
		self.url.query_pairs().find(|(name, _)| name == key).map(|(_, value)| value.into_owned())
	}
}

/// Builds the authorization redirect for one attempt.
///
/// Parameters are appended in a fixed order: `response_type=code`, `client_id`, `redirect_uri`
/// (request override, else the configured callback, else empty), `scope` (joined with the
/// configured separator, possibly empty), `state` (when supplied), then `extra_params`. Query
/// keys already on the base URL and extras that collide with [`RESERVED_AUTHORIZATION_PARAMS`]
/// are dropped, so each of the four core keys appears exactly once.
pub fn build_authorization_url(
	config: &StrategyConfig,
	options: &AuthorizationOptions,
	extra_params: &BTreeMap<String, String>,
) -> Result<AuthorizationRequest, ConfigError> {
	let mut url = config.authorization_url.clone();

	if url.cannot_be_a_base() {
		return Err(ConfigError::OpaqueEndpoint { endpoint: "authorization" });
	}

	let retained = url
		.query_pairs()
		.filter(|(key, _)| !is_reserved(key))
		.map(|(key, value)| (key.into_owned(), value.into_owned()))
		.collect::<Vec<_>>();
	let redirect_uri = options.callback_url.as_ref().or(config.callback_url.as_ref());
	let scope = options.scope.as_ref().unwrap_or(&config.scope);

	url.set_query(None);

	let mut pairs = url.query_pairs_mut();

	pairs.extend_pairs(retained.iter());
	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", &config.client_id);

	pairs.append_pair("redirect_uri", redirect_uri.map(Url::as_str).unwrap_or_default());
	pairs.append_pair("scope", &scope.join(&config.scope_separator));
	if let Some(state) = options.state.as_deref() {
		pairs.append_pair("state", state);
	}

	for (key, value) in extra_params.iter().filter(|(key, _)| !is_reserved(key)) {
		pairs.append_pair(key, value);
	}

	drop(pairs);

	Ok(AuthorizationRequest { url, state: options.state.clone() })
}

fn is_reserved(key: &str) -> bool {
	RESERVED_AUTHORIZATION_PARAMS.contains(&key)
}
