//! Host-facing strategy options and the validated configuration derived from them.
//!
//! Hosts describe a strategy with [`StrategyOptions`], either through the builder methods or by
//! deserializing any serde format (keys accept both `camelCase` and the `clientID`/`callbackURL`
//! spellings). [`StrategyConfig::from_options`] applies the provider's [`ProviderDefaults`],
//! validates everything once, and yields the immutable value every operation reads from.

// crates.io
use oauth2::ClientSecret;
// self
use crate::{_prelude::*, auth::ScopeList, error::ConfigError, oauth::AccessTokenPlacement};

/// Client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	#[default]
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Provider-fixed values applied when the host omits them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProviderDefaults {
	/// Authorization endpoint.
	pub authorization_url: &'static str,
	/// Token endpoint.
	pub token_url: &'static str,
	/// Protected resource returning the user's profile data.
	pub profile_url: &'static str,
	/// Separator used to join scopes.
	pub scope_separator: &'static str,
	/// How the access token travels to the profile endpoint.
	pub access_token_placement: AccessTokenPlacement,
}

/// Options recognized by the strategy constructor.
#[derive(Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StrategyOptions {
	/// Application ID issued by the provider (required).
	#[serde(alias = "clientID")]
	pub client_id: Option<String>,
	/// Application secret issued by the provider (required).
	pub client_secret: Option<String>,
	/// URL the provider redirects back to after authorization.
	#[serde(alias = "callbackURL", alias = "redirectURL")]
	pub callback_url: Option<String>,
	/// Authorization endpoint override.
	#[serde(alias = "authorizationURL")]
	pub authorization_url: Option<String>,
	/// Token endpoint override.
	#[serde(alias = "tokenURL")]
	pub token_url: Option<String>,
	/// Profile endpoint override.
	#[serde(alias = "profileURL")]
	pub profile_url: Option<String>,
	/// Scope separator override.
	pub scope_separator: Option<String>,
	/// Scopes requested when a request does not override them.
	pub scope: Option<ScopeList>,
	/// Enables the `state` round-trip check.
	pub state: bool,
	/// Client authentication method override.
	pub client_auth_method: Option<ClientAuthMethod>,
	/// Access token placement override.
	pub access_token_placement: Option<AccessTokenPlacement>,
}
impl StrategyOptions {
	/// Creates options with the required client credentials.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self {
			client_id: Some(client_id.into()),
			client_secret: Some(client_secret.into()),
			..Default::default()
		}
	}

	/// Sets the callback URL.
	pub fn callback_url(mut self, url: impl Into<String>) -> Self {
		self.callback_url = Some(url.into());

		self
	}

	/// Overrides the authorization endpoint.
	pub fn authorization_url(mut self, url: impl Into<String>) -> Self {
		self.authorization_url = Some(url.into());

		self
	}

	/// Overrides the token endpoint.
	pub fn token_url(mut self, url: impl Into<String>) -> Self {
		self.token_url = Some(url.into());

		self
	}

	/// Overrides the profile endpoint.
	pub fn profile_url(mut self, url: impl Into<String>) -> Self {
		self.profile_url = Some(url.into());

		self
	}

	/// Overrides the scope separator.
	pub fn scope_separator(mut self, separator: impl Into<String>) -> Self {
		self.scope_separator = Some(separator.into());

		self
	}

	/// Sets the default scopes.
	pub fn scope(mut self, scope: ScopeList) -> Self {
		self.scope = Some(scope);

		self
	}

	/// Enables or disables the `state` round-trip check.
	pub fn state(mut self, enabled: bool) -> Self {
		self.state = enabled;

		self
	}

	/// Overrides the client authentication method.
	pub fn client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth_method = Some(method);

		self
	}

	/// Overrides where the access token is attached when fetching the profile.
	pub fn access_token_placement(mut self, placement: AccessTokenPlacement) -> Self {
		self.access_token_placement = Some(placement);

		self
	}
}
impl Debug for StrategyOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StrategyOptions")
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("callback_url", &self.callback_url)
			.field("authorization_url", &self.authorization_url)
			.field("token_url", &self.token_url)
			.field("profile_url", &self.profile_url)
			.field("scope_separator", &self.scope_separator)
			.field("scope", &self.scope)
			.field("state", &self.state)
			.field("client_auth_method", &self.client_auth_method)
			.field("access_token_placement", &self.access_token_placement)
			.finish()
	}
}

/// Immutable, validated configuration owned by one strategy.
#[derive(Clone, Debug)]
pub struct StrategyConfig {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// OAuth 2.0 client secret.
	pub client_secret: ClientSecret,
	/// Default redirect URI.
	pub callback_url: Option<Url>,
	/// Authorization endpoint.
	pub authorization_url: Url,
	/// Token endpoint.
	pub token_url: Url,
	/// Profile endpoint.
	pub profile_url: Url,
	/// Separator used to join scopes.
	pub scope_separator: String,
	/// Default scopes.
	pub scope: ScopeList,
	/// Whether the `state` round-trip check is enabled.
	pub state: bool,
	/// Client authentication method for the token endpoint.
	pub client_auth_method: ClientAuthMethod,
	/// How the access token travels to the profile endpoint.
	pub access_token_placement: AccessTokenPlacement,
}
impl StrategyConfig {
	/// Validates `options`, filling gaps from `defaults`.
	///
	/// Credentials are checked first so a strategy missing them fails before anything else runs.
	pub fn from_options(
		options: StrategyOptions,
		defaults: &ProviderDefaults,
	) -> Result<Self, ConfigError> {
		let client_id = non_blank(options.client_id).ok_or(ConfigError::MissingClientId)?;
		let client_secret =
			non_blank(options.client_secret).ok_or(ConfigError::MissingClientSecret)?;
		let callback_url = non_blank(options.callback_url)
			.map(|raw| parse_endpoint("callback", &raw))
			.transpose()?;
		let authorization_url = parse_endpoint(
			"authorization",
			non_blank(options.authorization_url).as_deref().unwrap_or(defaults.authorization_url),
		)?;
		let token_url = parse_endpoint(
			"token",
			non_blank(options.token_url).as_deref().unwrap_or(defaults.token_url),
		)?;
		let profile_url = parse_endpoint(
			"profile",
			non_blank(options.profile_url).as_deref().unwrap_or(defaults.profile_url),
		)?;
		let scope_separator = options
			.scope_separator
			.filter(|separator| !separator.is_empty())
			.unwrap_or_else(|| defaults.scope_separator.to_owned());

		Ok(Self {
			client_id,
			client_secret: ClientSecret::new(client_secret),
			callback_url,
			authorization_url,
			token_url,
			profile_url,
			scope_separator,
			scope: options.scope.unwrap_or_default(),
			state: options.state,
			client_auth_method: options.client_auth_method.unwrap_or_default(),
			access_token_placement: options
				.access_token_placement
				.unwrap_or(defaults.access_token_placement),
		})
	}
}

fn non_blank(value: Option<String>) -> Option<String> {
	value.filter(|value| !value.trim().is_empty())
}

fn parse_endpoint(endpoint: &'static str, raw: &str) -> Result<Url, ConfigError> {
	let url = Url::parse(raw).map_err(|source| ConfigError::InvalidEndpoint { endpoint, source })?;

	if url.cannot_be_a_base() {
		return Err(ConfigError::OpaqueEndpoint { endpoint });
	}

	Ok(url)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const DEFAULTS: ProviderDefaults = ProviderDefaults {
		authorization_url: "https://provider.example.com/authorize",
		token_url: "https://provider.example.com/token",
		profile_url: "https://provider.example.com/me",
		scope_separator: " ",
		access_token_placement: AccessTokenPlacement::AuthorizationHeader,
	};

	#[test]
	fn blank_credentials_are_rejected() {
		let err = StrategyConfig::from_options(StrategyOptions::new("  ", "secret"), &DEFAULTS)
			.expect_err("Blank client_id must be rejected.");

		assert!(matches!(err, ConfigError::MissingClientId));

		let err = StrategyConfig::from_options(StrategyOptions::new("id", ""), &DEFAULTS)
			.expect_err("Empty client_secret must be rejected.");

		assert!(matches!(err, ConfigError::MissingClientSecret));
	}

	#[test]
	fn empty_separator_falls_back_to_default() {
		let config = StrategyConfig::from_options(
			StrategyOptions::new("id", "secret").scope_separator(""),
			&DEFAULTS,
		)
		.expect("Config should build.");

		assert_eq!(config.scope_separator, " ");
	}

	#[test]
	fn opaque_endpoints_are_rejected() {
		let err = StrategyConfig::from_options(
			StrategyOptions::new("id", "secret").token_url("mailto:token@example.com"),
			&DEFAULTS,
		)
		.expect_err("Opaque token URL must be rejected.");

		assert!(matches!(err, ConfigError::OpaqueEndpoint { endpoint: "token" }));
	}

	#[test]
	fn debug_output_hides_the_secret() {
		let options = StrategyOptions::new("id", "very-secret-value");
		let config =
			StrategyConfig::from_options(options.clone(), &DEFAULTS).expect("Config should build.");

		assert!(!format!("{options:?}").contains("very-secret-value"));
		assert!(!format!("{config:?}").contains("very-secret-value"));
	}
}
