//! The callback state machine: redirect, reject, or exchange and verify.

// self
use crate::{
	_prelude::*,
	flows::Verify,
	http::OAuthHttpClient,
	oauth::{AuthorizationOptions, AuthorizationRequest, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::RakutenStrategy,
};

const ACCESS_DENIED: &str = "access_denied";
const STATE_MISSING: &str = "Unable to verify authorization request state.";
const STATE_MISMATCH: &str = "Invalid authorization request state.";

/// Query parameters the provider appends to the callback URL.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
	/// Authorization code.
	pub code: Option<String>,
	/// State echoed back by the provider.
	pub state: Option<String>,
	/// OAuth error code.
	pub error: Option<String>,
	/// OAuth error description.
	pub error_description: Option<String>,
	/// OAuth error URI.
	pub error_uri: Option<String>,
}
impl CallbackParams {
	/// Parses a raw query string (without the leading `?`). Empty values count as absent.
	pub fn from_query(query: &str) -> Self {
		let mut params = Self::default();

		for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
			if value.is_empty() {
				continue;
			}

			let slot = match key.as_ref() {
				"code" => &mut params.code,
				"state" => &mut params.state,
				"error" => &mut params.error,
				"error_description" => &mut params.error_description,
				"error_uri" => &mut params.error_uri,
				_ => continue,
			};

			// First occurrence wins.
			if slot.is_none() {
				*slot = Some(value.into_owned());
			}
		}

		params
	}

	/// Parses the query of a full callback URL.
	pub fn from_url(url: &Url) -> Self {
		url.query().map(Self::from_query).unwrap_or_default()
	}
}
impl Debug for CallbackParams {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CallbackParams")
			.field("code", &self.code.as_ref().map(|_| "<redacted>"))
			.field("state", &self.state)
			.field("error", &self.error)
			.field("error_description", &self.error_description)
			.field("error_uri", &self.error_uri)
			.finish()
	}
}

/// Outcome of one [`RakutenStrategy::authenticate`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Authentication<U> {
	/// Send the user agent to the provider.
	Redirect(AuthorizationRequest),
	/// The verify callback accepted the identity.
	Success(U),
	/// The attempt failed without an error: the user denied access, the state did not check
	/// out, or the verify callback rejected the identity.
	Fail {
		/// Human-readable reason, when one exists.
		message: Option<String>,
	},
}
impl<U> Authentication<U> {
	fn fail(message: impl Into<String>) -> Self {
		Self::Fail { message: Some(message.into()) }
	}
}

impl<C, M> RakutenStrategy<C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Drives one leg of an authentication attempt.
	///
	/// `options.state` is the state the host stashed when it issued the redirect. State is checked
	/// when the strategy enables it or when the host supplies an expected value. `verify` runs at
	/// most once, and only after both the exchange and the profile fetch succeed.
	pub async fn authenticate<V>(
		&self,
		params: CallbackParams,
		options: &AuthorizationOptions,
		verify: &V,
	) -> Result<Authentication<V::User>>
	where
		V: Verify,
	{
		const KIND: FlowKind = FlowKind::Authenticate;

		let span = FlowSpan::new(KIND, "authenticate");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.authenticate_inner(params, options, verify)).await;

		match &result {
			Ok(Authentication::Success(_)) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Ok(Authentication::Redirect(_)) => (),
			Ok(Authentication::Fail { .. }) | Err(_) =>
				obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn authenticate_inner<V>(
		&self,
		params: CallbackParams,
		options: &AuthorizationOptions,
		verify: &V,
	) -> Result<Authentication<V::User>>
	where
		V: Verify,
	{
		let CallbackParams { code, state, error, error_description, error_uri } = params;

		if let Some(error) = error {
			if error == ACCESS_DENIED {
				return Ok(Authentication::Fail { message: error_description });
			}

			return Err(Error::Authorization {
				code: error,
				description: error_description,
				uri: error_uri,
			});
		}

		let Some(code) = code else {
			return Ok(Authentication::Redirect(self.authorization_url(options)?));
		};

		if self.config().state || options.state.is_some() {
			let Some(expected) = options.state.as_deref() else {
				return Ok(Authentication::fail(STATE_MISSING));
			};

			if state.as_deref() != Some(expected) {
				return Ok(Authentication::fail(STATE_MISMATCH));
			}
		}

		let tokens = self.exchange_code(&code, options).await?;
		let profile = self.get_profile(&tokens.access_token).await?;

		match verify.verify(tokens, profile).await {
			Ok(Some(user)) => Ok(Authentication::Success(user)),
			Ok(None) => Ok(Authentication::Fail { message: None }),
			Err(e) => Err(Error::verify(e)),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn query_parsing_keeps_the_first_non_empty_value() {
		let params = CallbackParams::from_query("code=abc&code=def&state=&error_description=a%20b");

		assert_eq!(params.code.as_deref(), Some("abc"));
		assert_eq!(params.state, None);
		assert_eq!(params.error_description.as_deref(), Some("a b"));
	}

	#[test]
	fn url_parsing_reads_the_query() {
		let url = Url::parse("https://app.example.com/callback?error=access_denied&state=xyz")
			.expect("URL should parse.");
		let params = CallbackParams::from_url(&url);

		assert_eq!(params.error.as_deref(), Some("access_denied"));
		assert_eq!(params.state.as_deref(), Some("xyz"));

		let bare = Url::parse("https://app.example.com/").expect("URL should parse.");

		assert_eq!(CallbackParams::from_url(&bare), CallbackParams::default());
	}

	#[test]
	fn debug_output_hides_the_code() {
		let params = CallbackParams::from_query("code=very-secret-code");

		assert!(!format!("{params:?}").contains("very-secret-code"));
	}
}
