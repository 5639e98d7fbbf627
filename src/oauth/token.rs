//! Authorization-code exchange against the token endpoint.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use oauth2::{
	HttpRequest, HttpResponse,
	basic::BasicErrorResponse,
	http::{
		Method,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::TokenPair,
	config::{ClientAuthMethod, StrategyConfig},
	error::{ConfigError, TokenExchangeError},
	http::OAuthHttpClient,
	oauth::{Endpoint, OAuth2Client, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl<C, M> OAuth2Client<C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges an authorization `code` for tokens with exactly one POST to the token endpoint.
	///
	/// `redirect_uri` must match the one sent on the authorization redirect; pass `None` only
	/// when that redirect carried none. Extras never override the core form fields.
	pub async fn exchange_code(
		&self,
		config: &StrategyConfig,
		code: &str,
		redirect_uri: Option<&Url>,
		extra_params: &BTreeMap<String, String>,
	) -> Result<TokenPair> {
		const KIND: FlowKind = FlowKind::TokenExchange;

		let span = FlowSpan::new(KIND, "exchange_code");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request = build_token_request(config, code, redirect_uri, extra_params)?;
				let response = self.dispatch(Endpoint::Token, request).await?;

				parse_token_response(&response).map_err(Error::from)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}

#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
	access_token: Option<String>,
	refresh_token: Option<String>,
	token_type: Option<String>,
	expires_in: Option<ExpiresIn>,
	scope: Option<String>,
}
impl TokenEndpointResponse {
	fn from_form(body: &[u8]) -> Self {
		let mut response = Self {
			access_token: None,
			refresh_token: None,
			token_type: None,
			expires_in: None,
			scope: None,
		};

		for (key, value) in form_urlencoded::parse(body) {
			let value = value.into_owned();

			match key.as_ref() {
				"access_token" => response.access_token = Some(value),
				"refresh_token" => response.refresh_token = Some(value),
				"token_type" => response.token_type = Some(value),
				"expires_in" => response.expires_in = Some(ExpiresIn::Text(value)),
				"scope" => response.scope = Some(value),
				_ => (),
			}
		}

		response
	}
}

// Some providers send `expires_in` as a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExpiresIn {
	Number(serde_json::Number),
	Text(String),
}
impl ExpiresIn {
	fn seconds(&self) -> Option<i64> {
		match self {
			ExpiresIn::Number(number) =>
				number.as_i64().or_else(|| number.as_f64().map(|secs| secs as i64)),
			ExpiresIn::Text(text) => text.trim().parse().ok(),
		}
	}
}

fn build_token_request(
	config: &StrategyConfig,
	code: &str,
	redirect_uri: Option<&Url>,
	extra_params: &BTreeMap<String, String>,
) -> Result<HttpRequest, ConfigError> {
	let mut form = form_urlencoded::Serializer::new(String::new());

	form.append_pair("grant_type", "authorization_code");
	form.append_pair("code", code);

	if let Some(redirect_uri) = redirect_uri {
		form.append_pair("redirect_uri", redirect_uri.as_str());
	}

	let mut builder = oauth2::http::Request::builder()
		.method(Method::POST)
		.uri(config.token_url.as_str())
		.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
		.header(ACCEPT, "application/json");

	match config.client_auth_method {
		ClientAuthMethod::ClientSecretPost => {
			form.append_pair("client_id", &config.client_id);
			form.append_pair("client_secret", config.client_secret.secret());
		},
		ClientAuthMethod::ClientSecretBasic => {
			// RFC 6749 §2.3.1: both halves are form-encoded before base64.
			let credentials = format!(
				"{}:{}",
				form_urlencoded::byte_serialize(config.client_id.as_bytes()).collect::<String>(),
				form_urlencoded::byte_serialize(config.client_secret.secret().as_bytes())
					.collect::<String>(),
			);

			builder = builder.header(AUTHORIZATION, format!("Basic {}", STANDARD.encode(credentials)));
		},
	}

	for (key, value) in extra_params.iter().filter(|(key, _)| !is_core_form_field(key)) {
		form.append_pair(key, value);
	}

	Ok(builder.body(form.finish().into_bytes())?)
}

fn is_core_form_field(key: &str) -> bool {
	matches!(key, "grant_type" | "code" | "redirect_uri" | "client_id" | "client_secret")
}

fn parse_token_response(response: &HttpResponse) -> Result<TokenPair, TokenExchangeError> {
	let status = response.status().as_u16();
	let body = response.body().as_slice();

	if !response.status().is_success() {
		let oauth = serde_json::from_slice::<BasicErrorResponse>(body).ok();

		return Err(TokenExchangeError::Rejected {
			status,
			oauth_error: oauth.as_ref().map(|err| err.error().to_string()),
			description: oauth.as_ref().and_then(|err| err.error_description().cloned()),
			error_uri: oauth.as_ref().and_then(|err| err.error_uri().cloned()),
			body_preview: super::body_preview(body),
		});
	}

	let parsed = if looks_like_json(body) {
		let mut de = serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize::<_, TokenEndpointResponse>(&mut de)
			.map_err(|source| TokenExchangeError::Parse { source, status })?
	} else {
		TokenEndpointResponse::from_form(body)
	};
	let access_token = parsed
		.access_token
		.filter(|token| !token.is_empty())
		.ok_or(TokenExchangeError::MissingAccessToken { status })?;
	let mut pair = TokenPair::new(access_token, parsed.refresh_token.filter(|token| !token.is_empty()));

	pair.token_type = parsed.token_type;
	pair.scope = parsed.scope;

	if let Some(seconds) = parsed.expires_in.as_ref().and_then(ExpiresIn::seconds) {
		pair = pair.with_expires_in(Duration::seconds(seconds));
	}

	Ok(pair)
}

fn looks_like_json(body: &[u8]) -> bool {
	body.iter().find(|byte| !byte.is_ascii_whitespace()) == Some(&b'{')
}
