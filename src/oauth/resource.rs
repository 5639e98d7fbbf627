//! Protected-resource fetches authorized by an access token.

// crates.io
use oauth2::{
	HttpRequest,
	http::{
		Method,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ResourceFetchError, TransportError},
	http::OAuthHttpClient,
	oauth::{Endpoint, OAuth2Client, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Where the access token travels when fetching a protected resource.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessTokenPlacement {
	/// `Authorization: Bearer <token>` header.
	#[default]
	AuthorizationHeader,
	/// `access_token=<token>` query parameter.
	QueryParameter,
}

/// Undecoded protected-resource response.
#[derive(Clone, PartialEq, Eq)]
pub struct RawProfileResponse {
	/// HTTP status (always 2xx once returned by the core).
	pub status: u16,
	/// `Content-Type` header, when sent.
	pub content_type: Option<String>,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl RawProfileResponse {
	/// Wraps a body as if it were a `200 OK` without a content type.
	pub fn new(body: impl Into<Vec<u8>>) -> Self {
		Self { status: 200, content_type: None, body: body.into() }
	}
}
impl Debug for RawProfileResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RawProfileResponse")
			.field("status", &self.status)
			.field("content_type", &self.content_type)
			.field("body_len", &self.body.len())
			.finish()
	}
}

impl<C, M> OAuth2Client<C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Issues exactly one GET for `url`, authorized by `access_token`.
	///
	/// Non-2xx answers become [`ResourceFetchError::Status`]; neither that error nor any
	/// transport error carries the request URL, so a query-placed token cannot leak through it.
	pub async fn fetch_protected_resource(
		&self,
		url: &Url,
		access_token: &TokenSecret,
		placement: AccessTokenPlacement,
	) -> Result<RawProfileResponse> {
		const KIND: FlowKind = FlowKind::ProfileFetch;

		let span = FlowSpan::new(KIND, "fetch_protected_resource");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request = build_resource_request(url, access_token, placement)?;
				let response = self.dispatch(Endpoint::Resource, request).await?;
				let status = response.status();

				if !status.is_success() {
					return Err(ResourceFetchError::Status {
						status: status.as_u16(),
						body_preview: super::body_preview(response.body()),
					}
					.into());
				}

				let content_type = response
					.headers()
					.get(CONTENT_TYPE)
					.and_then(|value| value.to_str().ok())
					.map(str::to_owned);

				Ok(RawProfileResponse {
					status: status.as_u16(),
					content_type,
					body: response.into_body(),
				})
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}

fn build_resource_request(
	url: &Url,
	access_token: &TokenSecret,
	placement: AccessTokenPlacement,
) -> Result<HttpRequest, ResourceFetchError> {
	let mut target = url.clone();
	let builder = oauth2::http::Request::builder().method(Method::GET).header(ACCEPT, "application/json");
	let builder = match placement {
		AccessTokenPlacement::AuthorizationHeader =>
			builder.header(AUTHORIZATION, format!("Bearer {}", access_token.expose())),
		AccessTokenPlacement::QueryParameter => {
			target.query_pairs_mut().append_pair("access_token", access_token.expose());

			builder
		},
	};

	// A token the header grammar rejects fails here, before anything is sent.
	builder
		.uri(target.as_str())
		.body(Vec::new())
		.map_err(|err| ResourceFetchError::Transport(TransportError::request(err)))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn header_placement_leaves_the_url_untouched() {
		let url = Url::parse("https://provider.example.com/me?format=json").expect("URL should parse.");
		let request = build_resource_request(
			&url,
			&TokenSecret::new("tok"),
			AccessTokenPlacement::AuthorizationHeader,
		)
		.expect("Resource request should build.");

		assert_eq!(request.method(), Method::GET);
		assert_eq!(request.uri(), "https://provider.example.com/me?format=json");
		assert_eq!(
			request.headers().get(AUTHORIZATION).and_then(|value| value.to_str().ok()),
			Some("Bearer tok")
		);
	}

	#[test]
	fn query_placement_appends_to_trailing_question_marks() {
		let url = Url::parse("https://app.rakuten.co.jp/services/api/FavoriteBookmark/List/20120627?")
			.expect("URL should parse.");
		let request =
			build_resource_request(&url, &TokenSecret::new("t/k"), AccessTokenPlacement::QueryParameter)
				.expect("Resource request should build.");

		assert_eq!(
			request.uri(),
			"https://app.rakuten.co.jp/services/api/FavoriteBookmark/List/20120627?access_token=t%2Fk"
		);
		assert!(request.headers().get(AUTHORIZATION).is_none());
	}

	#[test]
	fn unsendable_tokens_fail_as_fetch_errors() {
		let url = Url::parse("https://provider.example.com/me").expect("URL should parse.");
		let err = build_resource_request(
			&url,
			&TokenSecret::new("tok\nen"),
			AccessTokenPlacement::AuthorizationHeader,
		)
		.expect_err("Control characters cannot travel in a header.");

		assert!(matches!(err, ResourceFetchError::Transport(TransportError::Request { .. })));
		assert!(!err.reached_provider());

		let err = Error::from(err);

		assert_eq!(err.kind(), crate::error::ErrorKind::ResourceFetch);
		assert!(!format!("{err:?}").contains("tok"));
	}

	#[test]
	fn raw_response_debug_hides_the_body() {
		let raw = RawProfileResponse::new(r#"{"email":"someone@example.com"}"#);

		assert!(!format!("{raw:?}").contains("someone@example.com"));
	}
}
