//! Generic OAuth 2.0 authorization-code core.
//!
//! [`OAuth2Client`] owns nothing but a shared transport and its error mapper. Each operation is
//! handed the [`StrategyConfig`](crate::config::StrategyConfig) and tokens it needs, so one
//! client serves any number of concurrent authentication attempts without locking.
//!
//! - [`build_authorization_url`] is pure and synchronous.
//! - [`OAuth2Client::exchange_code`] performs exactly one POST to the token endpoint.
//! - [`OAuth2Client::fetch_protected_resource`] performs exactly one GET.
//!
//! Nothing is retried; the host owns retry policy.

pub mod authorize;
pub mod resource;
pub mod token;

pub use oauth2;

pub use authorize::*;
pub use resource::*;
pub use token::*;

// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
// self
use crate::{
	_prelude::*,
	error::{ResourceFetchError, TokenExchangeError, TransportError},
	http::{OAuthHttpClient, ResponseMetadata, ResponseMetadataSlot},
};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestHttpClient};

const BODY_PREVIEW_LIMIT: usize = 256;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport stack.
pub type ReqwestOAuth2Client = OAuth2Client<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Remote endpoints contacted by the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
	/// Token endpoint (code exchange).
	Token,
	/// Protected resource (profile fetch).
	Resource,
}
impl Endpoint {
	/// Returns a stable label suitable for logs and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			Endpoint::Token => "token",
			Endpoint::Resource => "resource",
		}
	}

	/// Lifts a transport failure into the error family owned by this endpoint.
	pub fn wrap(self, err: TransportError) -> Error {
		match self {
			Endpoint::Token => TokenExchangeError::Transport(err).into(),
			Endpoint::Resource => ResourceFetchError::Transport(err).into(),
		}
	}
}
impl Display for Endpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Maps HTTP transport failures into strategy [`Error`] values.
///
/// Implementations must not copy request URLs or headers into the resulting error, since the
/// access token may travel in either.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a strategy error.
	fn map_transport_error(
		&self,
		endpoint: Endpoint,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		endpoint: Endpoint,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		let transport = match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(meta, *inner),
			HttpClientError::Http(inner) => TransportError::request(inner),
			HttpClientError::Io(inner) => TransportError::Io(inner),
			HttpClientError::Other(message) => TransportError::Other { message },
			_ => TransportError::Other { message: "unrecognized client failure".into() },
		};

		endpoint.wrap(transport)
	}
}

/// Stateless authorization-code engine shared by every attempt of a strategy.
pub struct OAuth2Client<C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client used for every outbound provider request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub error_mapper: Arc<M>,
}
impl<C, M> OAuth2Client<C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client from a transport + mapper pair.
	pub fn new(http_client: impl Into<Arc<C>>, error_mapper: impl Into<Arc<M>>) -> Self {
		Self { http_client: http_client.into(), error_mapper: error_mapper.into() }
	}

	async fn dispatch(&self, endpoint: Endpoint, request: HttpRequest) -> Result<HttpResponse> {
		let slot = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(slot.clone());

		handle.call(request).await.map_err(|err| {
			self.error_mapper.map_transport_error(endpoint, slot.take().as_ref(), err)
		})
	}
}
#[cfg(feature = "reqwest")]
impl OAuth2Client<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client backed by [`ReqwestHttpClient::new`].
	pub fn reqwest() -> Result<Self, ConfigError> {
		Ok(Self::new(ReqwestHttpClient::new()?, ReqwestTransportErrorMapper))
	}
}
impl<C, M> Clone for OAuth2Client<C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self { http_client: self.http_client.clone(), error_mapper: self.error_mapper.clone() }
	}
}
impl<C, M> Debug for OAuth2Client<C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("OAuth2Client(..)")
	}
}

/// Truncated, lossily decoded copy of a response body for diagnostics.
pub(crate) fn body_preview(body: &[u8]) -> Option<String> {
	let text = String::from_utf8_lossy(body);
	let trimmed = text.trim();

	if trimmed.is_empty() {
		return None;
	}
	if trimmed.chars().count() <= BODY_PREVIEW_LIMIT {
		return Some(trimmed.to_owned());
	}

	let mut buf = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect::<String>();

	buf.push('…');

	Some(buf)
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(meta: Option<&ResponseMetadata>, err: ReqwestError) -> TransportError {
	// Query-placed access tokens live in the URL.
	let err = err.without_url();

	if err.is_builder() {
		return TransportError::request(err);
	}
	if err.is_timeout() {
		return TransportError::Timeout {
			status: meta.and_then(|value| value.status).or_else(|| err.status().map(|code| code.as_u16())),
			retry_after: meta.and_then(|value| value.retry_after),
		};
	}

	TransportError::network(err)
}
