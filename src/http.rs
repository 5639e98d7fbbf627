//! Pluggable HTTP transport for the two provider round-trips.
//!
//! The OAuth core never names an HTTP library. It asks an [`OAuthHttpClient`] for a handle per
//! request and hands that handle a fresh [`ResponseMetadataSlot`]. Transports record the status
//! and `Retry-After` hint there, so a failed call can still be classified with whatever the wire
//! showed before it broke.

// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
#[cfg(feature = "reqwest")] use reqwest::{
	header::{HeaderMap, HeaderValue, RETRY_AFTER},
	redirect::Policy,
};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Source of per-request [`AsyncHttpClient`] handles.
///
/// One transport is shared by every attempt of a strategy, hence `'static + Send + Sync`. The
/// futures returned by its handles must be `Send` so attempts can run on any executor thread.
pub trait OAuthHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle tied to a [`ResponseMetadataSlot`].
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Returns a handle bound to `slot`.
	///
	/// Handles clear the slot with [`ResponseMetadataSlot::take`] before sending and call
	/// [`ResponseMetadataSlot::store`] as soon as a status line arrives.
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;
}

/// What the transport saw of a response before handing it (or a failure) back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
	/// Status code, once one was received.
	pub status: Option<u16>,
	/// `Retry-After` converted to a relative duration.
	pub retry_after: Option<Duration>,
}

/// Shared cell through which a handle reports [`ResponseMetadata`] to the error mapper.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Replaces the recorded metadata.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Removes and returns the recorded metadata.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Default transport: a [`ReqwestClient`] that never follows redirects.
///
/// Token and profile endpoints answer directly. A redirect from either is surfaced to the
/// caller as the status it carries instead of being chased with the code or token attached.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient {
	client: ReqwestClient,
}
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Per-request timeout used by [`ReqwestHttpClient::new`].
	pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

	/// Builds the default transport with [`Self::DEFAULT_TIMEOUT`].
	pub fn new() -> Result<Self, ConfigError> {
		Self::with_timeout(Self::DEFAULT_TIMEOUT)
	}

	/// Builds a transport that abandons any request running longer than `timeout`.
	///
	/// An abandoned token exchange may still have reached Rakuten, so the code must be treated
	/// as consumed.
	pub fn with_timeout(timeout: std::time::Duration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.redirect(Policy::none())
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self { client })
	}

	/// Adopts a host-configured client as is.
	pub fn from_client(client: ReqwestClient) -> Self {
		Self { client }
	}

	/// Underlying reqwest client.
	pub fn client(&self) -> &ReqwestClient {
		&self.client
	}
}
#[cfg(feature = "reqwest")]
impl OAuthHttpClient for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		ReqwestHandle { client: self.client.clone(), slot }
	}
}

/// Per-request handle created by [`ReqwestHttpClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHandle {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.slot.take();

			let request = request.try_into().map_err(Box::new)?;
			let response = self.client.execute(request).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().clone();

			self.slot.store(ResponseMetadata::observed(status.as_u16(), &headers));

			let body = response.bytes().await.map_err(Box::new)?;
			let mut converted = HttpResponse::new(body.to_vec());

			*converted.status_mut() = status;
			*converted.headers_mut() = headers;

			Ok(converted)
		})
	}
}

#[cfg(feature = "reqwest")]
impl ResponseMetadata {
	fn observed(status: u16, headers: &HeaderMap) -> Self {
		Self { status: Some(status), retry_after: headers.get(RETRY_AFTER).and_then(retry_after) }
	}
}

/// `Retry-After` as either delta seconds or an HTTP date still in the future.
#[cfg(feature = "reqwest")]
fn retry_after(value: &HeaderValue) -> Option<Duration> {
	let raw = value.to_str().ok()?.trim();

	match raw.parse::<u32>() {
		Ok(secs) => Some(Duration::seconds(secs.into())),
		Err(_) => {
			let delta = OffsetDateTime::parse(raw, &Rfc2822).ok()? - OffsetDateTime::now_utc();

			delta.is_positive().then_some(delta)
		},
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;

	fn observed(retry: &'static str) -> ResponseMetadata {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static(retry));

		ResponseMetadata::observed(429, &headers)
	}

	#[test]
	fn retry_after_reads_delta_seconds() {
		assert_eq!(observed("120").retry_after, Some(Duration::seconds(120)));
		assert_eq!(observed(" 7 ").retry_after, Some(Duration::seconds(7)));
		assert_eq!(observed("120").status, Some(429));
	}

	#[test]
	fn retry_after_drops_past_dates_and_garbage() {
		assert_eq!(observed("Wed, 21 Oct 2015 07:28:00 GMT").retry_after, None);
		assert_eq!(observed("later").retry_after, None);
		assert_eq!(ResponseMetadata::observed(200, &HeaderMap::new()).retry_after, None);
	}

	#[test]
	fn taking_empties_the_slot() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata { status: Some(503), retry_after: None });

		assert_eq!(slot.clone().take().and_then(|meta| meta.status), Some(503));
		assert!(slot.take().is_none());
	}

	#[test]
	fn default_transport_builds() {
		let transport = ReqwestHttpClient::new().expect("Default transport should build.");

		assert!(format!("{transport:?}").contains("ReqwestHttpClient"));
	}
}
