// std
use std::{
	collections::VecDeque,
	convert::Infallible,
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	future::Future,
	pin::Pin,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};
// crates.io
use parking_lot::Mutex;
use time::Duration;
// self
use oauth2_rakuten::{
	auth::TokenPair,
	config::{ClientAuthMethod, StrategyOptions},
	error::{Error, ResourceFetchError, TokenExchangeError, TransportError},
	flows::{Authentication, CallbackParams},
	http::{OAuthHttpClient, ResponseMetadata, ResponseMetadataSlot},
	oauth::{
		AuthorizationOptions, Endpoint, TransportErrorMapper,
		oauth2::{
			AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
			http::{HeaderMap, Method, StatusCode, header::AUTHORIZATION},
		},
	},
	provider::{Profile, RakutenStrategy},
	url::form_urlencoded,
};

const TOKEN_BODY: &str = r#"{"access_token":"fake-access","refresh_token":"fake-refresh","token_type":"BEARER","expires_in":3600}"#;

#[derive(Debug)]
enum FakeTransportError {
	Refused,
	TimedOut,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Refused => write!(f, "Connection refused."),
			Self::TimedOut => write!(f, "Operation timed out."),
		}
	}
}
impl StdError for FakeTransportError {}

enum Step {
	Respond(u16, &'static str),
	Fail(FakeTransportError),
	Throttle { status: u16, retry_after: Duration },
}

#[derive(Clone, Debug)]
struct Captured {
	method: Method,
	uri: String,
	headers: HeaderMap,
	body: Vec<u8>,
}
impl Captured {
	fn form(&self) -> Vec<(String, String)> {
		form_urlencoded::parse(&self.body).into_owned().collect()
	}
}

/// Replays one scripted step per request and records what it was asked to send.
#[derive(Clone, Default)]
struct ScriptedHttpClient {
	steps: Arc<Mutex<VecDeque<Step>>>,
	requests: Arc<Mutex<Vec<Captured>>>,
}
impl ScriptedHttpClient {
	fn new(steps: impl IntoIterator<Item = Step>) -> Self {
		Self { steps: Arc::new(Mutex::new(steps.into_iter().collect())), ..Default::default() }
	}

	fn requests(&self) -> Vec<Captured> {
		self.requests.lock().clone()
	}
}
impl OAuthHttpClient for ScriptedHttpClient {
	type Handle = ScriptedHandle;
	type TransportError = FakeTransportError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		ScriptedHandle { client: self.clone(), slot }
	}
}

struct ScriptedHandle {
	client: ScriptedHttpClient,
	slot: ResponseMetadataSlot,
}
impl<'a> AsyncHttpClient<'a> for ScriptedHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			assert!(self.slot.take().is_none(), "Metadata slot must start empty.");

			self.client.requests.lock().push(Captured {
				method: request.method().clone(),
				uri: request.uri().to_string(),
				headers: request.headers().clone(),
				body: request.body().clone(),
			});

			let step = self.client.steps.lock().pop_front().expect("Script ran out of steps.");

			match step {
				Step::Respond(status, body) => {
					let mut response = HttpResponse::new(body.as_bytes().to_vec());

					*response.status_mut() =
						StatusCode::from_u16(status).expect("Scripted status should be valid.");

					self.slot.store(ResponseMetadata { status: Some(status), retry_after: None });

					Ok(response)
				},
				Step::Fail(err) => Err(HttpClientError::Reqwest(Box::new(err))),
				Step::Throttle { status, retry_after } => {
					self.slot.store(ResponseMetadata {
						status: Some(status),
						retry_after: Some(retry_after),
					});

					Err(HttpClientError::Reqwest(Box::new(FakeTransportError::TimedOut)))
				},
			}
		})
	}
}

#[derive(Clone, Copy, Default)]
struct FakeMapper;
impl TransportErrorMapper<FakeTransportError> for FakeMapper {
	fn map_transport_error(
		&self,
		endpoint: Endpoint,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<FakeTransportError>,
	) -> Error {
		let transport = match err {
			HttpClientError::Reqwest(inner) => match *inner {
				FakeTransportError::TimedOut => TransportError::Timeout {
					status: meta.and_then(|value| value.status),
					retry_after: meta.and_then(|value| value.retry_after),
				},
				refused => TransportError::network(refused),
			},
			HttpClientError::Io(inner) => TransportError::Io(inner),
			other => TransportError::Other { message: other.to_string() },
		};

		endpoint.wrap(transport)
	}
}

type FakeStrategy = RakutenStrategy<ScriptedHttpClient, FakeMapper>;

fn fake_strategy(client: &ScriptedHttpClient, options: StrategyOptions) -> FakeStrategy {
	RakutenStrategy::with_http_client(options, client.clone(), FakeMapper)
		.expect("Strategy should build.")
}

fn options() -> StrategyOptions {
	StrategyOptions::new("fake-id", "fake-secret")
		.callback_url("https://app.example.com/callback")
		.token_url("https://rakuten.test/services/token")
		.profile_url("https://rakuten.test/services/api/FavoriteBookmark/List/20120627?")
}

fn callback(code: &str) -> CallbackParams {
	CallbackParams { code: Some(code.into()), ..Default::default() }
}

#[tokio::test]
async fn success_runs_exchange_then_fetch_then_verify_once() {
	let client = ScriptedHttpClient::new([
		Step::Respond(200, TOKEN_BODY),
		Step::Respond(200, r#"{"summary":{"count":3,"hits":3,"pageCount":1},"items":[]}"#),
	]);
	let strategy = fake_strategy(&client, options());
	let calls = Arc::new(AtomicUsize::new(0));
	let verify = {
		let calls = calls.clone();

		move |tokens: TokenPair, profile: Profile| {
			calls.fetch_add(1, Ordering::SeqCst);

			async move {
				assert_eq!(tokens.access_token.expose(), "fake-access");

				Ok::<_, Infallible>(profile.summary.and_then(|summary| summary.count))
			}
		}
	};
	let outcome = strategy
		.authenticate(callback("auth-code"), &AuthorizationOptions::default(), &verify)
		.await
		.expect("Authentication should succeed.");

	assert_eq!(outcome, Authentication::Success(3));
	assert_eq!(calls.load(Ordering::SeqCst), 1);

	let requests = client.requests();

	assert_eq!(requests.len(), 2);
	assert_eq!(requests[0].method, Method::POST);
	assert_eq!(requests[0].uri, "https://rakuten.test/services/token");
	assert_eq!(requests[1].method, Method::GET);
	assert_eq!(
		requests[1].uri,
		"https://rakuten.test/services/api/FavoriteBookmark/List/20120627?access_token=fake-access"
	);

	let form = requests[0].form();

	assert!(form.contains(&("code".into(), "auth-code".into())));
	assert!(form.contains(&("redirect_uri".into(), "https://app.example.com/callback".into())));
	assert!(form.contains(&("client_secret".into(), "fake-secret".into())));
}

#[tokio::test]
async fn basic_client_auth_keeps_the_secret_out_of_the_body() {
	let client = ScriptedHttpClient::new([Step::Respond(200, TOKEN_BODY)]);
	let strategy =
		fake_strategy(&client, options().client_auth_method(ClientAuthMethod::ClientSecretBasic));
	let tokens = strategy
		.exchange_code("auth-code", &AuthorizationOptions::default())
		.await
		.expect("Exchange should succeed.");

	assert_eq!(tokens.refresh_token.as_ref().map(|token| token.expose()), Some("fake-refresh"));

	let requests = client.requests();
	let header = requests[0]
		.headers
		.get(AUTHORIZATION)
		.and_then(|value| value.to_str().ok())
		.expect("Basic header should be sent.");
	let form = requests[0].form();

	assert!(header.starts_with("Basic "));
	assert!(form.iter().all(|(key, _)| key != "client_secret" && key != "client_id"));
}

#[tokio::test]
async fn token_transport_failure_skips_fetch_and_verify() {
	let client = ScriptedHttpClient::new([Step::Fail(FakeTransportError::Refused)]);
	let strategy = fake_strategy(&client, options());
	let calls = Arc::new(AtomicUsize::new(0));
	let verify = {
		let calls = calls.clone();

		move |_: TokenPair, _: Profile| {
			calls.fetch_add(1, Ordering::SeqCst);

			async { Ok::<Option<()>, Infallible>(Some(())) }
		}
	};
	let err = strategy
		.authenticate(callback("auth-code"), &AuthorizationOptions::default(), &verify)
		.await
		.expect_err("Transport failures must surface.");

	assert!(matches!(
		err,
		Error::TokenExchange(TokenExchangeError::Transport(TransportError::Network { .. }))
	));
	assert_eq!(client.requests().len(), 1);
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn profile_transport_failure_never_reached_the_provider() {
	let client = ScriptedHttpClient::new([
		Step::Respond(200, TOKEN_BODY),
		Step::Fail(FakeTransportError::Refused),
	]);
	let strategy = fake_strategy(&client, options());
	let calls = Arc::new(AtomicUsize::new(0));
	let verify = {
		let calls = calls.clone();

		move |_: TokenPair, _: Profile| {
			calls.fetch_add(1, Ordering::SeqCst);

			async { Ok::<Option<()>, Infallible>(Some(())) }
		}
	};
	let err = strategy
		.authenticate(callback("auth-code"), &AuthorizationOptions::default(), &verify)
		.await
		.expect_err("Profile transport failures must surface.");
	let Error::ResourceFetch(fetch) = &err else {
		panic!("Expected a resource fetch error.");
	};

	assert!(!fetch.reached_provider());
	assert!(matches!(fetch, ResourceFetchError::Transport(TransportError::Network { .. })));
	assert!(!format!("{err:?}").contains("fake-access"));
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn timeouts_carry_observed_metadata() {
	let client = ScriptedHttpClient::new([Step::Throttle {
		status: 503,
		retry_after: Duration::seconds(30),
	}]);
	let strategy = fake_strategy(&client, options());
	let err = strategy
		.exchange_code("auth-code", &AuthorizationOptions::default())
		.await
		.expect_err("Throttled exchanges must fail.");

	assert!(matches!(
		err,
		Error::TokenExchange(TokenExchangeError::Transport(TransportError::Timeout {
			status: Some(503),
			retry_after: Some(retry_after),
		})) if retry_after == Duration::seconds(30)
	));
}
