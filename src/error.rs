//! Strategy-level error types shared by the OAuth core, the Rakuten provider, and flows.
//!
//! Every failure surfaces as one [`Error`]; [`Error::kind`] collapses it into the coarse
//! [`ErrorKind`] hosts usually branch on. None of the `Display` implementations below include
//! access tokens, client secrets, or request URLs.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error used for transport and host-supplied sources.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Coarse classification of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Bad or missing setup, detected at construction.
	Configuration,
	/// Provider redirected back with an OAuth error other than `access_denied`.
	Authorization,
	/// Token endpoint unreachable or it rejected the code.
	TokenExchange,
	/// Profile endpoint unreachable or it answered with a non-2xx status.
	ResourceFetch,
	/// Profile body is not parseable structured data.
	ProfileParse,
	/// Host verify callback aborted the attempt.
	Verify,
}
impl ErrorKind {
	/// Returns a stable label suitable for logs and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			ErrorKind::Configuration => "configuration",
			ErrorKind::Authorization => "authorization",
			ErrorKind::TokenExchange => "token_exchange",
			ErrorKind::ResourceFetch => "resource_fetch",
			ErrorKind::ProfileParse => "profile_parse",
			ErrorKind::Verify => "verify",
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Provider returned an OAuth error on the authorization redirect.
	#[error("Provider returned an authorization error: {code}.")]
	Authorization {
		/// OAuth `error` code from the redirect.
		code: String,
		/// OAuth `error_description`, when supplied.
		description: Option<String>,
		/// OAuth `error_uri`, when supplied.
		uri: Option<String>,
	},
	/// Authorization code could not be exchanged.
	#[error(transparent)]
	TokenExchange(#[from] TokenExchangeError),
	/// Protected resource could not be fetched.
	#[error(transparent)]
	ResourceFetch(#[from] ResourceFetchError),
	/// Protected resource body could not be normalized.
	#[error(transparent)]
	ProfileParse(#[from] ProfileParseError),
	/// Host verify callback returned an error.
	#[error("Verify callback aborted the authentication attempt.")]
	Verify {
		/// Error returned by the host.
		#[source]
		source: BoxError,
	},
}
impl Error {
	/// Wraps an error returned by a verify callback.
	pub fn verify(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Verify { source: Box::new(src) }
	}

	/// Classifies the error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Error::Config(_) => ErrorKind::Configuration,
			Error::Authorization { .. } => ErrorKind::Authorization,
			Error::TokenExchange(_) => ErrorKind::TokenExchange,
			Error::ResourceFetch(_) => ErrorKind::ResourceFetch,
			Error::ProfileParse(_) => ErrorKind::ProfileParse,
			Error::Verify { .. } => ErrorKind::Verify,
		}
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// `client_id` option is absent or blank.
	#[error("The client_id option is required.")]
	MissingClientId,
	/// `client_secret` option is absent or blank.
	#[error("The client_secret option is required.")]
	MissingClientSecret,
	/// An endpoint option cannot be parsed as a URL.
	#[error("The {endpoint} URL is invalid.")]
	InvalidEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// An endpoint URL cannot carry query parameters (e.g. `mailto:`).
	#[error("The {endpoint} URL cannot carry query parameters.")]
	OpaqueEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
	},
	/// Configured scopes are invalid.
	#[error("Configured scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO); the provider was never reached.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request timed out.
	#[error("Request timed out.")]
	Timeout {
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred.")]
	Io(#[from] std::io::Error),
	/// Transport could not turn the request into a wire request.
	#[error("HTTP request could not be prepared.")]
	Request {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// Any other client failure reported as a message.
	#[error("HTTP client error: {message}.")]
	Other {
		/// Client-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific request preparation error.
	pub fn request(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Request { source: Box::new(src) }
	}
}

/// Failures raised while exchanging an authorization code.
#[derive(Debug, ThisError)]
pub enum TokenExchangeError {
	/// Token endpoint could not be reached.
	#[error("Token endpoint could not be reached.")]
	Transport(#[from] TransportError),
	/// Token endpoint answered with a non-2xx status.
	#[error("Token endpoint rejected the authorization code with HTTP {status}.")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// OAuth `error` field, when the body carried one.
		oauth_error: Option<String>,
		/// OAuth `error_description` field.
		description: Option<String>,
		/// OAuth `error_uri` field.
		error_uri: Option<String>,
		/// Truncated response body for diagnostics.
		body_preview: Option<String>,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code.
		status: u16,
	},
	/// Token endpoint response carried no usable access token.
	#[error("Token endpoint response is missing access_token.")]
	MissingAccessToken {
		/// HTTP status code.
		status: u16,
	},
}

/// Failures raised while fetching a protected resource.
#[derive(Debug, ThisError)]
pub enum ResourceFetchError {
	/// Profile endpoint could not be reached.
	#[error("Failed to fetch user profile: the provider could not be reached.")]
	Transport(#[from] TransportError),
	/// Profile endpoint answered with a non-2xx status.
	#[error("Failed to fetch user profile: the provider responded with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Truncated response body for diagnostics.
		body_preview: Option<String>,
	},
}
impl ResourceFetchError {
	/// Returns `true` when the provider answered (and rejected) the request.
	pub fn reached_provider(&self) -> bool {
		matches!(self, ResourceFetchError::Status { .. })
	}

	/// HTTP status returned by the provider, if it answered.
	pub fn status(&self) -> Option<u16> {
		match self {
			ResourceFetchError::Status { status, .. } => Some(*status),
			ResourceFetchError::Transport(TransportError::Timeout { status, .. }) => *status,
			ResourceFetchError::Transport(_) => None,
		}
	}
}

/// Failures raised while normalizing a profile payload.
#[derive(Debug, ThisError)]
pub enum ProfileParseError {
	/// Payload is not valid UTF-8.
	#[error("Profile payload is not valid UTF-8.")]
	Encoding(#[from] std::string::FromUtf8Error),
	/// Payload is not valid JSON.
	#[error("Profile payload is not valid JSON.")]
	Json(#[from] serde_json::Error),
	/// Payload is JSON but not an object.
	#[error("Profile payload must be a JSON object, found {found}.")]
	NotAnObject {
		/// JSON type that was found instead.
		found: &'static str,
	},
}
