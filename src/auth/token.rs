//! Token secrets and the access/refresh pair produced by a code exchange.

// self
use crate::_prelude::*;

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Tokens returned by the token endpoint for one authentication attempt.
///
/// The pair lives as long as the attempt that produced it; persisting it is the host's call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenPair {
	/// Access token used as the bearer credential.
	pub access_token: TokenSecret,
	/// Refresh token, if the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Token type reported by the provider (usually `Bearer`).
	pub token_type: Option<String>,
	/// Space-delimited scope string granted by the provider, if reported.
	pub scope: Option<String>,
	/// Instant the exchange completed.
	pub issued_at: OffsetDateTime,
	/// Expiry derived from `expires_in`, when the provider reported a positive value.
	pub expires_at: Option<OffsetDateTime>,
}
impl TokenPair {
	/// Creates a pair issued now with no expiry metadata.
	pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: refresh_token.map(TokenSecret::new),
			token_type: None,
			scope: None,
			issued_at: OffsetDateTime::now_utc(),
			expires_at: None,
		}
	}

	/// Sets the expiry relative to `issued_at`.
	///
	/// Non-positive lifetimes, and lifetimes too large to represent as an instant, clear it.
	pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
		self.expires_at = if expires_in.is_positive() {
			self.issued_at.checked_add(expires_in)
		} else {
			None
		};

		self
	}

	/// Returns `true` when the access token is known to be expired at `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant >= expires_at)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn pair_debug_never_prints_tokens() {
		let pair = TokenPair::new("access-abc", Some("refresh-def".into()));
		let rendered = format!("{pair:?}");

		assert!(!rendered.contains("access-abc"));
		assert!(!rendered.contains("refresh-def"));
	}

	#[test]
	fn expiry_tracks_expires_in() {
		let pair = TokenPair::new("access", None).with_expires_in(Duration::seconds(60));
		let expires_at = pair.expires_at.expect("Positive lifetimes should set an expiry.");

		assert!(!pair.is_expired_at(pair.issued_at));
		assert!(pair.is_expired_at(expires_at));
		assert!(TokenPair::new("access", None).with_expires_in(Duration::ZERO).expires_at.is_none());
	}

	#[test]
	fn unrepresentable_expiry_is_dropped() {
		let pair = TokenPair::new("access", None).with_expires_in(Duration::seconds(i64::MAX));

		assert!(pair.expires_at.is_none());
		assert!(!pair.is_expired_at(pair.issued_at));
	}
}
