//! Host-supplied verification of an authenticated identity.

// self
use crate::{_prelude::*, auth::TokenPair, provider::Profile};

/// Decides whether the tokens and profile of a completed exchange map to a local user.
///
/// Three outcomes: `Ok(Some(user))` accepts, `Ok(None)` rejects without an error (the attempt
/// fails normally), and `Err(e)` aborts the attempt with [`Error::Verify`].
///
/// Any `Fn(TokenPair, Profile) -> impl Future<Output = Result<Option<U>, E>>` implements this
/// trait, so most hosts pass an async closure.
pub trait Verify
where
	Self: Send + Sync,
{
	/// Local user produced on success.
	type User: Send;
	/// Error returned when verification itself fails.
	type Error: 'static + Send + Sync + StdError;

	/// Verifies one authenticated identity.
	fn verify(
		&self,
		tokens: TokenPair,
		profile: Profile,
	) -> impl Future<Output = Result<Option<Self::User>, Self::Error>> + Send;
}
impl<F, Fut, U, E> Verify for F
where
	F: Send + Sync + Fn(TokenPair, Profile) -> Fut,
	Fut: Send + Future<Output = Result<Option<U>, E>>,
	U: Send,
	E: 'static + Send + Sync + StdError,
{
	type Error = E;
	type User = U;

	fn verify(
		&self,
		tokens: TokenPair,
		profile: Profile,
	) -> impl Future<Output = Result<Option<U>, E>> + Send {
		self(tokens, profile)
	}
}
