//! Callback-driven authentication on top of [`RakutenStrategy`](crate::provider::RakutenStrategy).
//!
//! A host drives one attempt in two legs. The first request has no `code`, so
//! [`RakutenStrategy::authenticate`](crate::provider::RakutenStrategy::authenticate) answers with
//! [`Authentication::Redirect`]. The provider then redirects back with `code` (and `state`), and
//! the same call exchanges the code, fetches the profile, and hands both to the host's
//! [`Verify`] implementation exactly once.

pub mod authenticate;
pub mod verify;

pub use authenticate::*;
pub use verify::*;
