//! Rakuten provider: fixed endpoints, the profile normalizer, and the strategy that ties them to
//! the OAuth core.
//!
//! `profile` turns raw Rakuten payloads (bookmark listings or member records) into a
//! [`Profile`]. `strategy` exposes [`RakutenStrategy`], which owns one validated
//! [`StrategyConfig`](crate::config::StrategyConfig) and an [`OAuth2Client`](crate::oauth::OAuth2Client).

pub mod profile;
pub mod strategy;

pub use profile::*;
pub use strategy::*;

// self
use crate::{config::ProviderDefaults, oauth::AccessTokenPlacement};

/// Strategy name hosts register the strategy under.
pub const PROVIDER_NAME: &str = "rakuten";
/// Default authorization endpoint.
pub const AUTHORIZATION_URL: &str = "https://app.rakuten.co.jp/services/authorize";
/// Default token endpoint.
pub const TOKEN_URL: &str = "https://app.rakuten.co.jp/services/token";
/// Default profile endpoint (favorite bookmark listing).
pub const PROFILE_URL: &str = "https://app.rakuten.co.jp/services/api/FavoriteBookmark/List/20120627?";

/// Rakuten defaults applied by [`RakutenStrategy::new`].
///
/// Rakuten's web APIs read the token from the `access_token` query parameter.
pub const DEFAULTS: ProviderDefaults = ProviderDefaults {
	authorization_url: AUTHORIZATION_URL,
	token_url: TOKEN_URL,
	profile_url: PROFILE_URL,
	scope_separator: " ",
	access_token_placement: AccessTokenPlacement::QueryParameter,
};
