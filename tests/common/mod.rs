//! Shared fixtures for integration tests.

#![allow(dead_code)]

// crates.io
use httpmock::MockServer;
// self
use oauth2_rakuten::{
	config::StrategyOptions,
	provider::{RakutenStrategy, ReqwestRakutenStrategy},
};

pub const CLIENT_ID: &str = "rakuten-app-id";
pub const CLIENT_SECRET: &str = "rakuten-app-secret";
pub const CALLBACK_URL: &str = "https://app.example.com/auth/rakuten/callback";
pub const ACCESS_TOKEN: &str = "rakuten-access-token";
pub const PROFILE_PATH: &str = "/services/api/FavoriteBookmark/List/20120627";

/// Bookmark listing returned by Rakuten's favorite-bookmark API.
pub const BOOKMARKS: &str = r#"{"summary":{"count":1,"hits":1,"pageCount":1},"items":[{"item":{"bookmarkId":"4709771","itemCode":"book:11024900","productId":"","shopName":"楽天ブックス","shopUrl":"http://www.rakuten.co.jp/book","itemName":"マネジメント [ ピーター・ファーディナンド・ドラッカー ]","itemUrl":"http://item.rakuten.co.jp/book/1401537","smallImageUrl":"http://thumbnail.image.rakuten.co.jp/@0_mall/book/cabinet/0233/9784478410233.jpg?_ex=64x64","mediumImageUrl":"http://thumbnail.image.rakuten.co.jp/@0_mall/book/cabinet/0233/9784478410233.jpg?_ex=128x128","reviewCount":590,"reviewUrl":"http://review.rakuten.co.jp/item/1/213310_11024900/1.1/","pointRate":0,"reviewAverage":"4.25","postageFlag":0,"taxFlag":0,"affiliateUrl":""}}]}"#;

/// Options whose endpoints all point at `server`, mirroring the Rakuten URL layout.
pub fn mock_options(server: &MockServer) -> StrategyOptions {
	StrategyOptions::new(CLIENT_ID, CLIENT_SECRET)
		.callback_url(CALLBACK_URL)
		.authorization_url(server.url("/services/authorize"))
		.token_url(server.url("/services/token"))
		.profile_url(format!("{}?", server.url(PROFILE_PATH)))
}

/// Reqwest-backed strategy bound to `options`.
pub fn build_strategy(options: StrategyOptions) -> ReqwestRakutenStrategy {
	RakutenStrategy::new(options).expect("Strategy should build from test options.")
}
