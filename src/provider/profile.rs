//! Normalized Rakuten profile and the transform that builds it.
//!
//! Rakuten answers profile requests with either a favorite-bookmark listing
//! (`{"summary":{..},"items":[{"item":{..}}]}`) or a member record. [`normalize_profile`] reads
//! both shapes field by field. A source field that is missing or `null` stays `None` and is
//! omitted when the profile is serialized; a field that is present but empty (`""`, `[]`) is kept
//! as such.

// self
use crate::{_prelude::*, error::ProfileParseError, oauth::RawProfileResponse, provider::PROVIDER_NAME};

type Object = Map<String, Value>;

/// Provider-neutral user profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
	/// Always [`PROVIDER_NAME`].
	pub provider: String,
	/// Stable user identifier (`id` or `openId`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	/// Display name (`displayName` or `nickName`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub display_name: Option<String>,
	/// Structured name; absent when the payload carries neither part.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<ProfileName>,
	/// Gender (`gender` or `sex`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub gender: Option<String>,
	/// Public profile page.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub profile_url: Option<String>,
	/// Email addresses in payload order.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub emails: Option<Vec<ProfileValue>>,
	/// Photo URLs in payload order.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub photos: Option<Vec<ProfileValue>>,
	/// Bookmark listing summary.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub summary: Option<BookmarkSummary>,
	/// Bookmarked items in payload order.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub items: Option<Vec<Bookmark>>,
	/// Payload text exactly as received.
	#[serde(rename = "_raw")]
	pub raw: String,
	/// Payload parsed as JSON.
	#[serde(rename = "_json")]
	pub parsed: Value,
}

/// Family and given name parts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileName {
	/// Family name (`familyName` or `lastName`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub family_name: Option<String>,
	/// Given name (`givenName` or `firstName`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub given_name: Option<String>,
}

/// Single `{ "value": .. }` entry used for emails and photos.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileValue {
	/// The email address or URL.
	pub value: String,
}

/// Paging summary of a bookmark listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkSummary {
	/// Total number of bookmarks.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub count: Option<u64>,
	/// Bookmarks returned on this page.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub hits: Option<u64>,
	/// Number of pages.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub page_count: Option<u64>,
}

/// One favorite-bookmark entry.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bookmark_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub item_code: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub product_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub shop_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub shop_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub item_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub item_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub small_image_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub medium_image_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub review_count: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub review_url: Option<String>,
	/// Kept as text; Rakuten sends it as a decimal string.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub review_average: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub point_rate: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub postage_flag: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tax_flag: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub affiliate_url: Option<String>,
}
impl Bookmark {
	fn from_object(obj: &Object) -> Self {
		Self {
			bookmark_id: text(obj, &["bookmarkId"]),
			item_code: text(obj, &["itemCode"]),
			product_id: text(obj, &["productId"]),
			shop_name: text(obj, &["shopName"]),
			shop_url: text(obj, &["shopUrl"]),
			item_name: text(obj, &["itemName"]),
			item_url: text(obj, &["itemUrl"]),
			small_image_url: text(obj, &["smallImageUrl"]),
			medium_image_url: text(obj, &["mediumImageUrl"]),
			review_count: count(obj, "reviewCount"),
			review_url: text(obj, &["reviewUrl"]),
			review_average: text(obj, &["reviewAverage"]),
			point_rate: count(obj, "pointRate"),
			postage_flag: count(obj, "postageFlag"),
			tax_flag: count(obj, "taxFlag"),
			affiliate_url: text(obj, &["affiliateUrl"]),
		}
	}
}

/// Parses a profile payload and maps it into a [`Profile`].
///
/// Pure and synchronous; normalizing the same payload twice yields equal profiles.
pub fn normalize_profile(raw: &RawProfileResponse) -> Result<Profile, ProfileParseError> {
	let body = String::from_utf8(raw.body.clone())?;
	let parsed = serde_json::from_str::<Value>(&body)?;
	let Some(obj) = parsed.as_object() else {
		return Err(ProfileParseError::NotAnObject { found: json_type(&parsed) });
	};
	let family_name = text(obj, &["familyName", "lastName"]);
	let given_name = text(obj, &["givenName", "firstName"]);
	let name = (family_name.is_some() || given_name.is_some())
		.then_some(ProfileName { family_name, given_name });
	let emails = values(obj, "emails")
		.or_else(|| text(obj, &["emailAddress"]).map(|value| vec![ProfileValue { value }]));
	let summary = field(obj, "summary").and_then(Value::as_object).map(|summary| BookmarkSummary {
		count: count(summary, "count"),
		hits: count(summary, "hits"),
		page_count: count(summary, "pageCount"),
	});
	let items = field(obj, "items").and_then(Value::as_array).map(|entries| {
		entries
			.iter()
			.filter_map(|entry| entry.get("item").unwrap_or(entry).as_object())
			.map(Bookmark::from_object)
			.collect()
	});

	Ok(Profile {
		provider: PROVIDER_NAME.to_owned(),
		id: text(obj, &["id", "openId"]),
		display_name: text(obj, &["displayName", "nickName"]),
		name,
		gender: text(obj, &["gender", "sex"]),
		profile_url: text(obj, &["profileUrl"]),
		emails,
		photos: values(obj, "photos"),
		summary,
		items,
		raw: body,
		parsed,
	})
}

// `null` is treated as absent.
fn field<'a>(obj: &'a Object, key: &str) -> Option<&'a Value> {
	obj.get(key).filter(|value| !value.is_null())
}

fn text(obj: &Object, keys: &[&str]) -> Option<String> {
	keys.iter().find_map(|key| match field(obj, key)? {
		Value::String(value) => Some(value.clone()),
		Value::Number(value) => Some(value.to_string()),
		Value::Bool(value) => Some(value.to_string()),
		_ => None,
	})
}

fn count(obj: &Object, key: &str) -> Option<u64> {
	match field(obj, key)? {
		Value::Number(value) => value.as_u64(),
		Value::String(value) => value.trim().parse().ok(),
		_ => None,
	}
}

fn values(obj: &Object, key: &str) -> Option<Vec<ProfileValue>> {
	let entry_value = |entry: &Value| match entry {
		Value::String(value) => Some(value.clone()),
		Value::Object(inner) => text(inner, &["value"]),
		_ => None,
	};

	match field(obj, key)? {
		Value::Array(entries) =>
			Some(entries.iter().filter_map(entry_value).map(|value| ProfileValue { value }).collect()),
		Value::String(value) => Some(vec![ProfileValue { value: value.clone() }]),
		_ => None,
	}
}

fn json_type(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}
