//! Response interpretation for JSON gateway endpoints.
//!
//! Gateway services report failures inside the body (`err`, `error`, or `errors`) and wrap
//! many single-value results in a one-key envelope such as `{"score": 5}`. The helpers here
//! surface the former as [`Error::Remote`] and peel the latter. The envelope heuristic cannot
//! tell a genuine one-field object from an envelope; it always unwraps.

// crates.io
use http::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde_path_to_error::Track;
// self
use crate::{_prelude::*, transport::RawResponse};

const ERROR_FIELDS: [&str; 3] = ["err", "error", "errors"];

/// Returns `true` when the response declares a JSON media type.
pub fn is_json(response: &RawResponse) -> bool {
	response
		.headers()
		.get(CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.is_some_and(|value| value.to_ascii_lowercase().contains("json"))
}

/// Parses a JSON response and rejects gateway error payloads.
///
/// Non-JSON responses always fail with [`Error::Remote`] carrying the body text.
pub fn parse_json(response: &RawResponse) -> Result<JsonValue> {
	let status = Some(response.status().as_u16());

	if !is_json(response) {
		return Err(Error::Remote {
			message: String::from_utf8_lossy(response.body()).into_owned(),
			status,
		});
	}

	let mut de = serde_json::Deserializer::from_slice(response.body());
	let value: JsonValue = serde_path_to_error::deserialize(&mut de)?;

	// Anything but whitespace after the value makes the body malformed.
	de.end().map_err(|e| serde_path_to_error::Error::new(Track::new().path(), e))?;

	if let Some(message) = remote_error(&value) {
		return Err(Error::Remote { message, status });
	}

	Ok(value)
}

/// Peels a single-key object down to its sole value; arrays and other objects pass through.
pub fn unwrap_envelope(value: JsonValue) -> JsonValue {
	match value {
		JsonValue::Object(map) if map.len() == 1 =>
			map.into_iter().next().map(|(_, inner)| inner).unwrap_or(JsonValue::Null),
		value => value,
	}
}

/// Returns `field` from a parsed object, or `null` when absent.
pub fn select_field(value: JsonValue, field: &str) -> JsonValue {
	match value {
		JsonValue::Object(mut map) => map.remove(field).unwrap_or(JsonValue::Null),
		_ => JsonValue::Null,
	}
}

/// Deserializes `value` into `T`, reporting the failing JSON path.
pub fn decode<T>(value: JsonValue) -> Result<T>
where
	T: DeserializeOwned,
{
	Ok(serde_path_to_error::deserialize(value)?)
}

fn remote_error(value: &JsonValue) -> Option<String> {
	let object = value.as_object()?;

	ERROR_FIELDS.iter().filter_map(|field| object.get(*field)).find(|v| is_truthy(v)).map(|v| match v {
		JsonValue::String(s) => s.clone(),
		other => other.to_string(),
	})
}

fn is_truthy(value: &JsonValue) -> bool {
	match value {
		JsonValue::Null => false,
		JsonValue::Bool(b) => *b,
		JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.),
		JsonValue::String(s) => !s.is_empty(),
		JsonValue::Array(_) | JsonValue::Object(_) => true,
	}
}
