//! Loosely typed request values plus the coercion rules the gateway signs with.
//!
//! Query strings, form bodies, JSON payloads, and sign data all share the [`Value`] model so
//! the canonicalizer and both signing modes see exactly one representation. String coercion
//! and truthiness follow the gateway's JavaScript reference: `true` becomes `"true"`, `1.0`
//! becomes `"1"`, and `""`, `0`, `false`, and `null` are falsy.

// crates.io
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde_json::Number;
use url::form_urlencoded;
// self
use crate::_prelude::*;

/// Sorted string-keyed map used for query, form, JSON payloads, and sign data.
pub type Map = BTreeMap<String, Value>;

/// A single request value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
	/// Absent value.
	#[default]
	Null,
	/// Boolean literal.
	Bool(bool),
	/// Integer or floating-point number.
	Number(Number),
	/// UTF-8 text.
	String(String),
	/// Binary blob, fed to signers as raw bytes.
	Bytes(Bytes),
	/// Ordered sequence; element order is significant.
	Array(Vec<Value>),
	/// Nested map; keys are always visited in sorted order.
	Map(Map),
}
impl Value {
	/// Returns `false` for values the gateway treats as empty: `null`, `false`, `0`, `NaN`,
	/// and `""`. Byte buffers, arrays, and maps are always truthy, even when empty.
	pub fn is_truthy(&self) -> bool {
		match self {
			Self::Null => false,
			Self::Bool(b) => *b,
			Self::Number(n) => n.as_f64().is_some_and(|f| f != 0. && !f.is_nan()),
			Self::String(s) => !s.is_empty(),
			Self::Bytes(_) | Self::Array(_) | Self::Map(_) => true,
		}
	}

	/// Coerces the value to a string the way `"" + value` does in JavaScript.
	///
	/// Arrays are comma-joined with `null` elements rendered empty, maps render as
	/// `[object Object]`, and byte buffers decode as (lossy) UTF-8.
	pub fn to_param_string(&self) -> String {
		match self {
			Self::Null => "null".into(),
			Self::Bool(b) => b.to_string(),
			Self::Number(n) => number_to_string(n),
			Self::String(s) => s.clone(),
			Self::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
			Self::Array(items) => items
				.iter()
				.map(|item| match item {
					Self::Null => String::new(),
					item => item.to_param_string(),
				})
				.collect::<Vec<_>>()
				.join(","),
			Self::Map(_) => "[object Object]".into(),
		}
	}

	/// Returns the inner map, if this value is one.
	pub fn as_map(&self) -> Option<&Map> {
		match self {
			Self::Map(map) => Some(map),
			_ => None,
		}
	}
}
impl From<&str> for Value {
	fn from(v: &str) -> Self {
		Self::String(v.to_owned())
	}
}
impl From<String> for Value {
	fn from(v: String) -> Self {
		Self::String(v)
	}
}
impl From<&String> for Value {
	fn from(v: &String) -> Self {
		Self::String(v.clone())
	}
}
impl From<bool> for Value {
	fn from(v: bool) -> Self {
		Self::Bool(v)
	}
}
impl From<f64> for Value {
	fn from(v: f64) -> Self {
		// NaN and infinities have no JSON form; both collapse to null.
		Number::from_f64(v).map(Self::Number).unwrap_or(Self::Null)
	}
}
impl From<Bytes> for Value {
	fn from(v: Bytes) -> Self {
		Self::Bytes(v)
	}
}
impl From<Vec<u8>> for Value {
	fn from(v: Vec<u8>) -> Self {
		Self::Bytes(v.into())
	}
}
impl From<Vec<Value>> for Value {
	fn from(v: Vec<Value>) -> Self {
		Self::Array(v)
	}
}
impl From<Map> for Value {
	fn from(v: Map) -> Self {
		Self::Map(v)
	}
}
impl<T> From<Option<T>> for Value
where
	T: Into<Value>,
{
	fn from(v: Option<T>) -> Self {
		v.map(Into::into).unwrap_or(Self::Null)
	}
}
impl From<JsonValue> for Value {
	fn from(v: JsonValue) -> Self {
		match v {
			JsonValue::Null => Self::Null,
			JsonValue::Bool(b) => Self::Bool(b),
			JsonValue::Number(n) => Self::Number(n),
			JsonValue::String(s) => Self::String(s),
			JsonValue::Array(items) => Self::Array(items.into_iter().map(Into::into).collect()),
			JsonValue::Object(map) => Self::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
		}
	}
}
macro_rules! impl_from_integer {
	($($ty:ty),*) => {
		$(
			impl From<$ty> for Value {
				fn from(v: $ty) -> Self {
					Self::Number(v.into())
				}
			}
		)*
	};
}
impl_from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
impl Serialize for Value {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match self {
			Self::Null => serializer.serialize_unit(),
			Self::Bool(b) => serializer.serialize_bool(*b),
			Self::Number(n) => n.serialize(serializer),
			Self::String(s) => serializer.serialize_str(s),
			Self::Bytes(b) => serializer.serialize_bytes(b),
			Self::Array(items) => {
				let mut seq = serializer.serialize_seq(Some(items.len()))?;

				for item in items {
					seq.serialize_element(item)?;
				}

				seq.end()
			},
			Self::Map(map) => {
				let mut out = serializer.serialize_map(Some(map.len()))?;

				for (k, v) in map {
					out.serialize_entry(k, v)?;
				}

				out.end()
			},
		}
	}
}

/// Builds a [`Map`] from key/value pairs.
pub fn map<I, K, V>(entries: I) -> Map
where
	I: IntoIterator<Item = (K, V)>,
	K: Into<String>,
	V: Into<Value>,
{
	entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

/// Returns a copy of `map` without its falsy top-level fields.
pub fn compact(map: &Map) -> Map {
	map.iter().filter(|(_, v)| v.is_truthy()).map(|(k, v)| (k.clone(), v.clone())).collect()
}

/// Encodes the compacted map as `application/x-www-form-urlencoded`.
///
/// Array values expand into repeated `key=value` pairs.
pub fn encode_form(map: &Map) -> String {
	let mut serializer = form_urlencoded::Serializer::new(String::new());

	for (key, value) in map.iter().filter(|(_, v)| v.is_truthy()) {
		match value {
			Value::Array(items) =>
				for item in items {
					serializer.append_pair(key, &form_scalar(item));
				},
			value => {
				serializer.append_pair(key, &form_scalar(value));
			},
		}
	}

	serializer.finish()
}

fn form_scalar(value: &Value) -> String {
	match value {
		Value::Null | Value::Map(_) => String::new(),
		value => value.to_param_string(),
	}
}

/// Formats a number like JavaScript's `Number.prototype.toString`.
pub(crate) fn number_to_string(n: &Number) -> String {
	if n.is_i64() || n.is_u64() {
		return n.to_string();
	}

	let Some(f) = n.as_f64() else {
		return n.to_string();
	};
	let abs = f.abs();

	if f == 0. {
		return "0".into();
	}
	if abs >= 1e21 || abs < 1e-6 {
		let formatted = format!("{f:e}");

		// Rust omits the sign of positive exponents; JavaScript always prints it.
		return match formatted.split_once('e') {
			Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
			_ => formatted,
		};
	}
	if f.fract() == 0. {
		return format!("{}", f as i128);
	}

	format!("{f}")
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn float(f: f64) -> Value {
		Value::from(f)
	}

	#[test]
	fn truthiness_matches_gateway_rules() {
		assert!(!Value::Null.is_truthy());
		assert!(!Value::from(false).is_truthy());
		assert!(!Value::from(0).is_truthy());
		assert!(!float(0.).is_truthy());
		assert!(!float(-0.).is_truthy());
		assert!(!Value::from("").is_truthy());
		assert!(Value::from("0").is_truthy());
		assert!(Value::from(-1).is_truthy());
		assert!(Value::Bytes(Bytes::new()).is_truthy());
		assert!(Value::Array(Vec::new()).is_truthy());
		assert!(Value::Map(Map::new()).is_truthy());
	}

	#[test]
	fn param_strings_follow_javascript_coercion() {
		assert_eq!(Value::from(true).to_param_string(), "true");
		assert_eq!(Value::from(123).to_param_string(), "123");
		assert_eq!(float(1.0).to_param_string(), "1");
		assert_eq!(float(1.5).to_param_string(), "1.5");
		assert_eq!(float(-2.25).to_param_string(), "-2.25");
		assert_eq!(float(1e21).to_param_string(), "1e+21");
		assert_eq!(float(1.5e-7).to_param_string(), "1.5e-7");
		assert_eq!(Value::Null.to_param_string(), "null");
		assert_eq!(
			Value::from(vec![Value::from(1), Value::Null, Value::from("x")]).to_param_string(),
			"1,,x"
		);
		assert_eq!(Value::Map(map([("a", 1)])).to_param_string(), "[object Object]");
		assert_eq!(Value::from(b"raw".to_vec()).to_param_string(), "raw");
	}

	#[test]
	fn compact_drops_only_falsy_fields() {
		let source = map([
			("a", Value::from("x")),
			("b", Value::from("")),
			("c", Value::from(0)),
			("d", Value::from(false)),
			("e", Value::Null),
			("f", Value::Array(Vec::new())),
		]);
		let compacted = compact(&source);

		assert_eq!(compacted.keys().map(String::as_str).collect::<Vec<_>>(), ["a", "f"]);
	}

	#[test]
	fn json_conversion_preserves_structure() {
		let json = serde_json::json!({"b": [1, true, null], "a": {"x": "y"}});
		let value = Value::from(json.clone());

		assert_eq!(serde_json::to_value(&value).expect("Value should serialize to JSON."), json);
	}

	#[test]
	fn form_encoding_compacts_and_repeats_arrays() {
		let form = map([
			("name", Value::from("foo bar")),
			("empty", Value::from("")),
			("ids", Value::from(vec![Value::from(1), Value::from(2)])),
			("flag", Value::from(true)),
		]);

		assert_eq!(encode_form(&form), "flag=true&ids=1&ids=2&name=foo+bar");
	}
}
