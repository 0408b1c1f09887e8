//! Canonicalization and HMAC-SHA256 signing shared with the gateway.
//!
//! The gateway recomputes every signature on its side, so both modes here are a wire
//! contract: keys are visited in byte-wise ascending order, booleans render as
//! `true`/`false`, and digests are encoded as uppercase hex.

// crates.io
use hmac::{Hmac, Mac};
use sha2::Sha256;
// self
use crate::{
	_prelude::*,
	value::{Map, Value, number_to_string},
};

type HmacSha256 = Hmac<Sha256>;

/// Selects how sign data is fed into the digest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignMode {
	/// Digest over the canonical byte string of the whole map; used for JSON payloads.
	Json,
	/// Digest over sorted `key ++ value` pairs; used for query, form, and raw payloads.
	Param,
}
impl SignMode {
	/// Signs `data` with `secret` in this mode.
	pub fn sign(self, secret: &[u8], data: &Map) -> String {
		match self {
			Self::Json => sign_json(secret, data),
			Self::Param => sign_param(secret, data),
		}
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Json => "json",
			Self::Param => "param",
		}
	}
}
impl Display for SignMode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Serializes `value` into its canonical, key-order independent byte form.
///
/// Arrays keep their element order, maps emit `key ++ canonical(value)` in sorted key order,
/// and `null` contributes nothing.
pub fn canonicalize(value: &Value) -> Vec<u8> {
	let mut buf = Vec::new();

	write_canonical(value, &mut buf);

	buf
}

/// Canonicalizes a top-level map without wrapping it in a [`Value`].
pub fn canonicalize_map(map: &Map) -> Vec<u8> {
	let mut buf = Vec::new();

	write_canonical_map(map, &mut buf);

	buf
}

fn write_canonical(value: &Value, buf: &mut Vec<u8>) {
	match value {
		Value::Null => {},
		Value::Bool(true) => buf.extend_from_slice(b"true"),
		Value::Bool(false) => buf.extend_from_slice(b"false"),
		Value::Number(n) => buf.extend_from_slice(number_to_string(n).as_bytes()),
		Value::String(s) => buf.extend_from_slice(s.as_bytes()),
		Value::Bytes(b) => buf.extend_from_slice(b),
		Value::Array(items) =>
			for item in items {
				write_canonical(item, buf);
			},
		Value::Map(map) => write_canonical_map(map, buf),
	}
}

fn write_canonical_map(map: &Map, buf: &mut Vec<u8>) {
	// `BTreeMap` iterates keys in byte-wise ascending order.
	for (key, value) in map {
		buf.extend_from_slice(key.as_bytes());
		write_canonical(value, buf);
	}
}

/// JSON-mode signature: uppercase hex HMAC-SHA256 of [`canonicalize_map`].
pub fn sign_json(secret: &[u8], data: &Map) -> String {
	let mut mac = new_mac(secret);

	mac.update(&canonicalize_map(data));

	finish(mac)
}

/// Param-mode signature: uppercase hex HMAC-SHA256 fed each sorted key, then its value as raw
/// bytes for blobs or as its JavaScript string form otherwise.
pub fn sign_param(secret: &[u8], data: &Map) -> String {
	let mut mac = new_mac(secret);

	for (key, value) in data {
		mac.update(key.as_bytes());

		match value {
			Value::Bytes(b) => mac.update(b),
			value => mac.update(value.to_param_string().as_bytes()),
		}
	}

	finish(mac)
}

fn new_mac(secret: &[u8]) -> HmacSha256 {
	<HmacSha256 as Mac>::new_from_slice(secret).expect("HMAC-SHA256 accepts keys of any length.")
}

fn finish(mac: HmacSha256) -> String {
	hex::encode_upper(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::value::{compact, map};

	fn is_upper_hex(signature: &str) -> bool {
		signature.len() == 64
			&& signature.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
	}

	#[test]
	fn canonical_form_ignores_key_order() {
		let mut first = Map::new();

		first.insert("zeta".into(), Value::from(1));
		first.insert("alpha".into(), Value::from("a"));
		first.insert("mid".into(), Value::Map(map([("y", 2), ("x", 1)])));

		let mut second = Map::new();

		second.insert("mid".into(), Value::Map(map([("x", 1), ("y", 2)])));
		second.insert("alpha".into(), Value::from("a"));
		second.insert("zeta".into(), Value::from(1));

		assert_eq!(canonicalize_map(&first), canonicalize_map(&second));
		assert_eq!(canonicalize_map(&first), b"alphaamidx1y2zeta1");
	}

	#[test]
	fn canonical_form_keeps_array_order_and_renders_literals() {
		let value = Value::from(vec![
			Value::from("b"),
			Value::from("a"),
			Value::from(true),
			Value::from(false),
			Value::Null,
			Value::from(2.5),
			Value::from(b"\x00\x01".to_vec()),
		]);

		assert_eq!(canonicalize(&value), b"batruefalse2.5\x00\x01");
	}

	#[test]
	fn param_signature_matches_reference_vector() {
		let data = map([
			("timestamp", Value::from(1_700_000_000)),
			("a", Value::from("x")),
			("pathname", Value::from("/p")),
			("key", Value::from("K")),
		]);
		let signature = sign_param(b"S", &data);

		assert_eq!(signature, "DD92AA9B2C5D8070BE7021DCF5ECB9AECBBA68C786C57784B083315B0E5684D3");
		assert!(is_upper_hex(&signature));
	}

	#[test]
	fn json_signature_matches_reference_vector() {
		let nested = map([("d", Value::Null), ("c", Value::from("z"))]);
		let data = map([
			("b", Value::from(vec![Value::from(1), Value::from(true), Value::Map(nested)])),
			("a", Value::from("x")),
		]);

		assert_eq!(
			sign_json(b"S", &data),
			"1183179D1A2674D88A13042B0FA8D51672EA5D5D245E56508CFF8890AA6431C7"
		);
	}

	#[test]
	fn param_signature_feeds_blobs_as_raw_bytes() {
		let data = map([
			("raw", Value::from(vec![0_u8, 255, 1])),
			("key", Value::from("K")),
			("pathname", Value::from("/file/a.bin")),
			("timestamp", Value::from(1_700_000_000)),
		]);

		assert_eq!(
			sign_param(b"S", &data),
			"178BA1EB0C836D6DA36194E4D6ADAED9B59B5A15EBA22F8EB06C93F77B81C454"
		);
	}

	#[test]
	fn compaction_removes_empty_fields_from_signature() {
		let with_empty = map([("a", Value::from("x")), ("b", Value::from(""))]);
		let without = map([("a", Value::from("x"))]);

		assert_eq!(sign_param(b"S", &compact(&with_empty)), sign_param(b"S", &without));
		assert_eq!(sign_json(b"S", &compact(&with_empty)), sign_json(b"S", &without));
		assert_ne!(sign_param(b"S", &with_empty), sign_param(b"S", &without));
	}

	#[test]
	fn signatures_are_deterministic_uppercase_hex() {
		let data = map([("flag", Value::from(true)), ("n", Value::from(42))]);

		for mode in [SignMode::Json, SignMode::Param] {
			let first = mode.sign(b"secret", &data);

			assert_eq!(first, mode.sign(b"secret", &data));
			assert!(is_upper_hex(&first), "{mode} signature should be uppercase hex: {first}");
		}
		assert_eq!(
			sign_param(b"", &Map::new()),
			"B613679A0814D9EC772F95D778C35FC5FF1697C493715653C6C712144292C5AD"
		);
	}
}
