// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Masking of sensitive keys in flat mappings.
//!
//! Only top-level keys are inspected. Values nested inside objects or arrays
//! are left as they are.

use serde_json::{Map, Value};

/// Replacement for every masked value.
pub const MASK: &str = "******";

/// Keys whose values never leave the normalizer, compared case-insensitively.
pub const SENSITIVE_KEYS: [&str; 6] = ["password", "token", "mobile", "phone", "cardNo", "auth"];

pub fn is_sensitive_key(key: &str) -> bool {
	SENSITIVE_KEYS
		.iter()
		.any(|sensitive| sensitive.eq_ignore_ascii_case(key))
}

fn has_content(value: &Value) -> bool {
	match value {
		Value::Null | Value::Bool(false) => false,
		Value::String(s) => !s.is_empty(),
		_ => true,
	}
}

/// Masks sensitive keys of `map` in place.
pub fn redact_map(map: &mut Map<String, Value>) {
	for (key, value) in map.iter_mut() {
		if is_sensitive_key(key) && has_content(value) {
			*value = Value::String(MASK.to_string());
		}
	}
}

/// Returns `value` with sensitive keys masked if it is an object; any other
/// value is returned unchanged.
pub fn redact_fields(value: Value) -> Value {
	match value {
		Value::Object(mut map) => {
			redact_map(&mut map);
			Value::Object(map)
		}
		other => other,
	}
}
