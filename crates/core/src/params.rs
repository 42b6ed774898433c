//! Lenient typed lookups into a JSON options object.
//!
//! Each helper takes the options value, a key, and a default. Missing keys
//! and values of the wrong JSON type yield the default, matching how the
//! component treats unspecified options. These never fail.

use serde_json::Value;

/// `params[name]` as `f64`; integers are accepted.
pub fn param_f64(params: &Value, name: &str, default: f64) -> f64 {
    params.get(name).and_then(Value::as_f64).unwrap_or(default)
}

/// `params[name]` as `bool`.
pub fn param_bool(params: &Value, name: &str, default: bool) -> bool {
    params.get(name).and_then(Value::as_bool).unwrap_or(default)
}

/// `params[name]` as an owned string.
pub fn param_string(params: &Value, name: &str, default: &str) -> String {
    params
        .get(name)
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| default.to_owned())
}

/// `params[name]` as `u64`, or `None` when absent or not a non-negative integer.
pub fn param_opt_u64(params: &Value, name: &str) -> Option<u64> {
    params.get(name).and_then(Value::as_u64)
}
