//! Permissive, typed access to a request's `Params` object.
//!
//! The controller is loosely typed: numbers sometimes arrive as strings,
//! integers as floats, flags as `0`/`1`. Every lookup here takes an explicit
//! default and falls back to it when the key is absent **or** the value cannot
//! be coerced. Coercion fallbacks are logged at `warn!` and never surface as
//! errors; only a *required* field that is missing or blank is an error, and
//! that check lives in [`crate::protocol::commands`].

use serde_json::{Map, Value};
use tracing::warn;

/// Borrowed view over a request's parameter object.
#[derive(Debug, Clone, Copy)]
pub struct Params<'a> {
    map: Option<&'a Map<String, Value>>,
}

impl<'a> Params<'a> {
    pub fn new(map: Option<&'a Map<String, Value>>) -> Self {
        Self { map }
    }

    /// A view with no parameters at all.
    pub fn empty() -> Self {
        Self { map: None }
    }

    fn raw(&self, key: &str) -> Option<&'a Value> {
        self.map.and_then(|m| m.get(key)).filter(|v| !v.is_null())
    }

    /// Integer lookup. Accepts JSON integers, finite floats (rounded to the
    /// nearest integer) and numeric strings.
    pub fn i32_or(&self, key: &str, default: i32) -> i32 {
        self.i32_opt(key).unwrap_or(default)
    }

    /// Like [`Params::i32_or`] but yields `None` instead of a default.
    pub fn i32_opt(&self, key: &str) -> Option<i32> {
        let value = self.raw(key)?;
        let coerced = coerce_i32(value);
        if coerced.is_none() {
            warn!(key, ?value, "parameter is not an integer; ignoring it");
        }
        coerced
    }

    /// Floating point lookup. Accepts JSON numbers and numeric strings.
    pub fn f64_or(&self, key: &str, default: f64) -> f64 {
        let Some(value) = self.raw(key) else {
            return default;
        };
        let coerced = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|v| v.is_finite());
        match coerced {
            Some(v) => v,
            None => {
                warn!(key, ?value, default, "parameter is not a number; using default");
                default
            }
        }
    }

    /// Boolean lookup. Accepts JSON booleans, `"true"`/`"false"` in any case,
    /// and the integers `0`/`1`.
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        let Some(value) = self.raw(key) else {
            return default;
        };
        let coerced = match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Some(true),
            Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Some(false),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            _ => None,
        };
        match coerced {
            Some(v) => v,
            None => {
                warn!(key, ?value, default, "parameter is not a boolean; using default");
                default
            }
        }
    }

    /// String lookup. Only JSON strings are accepted.
    pub fn string_or(&self, key: &str, default: &str) -> String {
        match self.raw(key) {
            None => default.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(value) => {
                warn!(key, ?value, default, "parameter is not a string; using default");
                default.to_string()
            }
        }
    }

    /// String lookup that yields `None` for absent, non-string, or blank values.
    pub fn non_blank(&self, key: &str) -> Option<String> {
        let text = self.string_or(key, "");
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

fn coerce_i32(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).ok()
            } else {
                n.as_f64().and_then(round_to_i32)
            }
        }
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i32>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(round_to_i32))
        }
        _ => None,
    }
}

fn round_to_i32(v: f64) -> Option<i32> {
    let r = v.round();
    (r.is_finite() && r >= i32::MIN as f64 && r <= i32::MAX as f64).then_some(r as i32)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
