// SPDX-License-Identifier: Apache-2.0

//! JSON line format: one object per line, message under a configurable key,
//! severity under `level`, the full decoded object under `json`.
//!
//! This parser never fails: undecodable lines degrade to the raw line plus
//! a `parse_error` description.

use serde_json::{Map, Value};

use super::ParsedFields;

pub fn parse(line: &str, msg_key: &str) -> ParsedFields {
    let obj: Map<String, Value> = match serde_json::from_str(line) {
        Ok(Value::Object(obj)) => obj,
        Ok(_) => return degraded(line, "JSON line is not an object"),
        Err(e) => return degraded(line, &format!("invalid JSON: {e}")),
    };

    let message = match obj.get(msg_key) {
        Some(message) => message.clone(),
        None => return degraded(line, &format!("message key {msg_key:?} missing")),
    };
    let severity = obj
        .get("level")
        .cloned()
        .unwrap_or_else(|| Value::String("UNKNOWN".to_string()));

    let mut fields = ParsedFields::new();
    fields.insert("message".into(), message);
    fields.insert("severity".into(), severity);
    fields.insert("json".into(), Value::Object(obj));
    fields
}

fn degraded(line: &str, error: &str) -> ParsedFields {
    let mut fields = ParsedFields::new();
    fields.insert("message".into(), Value::String(line.to_string()));
    fields.insert("parse_error".into(), Value::String(error.to_string()));
    fields
}
