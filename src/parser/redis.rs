// SPDX-License-Identifier: Apache-2.0

//! Redis server log format: `timestamp * message` or `timestamp # message`.

use serde_json::Value;

use super::ParsedFields;
use crate::error::{Error, Result};

pub fn parse(line: &str) -> Result<ParsedFields> {
    let (timestamp, message) = line
        .split_once(" * ")
        .or_else(|| line.split_once(" # "))
        .ok_or_else(|| Error::Parse(format!("redis line missing '*' or '#' separator: {line:?}")))?;

    let mut fields = ParsedFields::new();
    fields.insert("message".into(), Value::String(message.trim().to_string()));
    fields.insert("logger_timestamp".into(), Value::String(timestamp.trim().to_string()));
    Ok(fields)
}
