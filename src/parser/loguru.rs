// SPDX-License-Identifier: Apache-2.0

//! Loguru-style plain format: `timestamp | SEVERITY | logger - message`.

use serde_json::Value;

use super::ParsedFields;
use crate::error::{Error, Result};

pub fn parse(line: &str) -> Result<ParsedFields> {
    let (timestamp, rest) = line.split_once('|').ok_or_else(|| malformed(line))?;
    let (severity, rest) = rest.split_once('|').ok_or_else(|| malformed(line))?;
    let (logger, message) = rest.split_once(" - ").ok_or_else(|| malformed(line))?;

    let mut fields = ParsedFields::new();
    fields.insert("logger_timestamp".into(), Value::String(timestamp.trim().to_string()));
    fields.insert("severity".into(), Value::String(severity.trim().to_string()));
    fields.insert("logger_name".into(), Value::String(logger.trim().to_string()));
    fields.insert("message".into(), Value::String(message.trim().to_string()));
    Ok(fields)
}

fn malformed(line: &str) -> Error {
    Error::Parse(format!("loguru line missing delimiters: {line:?}"))
}
