// SPDX-License-Identifier: Apache-2.0

//! Media-server style format: `[time] [SEV] logger: message`.
//!
//! Severities use three-letter abbreviations on the wire; the common ones
//! are widened to their conventional names, anything else passes through.

use serde_json::Value;

use super::ParsedFields;
use crate::error::{Error, Result};

pub fn parse(line: &str) -> Result<ParsedFields> {
    let (time_token, rest) = line.split_once(' ').ok_or_else(|| malformed(line))?;
    let (severity_token, rest) = rest.split_once(' ').ok_or_else(|| malformed(line))?;
    let (logger, message) = rest.split_once(": ").ok_or_else(|| malformed(line))?;

    let severity = normalize_severity(strip_brackets(severity_token));

    let mut fields = ParsedFields::new();
    fields.insert("severity".into(), Value::String(severity.to_string()));
    fields.insert("message".into(), Value::String(message.to_string()));
    fields.insert(
        "logger_timestamp".into(),
        Value::String(strip_brackets(time_token).to_string()),
    );
    fields.insert("logger_name".into(), Value::String(logger.to_string()));
    fields.insert("logger_raw".into(), Value::String(line.to_string()));
    Ok(fields)
}

fn strip_brackets(token: &str) -> &str {
    token
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .unwrap_or(token)
}

fn normalize_severity(severity: &str) -> &str {
    match severity {
        "INF" => "INFO",
        "ERR" => "ERROR",
        "WRN" => "WARN",
        other => other,
    }
}

fn malformed(line: &str) -> Error {
    Error::Parse(format!("jellyfin line missing delimiters: {line:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_all_fields_and_keeps_raw_line() {
        let line = "[10:15:32] [INF] Emby.Server: media scan complete";
        let fields = parse(line).unwrap();

        assert_eq!(fields["severity"], json!("INFO"));
        assert_eq!(fields["message"], json!("media scan complete"));
        assert_eq!(fields["logger_timestamp"], json!("10:15:32"));
        assert_eq!(fields["logger_name"], json!("Emby.Server"));
        assert_eq!(fields["logger_raw"], json!(line));
    }

    #[test]
    fn normalizes_known_severities_and_passes_through_others() {
        let err = parse("[t] [ERR] App: broke").unwrap();
        assert_eq!(err["severity"], json!("ERROR"));

        let wrn = parse("[t] [WRN] App: careful").unwrap();
        assert_eq!(wrn["severity"], json!("WARN"));

        let dbg = parse("[t] [DBG] App: detail").unwrap();
        assert_eq!(dbg["severity"], json!("DBG"));
    }

    #[test]
    fn message_may_contain_colons() {
        let fields = parse("[t] [INF] App: key: value").unwrap();
        assert_eq!(fields["logger_name"], json!("App"));
        assert_eq!(fields["message"], json!("key: value"));
    }

    #[test]
    fn malformed_lines_error() {
        assert!(parse("single-token").is_err());
        assert!(parse("[t] [INF] no-logger-separator").is_err());
    }
}
