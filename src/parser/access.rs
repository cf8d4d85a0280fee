// SPDX-License-Identifier: Apache-2.0

//! Combined access-log format (nextcloud/apache style).
//!
//! ```text
//! $remote_addr $ident $remote_user [$time_local] "$request" $status $bytes "$referer" "$user_agent"
//! ```
//!
//! The raw line is kept as `message`; the positional fields land in a
//! nested `nextcloud` object. Lines that do not match degrade to the raw
//! line plus a `parser_error` description rather than failing.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::ParsedFields;

/// Combined access log pattern with named captures.
pub const COMBINED_PATTERN: &str = r#"^(?P<ip>\S+) (?P<ident>\S+) (?P<user>\S+) \[(?P<time>[^\]]+)\] "(?P<request>[^"]*)" (?P<status>\S+) (?P<bytes>\S+) "(?P<referer>[^"]*)" "(?P<user_agent>[^"]*)""#;

const FIELD_NAMES: [&str; 9] = [
    "ip", "ident", "user", "time", "request", "status", "bytes", "referer", "user_agent",
];

static COMBINED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(COMBINED_PATTERN).expect("combined access log pattern must compile")
});

pub fn parse(line: &str) -> ParsedFields {
    let mut fields = ParsedFields::new();
    fields.insert("message".into(), Value::String(line.to_string()));

    match COMBINED_RE.captures(line) {
        Some(captures) => {
            let mut nested = Map::new();
            for name in FIELD_NAMES {
                if let Some(capture) = captures.name(name) {
                    nested.insert(name.to_string(), Value::String(capture.as_str().to_string()));
                }
            }
            fields.insert("nextcloud".into(), Value::Object(nested));
        }
        None => {
            fields.insert(
                "parser_error".into(),
                Value::String("line does not match combined access log format".to_string()),
            );
        }
    }
    fields
}
