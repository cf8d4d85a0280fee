// SPDX-License-Identifier: Apache-2.0

//! Per-format line parsers and the dispatch wrapper.
//!
//! Each parser maps one raw line to a set of structured fields. The format
//! is fixed per source at descriptor construction, so dispatch is a plain
//! `match` over the closed [`LogFormat`] set. The fallback wrapper
//! guarantees a record is always produced: a line that does not match its
//! assigned format degrades to the plain parser's output instead of being
//! dropped or killing the loop.

pub mod access;
pub mod jellyfin;
pub mod json;
pub mod loguru;
pub mod redis;

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::Result;
use crate::source::{LogFormat, SourceDescriptor};

/// Fields extracted from one raw log line.
pub type ParsedFields = Map<String, Value>;

/// Parse a line as plain text. Never fails.
pub fn parse_plain(line: &str) -> ParsedFields {
    let mut fields = ParsedFields::new();
    fields.insert("message".into(), Value::String(line.to_string()));
    fields
}

/// Dispatch a line to the parser assigned to the source.
pub fn parse(format: LogFormat, json_msg_key: &str, line: &str) -> Result<ParsedFields> {
    match format {
        LogFormat::Plain => Ok(parse_plain(line)),
        LogFormat::Json => Ok(json::parse(line, json_msg_key)),
        LogFormat::LoguruPlain => loguru::parse(line),
        LogFormat::Jellyfin => jellyfin::parse(line),
        LogFormat::Nextcloud => Ok(access::parse(line)),
        LogFormat::Redis => redis::parse(line),
    }
}

/// Parse a line with the plain fallback.
pub fn parse_with_fallback(descriptor: &SourceDescriptor, line: &str) -> ParsedFields {
    match parse(descriptor.format, &descriptor.json_msg_key, line) {
        Ok(fields) => fields,
        Err(e) => {
            warn!(
                source = %descriptor.short_id,
                error = %e,
                line,
                "line did not match assigned format, falling back to plain"
            );
            parse_plain(line)
        }
    }
}
