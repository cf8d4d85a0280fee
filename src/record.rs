// SPDX-License-Identifier: Apache-2.0

//! Record assembly: the outer line-delivery wrapper and the envelope merge.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Static metadata attached to every record emitted for one source.
pub type Envelope = Map<String, Value>;

/// One line as written by docker's json-file log driver: the raw payload
/// plus the time the runtime captured it.
#[derive(Debug, Deserialize)]
pub struct WrappedLine {
    pub log: String,
    pub time: String,
}

/// Merge parsed fields with the source envelope and the wrapper timestamp.
///
/// Envelope keys overwrite same-named parsed keys, so routing and identity
/// fields can never be shadowed by parser output.
pub fn assemble(parsed: Map<String, Value>, envelope: &Envelope, timestamp: &str) -> Map<String, Value> {
    let mut record = parsed;
    for (key, value) in envelope {
        record.insert(key.clone(), value.clone());
    }
    record.insert("@timestamp".to_string(), Value::String(timestamp.to_string()));
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_wins_over_parsed_fields() {
        let mut parsed = Map::new();
        parsed.insert("message".into(), json!("hello"));
        parsed.insert("type".into(), json!("spoofed-by-parser"));

        let mut envelope = Envelope::new();
        envelope.insert("type".into(), json!("dockerlogs"));
        envelope.insert("container_name".into(), json!("web1"));

        let record = assemble(parsed, &envelope, "2024-01-01T00:00:00Z");

        assert_eq!(record["type"], json!("dockerlogs"));
        assert_eq!(record["container_name"], json!("web1"));
        assert_eq!(record["message"], json!("hello"));
        assert_eq!(record["@timestamp"], json!("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn wrapper_line_decodes_payload_and_time() {
        let line = r#"{"log":"boom\n","stream":"stdout","time":"2024-01-01T00:00:00Z"}"#;
        let wrapped: WrappedLine = serde_json::from_str(line).unwrap();
        assert_eq!(wrapped.log, "boom\n");
        assert_eq!(wrapped.time, "2024-01-01T00:00:00Z");
    }
}
