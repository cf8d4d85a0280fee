// SPDX-License-Identifier: Apache-2.0

//! Per-source metadata: the assigned log format and the static envelope.

use std::path::PathBuf;

use gethostname::gethostname;
use serde_json::Value;

use crate::inventory::{SourceKind, SourceSpec};
use crate::record::Envelope;

/// Container label selecting the log format for a source.
pub const FORMAT_LABEL: &str = "boxtail_format";
/// Container label overriding the message key used by the json format.
pub const JSON_MSG_KEY_LABEL: &str = "boxtail_json_msg_key";

pub const DEFAULT_JSON_MSG_KEY: &str = "message";

/// Log format assigned to a source.
///
/// The set is closed; unknown or absent labels fall back to `Plain`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Raw log lines, no parsing
    #[default]
    Plain,
    /// One JSON object per line
    Json,
    /// `timestamp | SEVERITY | logger - message`
    LoguruPlain,
    /// `[time] [SEV] logger: message`
    Jellyfin,
    /// Combined access log (nextcloud/apache style)
    Nextcloud,
    /// `timestamp * message` redis server log
    Redis,
}

impl LogFormat {
    /// Resolve a format label, case-insensitively. Anything unrecognized
    /// maps to `Plain`.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(|l| l.to_ascii_lowercase()).as_deref() {
            Some("json") => LogFormat::Json,
            Some("loguru_plain") => LogFormat::LoguruPlain,
            Some("jellyfin") => LogFormat::Jellyfin,
            Some("nextcloud") => LogFormat::Nextcloud,
            Some("redis") => LogFormat::Redis,
            _ => LogFormat::Plain,
        }
    }
}

/// Immutable description of one followed source: identity, where its byte
/// stream lives, how its lines are parsed, and the envelope stamped onto
/// every record it produces.
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    /// Opaque stable id: container id or file path
    pub identity: String,
    /// Display name
    pub name: String,
    /// Short identity for log lines
    pub short_id: String,
    pub format: LogFormat,
    /// Message key used by the json format
    pub json_msg_key: String,
    /// File followed by the tailer
    pub log_path: PathBuf,
    pub envelope: Envelope,
    /// Whether lines carry the json-file delivery wrapper
    pub wrapped: bool,
}

impl SourceDescriptor {
    pub fn from_spec(spec: &SourceSpec) -> Self {
        match spec.kind {
            SourceKind::Container => Self::for_container(spec),
            SourceKind::File => Self::for_file(spec),
        }
    }

    fn for_container(spec: &SourceSpec) -> Self {
        let short_id: String = spec.identity.chars().take(12).collect();

        let format = LogFormat::from_label(spec.labels.get(FORMAT_LABEL).map(String::as_str));
        let json_msg_key = spec
            .labels
            .get(JSON_MSG_KEY_LABEL)
            .cloned()
            .unwrap_or_else(|| DEFAULT_JSON_MSG_KEY.to_string());

        let mut envelope = Envelope::new();
        envelope.insert("type".into(), Value::String("dockerlogs".into()));
        envelope.insert("container_name".into(), Value::String(spec.name.clone()));
        envelope.insert("container_id".into(), Value::String(spec.identity.clone()));
        envelope.insert("container_short_id".into(), Value::String(short_id.clone()));
        if let Some(image) = &spec.image {
            envelope.insert("container_image".into(), Value::String(image.clone()));
        }
        envelope.insert("hostname".into(), Value::String(local_hostname()));

        Self {
            identity: spec.identity.clone(),
            name: spec.name.clone(),
            short_id,
            format,
            json_msg_key,
            log_path: spec.log_path.clone(),
            envelope,
            wrapped: true,
        }
    }

    fn for_file(spec: &SourceSpec) -> Self {
        let mut envelope = Envelope::new();
        envelope.insert("type".into(), Value::String("filetailer".into()));
        envelope.insert("app_name".into(), Value::String(spec.name.clone()));
        envelope.insert("hostname".into(), Value::String(local_hostname()));

        Self {
            identity: spec.identity.clone(),
            name: spec.name.clone(),
            short_id: spec.name.clone(),
            format: LogFormat::from_label(spec.labels.get(FORMAT_LABEL).map(String::as_str)),
            json_msg_key: DEFAULT_JSON_MSG_KEY.to_string(),
            log_path: spec.log_path.clone(),
            envelope,
            wrapped: false,
        }
    }
}

fn local_hostname() -> String {
    gethostname()
        .into_string()
        .unwrap_or_else(|_| "unknown".to_string())
}
