// SPDX-License-Identifier: Apache-2.0

//! End-to-end pipeline tests: a real engine following real files through
//! spawned follow processes, with records collected from the sink side.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use boxtail::engine::Engine;
use boxtail::error::Result;
use boxtail::inventory::{Inventory, SourceKind, SourceSpec};
use boxtail::reconciler::Reconciler;
use boxtail::sinks::Sink;
use boxtail::source::FORMAT_LABEL;

struct StaticInventory {
    sources: Vec<SourceSpec>,
}

#[async_trait]
impl Inventory for StaticInventory {
    async fn list_sources(&self) -> Result<Vec<SourceSpec>> {
        Ok(self.sources.clone())
    }
}

#[derive(Clone)]
struct CollectSink {
    records: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Sink for CollectSink {
    async fn handle(&mut self, record: &str) -> Result<()> {
        self.records.lock().unwrap().push(record.to_string());
        Ok(())
    }
}

async fn wait_for_records(records: &Arc<Mutex<Vec<String>>>, count: usize) {
    for _ in 0..100 {
        if records.lock().unwrap().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!(
        "expected {count} records, got {}",
        records.lock().unwrap().len()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn wrapped_json_lines_become_merged_records() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("web1.log");
    std::fs::write(
        &log_path,
        concat!(
            r#"{"log":"{\"level\":\"error\",\"message\":\"boom\"}\n","time":"2024-01-01T00:00:00Z"}"#,
            "\n",
            r#"{"log":"not json\n","time":"t"}"#,
            "\n",
        ),
    )
    .unwrap();

    let mut labels = HashMap::new();
    labels.insert(FORMAT_LABEL.to_string(), "json".to_string());
    let inventory = StaticInventory {
        sources: vec![SourceSpec {
            identity: "c-web1".to_string(),
            name: "web1".to_string(),
            labels,
            image: Some("web:latest".to_string()),
            log_path,
            kind: SourceKind::Container,
        }],
    };

    let records = Arc::new(Mutex::new(Vec::new()));
    let mut sink = CollectSink {
        records: records.clone(),
    };

    let reconciler = Reconciler::new(vec![Box::new(inventory)], Duration::from_millis(100));
    let mut engine = Engine::new(reconciler, Duration::from_millis(100));

    let cancel = CancellationToken::new();
    let engine_cancel = cancel.clone();
    let handle = tokio::spawn(async move {
        engine.run(&mut sink, engine_cancel).await;
    });

    wait_for_records(&records, 2).await;
    cancel.cancel();
    handle.await.unwrap();

    let collected = records.lock().unwrap();

    let first: Value = serde_json::from_str(&collected[0]).unwrap();
    assert_eq!(first["message"], json!("boom"));
    assert_eq!(first["severity"], json!("error"));
    assert_eq!(first["json"]["message"], json!("boom"));
    assert_eq!(first["type"], json!("dockerlogs"));
    assert_eq!(first["container_name"], json!("web1"));
    assert_eq!(first["@timestamp"], json!("2024-01-01T00:00:00Z"));

    let second: Value = serde_json::from_str(&collected[1]).unwrap();
    assert_eq!(second["message"], json!("not json"));
    assert!(second.get("parse_error").is_some());
    assert_eq!(second["type"], json!("dockerlogs"));
    assert_eq!(second["container_name"], json!("web1"));
    assert_eq!(second["@timestamp"], json!("t"));
}

#[tokio::test(flavor = "multi_thread")]
async fn plain_file_sources_forward_raw_lines() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("app.log");
    std::fs::write(&log_path, "hello from a file\n").unwrap();

    let inventory = StaticInventory {
        sources: vec![SourceSpec {
            identity: log_path.display().to_string(),
            name: "app.log".to_string(),
            labels: HashMap::new(),
            image: None,
            log_path,
            kind: SourceKind::File,
        }],
    };

    let records = Arc::new(Mutex::new(Vec::new()));
    let mut sink = CollectSink {
        records: records.clone(),
    };

    let reconciler = Reconciler::new(vec![Box::new(inventory)], Duration::from_millis(100));
    let mut engine = Engine::new(reconciler, Duration::from_millis(100));

    let cancel = CancellationToken::new();
    let engine_cancel = cancel.clone();
    let handle = tokio::spawn(async move {
        engine.run(&mut sink, engine_cancel).await;
    });

    wait_for_records(&records, 1).await;
    cancel.cancel();
    handle.await.unwrap();

    let collected = records.lock().unwrap();
    let record: Value = serde_json::from_str(&collected[0]).unwrap();
    assert_eq!(record["message"], json!("hello from a file"));
    assert_eq!(record["type"], json!("filetailer"));
    assert_eq!(record["app_name"], json!("app.log"));
    assert!(record.get("@timestamp").is_some());
}
