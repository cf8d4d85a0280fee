// SPDX-License-Identifier: Apache-2.0

//! Keeps the live tailer set aligned with the source inventories.
//!
//! Reconciliation is a plain set difference on source identities: sources
//! in the inventory but not the registry get a started tailer; registry
//! entries whose source disappeared get stopped and deregistered. The
//! reconciler rate-limits itself so the engine can invoke it on every loop
//! iteration without flooding the inventory.

use std::collections::HashSet;
use std::time::Duration;

use tokio::time::Instant;
use tokio_stream::StreamMap;
use tracing::{info, warn};

use crate::inventory::{Inventory, SourceSpec};
use crate::registry::Registry;
use crate::source::SourceDescriptor;
use crate::tailer::{TailStream, Tailer, TailerId};

pub const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(6);

pub struct Reconciler {
    inventories: Vec<Box<dyn Inventory>>,
    interval: Duration,
    last_run: Option<Instant>,
}

impl Reconciler {
    pub fn new(inventories: Vec<Box<dyn Inventory>>, interval: Duration) -> Self {
        Self {
            inventories,
            interval,
            last_run: None,
        }
    }

    /// Align the registry with the inventories. Calls within the configured
    /// interval of the previous run are no-ops.
    pub async fn run(&mut self, registry: &mut Registry, streams: &mut StreamMap<TailerId, TailStream>) {
        if let Some(last) = self.last_run {
            if last.elapsed() < self.interval {
                return;
            }
        }
        self.last_run = Some(Instant::now());

        let mut live: Vec<SourceSpec> = Vec::new();
        for inventory in &self.inventories {
            match inventory.list_sources().await {
                Ok(mut sources) => live.append(&mut sources),
                Err(e) => {
                    // transient: a failed query must never reap live tailers
                    warn!(error = %e, "inventory query failed, skipping reconciliation cycle");
                    return;
                }
            }
        }

        let live_ids: HashSet<&str> = live.iter().map(|s| s.identity.as_str()).collect();

        let dead: Vec<String> = registry
            .identities()
            .filter(|identity| !live_ids.contains(identity.as_str()))
            .cloned()
            .collect();
        for identity in dead {
            if let Some(mut tailer) = registry.remove_by_identity(&identity) {
                streams.remove(&tailer.id());
                info!(source = %tailer.descriptor().name, "source gone, stopping tailer");
                tailer.stop().await;
            }
        }

        for spec in live {
            if registry.contains_identity(&spec.identity) {
                continue;
            }
            let descriptor = SourceDescriptor::from_spec(&spec);
            let mut tailer = Tailer::new(descriptor);
            match tailer.start() {
                Ok(stream) => {
                    info!(source = %tailer.descriptor().name, id = tailer.id(), "following new source");
                    streams.insert(tailer.id(), stream);
                    registry.insert(tailer);
                }
                Err(e) => {
                    warn!(source = %spec.name, error = %e, "failed to start tailer");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::error::{Error, Result};
    use crate::inventory::SourceKind;

    struct StaticInventory {
        sources: Mutex<Vec<SourceSpec>>,
        calls: AtomicUsize,
        fail: Mutex<bool>,
    }

    impl StaticInventory {
        fn new(sources: Vec<SourceSpec>) -> Arc<Self> {
            Arc::new(Self {
                sources: Mutex::new(sources),
                calls: AtomicUsize::new(0),
                fail: Mutex::new(false),
            })
        }

        fn set_sources(&self, sources: Vec<SourceSpec>) {
            *self.sources.lock().unwrap() = sources;
        }

        fn set_fail(&self, fail: bool) {
            *self.fail.lock().unwrap() = fail;
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Inventory for Arc<StaticInventory> {
        async fn list_sources(&self) -> Result<Vec<SourceSpec>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if *self.fail.lock().unwrap() {
                return Err(Error::Inventory("inventory down".to_string()));
            }
            Ok(self.sources.lock().unwrap().clone())
        }
    }

    fn file_spec(dir: &TempDir, id: &str) -> SourceSpec {
        let path = dir.path().join(format!("{id}.log"));
        std::fs::write(&path, b"").unwrap();
        SourceSpec {
            identity: id.to_string(),
            name: id.to_string(),
            labels: HashMap::new(),
            image: None,
            log_path: path,
            kind: SourceKind::File,
        }
    }

    async fn teardown(registry: &mut Registry) {
        for mut tailer in registry.drain() {
            tailer.stop().await;
        }
    }

    #[tokio::test]
    async fn unchanged_inventory_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let inventory = StaticInventory::new(vec![file_spec(&dir, "a"), file_spec(&dir, "b")]);
        let mut reconciler = Reconciler::new(vec![Box::new(inventory)], Duration::ZERO);
        let mut registry = Registry::new();
        let mut streams = StreamMap::new();

        reconciler.run(&mut registry, &mut streams).await;
        assert_eq!(registry.len(), 2);
        assert_eq!(streams.len(), 2);
        let id_a = registry.id_of("a").unwrap();
        let id_b = registry.id_of("b").unwrap();

        reconciler.run(&mut registry, &mut streams).await;
        assert_eq!(registry.len(), 2);
        assert_eq!(streams.len(), 2);
        assert_eq!(registry.id_of("a").unwrap(), id_a);
        assert_eq!(registry.id_of("b").unwrap(), id_b);

        teardown(&mut registry).await;
    }

    #[tokio::test]
    async fn diff_creates_and_destroys_exactly_the_changed_sources() {
        let dir = TempDir::new().unwrap();
        let inventory = StaticInventory::new(vec![file_spec(&dir, "a"), file_spec(&dir, "b")]);
        let mut reconciler = Reconciler::new(vec![Box::new(inventory.clone())], Duration::ZERO);
        let mut registry = Registry::new();
        let mut streams = StreamMap::new();

        reconciler.run(&mut registry, &mut streams).await;
        let id_a = registry.id_of("a").unwrap();
        let id_b = registry.id_of("b").unwrap();

        inventory.set_sources(vec![file_spec(&dir, "b"), file_spec(&dir, "c")]);
        reconciler.run(&mut registry, &mut streams).await;

        assert_eq!(registry.len(), 2);
        assert!(!registry.contains_identity("a"));
        assert!(registry.contains_identity("b"));
        assert!(registry.contains_identity("c"));
        // b untouched, a's handle fully deregistered
        assert_eq!(registry.id_of("b").unwrap(), id_b);
        assert!(!registry.contains_id(id_a));
        assert!(!streams.contains_key(&id_a));
        assert_eq!(streams.len(), 2);

        teardown(&mut registry).await;
    }

    #[tokio::test]
    async fn failed_query_skips_the_cycle_without_reaping() {
        let dir = TempDir::new().unwrap();
        let inventory = StaticInventory::new(vec![file_spec(&dir, "a")]);
        let mut reconciler = Reconciler::new(vec![Box::new(inventory.clone())], Duration::ZERO);
        let mut registry = Registry::new();
        let mut streams = StreamMap::new();

        reconciler.run(&mut registry, &mut streams).await;
        assert_eq!(registry.len(), 1);

        inventory.set_fail(true);
        reconciler.run(&mut registry, &mut streams).await;
        assert_eq!(registry.len(), 1);
        assert_eq!(streams.len(), 1);

        teardown(&mut registry).await;
    }

    #[tokio::test(start_paused = true)]
    async fn runs_at_most_once_per_interval() {
        let inventory = StaticInventory::new(vec![]);
        let mut reconciler =
            Reconciler::new(vec![Box::new(inventory.clone())], DEFAULT_RECONCILE_INTERVAL);
        let mut registry = Registry::new();
        let mut streams = StreamMap::new();

        reconciler.run(&mut registry, &mut streams).await;
        reconciler.run(&mut registry, &mut streams).await;
        assert_eq!(inventory.calls(), 1);

        tokio::time::advance(Duration::from_secs(7)).await;
        reconciler.run(&mut registry, &mut streams).await;
        assert_eq!(inventory.calls(), 2);
    }
}
