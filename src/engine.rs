// SPDX-License-Identifier: Apache-2.0

//! The multiplexing loop.
//!
//! One iteration interleaves two activities: wait across every registered
//! follow stream with a bounded timeout, drain whatever is ready into
//! records handed to the sink, then give the reconciler a chance to run.
//! The bound on the wait is a correctness requirement, not a tuning knob:
//! it keeps reconciliation live when no source produces output, so
//! topology changes are picked up within one interval regardless of log
//! volume.
//!
//! The engine is the sole owner and mutator of the registry; the
//! reconciler and stream teardown both run inside its control flow.

use std::time::Duration;

use tokio::select;
use tokio_stream::{StreamExt, StreamMap};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::reconciler::Reconciler;
use crate::registry::Registry;
use crate::sinks::Sink;
use crate::tailer::{TailStream, TailerId};

pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(1);

pub struct Engine {
    registry: Registry,
    streams: StreamMap<TailerId, TailStream>,
    reconciler: Reconciler,
    poll_timeout: Duration,
}

impl Engine {
    pub fn new(reconciler: Reconciler, poll_timeout: Duration) -> Self {
        Self {
            registry: Registry::new(),
            streams: StreamMap::new(),
            reconciler,
            poll_timeout,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run until cancelled. On cancellation every live tailer is stopped
    /// before returning, so no follow process outlives the engine.
    pub async fn run(&mut self, sink: &mut dyn Sink, cancel: CancellationToken) {
        info!("ingestion loop started");
        loop {
            select! {
                biased;

                _ = cancel.cancelled() => break,

                Some((id, next)) = self.streams.next(), if !self.streams.is_empty() => {
                    self.dispatch(id, next, sink).await;
                }

                _ = tokio::time::sleep(self.poll_timeout) => {}
            }

            // rate-limited internally
            self.reconciler.run(&mut self.registry, &mut self.streams).await;
        }
        self.shutdown().await;
    }

    async fn dispatch(&mut self, id: TailerId, next: std::io::Result<String>, sink: &mut dyn Sink) {
        match next {
            Ok(line) => {
                let Some(tailer) = self.registry.get_mut(id) else {
                    debug!(id, "line from deregistered stream, dropping");
                    return;
                };
                match tailer.record_for_line(&line) {
                    Ok(record) => {
                        if let Err(e) = sink.handle(&record).await {
                            warn!(error = %e, "sink delivery failed, dropping record");
                        }
                    }
                    Err(e) => {
                        warn!(
                            source = %tailer.descriptor().short_id,
                            error = %e,
                            line = %line,
                            "undecodable wrapper line, skipping"
                        );
                    }
                }
            }
            Err(e) => {
                // the follow process died or its pipe broke: reap this
                // source now instead of waiting for the next diff
                self.streams.remove(&id);
                if let Some(mut tailer) = self.registry.remove_by_id(id) {
                    warn!(
                        source = %tailer.descriptor().name,
                        error = %e,
                        "follow stream failed, stopping tailer"
                    );
                    tailer.stop().await;
                }
            }
        }
    }

    async fn shutdown(&mut self) {
        info!(tailers = self.registry.len(), "shutting down, stopping all tailers");
        for mut tailer in self.registry.drain() {
            self.streams.remove(&tailer.id());
            tailer.stop().await;
        }
    }
}
