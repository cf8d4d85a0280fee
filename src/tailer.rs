// SPDX-License-Identifier: Apache-2.0

//! One live follow process per source.
//!
//! A tailer binds a [`SourceDescriptor`] to a spawned `tail -F` of the
//! descriptor's log file. Starting hands the engine a line stream to
//! register with its readiness map; the tailer keeps the child so the
//! process can be killed and reaped when the source goes away.

use std::pin::Pin;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio_stream::wrappers::LinesStream;
use tokio_stream::{Stream, StreamExt};
use tracing::debug;

use crate::error::{Error, Result};
use crate::parser;
use crate::record::{self, WrappedLine};
use crate::source::SourceDescriptor;

/// Stable multiplexing key for a started tailer.
pub type TailerId = u64;

static NEXT_TAILER_ID: AtomicU64 = AtomicU64::new(1);

/// Line stream handed to the engine on start. The stream ends with an
/// explicit `UnexpectedEof` error item so a dying follow process surfaces
/// as a readable event instead of a silent stream removal.
pub type TailStream = Pin<Box<dyn Stream<Item = std::io::Result<String>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailerState {
    /// Descriptor bound, no process yet
    Created,
    /// Follow process spawned, stream registered
    Started,
    /// At least one line has been read
    Active,
    /// Process reaped, stream deregistered. Never reused.
    Terminated,
}

pub struct Tailer {
    descriptor: SourceDescriptor,
    id: TailerId,
    state: TailerState,
    child: Option<Child>,
}

impl Tailer {
    pub fn new(descriptor: SourceDescriptor) -> Self {
        Self {
            descriptor,
            id: NEXT_TAILER_ID.fetch_add(1, Ordering::Relaxed),
            state: TailerState::Created,
            child: None,
        }
    }

    pub fn id(&self) -> TailerId {
        self.id
    }

    pub fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> TailerState {
        self.state
    }

    /// Spawn the follow process and return its line stream.
    ///
    /// Calling this twice on the same tailer is a programmer error, not a
    /// runtime condition.
    pub fn start(&mut self) -> Result<TailStream> {
        if self.state != TailerState::Created {
            return Err(Error::AlreadyStarted(self.descriptor.name.clone()));
        }

        let mut child = Command::new("tail")
            .arg("-F")
            .arg(&self.descriptor.log_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Config("follow process spawned without stdout".to_string()))?;

        self.child = Some(child);
        self.state = TailerState::Started;
        debug!(
            source = %self.descriptor.short_id,
            path = %self.descriptor.log_path.display(),
            id = self.id,
            "follow process started"
        );

        let lines = LinesStream::new(BufReader::new(stdout).lines());
        let eof = tokio_stream::once(Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "follow stream closed",
        )));
        Ok(Box::pin(lines.chain(eof)))
    }

    /// Build the outbound record for one raw line read from the stream:
    /// wrapper decode, parser dispatch with fallback, envelope merge,
    /// serialization.
    pub fn record_for_line(&mut self, line: &str) -> Result<String> {
        if self.state == TailerState::Started {
            self.state = TailerState::Active;
        }

        let wrapped = if self.descriptor.wrapped {
            serde_json::from_str::<WrappedLine>(line)?
        } else {
            WrappedLine {
                log: line.to_string(),
                time: chrono::Utc::now().to_rfc3339(),
            }
        };

        let payload = wrapped.log.trim_end();
        let fields = parser::parse_with_fallback(&self.descriptor, payload);
        let record = record::assemble(fields, &self.descriptor.envelope, &wrapped.time);
        Ok(serde_json::to_string(&record)?)
    }

    /// Terminate the follow process and reap it. Idempotent: stopping an
    /// already-terminated tailer is a no-op, which tolerates races between
    /// stream teardown and reconciliation.
    pub async fn stop(&mut self) {
        if self.state == TailerState::Terminated {
            return;
        }
        self.state = TailerState::Terminated;
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                debug!(source = %self.descriptor.short_id, error = %e, "follow process already gone");
            }
        }
        debug!(source = %self.descriptor.short_id, id = self.id, "tailer stopped");
    }
}
