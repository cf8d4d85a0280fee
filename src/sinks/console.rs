// SPDX-License-Identifier: Apache-2.0

//! Stdout sink: one record per line.

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, Stdout};

use super::Sink;
use crate::error::Result;

pub struct ConsoleSink {
    stdout: Stdout,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            stdout: tokio::io::stdout(),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sink for ConsoleSink {
    async fn handle(&mut self, record: &str) -> Result<()> {
        self.stdout.write_all(record.as_bytes()).await?;
        self.stdout.write_all(b"\n").await?;
        self.stdout.flush().await?;
        Ok(())
    }
}
