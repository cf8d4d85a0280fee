// SPDX-License-Identifier: Apache-2.0

//! Fire-and-forget datagram sink: one record per UDP packet.

use async_trait::async_trait;
use tokio::net::UdpSocket;

use super::Sink;
use crate::error::{Error, Result};

pub struct UdpSink {
    socket: UdpSocket,
}

impl UdpSink {
    /// Connect to a `udp://host:port` target. Resolution and binding
    /// failures are configuration errors, surfaced at startup.
    pub async fn connect(url: &str) -> Result<Self> {
        let target = parse_udp_url(url)?;
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(target).await?;
        Ok(Self { socket })
    }
}

#[async_trait]
impl Sink for UdpSink {
    async fn handle(&mut self, record: &str) -> Result<()> {
        self.socket.send(record.as_bytes()).await?;
        Ok(())
    }
}

/// Split a `udp://host:port` URL into its target address.
pub(crate) fn parse_udp_url(url: &str) -> Result<&str> {
    let target = url
        .strip_prefix("udp://")
        .ok_or_else(|| Error::Config(format!("expected udp://host:port, got {url:?}")))?;
    if target.is_empty() || !target.contains(':') {
        return Err(Error::Config(format!("expected udp://host:port, got {url:?}")));
    }
    Ok(target)
}
