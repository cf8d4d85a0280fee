// SPDX-License-Identifier: Apache-2.0

//! RFC3164 syslog forwarding over UDP.
//!
//! Records go out as user-facility informational messages:
//! `<14>Mmm dd hh:mm:ss hostname tag: record`.

use async_trait::async_trait;
use chrono::Local;
use gethostname::gethostname;
use tokio::net::UdpSocket;

use super::udp::parse_udp_url;
use super::Sink;
use crate::error::Result;

const FACILITY_USER: u8 = 1;
const SEVERITY_INFO: u8 = 6;
const TAG: &str = "boxtail";

/// RFC3164 timestamp, day of month space-padded.
const STAMP_FORMAT: &str = "%b %e %H:%M:%S";

pub struct SyslogSink {
    socket: UdpSocket,
    hostname: String,
}

impl SyslogSink {
    /// Connect to a `udp://host:port` syslog collector.
    pub async fn connect(url: &str) -> Result<Self> {
        let target = parse_udp_url(url)?;
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(target).await?;
        let hostname = gethostname()
            .into_string()
            .unwrap_or_else(|_| "unknown".to_string());
        Ok(Self { socket, hostname })
    }
}

#[async_trait]
impl Sink for SyslogSink {
    async fn handle(&mut self, record: &str) -> Result<()> {
        let stamp = Local::now().format(STAMP_FORMAT).to_string();
        let message = frame(&self.hostname, &stamp, record);
        self.socket.send(message.as_bytes()).await?;
        Ok(())
    }
}

fn frame(hostname: &str, stamp: &str, body: &str) -> String {
    let priority = FACILITY_USER * 8 + SEVERITY_INFO;
    format!("<{priority}>{stamp} {hostname} {TAG}: {body}")
}
