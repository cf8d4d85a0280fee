// SPDX-License-Identifier: Apache-2.0

//! Outbound record delivery.
//!
//! Sinks are best-effort: the engine logs a failed delivery and moves on.
//! Construction is the one place that may fail hard — a malformed target
//! is a configuration error and the process should not start.

pub mod console;
pub mod syslog;
pub mod udp;

use async_trait::async_trait;
use clap::ValueEnum;

use crate::error::{Error, Result};

/// Consumer of serialized records.
#[async_trait]
pub trait Sink: Send {
    async fn handle(&mut self, record: &str) -> Result<()>;
}

/// Sink selection as exposed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SinkType {
    /// Write each record to stdout
    Print,
    /// Send each record as one UDP datagram
    Udp,
    /// Forward each record as an RFC3164 syslog message over UDP
    Syslog,
}

pub async fn build(sink_type: SinkType, url: Option<&str>) -> Result<Box<dyn Sink>> {
    match sink_type {
        SinkType::Print => Ok(Box::new(console::ConsoleSink::new())),
        SinkType::Udp => {
            let url = required_url(url, "udp")?;
            Ok(Box::new(udp::UdpSink::connect(url).await?))
        }
        SinkType::Syslog => {
            let url = required_url(url, "syslog")?;
            Ok(Box::new(syslog::SyslogSink::connect(url).await?))
        }
    }
}

fn required_url<'a>(url: Option<&'a str>, sink: &str) -> Result<&'a str> {
    url.ok_or_else(|| Error::Config(format!("the {sink} sink requires --sink-url")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn udp_sink_without_url_is_a_config_error() {
        assert!(matches!(build(SinkType::Udp, None).await, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn print_sink_needs_no_url() {
        assert!(build(SinkType::Print, None).await.is_ok());
    }
}
