// SPDX-License-Identifier: Apache-2.0

//! Docker Engine inventory over the local unix socket.
//!
//! One `GET /containers/json` per query, on a fresh connection. The
//! response rows carry everything a descriptor needs: id, name, image,
//! and the labels holding per-source configuration. Each container's
//! json-file log lives at `<containers_dir>/<id>/<id>-json.log`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use http::header::HOST;
use http::{Request, StatusCode};
use http_body_util::{BodyExt, Empty};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use tokio::net::UnixStream;
use tracing::debug;

use super::{Inventory, SourceKind, SourceSpec};
use crate::error::{Error, Result};

pub const DEFAULT_SOCKET: &str = "/var/run/docker.sock";
pub const DEFAULT_CONTAINERS_DIR: &str = "/var/lib/docker/containers";

const LIST_CONTAINERS_URI: &str = "/v1.41/containers/json";

/// Row shape of `GET /containers/json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerSummary {
    id: String,
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    image: String,
    // null for containers without labels on some engine versions
    #[serde(default)]
    labels: Option<HashMap<String, String>>,
}

pub struct DockerInventory {
    socket_path: PathBuf,
    containers_dir: PathBuf,
}

impl DockerInventory {
    pub fn new(socket_path: impl Into<PathBuf>, containers_dir: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            containers_dir: containers_dir.into(),
        }
    }

    async fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut sender, connection) = http1::handshake(TokioIo::new(stream)).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                debug!(error = %e, "docker api connection closed with error");
            }
        });

        let request = Request::builder()
            .uri(LIST_CONTAINERS_URI)
            .header(HOST, "docker")
            .body(Empty::<Bytes>::new())?;
        let response = sender.send_request(request).await?;
        if response.status() != StatusCode::OK {
            return Err(Error::Inventory(format!(
                "docker api returned {}",
                response.status()
            )));
        }

        let body = response.into_body().collect().await?.to_bytes();
        Ok(serde_json::from_slice(&body)?)
    }

    fn to_spec(&self, container: ContainerSummary) -> SourceSpec {
        // docker prefixes names with a slash
        let name = container
            .names
            .first()
            .map(|n| n.trim_start_matches('/').to_string())
            .unwrap_or_else(|| container.id.chars().take(12).collect());
        let log_path = container_log_path(&self.containers_dir, &container.id);

        SourceSpec {
            identity: container.id,
            name,
            labels: container.labels.unwrap_or_default(),
            image: Some(container.image),
            log_path,
            kind: SourceKind::Container,
        }
    }
}

pub fn container_log_path(containers_dir: &Path, container_id: &str) -> PathBuf {
    containers_dir
        .join(container_id)
        .join(format!("{container_id}-json.log"))
}

#[async_trait]
impl Inventory for DockerInventory {
    async fn list_sources(&self) -> Result<Vec<SourceSpec>> {
        let containers = self.list_containers().await?;
        Ok(containers.into_iter().map(|c| self.to_spec(c)).collect())
    }
}
