// SPDX-License-Identifier: Apache-2.0

//! Source discovery: where the set of live log sources comes from.
//!
//! An inventory answers one question, "which sources are live right now",
//! with a stable identity per source. The reconciler diffs successive
//! answers against the registry; everything else about a source is read
//! once, when its descriptor is built.

pub mod docker;
pub mod files;

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Container,
    File,
}

/// One live source as reported by an inventory.
#[derive(Debug, Clone)]
pub struct SourceSpec {
    /// Stable across successive queries for the same live source
    pub identity: String,
    pub name: String,
    /// Per-source configuration (format selection, message-key override)
    pub labels: HashMap<String, String>,
    pub image: Option<String>,
    /// File the follow process will tail
    pub log_path: PathBuf,
    pub kind: SourceKind,
}

/// A queryable catalog of live sources.
#[async_trait]
pub trait Inventory: Send + Sync {
    async fn list_sources(&self) -> Result<Vec<SourceSpec>>;
}
