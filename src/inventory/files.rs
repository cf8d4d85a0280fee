// SPDX-License-Identifier: Apache-2.0

//! Static file inventory: a fixed list of files given on the command line.
//!
//! The set never changes at runtime, but routing it through the inventory
//! interface means file tailers get the same lifecycle handling as
//! containers (including re-creation if their tailer is torn down after a
//! stream failure).

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;

use super::{Inventory, SourceKind, SourceSpec};
use crate::error::Result;

pub struct FileInventory {
    paths: Vec<PathBuf>,
}

impl FileInventory {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

#[async_trait]
impl Inventory for FileInventory {
    async fn list_sources(&self) -> Result<Vec<SourceSpec>> {
        Ok(self
            .paths
            .iter()
            .map(|path| {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                SourceSpec {
                    identity: path.display().to_string(),
                    name,
                    labels: HashMap::new(),
                    image: None,
                    log_path: path.clone(),
                    kind: SourceKind::File,
                }
            })
            .collect())
    }
}
