// SPDX-License-Identifier: Apache-2.0

//! Bookkeeping for live tailers, keyed by handle id and by source identity.

use std::collections::HashMap;

use crate::tailer::{Tailer, TailerId};

/// The live tailer set. Created by the engine at startup and mutated only
/// from the engine's control flow (reconciliation and stream teardown);
/// at most one tailer exists per source identity.
#[derive(Default)]
pub struct Registry {
    by_id: HashMap<TailerId, Tailer>,
    by_identity: HashMap<String, TailerId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tailer: Tailer) {
        self.by_identity
            .insert(tailer.descriptor().identity.clone(), tailer.id());
        self.by_id.insert(tailer.id(), tailer);
    }

    pub fn get_mut(&mut self, id: TailerId) -> Option<&mut Tailer> {
        self.by_id.get_mut(&id)
    }

    pub fn contains_identity(&self, identity: &str) -> bool {
        self.by_identity.contains_key(identity)
    }

    pub fn contains_id(&self, id: TailerId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn id_of(&self, identity: &str) -> Option<TailerId> {
        self.by_identity.get(identity).copied()
    }

    pub fn identities(&self) -> impl Iterator<Item = &String> {
        self.by_identity.keys()
    }

    pub fn remove_by_identity(&mut self, identity: &str) -> Option<Tailer> {
        let id = self.by_identity.remove(identity)?;
        self.by_id.remove(&id)
    }

    pub fn remove_by_id(&mut self, id: TailerId) -> Option<Tailer> {
        let tailer = self.by_id.remove(&id)?;
        self.by_identity.remove(&tailer.descriptor().identity);
        Some(tailer)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Take every tailer out, leaving the registry empty. Used on shutdown.
    pub fn drain(&mut self) -> Vec<Tailer> {
        self.by_identity.clear();
        self.by_id.drain().map(|(_, tailer)| tailer).collect()
    }
}
