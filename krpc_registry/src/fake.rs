// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! An in-process stand-in for a coordination service. Used by this crate's own tests, by
//! `krpc_core`'s integration tests, and by the demo binaries when no real ensemble is
//! configured — never a substitute for [`crate::zk::ZkRegistry`] in a real deployment.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::{NameRegistry, NodeFlags, RegistryError};

struct Node {
    data: Vec<u8>,
    flags: NodeFlags,
}

/// Mirrors just enough of a coordination service's semantics for testing: `create` is
/// idempotent, `get` returns empty data for a missing node rather than erroring, and
/// [`FakeRegistry::end_session`] models what happens to ephemeral nodes when a session
/// ends.
#[derive(Default)]
pub struct FakeRegistry {
    nodes: Mutex<HashMap<String, Node>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every ephemeral node, as a coordination service does automatically when the
    /// session that created them ends (spec.md §3, §8 law 6).
    pub fn end_session(&self) {
        let mut nodes = self.nodes.lock().unwrap();
        nodes.retain(|_, node| node.flags != NodeFlags::Ephemeral);
    }
}

impl NameRegistry for FakeRegistry {
    fn connect(&self) -> Result<(), RegistryError> {
        Ok(())
    }

    fn create(&self, path: &str, data: &[u8], flags: NodeFlags) -> Result<(), RegistryError> {
        let mut nodes = self.nodes.lock().unwrap();
        nodes
            .entry(path.to_string())
            .or_insert_with(|| Node { data: data.to_vec(), flags });
        Ok(())
    }

    fn get(&self, path: &str) -> Result<Vec<u8>, RegistryError> {
        let nodes = self.nodes.lock().unwrap();
        Ok(nodes.get(path).map(|node| node.data.clone()).unwrap_or_default())
    }
}
