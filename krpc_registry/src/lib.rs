// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! A thin abstraction over a coordination service's client library, used for the service
//! discovery this framework deliberately doesn't implement itself (spec.md §1, §4.2). The
//! production implementation, [`zk::ZkRegistry`], wraps the `zookeeper` crate; tests and
//! the demo binaries can instead use [`fake::FakeRegistry`], an in-process stand-in.

pub mod fake;
pub mod zk;

use std::fmt;

#[derive(Debug)]
pub enum RegistryError {
    ConnectFailed(String),
    CreateFailed(String),
    GetFailed(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::ConnectFailed(reason) => write!(f, "connect failed: {reason}"),
            RegistryError::CreateFailed(reason) => write!(f, "create failed: {reason}"),
            RegistryError::GetFailed(reason) => write!(f, "get failed: {reason}"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Whether a node should outlive the session that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeFlags {
    /// Survives session end. Used for the `/service` parent node (spec.md §4.2).
    Persistent,
    /// Removed automatically when the owning session ends. Used for `/service/method`
    /// nodes, so a crashed or disconnected provider's addresses stop resolving on their
    /// own (spec.md §3, §8 law 6).
    Ephemeral,
}

/// Service discovery, generalized from the original's direct ZooKeeper calls (spec.md
/// §4.2). A server registers itself by `create`ing nodes; a client resolves an address by
/// `get`ting the node a server registered.
pub trait NameRegistry: Send + Sync {
    /// Establishes a session with the coordination service. Blocks until connected or the
    /// attempt definitively fails.
    fn connect(&self) -> Result<(), RegistryError>;

    /// Creates a node at `path` holding `data`. Creating a node that already exists at
    /// that exact path is a no-op, not an error — this matches the original's idempotent
    /// `ZkClient::Create` (spec.md §4.2).
    fn create(&self, path: &str, data: &[u8], flags: NodeFlags) -> Result<(), RegistryError>;

    /// Returns the data stored at `path`, or an empty vector if no node exists there.
    fn get(&self, path: &str) -> Result<Vec<u8>, RegistryError>;
}
