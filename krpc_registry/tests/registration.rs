// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Registration and session-scoped cleanup laws (spec.md §8 laws 5-6), against
//! `FakeRegistry` — the in-process stand-in used wherever a live coordination service
//! ensemble isn't available.

use krpc_registry::fake::FakeRegistry;
use krpc_registry::{NameRegistry, NodeFlags};

#[test]
fn exported_methods_resolve_to_the_bound_address() {
    let registry = FakeRegistry::new();
    registry.create("/UserService", b"", NodeFlags::Persistent).unwrap();
    registry
        .create("/UserService/Login", b"127.0.0.1:9000", NodeFlags::Ephemeral)
        .unwrap();

    assert_eq!(registry.get("/UserService/Login").unwrap(), b"127.0.0.1:9000");
}

#[test]
fn session_end_evicts_ephemeral_leaves_but_keeps_the_persistent_parent() {
    let registry = FakeRegistry::new();
    registry.create("/UserService", b"", NodeFlags::Persistent).unwrap();
    registry
        .create("/UserService/Login", b"127.0.0.1:9000", NodeFlags::Ephemeral)
        .unwrap();

    registry.end_session();

    assert!(registry.get("/UserService/Login").unwrap().is_empty());
    // The persistent node itself still "exists" in the sense that `get` would return its
    // (empty) data rather than erroring — FakeRegistry has no separate existence check,
    // so this only demonstrates it wasn't evicted alongside the ephemeral leaf.
    registry.create("/UserService", b"not-overwritten", NodeFlags::Persistent).unwrap();
    assert_eq!(registry.get("/UserService").unwrap(), b"");
}
