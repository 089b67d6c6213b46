// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Wire codec, service registry, server dispatcher, and client channel for a small RPC
//! framework built around an external name registry for service discovery (spec.md §1).
//!
//! This crate does not implement service discovery itself — that is `krpc_registry` — nor
//! does it generate request/response types from an interface schema, which is out of
//! scope the same way it was for the system this one is modeled on (spec.md §1 Non-goals).

pub mod client;
pub mod controller;
pub mod error;
pub mod message;
pub mod server;
pub mod service;
pub mod wire;

pub use error::Error;
