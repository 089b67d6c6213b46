// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Demo provider, the counterpart to `caller`. Exports `UserService.Login`, registers it
//! with the name registry, and serves requests until killed — mirroring `Krpc_Provider.cpp`'s
//! `NotifyService`/`Run` pair (spec.md §8, Scenario A).

mod user_service;

use std::sync::Arc;

use krpc_config::Config;
use krpc_core::server::Server;
use krpc_registry::zk::ZkRegistry;

use user_service::UserServiceHandler;

fn main() {
    env_logger::init();

    let argv: Vec<String> = std::env::args().collect();
    let config = Config::from_cli(&argv);

    let mut server = Server::new();
    server.export(Arc::new(UserServiceHandler));

    let addr = config.rpc_server_addr();
    let zk_addr = config.zookeeper_addr();

    let registry = ZkRegistry::connect(&zk_addr).unwrap_or_else(|e| {
        log::error!("fatal: could not register with zookeeper at {zk_addr}: {e}");
        std::process::exit(1);
    });

    if let Err(e) = server.run(&addr, &registry) {
        log::error!("fatal: {e}");
        std::process::exit(1);
    }
}
