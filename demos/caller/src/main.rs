// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Demo caller, modeled directly on `example/caller/Kclient.cpp`: resolves
//! `UserService.Login` via the name registry and calls it once with a fixed
//! name/password pair (spec.md §8, Scenario A).

use krpc_config::Config;
use krpc_core::client::Channel;
use krpc_core::controller::Controller;
use krpc_core::service::MethodDescriptor;
use krpc_registry::zk::ZkRegistry;
use user_service_schema::{LoginRequest, LoginResponse};

fn main() {
    env_logger::init();

    let argv: Vec<String> = std::env::args().collect();
    let config = Config::from_cli(&argv);
    let zk_addr = config.zookeeper_addr();

    let registry = ZkRegistry::connect(&zk_addr).unwrap_or_else(|e| {
        log::error!("fatal: could not reach zookeeper at {zk_addr}: {e}");
        std::process::exit(1);
    });

    let request = LoginRequest {
        name: "leo".to_string(),
        pwd: "123456".to_string(),
    };
    let mut response = LoginResponse::default();
    let mut controller = Controller::new();
    let method = MethodDescriptor::new("Login");

    let mut channel = Channel::new("UserService", "Login");
    channel.call_method(&method, &mut controller, &request, &mut response, None, &registry);

    if controller.failed() {
        eprintln!("rpc login response error: {}", controller.error_text());
        std::process::exit(1);
    }

    if response.result.errcode != 0 {
        eprintln!("rpc login response error: {}", response.result.errmsg);
        std::process::exit(1);
    }

    println!("rpc login response success: {}", response.success);
}
