// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! The server-side dispatcher (spec.md §4.4): a blocking accept loop handing connections
//! off to a fixed worker pool, grounded on the teacher's own `run_blocking_tcp_server` /
//! `handle_connection` split, generalized from the teacher's single flat `RpcProcedure`
//! table to an exported-`Handler` registry, and from the teacher's program/version
//! identity to `(service_name, method_name)`.

use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use log::{debug, error, info, warn};

use krpc_registry::{NameRegistry, NodeFlags};

use crate::service::{Completion, ServiceRegistry};
use crate::wire::{decode_request, WireError};
use crate::Error;

/// Matches the original's `muduo::TcpServer::setThreadNum(4)` (spec.md §4.4).
const WORKER_THREADS: usize = 4;

/// A server hosts a fixed set of exported services and, once [`Server::run`] is called,
/// dispatches every incoming connection to whichever handler owns the requested method.
pub struct Server {
    registry: ServiceRegistry,
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl Server {
    pub fn new() -> Self {
        Self {
            registry: ServiceRegistry::new(),
        }
    }

    pub fn export(&mut self, handler: Arc<dyn crate::service::Handler>) {
        self.registry.export(handler);
    }

    /// Binds `addr`, registers every exported `(service, method)` with `name_registry`
    /// (persistent service node, ephemeral method node carrying `"ip:port"`), and then
    /// runs the accept loop until the listener itself errors out. Does not return under
    /// normal operation.
    ///
    /// A registration failure is treated as fatal and exits the process, matching the
    /// original provider's behavior when `ZkClient::Create` fails (spec.md §4.2, §7).
    pub fn run(self, addr: &str, name_registry: &dyn NameRegistry) -> Result<(), Error> {
        let listener = TcpListener::bind(addr)?;
        let bound_addr = listener.local_addr()?;

        name_registry.connect()?;
        self.register(bound_addr, name_registry);

        info!("krpc server listening on {bound_addr}");

        let registry = Arc::new(self.registry);
        let (job_tx, job_rx) = mpsc::channel::<TcpStream>();
        let job_rx = Arc::new(Mutex::new(job_rx));

        let mut workers = Vec::with_capacity(WORKER_THREADS);
        for id in 0..WORKER_THREADS {
            let job_rx = Arc::clone(&job_rx);
            let registry = Arc::clone(&registry);
            let handle = thread::Builder::new()
                .name(format!("krpc-worker-{id}"))
                .spawn(move || worker_loop(&job_rx, &registry))
                .expect("failed to spawn krpc worker thread");
            workers.push(handle);
        }

        for incoming in listener.incoming() {
            match incoming {
                Ok(stream) => {
                    if job_tx.send(stream).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("error accepting connection: {e}"),
            }
        }

        drop(job_tx);
        for worker in workers {
            let _ = worker.join();
        }

        Ok(())
    }

    fn register(&self, bound_addr: std::net::SocketAddr, name_registry: &dyn NameRegistry) {
        let data = format!("{}:{}", bound_addr.ip(), bound_addr.port());

        for service_name in self.registry.service_names() {
            let service_path = format!("/{service_name}");
            if let Err(e) = name_registry.create(&service_path, b"", NodeFlags::Persistent) {
                error!("fatal: could not register service node {service_path}: {e}");
                std::process::exit(1);
            }

            for method in self.registry.methods_of(service_name) {
                let method_path = format!("{service_path}/{}", method.name);
                if let Err(e) = name_registry.create(&method_path, data.as_bytes(), NodeFlags::Ephemeral) {
                    error!("fatal: could not register method node {method_path}: {e}");
                    std::process::exit(1);
                }
                info!("{method_path} registered at {data}");
            }
        }
    }
}

fn worker_loop(job_rx: &Mutex<mpsc::Receiver<TcpStream>>, registry: &ServiceRegistry) {
    loop {
        let received = {
            let rx = job_rx.lock().unwrap();
            rx.recv()
        };
        match received {
            Ok(stream) => handle_connection(stream, registry),
            Err(_) => break,
        }
    }
}

/// One request, one reply, then the connection closes — matching the teacher's original
/// `handle_connection` and spec.md §4.4's "no persistent connections, no pipelining".
fn handle_connection(mut stream: TcpStream, registry: &ServiceRegistry) {
    let (service_name, method_name, args) = match decode_request(&mut stream) {
        Ok(parsed) => parsed,
        Err(WireError::Malformed(reason)) => {
            debug!("dropping connection: malformed frame: {reason}");
            return;
        }
        Err(WireError::FrameTooLarge(len)) => {
            warn!("dropping connection: frame length {len} exceeds the limit");
            return;
        }
        Err(WireError::Io(e)) => {
            debug!("dropping connection: {e}");
            return;
        }
    };

    let Some((handler, method)) = registry.lookup(&service_name, &method_name) else {
        debug!("{service_name}.{method_name} is not exported here, dropping connection");
        return;
    };

    let mut request = handler.new_request(&method);
    if let Err(e) = request.deserialize(&mut args.as_slice()) {
        debug!("{service_name}.{method_name}: failed to parse arguments: {e}");
        return;
    }

    let mut response = handler.new_response(&method);
    let stream = Arc::new(Mutex::new(stream));
    let reply_stream = Arc::clone(&stream);
    let reply_label = format!("{service_name}.{method_name}");

    let done: Completion<'_> = Box::new(move |response| {
        let bytes = response.serialize_alloc();
        let mut stream = match reply_stream.lock() {
            Ok(stream) => stream,
            Err(_) => return,
        };
        if let Err(e) = stream.write_all(&bytes) {
            warn!("{reply_label}: failed to write response: {e}");
        }
    });

    handler.call_method(&method, request.as_ref(), response.as_mut(), done);
}
