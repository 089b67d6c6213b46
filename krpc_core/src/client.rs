// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! The client-side call path (spec.md §4.5), grounded on the teacher's `do_rpc_call` send/
//! receive flow and on the original `KrpcChannel::CallMethod`: resolve `(service,
//! method)` against the name registry, connect (retrying a few times), write the framed
//! request, and read one reply into a fixed-size buffer.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::{Mutex, OnceLock};

use krpc_registry::NameRegistry;

use crate::controller::{Controller, ControllerErrorKind};
use crate::message::Message;
use crate::service::MethodDescriptor;
use crate::wire::encode_request;

/// Accepted by [`Channel::call_method`] for interface compatibility with the original's
/// `google::protobuf::Closure`-based `CallMethod(..., done)` signature; never invoked, since
/// every call here runs synchronously to completion before returning (spec.md §4.5: "The
/// `done` callback parameter is accepted for interface compatibility but is not used").
pub type Done<'a> = Box<dyn FnOnce() + 'a>;

/// Matches the original's three-attempt connect loop (spec.md §4.5, §9).
const CONNECT_ATTEMPTS: usize = 3;

/// Matches the original's fixed 1KB receive buffer; a larger reply is silently truncated
/// (spec.md §4.5, §7 — documented, not fixed).
const DEFAULT_RECV_BUFFER_LEN: usize = 1024;

/// Serializes concurrent registry `get` calls behind one process-wide lock, the same
/// scalability ceiling the original imposes with its global mutex around `ZkClient::GetData`
/// (spec.md §5, Open Question 1 — kept as specified, not redesigned away).
fn registry_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// A single RPC call's transport. Channels are lazy: the socket is opened on the first
/// `call_method` and closed again once the reply (or a failure) has been handled — there
/// is no persistent/pooled connection (spec.md §9, Open Question 4). Not `Sync`: a caller
/// needing concurrent calls creates one `Channel` per thread, exactly as the original's
/// `Kclient.cpp` demo does.
pub struct Channel {
    service_name: String,
    method_name: String,
    stream: Option<TcpStream>,
    recv_buffer_len: usize,
}

impl Channel {
    pub fn new(service_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            method_name: method_name.into(),
            stream: None,
            recv_buffer_len: DEFAULT_RECV_BUFFER_LEN,
        }
    }

    pub fn with_recv_buffer_len(mut self, len: usize) -> Self {
        self.recv_buffer_len = len;
        self
    }

    /// Whether the channel currently holds an open socket. Always `false` once
    /// `call_method` has returned (spec.md §8 law 7): the channel is single-use.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Performs one call. On any failure, `controller.failed()` is set and `response` is
    /// left however far deserialization got (possibly its default value). `done` is part of
    /// the signature for interface compatibility only (spec.md §4.5) — it is never called;
    /// pass `None`.
    pub fn call_method(
        &mut self,
        _method: &MethodDescriptor,
        controller: &mut Controller,
        request: &dyn Message,
        response: &mut dyn Message,
        _done: Option<Done<'_>>,
        name_registry: &dyn NameRegistry,
    ) {
        controller.reset();

        if self.stream.is_none() {
            if let Err((kind, reason)) = self.connect(name_registry) {
                controller.set_failed(kind, reason);
                return;
            }
        }

        let args = request.serialize_alloc();
        let frame = encode_request(&self.service_name, &self.method_name, &args);

        let stream = self.stream.as_mut().expect("connected above");
        if let Err(e) = write_all_looped(stream, &frame) {
            controller.set_failed(ControllerErrorKind::SendFailed, e.to_string());
            self.close();
            return;
        }

        let mut buf = vec![0u8; self.recv_buffer_len];
        let n = match stream.read(&mut buf) {
            Ok(n) => n,
            Err(e) => {
                controller.set_failed(ControllerErrorKind::RecvFailed, e.to_string());
                self.close();
                return;
            }
        };

        if n == 0 {
            controller.set_failed(ControllerErrorKind::RecvFailed, "server closed the connection without a reply".to_string());
            self.close();
            return;
        }

        if let Err(e) = response.deserialize(&mut &buf[..n]) {
            controller.set_failed(ControllerErrorKind::ParseFailed, e.to_string());
        }

        self.close();
    }

    fn connect(&mut self, name_registry: &dyn NameRegistry) -> Result<(), (ControllerErrorKind, String)> {
        let path = format!("/{}/{}", self.service_name, self.method_name);

        let data = {
            let _guard = registry_lock().lock().unwrap();
            name_registry
                .get(&path)
                .map_err(|e| (ControllerErrorKind::ResolutionFailed, e.to_string()))?
        };

        if data.is_empty() {
            return Err((
                ControllerErrorKind::ResolutionFailed,
                format!("{path} is not registered with the name registry"),
            ));
        }

        let address = String::from_utf8_lossy(&data).into_owned();
        let Some(colon) = address.find(':') else {
            return Err((
                ControllerErrorKind::ResolutionFailed,
                format!("{path} has a malformed address: {address:?}"),
            ));
        };
        let server_address = format!("{}:{}", &address[..colon], &address[colon + 1..]);

        let mut last_err = None;
        for _ in 0..CONNECT_ATTEMPTS {
            match TcpStream::connect(&server_address) {
                Ok(stream) => {
                    self.stream = Some(stream);
                    return Ok(());
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err((
            ControllerErrorKind::ConnectFailed,
            format!(
                "could not connect to {server_address} after {CONNECT_ATTEMPTS} attempts: {}",
                last_err.map(|e| e.to_string()).unwrap_or_default()
            ),
        ))
    }

    fn close(&mut self) {
        self.stream = None;
    }
}

fn write_all_looped(stream: &mut TcpStream, mut buf: &[u8]) -> std::io::Result<()> {
    while !buf.is_empty() {
        let n = stream.write(buf)?;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "failed to write the whole request frame",
            ));
        }
        buf = &buf[n..];
    }
    Ok(())
}
