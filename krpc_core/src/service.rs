// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! The server-side service registry (spec.md §4.1, §4.4): a `Handler` exports a fixed set
//! of methods under a service name, and a [`ServiceRegistry`] maps `(service_name,
//! method_name)` lookups to the handler that owns them.

use std::collections::HashMap;
use std::sync::Arc;

use crate::message::Message;

/// Identifies one exported method within a service. Plain name for now — the original
/// schema would also carry request/response type descriptors, but nothing here needs to
/// inspect those beyond what `Handler::new_request`/`new_response` already encode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    pub name: String,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Invoked by a handler once a response is ready. Takes the response it was handed by the
/// dispatcher so an implementation need not hold on to its own copy.
pub type Completion<'a> = Box<dyn FnOnce(&dyn Message) + 'a>;

/// A service implementation, generalizing the schema compiler's generated `Service` base
/// class (spec.md §4.1). Every handler in this framework is synchronous: `call_method`
/// must invoke `done` before returning — there is no deferred/async completion path
/// (spec.md §9, Open Question 3).
pub trait Handler: Send + Sync {
    fn service_name(&self) -> &str;
    fn methods(&self) -> &[MethodDescriptor];
    fn new_request(&self, method: &MethodDescriptor) -> Box<dyn Message>;
    fn new_response(&self, method: &MethodDescriptor) -> Box<dyn Message>;
    fn call_method(
        &self,
        method: &MethodDescriptor,
        request: &dyn Message,
        response: &mut dyn Message,
        done: Completion<'_>,
    );
}

struct ServiceEntry {
    handler: Arc<dyn Handler>,
    methods: HashMap<String, MethodDescriptor>,
}

/// Maps service names to their handler. A server builds one of these at startup by
/// `export`ing every `Handler` it provides, then hands it to [`crate::server::Server`].
#[derive(Default)]
pub struct ServiceRegistry {
    services: HashMap<String, ServiceEntry>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every method `handler` declares under its service name. Exporting a
    /// second handler under the same service name replaces the first.
    pub fn export(&mut self, handler: Arc<dyn Handler>) {
        let service_name = handler.service_name().to_string();
        let methods = handler
            .methods()
            .iter()
            .cloned()
            .map(|m| (m.name.clone(), m))
            .collect();
        self.services
            .insert(service_name, ServiceEntry { handler, methods });
    }

    pub fn lookup(&self, service_name: &str, method_name: &str) -> Option<(Arc<dyn Handler>, MethodDescriptor)> {
        let entry = self.services.get(service_name)?;
        let method = entry.methods.get(method_name)?.clone();
        Some((Arc::clone(&entry.handler), method))
    }

    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    pub fn methods_of<'a>(&'a self, service_name: &str) -> impl Iterator<Item = &'a MethodDescriptor> {
        self.services
            .get(service_name)
            .into_iter()
            .flat_map(|entry| entry.methods.values())
    }
}
