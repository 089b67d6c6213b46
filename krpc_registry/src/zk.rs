// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! The production [`NameRegistry`], wrapping the `zookeeper` crate. Grounded directly on
//! `zookeeperUtil.cpp`'s `Start`/`Create`/`GetData`: a watcher notifies a condition
//! variable once the session reaches the connected state, `Create` treats "already exists"
//! as success, and `GetData` on a missing node returns empty rather than failing the call.

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use log::{error, info, warn};
use zookeeper::{Acl, CreateMode, WatchedEvent, Watcher, ZkError, ZkState, ZooKeeper};

use crate::{NameRegistry, NodeFlags, RegistryError};

/// The original waits up to 6 seconds for `zookeeper_init` to reach `ZOO_CONNECTED_STATE`
/// (spec.md §4.2).
const SESSION_TIMEOUT: Duration = Duration::from_secs(6);

/// `zookeeperUtil.cpp`'s `GetData` reads into a fixed 64-byte buffer; data beyond that is
/// silently truncated rather than causing the call to fail (spec.md §9).
const GET_BUFFER_LEN: usize = 64;

struct ConnectWatcher {
    state: Arc<(Mutex<bool>, Condvar)>,
}

impl Watcher for ConnectWatcher {
    fn handle(&self, event: WatchedEvent) {
        if event.keeper_state == ZkState::SyncConnected {
            let (lock, cvar) = &*self.state;
            let mut connected = lock.lock().unwrap();
            *connected = true;
            cvar.notify_all();
        }
    }
}

pub struct ZkRegistry {
    client: ZooKeeper,
}

impl ZkRegistry {
    /// Connects to the ensemble named by `connect_string` (`host:port[,host:port...]`),
    /// blocking on a condition variable the watcher signals once the session is connected.
    pub fn connect(connect_string: &str) -> Result<Self, RegistryError> {
        let state = Arc::new((Mutex::new(false), Condvar::new()));
        let watcher = ConnectWatcher { state: Arc::clone(&state) };

        let client = ZooKeeper::connect(connect_string, SESSION_TIMEOUT, watcher)
            .map_err(|e| RegistryError::ConnectFailed(e.to_string()))?;

        let (lock, cvar) = &*state;
        let mut connected = lock.lock().unwrap();
        while !*connected {
            let (guard, result) = cvar
                .wait_timeout(connected, SESSION_TIMEOUT)
                .map_err(|_| RegistryError::ConnectFailed("condition variable poisoned".to_string()))?;
            connected = guard;
            if result.timed_out() && !*connected {
                return Err(RegistryError::ConnectFailed(
                    "timed out waiting for the session to connect".to_string(),
                ));
            }
        }

        info!("zookeeper session established against {connect_string}");
        Ok(Self { client })
    }
}

impl NameRegistry for ZkRegistry {
    fn connect(&self) -> Result<(), RegistryError> {
        // The session was already established by `ZkRegistry::connect`; this satisfies
        // callers that only hold a `&dyn NameRegistry`.
        Ok(())
    }

    fn create(&self, path: &str, data: &[u8], flags: NodeFlags) -> Result<(), RegistryError> {
        let exists = self
            .client
            .exists(path, false)
            .map_err(|e| RegistryError::CreateFailed(e.to_string()))?;
        if exists.is_some() {
            return Ok(());
        }

        let mode = match flags {
            NodeFlags::Persistent => CreateMode::Persistent,
            NodeFlags::Ephemeral => CreateMode::Ephemeral,
        };

        match self
            .client
            .create(path, data.to_vec(), Acl::open_unsafe().clone(), mode)
        {
            Ok(_) => {
                info!("created {path}");
                Ok(())
            }
            Err(ZkError::NodeExists) => Ok(()),
            Err(e) => {
                error!("could not create {path}: {e}");
                Err(RegistryError::CreateFailed(e.to_string()))
            }
        }
    }

    fn get(&self, path: &str) -> Result<Vec<u8>, RegistryError> {
        match self.client.get_data(path, false) {
            Ok((mut data, _stat)) => {
                if data.len() > GET_BUFFER_LEN {
                    warn!("{path}'s data ({} bytes) exceeds the {GET_BUFFER_LEN}-byte read buffer, truncating", data.len());
                    data.truncate(GET_BUFFER_LEN);
                }
                Ok(data)
            }
            Err(ZkError::NoNode) => {
                warn!("{path} has no registered node");
                Ok(Vec::new())
            }
            Err(e) => {
                error!("could not read {path}: {e}");
                Err(RegistryError::GetFailed(e.to_string()))
            }
        }
    }
}
