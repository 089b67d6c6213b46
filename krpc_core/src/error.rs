// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Server- and process-level errors. Per-call failures live on [`crate::controller::Controller`]
//! instead — this enum is for the things that happen around a call: binding a listener,
//! registering with the name registry, a registry lookup gone wrong.

use std::fmt;

use krpc_registry::RegistryError;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Wire(crate::wire::WireError),
    Registry(RegistryError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "i/o error: {e}"),
            Error::Wire(e) => write!(f, "{e}"),
            Error::Registry(e) => write!(f, "name registry error: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<crate::wire::WireError> for Error {
    fn from(e: crate::wire::WireError) -> Self {
        Error::Wire(e)
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Error::Registry(e)
    }
}
