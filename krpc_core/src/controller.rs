// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! The per-call controller (spec.md §4.3). A fresh `Controller` rides along with every
//! client call and records how it failed, if it did; cancellation is part of the surface
//! but is never actually wired up to anything (spec.md §9 — matches the original's no-op
//! `StartCancel`/`IsCanceled`/`NotifyOnCancel`).

use std::fmt;

/// Why a call failed, as recorded on the [`Controller`] (spec.md §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerErrorKind {
    SerializeFailed,
    ResolutionFailed,
    ConnectFailed,
    SendFailed,
    RecvFailed,
    ParseFailed,
}

impl fmt::Display for ControllerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ControllerErrorKind::SerializeFailed => "serialize failed",
            ControllerErrorKind::ResolutionFailed => "resolution failed",
            ControllerErrorKind::ConnectFailed => "connect failed",
            ControllerErrorKind::SendFailed => "send failed",
            ControllerErrorKind::RecvFailed => "recv failed",
            ControllerErrorKind::ParseFailed => "parse failed",
        };
        write!(f, "{s}")
    }
}

/// Carries the outcome of a single RPC call. `Default` gives a fresh, unfailed controller.
#[derive(Debug, Default)]
pub struct Controller {
    kind: Option<ControllerErrorKind>,
    err_text: String,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.kind = None;
        self.err_text.clear();
    }

    pub fn failed(&self) -> bool {
        self.kind.is_some()
    }

    pub fn error_text(&self) -> &str {
        &self.err_text
    }

    pub fn kind(&self) -> Option<ControllerErrorKind> {
        self.kind
    }

    pub fn set_failed(&mut self, kind: ControllerErrorKind, reason: impl Into<String>) {
        self.kind = Some(kind);
        self.err_text = reason.into();
    }

    /// Cancellation is part of the controller's surface but unimplemented: no in-flight
    /// call can actually be interrupted (spec.md §9, Open Question 2).
    pub fn start_cancel(&self) {}

    pub fn is_canceled(&self) -> bool {
        false
    }
}
