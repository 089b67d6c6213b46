// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! The canonical schema encoding used for the request header and for every user request/
//! response message (spec.md §3, §4.1). Generating this code from an interface-description
//! schema is out of scope for this framework — the schema compiler is an external
//! collaborator (spec.md §1) — so these types are hand-authored in the shape its output
//! would take: a plain struct with an inherent `serialize_alloc`/`deserialize` pair, the
//! same convention the teacher's own generated XDR types use.

use std::any::Any;
use std::fmt;

/// A message failed to decode: truncated buffer, or invalid UTF-8 in a string field.
#[derive(Debug)]
pub struct DecodeError(pub String);

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for DecodeError {}

/// A request or response value that can be carried over the wire. `Any` lets the
/// dispatcher and handlers recover the concrete type behind a `dyn Message` (there is no
/// generated downcast, so this is the Rust analogue of the schema compiler's generated
/// `Message::New()`/dynamic cast pair).
pub trait Message: fmt::Debug + Send + Any {
    fn serialize_alloc(&self) -> Vec<u8>;
    fn deserialize(&mut self, buf: &mut &[u8]) -> Result<(), DecodeError>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Encoding primitives shared by every message type: a `u32` is 4 bytes big-endian, a
/// string is a `u32` length prefix followed by its UTF-8 bytes. There is no XDR-style
/// 4-byte alignment padding — the wire protocol specified here is simpler than full XDR.
pub mod primitives {
    use super::DecodeError;

    pub fn write_u32(buf: &mut Vec<u8>, n: u32) {
        buf.extend_from_slice(&n.to_be_bytes());
    }

    pub fn write_string(buf: &mut Vec<u8>, s: &str) {
        write_u32(buf, s.len() as u32);
        buf.extend_from_slice(s.as_bytes());
    }

    pub fn read_u32(buf: &mut &[u8]) -> Result<u32, DecodeError> {
        if buf.len() < 4 {
            return Err(DecodeError("truncated u32".to_string()));
        }
        let (head, rest) = buf.split_at(4);
        let n = u32::from_be_bytes(head.try_into().unwrap());
        *buf = rest;
        Ok(n)
    }

    pub fn read_string(buf: &mut &[u8]) -> Result<String, DecodeError> {
        let len = read_u32(buf)? as usize;
        if buf.len() < len {
            return Err(DecodeError("truncated string".to_string()));
        }
        let (head, rest) = buf.split_at(len);
        let s = String::from_utf8(head.to_vec())
            .map_err(|e| DecodeError(format!("invalid utf8 in string field: {e}")))?;
        *buf = rest;
        Ok(s)
    }
}

use primitives::{read_string, read_u32, write_string, write_u32};

/// The request frame header (spec.md §3): `service_name`, `method_name`, `args_len`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RpcHeader {
    pub service_name: String,
    pub method_name: String,
    pub args_len: u32,
}

impl Message for RpcHeader {
    fn serialize_alloc(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        write_string(&mut buf, &self.service_name);
        write_string(&mut buf, &self.method_name);
        write_u32(&mut buf, self.args_len);
        buf
    }

    fn deserialize(&mut self, buf: &mut &[u8]) -> Result<(), DecodeError> {
        self.service_name = read_string(buf)?;
        self.method_name = read_string(buf)?;
        self.args_len = read_u32(buf)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
