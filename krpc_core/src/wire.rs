// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Frame codec for the request wrapper (spec.md §3): a varint `header_len`, a header
//! encoded with [`crate::message::RpcHeader`], and `args_len` raw argument bytes. The reply
//! has no length prefix at all — the client reads into a fixed-size buffer and whatever
//! arrives is handed to the response type's `deserialize` (spec.md §4.5).

use std::fmt;
use std::io::{self, ErrorKind, Read};

use crate::message::Message;
use crate::message::RpcHeader;

/// Header sizes above this are refused outright rather than trusted to allocate. The spec
/// does not fix a number; 1 MiB comfortably covers any real service/method name pair.
pub const MAX_HEADER_LEN: u32 = 1024 * 1024;

/// Argument payloads above this are refused. 16 MiB, matching the ceiling a single
/// `krpc_core::client::Channel` read could ever need to produce on the request side.
pub const MAX_ARGS_LEN: u32 = 16 * 1024 * 1024;

#[derive(Debug)]
pub enum WireError {
    /// The frame violates the protocol: a truncated read, a header that failed to parse,
    /// or a body shorter than its own `args_len` promised.
    Malformed(String),
    /// A length field exceeded [`MAX_HEADER_LEN`]/[`MAX_ARGS_LEN`].
    FrameTooLarge(u32),
    /// An I/O error unrelated to framing (e.g. connection reset mid-read).
    Io(io::Error),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::Malformed(reason) => write!(f, "malformed frame: {reason}"),
            WireError::FrameTooLarge(len) => write!(f, "frame length {len} exceeds the limit"),
            WireError::Io(e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl std::error::Error for WireError {}

impl From<io::Error> for WireError {
    fn from(e: io::Error) -> Self {
        WireError::Io(e)
    }
}

/// Builds a request frame: `varint(header_len) || header_bytes || args`.
pub fn encode_request(service_name: &str, method_name: &str, args: &[u8]) -> Vec<u8> {
    let header = RpcHeader {
        service_name: service_name.to_string(),
        method_name: method_name.to_string(),
        args_len: args.len() as u32,
    };
    let header_bytes = header.serialize_alloc();

    let mut frame = Vec::with_capacity(5 + header_bytes.len() + args.len());
    write_varint32(&mut frame, header_bytes.len() as u32);
    frame.extend_from_slice(&header_bytes);
    frame.extend_from_slice(args);
    frame
}

/// Reads one request frame from `stream`: the varint length, the header it names, and then
/// `header.args_len` bytes of raw argument payload.
///
/// Any read that comes up short of what a length field promised is `Malformed`, not `Io` —
/// from the dispatcher's point of view a truncated stream and a deliberately bad frame look
/// the same, and both just mean: drop the connection (spec.md §7).
pub fn decode_request<R: Read>(stream: &mut R) -> Result<(String, String, Vec<u8>), WireError> {
    let header_len = read_varint32(stream)?;
    if header_len == 0 {
        return Err(WireError::Malformed("header_len is zero".to_string()));
    }
    if header_len > MAX_HEADER_LEN {
        return Err(WireError::FrameTooLarge(header_len));
    }

    let mut header_buf = vec![0u8; header_len as usize];
    read_exact_or_malformed(stream, &mut header_buf)?;

    let mut header = RpcHeader::default();
    header
        .deserialize(&mut header_buf.as_slice())
        .map_err(|e| WireError::Malformed(e.to_string()))?;

    if header.args_len > MAX_ARGS_LEN {
        return Err(WireError::FrameTooLarge(header.args_len));
    }

    let mut args = vec![0u8; header.args_len as usize];
    read_exact_or_malformed(stream, &mut args)?;

    Ok((header.service_name, header.method_name, args))
}

fn read_exact_or_malformed<R: Read>(stream: &mut R, buf: &mut [u8]) -> Result<(), WireError> {
    match stream.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            Err(WireError::Malformed("stream ended before the promised length".to_string()))
        }
        Err(e) => Err(WireError::Io(e)),
    }
}

fn write_varint32(buf: &mut Vec<u8>, mut n: u32) {
    loop {
        let byte = (n & 0x7f) as u8;
        n >>= 7;
        if n != 0 {
            buf.push(byte | 0x80);
        } else {
            buf.push(byte);
            break;
        }
    }
}

fn read_varint32<R: Read>(stream: &mut R) -> Result<u32, WireError> {
    let mut result: u32 = 0;
    let mut shift: u32 = 0;
    loop {
        if shift >= 35 {
            return Err(WireError::Malformed("varint is too long".to_string()));
        }
        let mut byte = [0u8; 1];
        read_exact_or_malformed(stream, &mut byte)?;
        let b = byte[0];
        result |= ((b & 0x7f) as u32) << shift;
        if b & 0x80 == 0 {
            break;
        }
        shift += 7;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trips() {
        let frame = encode_request("UserService", "Login", b"name=leo");
        let (service, method, args) = decode_request(&mut frame.as_slice()).unwrap();
        assert_eq!(service, "UserService");
        assert_eq!(method, "Login");
        assert_eq!(args, b"name=leo");
    }

    #[test]
    fn varint_header_len_handles_multi_byte_lengths() {
        let long_service = "s".repeat(200);
        let frame = encode_request(&long_service, "m", &[]);
        let (service, method, args) = decode_request(&mut frame.as_slice()).unwrap();
        assert_eq!(service, long_service);
        assert_eq!(method, "m");
        assert!(args.is_empty());
    }

    #[test]
    fn truncated_stream_is_malformed_not_io_error() {
        let frame = encode_request("UserService", "Login", b"0123456789");
        let short = &frame[..frame.len() - 3];
        let err = decode_request(&mut &short[..]).unwrap_err();
        assert!(matches!(err, WireError::Malformed(_)));
    }

    #[test]
    fn zero_header_len_is_rejected() {
        let bytes = [0u8];
        let err = decode_request(&mut &bytes[..]).unwrap_err();
        assert!(matches!(err, WireError::Malformed(_)));
    }

    #[test]
    fn oversized_header_len_is_rejected() {
        let mut bytes = Vec::new();
        write_varint32(&mut bytes, MAX_HEADER_LEN + 1);
        let err = decode_request(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(err, WireError::FrameTooLarge(_)));
    }
}
