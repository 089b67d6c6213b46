// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Hand-authored stand-in for what the schema compiler would generate from a
//! `UserService` interface description, matching the demo in `example/caller/Kclient.cpp`:
//! a `Login(LoginRequest) -> LoginResponse` method carrying a name/password pair and a
//! nested result code.

use std::any::Any;

use krpc_core::message::primitives::{read_string, read_u32, write_string, write_u32};
use krpc_core::message::{DecodeError, Message};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub name: String,
    pub pwd: String,
}

impl Message for LoginRequest {
    fn serialize_alloc(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        write_string(&mut buf, &self.name);
        write_string(&mut buf, &self.pwd);
        buf
    }

    fn deserialize(&mut self, buf: &mut &[u8]) -> Result<(), DecodeError> {
        self.name = read_string(buf)?;
        self.pwd = read_string(buf)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoginResult {
    pub errcode: u32,
    pub errmsg: String,
}

impl LoginResult {
    fn write(&self, buf: &mut Vec<u8>) {
        write_u32(buf, self.errcode);
        write_string(buf, &self.errmsg);
    }

    fn read(buf: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            errcode: read_u32(buf)?,
            errmsg: read_string(buf)?,
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    pub result: LoginResult,
    pub success: bool,
}

impl Message for LoginResponse {
    fn serialize_alloc(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.result.write(&mut buf);
        buf.push(self.success as u8);
        buf
    }

    fn deserialize(&mut self, buf: &mut &[u8]) -> Result<(), DecodeError> {
        self.result = LoginResult::read(buf)?;
        let Some((&flag, rest)) = buf.split_first() else {
            return Err(DecodeError("truncated bool field".to_string()));
        };
        self.success = flag != 0;
        *buf = rest;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_round_trips() {
        let request = LoginRequest {
            name: "leo".to_string(),
            pwd: "123456".to_string(),
        };
        let bytes = request.serialize_alloc();
        let mut after = LoginRequest::default();
        after.deserialize(&mut bytes.as_slice()).unwrap();
        assert_eq!(request, after);
    }

    #[test]
    fn login_response_round_trips() {
        let response = LoginResponse {
            result: LoginResult { errcode: 0, errmsg: String::new() },
            success: true,
        };
        let bytes = response.serialize_alloc();
        let mut after = LoginResponse::default();
        after.deserialize(&mut bytes.as_slice()).unwrap();
        assert_eq!(response, after);
    }
}
