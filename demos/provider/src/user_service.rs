// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! The demo's one exported service, mirroring `UserServiceImpl::Login` from
//! `example/caller/Kclient.cpp`'s counterpart provider.

use krpc_core::message::Message;
use krpc_core::service::{Completion, Handler, MethodDescriptor};
use std::sync::OnceLock;
use user_service_schema::{LoginRequest, LoginResponse, LoginResult};

const LOGIN: &str = "Login";

pub struct UserServiceHandler;

impl Handler for UserServiceHandler {
    fn service_name(&self) -> &str {
        "UserService"
    }

    fn methods(&self) -> &[MethodDescriptor] {
        static METHODS: OnceLock<Vec<MethodDescriptor>> = OnceLock::new();
        METHODS.get_or_init(|| vec![MethodDescriptor::new(LOGIN)])
    }

    fn new_request(&self, method: &MethodDescriptor) -> Box<dyn Message> {
        match method.name.as_str() {
            LOGIN => Box::<LoginRequest>::default(),
            other => unreachable!("UserService does not export {other}"),
        }
    }

    fn new_response(&self, method: &MethodDescriptor) -> Box<dyn Message> {
        match method.name.as_str() {
            LOGIN => Box::<LoginResponse>::default(),
            other => unreachable!("UserService does not export {other}"),
        }
    }

    fn call_method(
        &self,
        method: &MethodDescriptor,
        request: &dyn Message,
        response: &mut dyn Message,
        done: Completion<'_>,
    ) {
        match method.name.as_str() {
            LOGIN => self.login(request, response, done),
            other => unreachable!("UserService does not export {other}"),
        }
    }
}

impl UserServiceHandler {
    fn login(&self, request: &dyn Message, response: &mut dyn Message, done: Completion<'_>) {
        let request = request
            .as_any()
            .downcast_ref::<LoginRequest>()
            .expect("dispatcher always supplies the request type Login declared");
        let response = response
            .as_any_mut()
            .downcast_mut::<LoginResponse>()
            .expect("dispatcher always supplies the response type Login declared");

        log::info!("doLogin: name={} pwd={}", request.name, request.pwd);

        *response = LoginResponse {
            result: LoginResult { errcode: 0, errmsg: String::new() },
            success: request.name == "leo" && request.pwd == "123456",
        };

        done(response);
    }
}
