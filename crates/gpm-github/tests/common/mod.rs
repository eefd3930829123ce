//! Scripted transport and recording sleeper shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use gpm_github::{
    ApiRequest, ApiResponse, GithubClient, RetryPolicy, Sleeper, Transport, TransportError,
};

/// Replays queued responses in order and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: RefCell<VecDeque<Result<ApiResponse, TransportError>>>,
    requests: RefCell<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, response: ApiResponse) -> &Self {
        self.responses.borrow_mut().push_back(Ok(response));
        self
    }

    pub fn respond_json(&self, status: u16, body: serde_json::Value) -> &Self {
        self.respond(ApiResponse::new(status, body.to_string()))
    }

    pub fn fail(&self, message: &str) -> &Self {
        self.responses
            .borrow_mut()
            .push_back(Err(TransportError(message.to_string())));
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted response for {} {}", request.method.as_str(), request.url))
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
    }
}

pub fn policy(max_rate_limit_retries: u32, max_network_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_rate_limit_retries,
        max_network_retries,
        base_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(60),
    }
}

pub fn client<'a>(
    transport: &'a ScriptedTransport,
    sleeper: &'a RecordingSleeper,
    retry: RetryPolicy,
) -> GithubClient<&'a ScriptedTransport, &'a RecordingSleeper> {
    GithubClient::with_transport(
        transport,
        sleeper,
        retry,
        "https://api.example.test",
        "https://api.example.test/graphql",
    )
}
