#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use reqwest::Url;
use serde_json::Value;
use ygg_session::{HttpPoster, SessionManager, TransportError};

pub const AUTH_HOST: &str = "https://auth.example.com";

/// Records every POST and replays scripted answers in order.
#[derive(Default)]
pub struct FakePoster {
    requests: Mutex<Vec<(Url, Value)>>,
    responses: Mutex<VecDeque<Result<Option<Value>, TransportError>>>,
}

impl FakePoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, response: Result<Option<Value>, TransportError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn respond_json(&self, body: Value) {
        self.respond(Ok(Some(body)));
    }

    pub fn respond_empty(&self) {
        self.respond(Ok(None));
    }

    pub fn requests(&self) -> Vec<(Url, Value)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_route(&self) -> Option<String> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .and_then(|(url, _)| url.path_segments()?.last().map(str::to_string))
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl HttpPoster for FakePoster {
    async fn post(&self, url: Url, body: Value) -> Result<Option<Value>, TransportError> {
        self.requests.lock().unwrap().push((url, body));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::InvalidResponse("no scripted response".into())))
    }
}

pub fn manager_with(client_token: &str) -> SessionManager<FakePoster> {
    SessionManager::with_transport(Some(AUTH_HOST), Some(client_token), FakePoster::new())
        .expect("valid test configuration")
}

pub fn manager() -> SessionManager<FakePoster> {
    manager_with("")
}
