#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use snow_client::{Client, Error, HttpRequest, HttpResponse, Method, Result, Transport};

/// A canned reply for [`MockTransport`].
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub next: Option<String>,
}

impl Reply {
    pub fn json(status: u16, body: Value) -> Self {
        Reply {
            status,
            body: body.to_string(),
            next: None,
        }
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Reply {
            status,
            body: body.to_string(),
            next: None,
        }
    }

    pub fn with_next(mut self, url: &str) -> Self {
        self.next = Some(url.to_string());
        self
    }
}

/// Records requests and answers them from a queue of replies.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(MockTransport {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request(&self, index: usize) -> HttpRequest {
        self.requests()[index].clone()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let reply = self.replies.lock().unwrap().pop_front().ok_or_else(|| {
            Error::InvalidUsage(format!("unexpected request to {}", request.url))
        })?;

        let mut links = HashMap::new();
        if let Some(next) = reply.next {
            links.insert("next".to_string(), next);
        }

        let response = HttpResponse {
            status: reply.status,
            method: request.method,
            url: request.url.clone(),
            headers: Vec::new(),
            links,
            body: Box::new(Cursor::new(reply.body.into_bytes())),
        };
        self.requests.lock().unwrap().push(request);
        Ok(response)
    }
}

pub const BASE: &str = "https://dev.service-now.com";

pub fn client(transport: &Arc<MockTransport>) -> Client {
    client_with(transport, true)
}

pub fn client_with(transport: &Arc<MockTransport>, raise_on_empty: bool) -> Client {
    Client::builder()
        .instance("dev")
        .raise_on_empty(raise_on_empty)
        .transport(transport.clone())
        .build()
        .unwrap()
}

pub fn is_method(request: &HttpRequest, method: Method, url: &str) -> bool {
    request.method == method && request.url == url
}
