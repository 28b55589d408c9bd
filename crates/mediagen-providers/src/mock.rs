//! Scripted [`JobTransport`] shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use mediagen_core::types::GenerationError;

use crate::traits::{Auth, HttpReply, JobTransport};

/// A transport that replays canned replies and records what it was sent.
#[derive(Default)]
pub struct MockTransport {
    posts: Mutex<VecDeque<Result<HttpReply, GenerationError>>>,
    gets: Mutex<VecDeque<Result<HttpReply, GenerationError>>>,
    /// Bodies passed to `post_json`, in order.
    pub sent: Mutex<Vec<Value>>,
    /// URLs passed to either method, in order.
    pub urls: Mutex<Vec<String>>,
    post_calls: AtomicUsize,
    get_calls: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_post(self, reply: Result<HttpReply, GenerationError>) -> Self {
        self.posts.lock().unwrap().push_back(reply);
        self
    }

    pub fn on_get(self, reply: Result<HttpReply, GenerationError>) -> Self {
        self.gets.lock().unwrap().push_back(reply);
        self
    }

    pub fn post_calls(&self) -> usize {
        self.post_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobTransport for MockTransport {
    async fn post_json(
        &self,
        url: &str,
        _auth: Auth<'_>,
        body: &Value,
    ) -> Result<HttpReply, GenerationError> {
        self.post_calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(body.clone());
        self.urls.lock().unwrap().push(url.to_string());
        self.posts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(HttpReply::json(500, json!({ "msg": "no scripted reply" }))))
    }

    async fn get_json(
        &self,
        url: &str,
        _auth: Auth<'_>,
        _query: &[(&str, &str)],
    ) -> Result<HttpReply, GenerationError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());
        let mut gets = self.gets.lock().unwrap();
        // The last scripted reply repeats forever.
        if gets.len() > 1 {
            gets.pop_front().unwrap()
        } else {
            gets.front()
                .cloned()
                .unwrap_or_else(|| Ok(HttpReply::json(200, waiting())))
        }
    }

    fn display_name(&self) -> &str {
        "MockTransport"
    }
}

/// A transport whose requests never complete.
pub struct HangingTransport;

#[async_trait]
impl JobTransport for HangingTransport {
    async fn post_json(
        &self,
        _url: &str,
        _auth: Auth<'_>,
        _body: &Value,
    ) -> Result<HttpReply, GenerationError> {
        std::future::pending().await
    }

    async fn get_json(
        &self,
        _url: &str,
        _auth: Auth<'_>,
        _query: &[(&str, &str)],
    ) -> Result<HttpReply, GenerationError> {
        std::future::pending().await
    }

    fn display_name(&self) -> &str {
        "HangingTransport"
    }
}

/// KIE envelope for a submitted task.
pub fn queued(task_id: &str) -> Value {
    json!({ "code": 200, "msg": "success", "data": { "taskId": task_id } })
}

/// KIE status envelope for a task that is still running.
pub fn waiting() -> Value {
    json!({ "code": 200, "msg": "success", "data": { "taskId": "t-1", "state": "waiting" } })
}

/// KIE status envelope for a finished task with one result URL.
pub fn success(url: &str) -> Value {
    let result = json!({ "resultUrls": [url] }).to_string();
    json!({
        "code": 200,
        "msg": "success",
        "data": { "taskId": "t-1", "state": "success", "resultJson": result }
    })
}
