//! Scripted in-process loyalty API.
//!
//! Every call pops the next scripted [`Reply`]; once the script is empty the
//! mock answers with a successful match for every requested id. The mock
//! records each request, when it started, and the peak number of concurrent
//! calls.

use async_trait::async_trait;
use loyalty_migrator::{ApiError, LoyaltyApi};
use loyalty_migrator::models::CustomerDetailsResponse;
use serde_json::{json, Value};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub enum Reply {
    /// Every requested id matched
    Success,
    /// Decoded body with this top-level status code
    StatusCode(i64),
    /// HTTP error response
    Http {
        status: u16,
        headers: Vec<(&'static str, &'static str)>,
    },
    Transport(&'static str),
}

pub struct MockLoyaltyApi {
    script: Mutex<VecDeque<Reply>>,
    /// Requests containing one of these ids answer with status code 500
    failing_ids: Vec<String>,
    latency: Duration,
    requests: Mutex<Vec<(Instant, Vec<String>)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for MockLoyaltyApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLoyaltyApi {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            failing_ids: Vec::new(),
            latency: Duration::from_millis(20),
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_script(self, replies: impl IntoIterator<Item = Reply>) -> Self {
        *self.script.lock().unwrap() = replies.into_iter().collect();
        self
    }

    pub fn with_failing_id(mut self, id: &str) -> Self {
        self.failing_ids.push(id.to_string());
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request_sizes(&self) -> Vec<usize> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, ids)| ids.len())
            .collect()
    }

    pub fn request_times(&self) -> Vec<Instant> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(at, _)| *at)
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self, external_ids: &[String]) -> Reply {
        if external_ids.iter().any(|id| self.failing_ids.contains(id)) {
            return Reply::StatusCode(500);
        }
        self.script.lock().unwrap().pop_front().unwrap_or(Reply::Success)
    }
}

/// Number of expiry-schedule entries the mock returns for `id`
pub fn expiry_entries_for(id: &str) -> usize {
    id.bytes().map(usize::from).sum::<usize>() % 3
}

/// A matched customer: balance 100, one schedule entry of 10 points per slot
pub fn customer_json(id: &str) -> Value {
    let schedule: Vec<Value> = (0..expiry_entries_for(id))
        .map(|i| json!({"expiry_date": format!("2030-0{}-01 00:00:00", i + 1), "points": "10"}))
        .collect();
    json!({
        "external_id": id,
        "firstname": "Test",
        "lastname": id,
        "item_status": {"success": "true", "code": 1000, "message": "Customer successfully retrieved"},
        "points_summaries": {"points_summary": [{
            "loyaltyPoints": "100",
            "lifetimePoints": "250",
            "expired": "50",
            "redeemed": "100",
            "returned": "0"
        }]},
        "expiry_schedule": schedule
    })
}

pub fn response_json(code: i64, external_ids: &[String]) -> Value {
    let customers: Vec<Value> = external_ids.iter().map(|id| customer_json(id)).collect();
    json!({"response": {
        "status": {"success": true, "code": code, "message": "Success"},
        "customers": {"customer": customers}
    }})
}

#[async_trait]
impl LoyaltyApi for MockLoyaltyApi {
    async fn fetch_customers(
        &self,
        external_ids: &[String],
    ) -> Result<CustomerDetailsResponse, ApiError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((Instant::now(), external_ids.to_vec()));
        let reply = self.next_reply(external_ids);

        tokio::time::sleep(self.latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match reply {
            Reply::Success => Ok(serde_json::from_value(response_json(200, external_ids)).unwrap()),
            Reply::StatusCode(code) => {
                Ok(serde_json::from_value(response_json(code, external_ids)).unwrap())
            }
            Reply::Http { status, headers } => {
                let headers: BTreeMap<String, String> = headers
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                Err(ApiError::http(status, json!({"message": "error"}), headers))
            }
            Reply::Transport(message) => Err(ApiError::Transport(message.to_string())),
        }
    }
}
