// tests/common/mod.rs
// Shared helpers: an in-memory transport with per-source scripted replies.
#![allow(dead_code)]

use async_trait::async_trait;
use market_pulse::fetch::{FetchRequest, Transport, TransportError};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub type Reply = Result<Value, TransportError>;

#[derive(Default)]
pub struct ScriptedTransport {
    // source id → queued replies; the last reply repeats once the queue drains
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    delays: HashMap<String, Duration>,
    calls: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, source: &str, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(source.to_string(), replies.into());
        self
    }

    /// Every call for `source` sleeps this long before answering.
    pub fn delay(mut self, source: &str, d: Duration) -> Self {
        self.delays.insert(source.to_string(), d);
        self
    }

    pub fn calls(&self, source: &str) -> usize {
        self.calls.lock().unwrap().get(source).copied().unwrap_or(0)
    }

    /// Highest number of concurrent `get` calls observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn next_reply(&self, source: &str) -> Reply {
        let mut scripts = self.scripts.lock().unwrap();
        let Some(queue) = scripts.get_mut(source) else {
            return Err(TransportError::permanent(format!("no script for {source}")));
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(TransportError::permanent("empty script")))
        }
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, request: &FetchRequest) -> Result<Value, TransportError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(request.source.clone())
            .or_insert(0) += 1;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if let Some(d) = self.delays.get(&request.source) {
            tokio::time::sleep(*d).await;
        }
        self.next_reply(&request.source)
    }
}

pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{name}")).expect("fixture")
}

pub fn fixture_json(name: &str) -> Value {
    serde_json::from_str(&fixture(name)).expect("fixture json")
}
