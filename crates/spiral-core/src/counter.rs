//! Remote stone counter client.
//!
//! The counter collaborator answers with either a JSON object carrying
//! `stoneCount` and/or `pressCount`, or a raw numeric body. Every failure
//! degrades to the last known count; nothing here ever blocks a frame.

use crate::error::{Result, SpiralError};
use crate::spiral::clamp_stone_count;
use serde_json::Value;

/// Minimal HTTP answer as seen by the core.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport to the counter collaborator (fetch on the web, a file natively).
#[allow(async_fn_in_trait)]
pub trait CounterTransport {
    /// Increment-and-read (`POST`). Mutates shared state on every call.
    async fn increment(&self) -> Result<HttpReply>;
    /// Read-only (`GET`).
    async fn read(&self) -> Result<HttpReply>;
}

fn numeric_field(value: &Value, key: &str) -> Option<f64> {
    let n = match value.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Extract a stone count from a reply body.
///
/// Returns `Ok(None)` for a JSON object without a usable key, and an error
/// for bodies that are neither numeric nor JSON.
pub fn parse_counter_body(body: &str, base_offset: i64) -> Result<Option<i64>> {
    let trimmed = body.trim();
    if let Ok(n) = trimmed.parse::<f64>() {
        if n.is_finite() {
            return Ok(Some(n.trunc() as i64));
        }
    }
    let value: Value = serde_json::from_str(trimmed)
        .map_err(|_| SpiralError::Transport(format!("unparseable counter body: {trimmed:?}")))?;
    if let Some(stones) = numeric_field(&value, "stoneCount") {
        return Ok(Some(stones.trunc() as i64));
    }
    Ok(numeric_field(&value, "pressCount")
        .map(|p| base_offset.saturating_add(p.trunc() as i64)))
}

/// Result of one counter round trip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CounterOutcome {
    Fetched(i64),
    Failed,
}

/// Per-session view of the counter. `remote_count` carries over between
/// sessions so a failed round trip keeps the previous value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionCounterState {
    remote_count: i64,
    resolved: bool,
}

impl SessionCounterState {
    pub fn new(default_count: i64) -> Self {
        Self {
            remote_count: default_count,
            resolved: false,
        }
    }

    /// A new session needs a fresh round trip.
    pub fn begin(&mut self) {
        self.resolved = false;
    }

    pub fn settle(&mut self, outcome: CounterOutcome) {
        if let CounterOutcome::Fetched(n) = outcome {
            self.remote_count = n;
        }
        self.resolved = true;
    }

    pub fn remote_count(&self) -> i64 {
        self.remote_count
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Count fed into the spiral builder.
    pub fn stone_count(&self) -> u32 {
        clamp_stone_count(self.remote_count)
    }
}

pub struct CounterClient<T> {
    transport: T,
    base_offset: i64,
}

impl<T: CounterTransport> CounterClient<T> {
    pub fn new(transport: T, base_offset: i64) -> Self {
        Self {
            transport,
            base_offset,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Increment the remote counter and read the new value.
    pub async fn fetch(&self) -> CounterOutcome {
        let reply = self.transport.increment().await;
        match reply.and_then(|r| self.interpret(&r)) {
            Ok(Some(n)) => {
                log::info!("[counter] remote stoneCount is now {}", n);
                CounterOutcome::Fetched(n)
            }
            Ok(None) => {
                log::warn!("[counter] reply without stoneCount/pressCount; keeping previous value");
                CounterOutcome::Failed
            }
            Err(e) => {
                log::warn!("[counter] increment failed: {}", e);
                CounterOutcome::Failed
            }
        }
    }

    /// Round trip + settle `state`; returns the clamped stone count.
    pub async fn resolve_stone_count(&self, state: &mut SessionCounterState) -> u32 {
        let outcome = self.fetch().await;
        state.settle(outcome);
        state.stone_count()
    }

    /// Read without incrementing. A missing key reads as 0.
    pub async fn peek(&self) -> Result<i64> {
        let reply = self.transport.read().await?;
        Ok(self.interpret(&reply)?.unwrap_or(0))
    }

    fn interpret(&self, reply: &HttpReply) -> Result<Option<i64>> {
        if !reply.is_success() {
            return Err(SpiralError::Transport(format!(
                "counter answered status {}",
                reply.status
            )));
        }
        parse_counter_body(&reply.body, self.base_offset)
    }
}
