//! Test doubles shared by the pipeline's unit tests.

use crate::error::PipelineError;
use crate::identity::TokenProvider;
use api_client::{ApiError, BearerToken, PositionSource, ScheduleSource};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use core_types::{Position, PositionStatus, ProductId, Side};
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Notify};

/// A filled, closed position created `hour` hours into 2024-03-01.
pub fn fill(id: &str, product: &str, hour: u32) -> Position {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap();
    Position {
        product_id: product.parse::<ProductId>().unwrap(),
        order_id: id.to_string(),
        created_time: at,
        last_fill_time: Some(at),
        filled_size: dec!(1),
        filled_value: dec!(150),
        total_fees: dec!(50),
        total_value_after_fees: dec!(200),
        price: dec!(150),
        side: Side::Buy,
        status: PositionStatus::Closed,
    }
}

#[derive(Default)]
pub struct FakeSource {
    schedules: Vec<String>,
    schedule_error: bool,
    positions: HashMap<String, Vec<Position>>,
    failing: HashSet<String>,
    schedule_calls: AtomicUsize,
    position_calls: AtomicUsize,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    gate_reached: Arc<Notify>,
}

impl FakeSource {
    pub fn with_schedules(mut self, schedules: &[&str]) -> Self {
        self.schedules = schedules.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_schedule_error(mut self) -> Self {
        self.schedule_error = true;
        self
    }

    pub fn with_positions(mut self, product: &str, positions: Vec<Position>) -> Self {
        self.positions.insert(product.to_string(), positions);
        self
    }

    pub fn failing(mut self, product: &str) -> Self {
        self.failing.insert(product.to_string());
        self
    }

    /// Makes the first position fetch block until the returned sender fires.
    /// The `Notify` is signalled once that fetch is parked on the gate.
    pub fn gated(mut self) -> (Self, oneshot::Sender<()>, Arc<Notify>) {
        let (tx, rx) = oneshot::channel();
        self.gate = Mutex::new(Some(rx));
        let reached = self.gate_reached.clone();
        (self, tx, reached)
    }

    pub fn schedule_calls(&self) -> usize {
        self.schedule_calls.load(Ordering::SeqCst)
    }

    pub fn position_calls(&self) -> usize {
        self.position_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScheduleSource for FakeSource {
    async fn fetch_active_schedules(&self, _token: &BearerToken) -> Result<Vec<String>, ApiError> {
        self.schedule_calls.fetch_add(1, Ordering::SeqCst);
        if self.schedule_error {
            return Err(ApiError::Unauthorized(401));
        }
        Ok(self.schedules.clone())
    }
}

#[async_trait]
impl PositionSource for FakeSource {
    async fn fetch_product_positions(
        &self,
        product: &ProductId,
        _token: &BearerToken,
    ) -> Result<Vec<Position>, ApiError> {
        self.position_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            self.gate_reached.notify_one();
            let _ = gate.await;
        }

        if self.failing.contains(product.as_str()) {
            return Err(ApiError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(self.positions.get(product.as_str()).cloned().unwrap_or_default())
    }
}

/// An identity whose token and login state can be changed mid-test.
pub struct FakeIdentity {
    authenticated: AtomicBool,
    token: Mutex<String>,
    fail: AtomicBool,
}

impl FakeIdentity {
    pub fn signed_in(token: &str) -> Self {
        Self {
            authenticated: AtomicBool::new(true),
            token: Mutex::new(token.to_string()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn signed_out() -> Self {
        let identity = Self::signed_in("");
        identity.authenticated.store(false, Ordering::SeqCst);
        identity
    }

    pub fn set_token(&self, token: &str) {
        *self.token.lock().unwrap() = token.to_string();
    }

    pub fn fail_token_requests(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TokenProvider for FakeIdentity {
    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    async fn access_token(&self) -> Result<BearerToken, PipelineError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PipelineError::Identity("token refresh failed".to_string()));
        }
        let raw = self.token.lock().unwrap().clone();
        BearerToken::new(raw).ok_or_else(|| PipelineError::Identity("empty token".to_string()))
    }
}
