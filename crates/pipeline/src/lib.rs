//! Orchestration for the positions dashboard.
//!
//! `Pipeline` owns the injected sources and the identity capability, runs a
//! refresh (token → schedules → fan-out position fetch), and publishes the
//! merged collection as an immutable snapshot. Everything downstream of the
//! snapshot is the pure `analytics` crate.

use analytics::Analysis;
use api_client::{BearerToken, PositionSource, ScheduleSource};
use chrono::{DateTime, Local, TimeZone, Utc};
use core_types::Position;
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod error;
pub mod generation;
pub mod identity;
pub mod sources;

#[cfg(test)]
mod testing;

pub use error::PipelineError;
pub use generation::{Generation, GenerationCounter};
pub use identity::{StaticTokenProvider, TokenProvider};
pub use sources::{active_schedules, fetch_positions, PositionBatch, ProductFailure};

/// A fully joined, chronologically sorted position collection.
#[derive(Debug, Clone)]
pub struct PositionSnapshot {
    pub generation: Generation,
    pub positions: Vec<Position>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl PositionSnapshot {
    fn empty() -> Self {
        Self {
            generation: Generation::default(),
            positions: Vec::new(),
            fetched_at: None,
        }
    }

    pub fn analyze<Tz: TimeZone>(&self, tz: &Tz) -> Analysis<'_> {
        analytics::analyze(&self.positions, tz)
    }

    /// Analysis with calendar days in the machine's local timezone.
    pub fn analyze_local(&self) -> Analysis<'_> {
        self.analyze(&Local)
    }
}

/// What a call to `Pipeline::refresh` did.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// No credential was available; nothing was fetched and the previous
    /// snapshot stays published.
    Unauthenticated,
    /// A newer refresh started while this one was in flight, so its result
    /// was dropped.
    Stale { generation: Generation },
    /// The result was published. `failures` lists products that could not be
    /// fetched, which tells "no data" apart from "partial data".
    Applied {
        generation: Generation,
        snapshot: Arc<PositionSnapshot>,
        failures: Vec<ProductFailure>,
    },
}

#[derive(Debug)]
struct PipelineState {
    /// Schedules resolved for a specific credential.
    schedules: Option<(BearerToken, Vec<String>)>,
    snapshot: Arc<PositionSnapshot>,
}

/// The central orchestrator for fetching and publishing positions.
pub struct Pipeline {
    identity: Arc<dyn TokenProvider>,
    schedule_source: Arc<dyn ScheduleSource>,
    position_source: Arc<dyn PositionSource>,
    generations: GenerationCounter,
    state: RwLock<PipelineState>,
}

impl Pipeline {
    /// Creates a pipeline around the given identity and sources.
    pub fn new(
        identity: Arc<dyn TokenProvider>,
        schedule_source: Arc<dyn ScheduleSource>,
        position_source: Arc<dyn PositionSource>,
    ) -> Self {
        Self {
            identity,
            schedule_source,
            position_source,
            generations: GenerationCounter::new(),
            state: RwLock::new(PipelineState {
                schedules: None,
                snapshot: Arc::new(PositionSnapshot::empty()),
            }),
        }
    }

    /// The most recently published snapshot.
    pub async fn snapshot(&self) -> Arc<PositionSnapshot> {
        self.state.read().await.snapshot.clone()
    }

    /// Rebuilds the position collection from scratch.
    ///
    /// Never fails: every error along the way is logged and degrades to an
    /// empty or partial result. Schedules are reused while the credential is
    /// unchanged; positions are always refetched.
    pub async fn refresh(&self) -> RefreshOutcome {
        if !self.identity.is_authenticated() {
            tracing::debug!("Not authenticated; skipping refresh.");
            return RefreshOutcome::Unauthenticated;
        }
        let token = match self.identity.access_token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, "Error fetching token.");
                return RefreshOutcome::Unauthenticated;
            }
        };

        let generation = self.generations.next();
        tracing::info!(%generation, "Refreshing positions.");

        let schedules = self.schedules_for(&token).await;
        let batch =
            sources::fetch_positions(self.position_source.as_ref(), &schedules, &token).await;

        let mut state = self.state.write().await;
        if !self.generations.is_current(generation) {
            tracing::info!(%generation, "Discarding stale refresh result.");
            return RefreshOutcome::Stale { generation };
        }

        let snapshot = Arc::new(PositionSnapshot {
            generation,
            positions: batch.positions,
            fetched_at: Some(Utc::now()),
        });
        state.snapshot = snapshot.clone();

        tracing::info!(
            %generation,
            positions = snapshot.positions.len(),
            failed_products = batch.failures.len(),
            skipped_schedules = batch.skipped.len(),
            "Published position snapshot."
        );
        RefreshOutcome::Applied {
            generation,
            snapshot,
            failures: batch.failures,
        }
    }

    /// Returns the schedules for `token`, fetching them only when the
    /// credential changed or no schedules are known yet.
    async fn schedules_for(&self, token: &BearerToken) -> Vec<String> {
        if let Some((cached_for, schedules)) = &self.state.read().await.schedules {
            if cached_for == token && !schedules.is_empty() {
                return schedules.clone();
            }
        }

        let schedules = sources::active_schedules(self.schedule_source.as_ref(), token).await;
        if !schedules.is_empty() {
            self.state.write().await.schedules = Some((token.clone(), schedules.clone()));
        }
        schedules
    }
}
