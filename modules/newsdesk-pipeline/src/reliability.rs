//! Source reliability feedback: post-publication events nudge a source's
//! running credibility score. The structural tier never changes.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use newsdesk_common::{
    NewsdeskError, ReliabilityDeltas, ReliabilityEvent, SourceReliabilityLogEntry,
};
use tracing::info;
use uuid::Uuid;

use crate::store::PipelineStore;

/// Running scores live in [0, 100].
pub fn adjusted_score(current: f64, delta: f64) -> f64 {
    (current + delta).clamp(0.0, 100.0)
}

/// Why a reliability event was logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventContext {
    pub article_id: Option<Uuid>,
    pub correction_id: Option<Uuid>,
}

pub struct ReliabilityLedger {
    store: Arc<dyn PipelineStore>,
    deltas: ReliabilityDeltas,
}

impl ReliabilityLedger {
    pub fn new(store: Arc<dyn PipelineStore>, deltas: ReliabilityDeltas) -> Self {
        Self { store, deltas }
    }

    /// Apply the configured delta for `event` and return the new score.
    pub async fn log_event(
        &self,
        source_key: &str,
        event: ReliabilityEvent,
        context: EventContext,
        at: DateTime<Utc>,
    ) -> Result<f64> {
        let delta = self.deltas.delta_for(event);
        let entry = self.log_with_delta(source_key, event, delta, context, at).await?;
        Ok(entry.resulting_score)
    }

    /// Apply an explicit delta, bypassing the configured table.
    pub async fn log_with_delta(
        &self,
        source_key: &str,
        event: ReliabilityEvent,
        delta: f64,
        context: EventContext,
        at: DateTime<Utc>,
    ) -> Result<SourceReliabilityLogEntry> {
        let entry = self
            .store
            .log_reliability_event(
                source_key,
                event,
                delta,
                context.article_id,
                context.correction_id,
                at,
            )
            .await?
            .ok_or_else(|| NewsdeskError::NotFound(format!("source {source_key}")))?;

        info!(
            source = source_key,
            event = event.as_str(),
            delta,
            score = entry.resulting_score,
            "Logged reliability event"
        );
        Ok(entry)
    }
}
