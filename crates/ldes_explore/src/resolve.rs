//! Event-stream discovery from an artifact's link headers.

use ldes_core::vocab::{REL_EVENT_LOG, REL_EVENT_STREAM};
use ldes_core::{ArtifactRef, ExploreError, ExploreResult};
use ldes_transport::Transport;
use std::sync::Arc;

/// Links recovered from an artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLinks {
    /// Event stream root
    pub root_url: String,
    /// Event-log template link, if advertised
    pub event_log_template: Option<String>,
}

/// Finds the event stream an artifact belongs to
pub struct LinkResolver {
    transport: Arc<dyn Transport>,
    event_log_rel: String,
}

impl LinkResolver {
    /// Create a resolver using the default event-log relation
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            event_log_rel: REL_EVENT_LOG.to_string(),
        }
    }

    /// Set the event-log template relation
    #[must_use]
    pub fn with_event_log_rel(mut self, rel: impl Into<String>) -> Self {
        self.event_log_rel = rel.into();
        self
    }

    /// Resolve the event stream root of `artifact`
    ///
    /// # Errors
    ///
    /// Returns `NoEventStreamFound` if no link carries the event-stream
    /// relation, or `ProviderFailure` if the HEAD request fails
    #[tracing::instrument(skip(self), fields(artifact = %artifact))]
    pub async fn resolve(&self, artifact: &ArtifactRef) -> ExploreResult<ResolvedLinks> {
        let response = self.transport.head(artifact.as_str()).await?;
        let root = response
            .find_rel(REL_EVENT_STREAM)
            .ok_or_else(|| ExploreError::NoEventStreamFound {
                artifact: artifact.to_string(),
            })?;
        let event_log_template = response
            .find_rel(&self.event_log_rel)
            .map(|link| link.target.clone());

        tracing::info!(root = %root.target, "found event stream");
        Ok(ResolvedLinks {
            root_url: root.target.clone(),
            event_log_template,
        })
    }
}
