//! Explorer configuration.

use ldes_core::vocab::REL_EVENT_LOG;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which views of a stream are walked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewPolicy {
    /// First view matching the variant; other views are reported and skipped
    #[default]
    First,
    /// Relations of all matching views are merged into one page graph
    All,
}

/// Explorer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerConfig {
    /// Members materialized concurrently within one page
    pub prefetch: usize,
    /// View selection policy
    pub view_policy: ViewPolicy,
    /// Poll interval for following a growing log; `None` stops at the end
    pub follow: Option<Duration>,
    /// Link relation of the event-log template link
    pub event_log_rel: String,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            prefetch: 4,
            view_policy: ViewPolicy::First,
            follow: None,
            event_log_rel: REL_EVENT_LOG.to_string(),
        }
    }
}

impl ExplorerConfig {
    /// Set the prefetch width (at least 1)
    #[must_use]
    pub fn with_prefetch(mut self, prefetch: usize) -> Self {
        self.prefetch = prefetch.max(1);
        self
    }

    /// Set the view policy
    #[must_use]
    pub fn with_view_policy(mut self, policy: ViewPolicy) -> Self {
        self.view_policy = policy;
        self
    }

    /// Keep following the log, polling every `interval`
    #[must_use]
    pub fn with_follow(mut self, interval: Duration) -> Self {
        self.follow = Some(interval);
        self
    }

    /// Set the event-log template link relation
    #[must_use]
    pub fn with_event_log_rel(mut self, rel: impl Into<String>) -> Self {
        self.event_log_rel = rel.into();
        self
    }
}
