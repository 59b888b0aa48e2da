//! Page graph: ordered, lazy walk over a stream's fragments.
//!
//! The cursor never materializes the whole graph. It keeps a sorted
//! frontier of fragments still to visit, and when that runs dry it
//! re-queries the relations of the entry nodes (and, for relation-based
//! streams, the last visited node) so fragments appended while walking
//! are still picked up.

use crate::config::{ExplorerConfig, ViewPolicy};
use indexmap::IndexMap;
use ldes_core::vocab::CLASS_RELATION;
use ldes_core::{ComparisonValue, EventLogDescriptor, ExploreResult, FragmentRef, Relation, Variant};
use ldes_query::{Bindings, Freshness, Query, QueryOptions, QueryProvider};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Relations of `source` from relation query rows, one per relation id.
///
/// A relation typed both as the generic `tree:Relation` and as a specific
/// subclass keeps the specific kind.
#[must_use]
pub fn relations_from_rows(source: &str, rows: &[Bindings]) -> Vec<Relation> {
    let mut relations: IndexMap<String, Relation> = IndexMap::new();
    for row in rows {
        let (Some(relation_id), Some(target)) = (row.value("relation"), row.value("node")) else {
            tracing::debug!(source, "skipping incomplete relation row");
            continue;
        };
        let kind = row.value("relationType").unwrap_or(CLASS_RELATION);

        if let Some(existing) = relations.get_mut(relation_id) {
            if existing.relation_kind == CLASS_RELATION && kind != CLASS_RELATION {
                existing.relation_kind = kind.to_string();
            }
            continue;
        }
        relations.insert(
            relation_id.to_string(),
            Relation {
                relation_id: relation_id.to_string(),
                relation_kind: kind.to_string(),
                source_node: source.to_string(),
                target_node: target.to_string(),
                comparison_value: row.value("value").map(ComparisonValue::parse),
                path: row.string("path"),
            },
        );
    }
    relations.into_values().collect()
}

/// Order two optional comparison values; absent values sort last
#[must_use]
pub fn compare_values(a: Option<&ComparisonValue>, b: Option<&ComparisonValue>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sort relations ascending by comparison value, keeping discovery order
/// among ties
#[must_use]
pub fn order_relations(mut relations: Vec<Relation>) -> Vec<Relation> {
    relations.sort_by(|a, b| compare_values(a.comparison_value.as_ref(), b.comparison_value.as_ref()));
    relations
}

fn value_of(fragment: &FragmentRef) -> Option<&ComparisonValue> {
    fragment
        .relation
        .as_ref()
        .and_then(|r| r.comparison_value.as_ref())
}

/// Entry nodes the cursor starts from
#[must_use]
pub fn select_views(descriptor: &EventLogDescriptor, policy: ViewPolicy) -> Vec<String> {
    let candidates: Vec<&str> = match descriptor.variant {
        Variant::Flat => return vec![descriptor.root_url.clone()],
        Variant::ContainerBased => descriptor
            .views
            .iter()
            .filter(|v| v.managed_by_container_client)
            .map(|v| v.view_url.as_str())
            .collect(),
        Variant::RelationBased => descriptor.views.iter().map(|v| v.view_url.as_str()).collect(),
    };

    if candidates.is_empty() {
        tracing::warn!(root = %descriptor.root_url, "no usable view, starting from the root");
        return vec![descriptor.root_url.clone()];
    }
    match policy {
        ViewPolicy::All => candidates.into_iter().map(str::to_string).collect(),
        ViewPolicy::First => {
            if candidates.len() > 1 {
                tracing::warn!(
                    view = candidates[0],
                    ignored = ?&candidates[1..],
                    "stream has several views, walking the first"
                );
            }
            vec![candidates[0].to_string()]
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    Fresh,
    Walking,
    Exhausted,
}

/// Lazy cursor over the fragments of one stream
pub struct PageCursor {
    provider: Arc<dyn QueryProvider>,
    variant: Variant,
    entries: Vec<String>,
    state: CursorState,
    frontier: Vec<FragmentRef>,
    known: HashSet<String>,
    expanded: HashSet<String>,
    last: Option<FragmentRef>,
    revisit: Option<FragmentRef>,
    follow: Option<Duration>,
}

/// Build the page cursor for a discovered stream
#[must_use]
pub fn build_pages(
    provider: Arc<dyn QueryProvider>,
    descriptor: &EventLogDescriptor,
    config: &ExplorerConfig,
) -> PageCursor {
    PageCursor {
        provider,
        variant: descriptor.variant,
        entries: select_views(descriptor, config.view_policy),
        state: CursorState::Fresh,
        frontier: Vec::new(),
        known: HashSet::new(),
        expanded: HashSet::new(),
        last: None,
        revisit: None,
        follow: config.follow,
    }
}

impl PageCursor {
    /// Produce the next fragment, or `None` once the log is exhausted.
    ///
    /// In follow mode this never returns `None`: after a fruitless re-probe
    /// it sleeps for the poll interval and hands out the last fragment
    /// again so its listing can be refreshed.
    ///
    /// # Errors
    ///
    /// Returns `ProviderFailure` if a relations query fails; the cursor is
    /// exhausted afterwards
    pub async fn next_page(&mut self) -> ExploreResult<Option<FragmentRef>> {
        let result = self.step().await;
        if result.is_err() {
            self.state = CursorState::Exhausted;
        }
        result
    }

    async fn step(&mut self) -> ExploreResult<Option<FragmentRef>> {
        loop {
            match self.state {
                CursorState::Exhausted => return Ok(None),
                CursorState::Fresh => {
                    self.start().await?;
                    self.state = CursorState::Walking;
                }
                CursorState::Walking => {
                    if let Some(page) = self.pop().await? {
                        return Ok(Some(page));
                    }
                    if self.reprobe().await? > 0 {
                        continue;
                    }
                    match (self.follow, self.last.clone()) {
                        (Some(interval), Some(last)) => {
                            tracing::debug!(interval = ?interval, "no new fragments, waiting");
                            tokio::time::sleep(interval).await;
                            return Ok(Some(last.tail(true)));
                        }
                        _ => {
                            tracing::debug!(variant = %self.variant, "page graph exhausted");
                            self.state = CursorState::Exhausted;
                        }
                    }
                }
            }
        }
    }

    async fn start(&mut self) -> ExploreResult<()> {
        self.known.extend(self.entries.iter().cloned());
        match self.variant {
            Variant::Flat | Variant::RelationBased => {
                self.frontier
                    .extend(self.entries.iter().map(|e| FragmentRef::entry(e.clone())));
            }
            Variant::ContainerBased => {
                for entry in self.entries.clone() {
                    self.expand(&entry, Freshness::Cached).await?;
                }
            }
        }
        Ok(())
    }

    async fn pop(&mut self) -> ExploreResult<Option<FragmentRef>> {
        // A former tail is listed once more before moving past it.
        if let Some(page) = self.revisit.take() {
            return Ok(Some(page));
        }
        if self.frontier.is_empty() {
            return Ok(None);
        }
        let page = self.frontier.remove(0);
        if self.variant == Variant::RelationBased && self.expanded.insert(page.url.clone()) {
            self.expand(&page.url, Freshness::Cached).await?;
        }
        let page = page.tail(self.frontier.is_empty());
        tracing::debug!(fragment = %page.url, tail = page.is_tail, "next page");
        self.last = Some(page.clone());
        Ok(Some(page))
    }

    /// Re-query the nodes that may have gained relations, bypassing caches.
    /// Returns how many unseen fragments were enqueued.
    async fn reprobe(&mut self) -> ExploreResult<usize> {
        if !self.variant.is_paginated() {
            return Ok(0);
        }
        let mut nodes = self.entries.clone();
        if self.variant == Variant::RelationBased {
            if let Some(last) = &self.last {
                if !nodes.contains(&last.url) {
                    nodes.push(last.url.clone());
                }
            }
        }

        let mut added = 0;
        for node in &nodes {
            added += self.expand(node, Freshness::Revalidate).await?;
        }
        if added > 0 {
            tracing::info!(added, "found new fragments");
            if self.variant.has_mutable_tail() {
                self.revisit = self.last.clone().map(|last| last.tail(true));
            }
        }
        Ok(added)
    }

    async fn expand(&mut self, node: &str, freshness: Freshness) -> ExploreResult<usize> {
        let query = Query::relations(node)?;
        let options = QueryOptions::source(node)
            .lenient(true)
            .freshness(freshness);
        let rows = self.provider.select_all(&query, &options).await?;

        let mut added = 0;
        for relation in relations_from_rows(node, &rows) {
            if self.known.insert(relation.target_node.clone()) {
                self.frontier.push(FragmentRef::via(relation));
                added += 1;
            }
        }
        self.frontier
            .sort_by(|a, b| compare_values(value_of(a), value_of(b)));
        Ok(added)
    }
}
