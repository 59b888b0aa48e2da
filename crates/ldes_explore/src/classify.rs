//! Fragmentation strategy classification.

use indexmap::IndexMap;
use ldes_core::{check_iri, ExploreError, ExploreResult, Variant, ViewDescriptor};
use ldes_query::{Bindings, Query, QueryOptions, QueryProvider};
use std::sync::Arc;

/// Result of classifying a stream root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Fragmentation strategy
    pub variant: Variant,
    /// Views in discovery order
    pub views: Vec<ViewDescriptor>,
}

/// Decides which fragmentation strategy a stream uses
pub struct Classifier {
    provider: Arc<dyn QueryProvider>,
}

impl Classifier {
    /// Create a classifier
    #[must_use]
    pub fn new(provider: Arc<dyn QueryProvider>) -> Self {
        Self { provider }
    }

    /// Classify the stream at `root` with a single query
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedVariant` if no event stream is found, or
    /// `ProviderFailure` if the query fails
    #[tracing::instrument(skip(self))]
    pub async fn classify(&self, root: &str) -> ExploreResult<Classification> {
        let root = check_iri(root)?;
        let options = QueryOptions::source(root).lenient(true).follow_links(true);
        let rows = self.provider.select_all(&Query::classify(), &options).await?;
        let classification = classify_rows(root, &rows)?;
        tracing::info!(
            variant = %classification.variant,
            views = classification.views.len(),
            "classified event stream"
        );
        Ok(classification)
    }
}

/// Derive the variant from classification rows.
///
/// Priority: a container-managed view, then views plus direct members,
/// then a bare stream.
///
/// # Errors
///
/// Returns `UnsupportedVariant` when there are no rows
pub fn classify_rows(root: &str, rows: &[Bindings]) -> ExploreResult<Classification> {
    if rows.is_empty() {
        return Err(ExploreError::UnsupportedVariant {
            root: root.to_string(),
        });
    }

    let mut views: IndexMap<String, ViewDescriptor> = IndexMap::new();
    let mut has_member = false;
    for row in rows {
        has_member |= flag(row, "hasMember");
        let Some(view_url) = row.value("view") else {
            continue;
        };
        let view = views
            .entry(view_url.to_string())
            .or_insert_with(|| ViewDescriptor::new(view_url));
        if view.view_description_url.is_none() {
            view.view_description_url = row.string("viewDescription");
        }
        view.managed_by_container_client |= flag(row, "managed");
    }
    let views: Vec<ViewDescriptor> = views.into_values().collect();

    let variant = if views.iter().any(|v| v.managed_by_container_client) {
        Variant::ContainerBased
    } else if !views.is_empty() && has_member {
        Variant::RelationBased
    } else {
        Variant::Flat
    };
    Ok(Classification { variant, views })
}

fn flag(row: &Bindings, var: &str) -> bool {
    row.get(var).and_then(|t| t.as_bool()).unwrap_or(false)
}
