//! Member listing per fragment.

use chrono::DateTime;
use ldes_core::{ExploreResult, FragmentRef, MemberRef, Metadata, Variant};
use ldes_query::{Bindings, Freshness, Query, QueryOptions, QueryProvider};
use std::collections::HashSet;
use std::sync::Arc;

/// How members of a fragment are listed, chosen once from the variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingStrategy {
    /// `ldp:contains` of the fragment container, with modification times.
    /// Strict, and revalidated against the tail.
    Container,
    /// `tree:member` links found in the fragment document
    StreamMembership {
        /// Follow links out of the fragment while listing
        follow_links: bool,
    },
}

impl ListingStrategy {
    /// Strategy for `variant`
    #[must_use]
    pub const fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::ContainerBased => Self::Container,
            Variant::RelationBased => Self::StreamMembership {
                follow_links: false,
            },
            Variant::Flat => Self::StreamMembership { follow_links: true },
        }
    }

    /// Query and options listing `fragment`
    ///
    /// # Errors
    ///
    /// Returns `InvalidIri` if the fragment URL cannot be interpolated
    pub fn request(self, fragment: &FragmentRef) -> ExploreResult<(Query, QueryOptions)> {
        Ok(match self {
            Self::Container => {
                let freshness = if fragment.is_tail {
                    Freshness::Revalidate
                } else {
                    Freshness::Cached
                };
                (
                    Query::container_members(&fragment.url)?,
                    QueryOptions::source(&fragment.url)
                        .lenient(false)
                        .freshness(freshness),
                )
            }
            Self::StreamMembership { follow_links } => (
                Query::stream_members(),
                QueryOptions::source(&fragment.url)
                    .lenient(true)
                    .follow_links(follow_links),
            ),
        })
    }
}

/// Outcome of listing one fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Members in listing order
    Members(Vec<MemberRef>),
    /// The fragment lists no members
    EmptyPage,
}

impl PageOutcome {
    fn from_refs(refs: Vec<MemberRef>) -> Self {
        if refs.is_empty() {
            Self::EmptyPage
        } else {
            Self::Members(refs)
        }
    }

    /// Members, empty for an empty page
    #[must_use]
    pub fn into_members(self) -> Vec<MemberRef> {
        match self {
            Self::Members(refs) => refs,
            Self::EmptyPage => Vec::new(),
        }
    }
}

/// Lists the members of fragments
#[derive(Clone)]
pub struct MemberEnumerator {
    provider: Arc<dyn QueryProvider>,
    variant: Variant,
    strategy: ListingStrategy,
}

impl MemberEnumerator {
    /// Create an enumerator for `variant`
    #[must_use]
    pub fn new(provider: Arc<dyn QueryProvider>, variant: Variant) -> Self {
        Self {
            provider,
            variant,
            strategy: ListingStrategy::for_variant(variant),
        }
    }

    /// List the members of `fragment`, dropping duplicates
    ///
    /// # Errors
    ///
    /// Returns `ProviderFailure` if the listing query fails
    pub async fn list_members(&self, fragment: &FragmentRef) -> ExploreResult<PageOutcome> {
        let (query, options) = self.strategy.request(fragment)?;
        let rows = self.provider.select_all(&query, &options).await?;

        let mut seen = HashSet::new();
        let refs: Vec<MemberRef> = rows
            .iter()
            .filter_map(|row| self.member_ref(row))
            .filter(|r| seen.insert(r.id.clone()))
            .collect();

        if refs.is_empty() {
            tracing::debug!(fragment = %fragment.url, "empty page");
        } else {
            tracing::debug!(fragment = %fragment.url, members = refs.len(), "listed page");
        }
        Ok(PageOutcome::from_refs(refs))
    }

    fn member_ref(&self, row: &Bindings) -> Option<MemberRef> {
        let id = row.value("member")?;
        let mut member = MemberRef::new(id);
        if self.variant.has_member_timestamps() {
            member.metadata = Some(Metadata {
                date_time: row.value("modified").and_then(|lexical| parse_modified(id, lexical)),
            });
        }
        Some(member)
    }
}

fn parse_modified(member: &str, lexical: &str) -> Option<DateTime<chrono::FixedOffset>> {
    match DateTime::parse_from_rfc3339(lexical) {
        Ok(date_time) => Some(date_time),
        Err(err) => {
            tracing::warn!(member, modified = lexical, error = %err, "unparsable modification time");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedProvider, F1, F2, ROOT};
    use ldes_core::ExploreError;
    use ldes_query::QueryKind;

    #[tokio::test]
    async fn test_container_listing_metadata() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.script_container(
            F1,
            &[
                ("https://pod.example/ldes/1/m1", "2022-01-02T00:00:00Z"),
                ("https://pod.example/ldes/1/m2", "not a date"),
            ],
        );
        let enumerator = MemberEnumerator::new(provider.clone(), Variant::ContainerBased);

        let refs = enumerator
            .list_members(&FragmentRef::entry(F1))
            .await
            .unwrap()
            .into_members();
        assert_eq!(refs.len(), 2);
        let first = refs[0].metadata.as_ref().unwrap();
        assert_eq!(
            first.date_time.unwrap().to_rfc3339(),
            "2022-01-02T00:00:00+00:00"
        );
        assert_eq!(refs[1].metadata, Some(Metadata::default()));

        let calls = provider.calls();
        assert!(!calls[0].options.lenient);
        assert_eq!(calls[0].options.freshness, Freshness::Cached);
    }

    #[tokio::test]
    async fn test_tail_listing_revalidates() {
        let provider = Arc::new(ScriptedProvider::new());
        let enumerator = MemberEnumerator::new(provider.clone(), Variant::ContainerBased);

        enumerator.list_members(&FragmentRef::entry(F1)).await.unwrap();
        enumerator
            .list_members(&FragmentRef::entry(F2).tail(true))
            .await
            .unwrap();

        let calls = provider.calls_of(QueryKind::ContainerMembers);
        assert_eq!(calls[0].options.freshness, Freshness::Cached);
        assert_eq!(calls[1].subject.as_deref(), Some(F2));
        assert_eq!(calls[1].options.freshness, Freshness::Revalidate);
    }

    #[tokio::test]
    async fn test_stream_listing_options() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.script_stream_members(ROOT, &["https://pod.example/m1"]);

        let flat = MemberEnumerator::new(provider.clone(), Variant::Flat);
        let refs = flat
            .list_members(&FragmentRef::entry(ROOT))
            .await
            .unwrap()
            .into_members();
        assert_eq!(refs, vec![MemberRef::new("https://pod.example/m1")]);

        let paged = MemberEnumerator::new(provider.clone(), Variant::RelationBased);
        paged
            .list_members(&FragmentRef::entry(ROOT).tail(true))
            .await
            .unwrap();

        let calls = provider.calls_of(QueryKind::StreamMembers);
        assert!(calls[0].options.lenient && calls[0].options.follow_links);
        assert!(calls[1].options.lenient && !calls[1].options.follow_links);
        // Freshness override is container-only
        assert_eq!(calls[1].options.freshness, Freshness::Cached);
    }

    #[tokio::test]
    async fn test_duplicates_dropped_in_order() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.script_stream_members(
            ROOT,
            &["https://pod.example/b", "https://pod.example/a", "https://pod.example/b"],
        );
        let enumerator = MemberEnumerator::new(provider, Variant::Flat);

        let ids: Vec<_> = enumerator
            .list_members(&FragmentRef::entry(ROOT))
            .await
            .unwrap()
            .into_members()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, ["https://pod.example/b", "https://pod.example/a"]);
    }

    #[tokio::test]
    async fn test_empty_page_is_not_an_error() {
        let enumerator = MemberEnumerator::new(Arc::new(ScriptedProvider::new()), Variant::ContainerBased);
        let outcome = enumerator.list_members(&FragmentRef::entry(F1)).await.unwrap();
        assert_eq!(outcome, PageOutcome::EmptyPage);
    }

    #[tokio::test]
    async fn test_listing_failure() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.fail(QueryKind::ContainerMembers, F1);
        let enumerator = MemberEnumerator::new(provider, Variant::ContainerBased);

        let err = enumerator.list_members(&FragmentRef::entry(F1)).await.unwrap_err();
        assert!(matches!(err, ExploreError::ProviderFailure { .. }));
    }
}
