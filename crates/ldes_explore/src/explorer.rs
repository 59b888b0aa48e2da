//! Traversal facade: artifact URL in, ordered member stream out.

use crate::classify::Classifier;
use crate::config::ExplorerConfig;
use crate::materialize::Materializer;
use crate::members::MemberEnumerator;
use crate::pages::{build_pages, PageCursor};
use crate::resolve::LinkResolver;
use futures::future::ready;
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt, TryStreamExt};
use ldes_core::{
    ArtifactRef, EventLogDescriptor, ExploreError, ExploreResult, FragmentRef, Member,
    MemberRecord, MemberRef, Variant,
};
use ldes_query::QueryProvider;
use ldes_transport::Transport;
use std::collections::HashSet;
use std::sync::Arc;

/// Member ids already emitted for the fragment currently being listed.
/// Only the tail is ever listed twice, so one fragment's worth is kept.
#[derive(Debug, Default)]
struct SeenMembers {
    fragment: Option<String>,
    ids: HashSet<String>,
}

impl SeenMembers {
    fn admit(&mut self, fragment: &str, refs: Vec<MemberRef>) -> Vec<MemberRef> {
        if self.fragment.as_deref() != Some(fragment) {
            self.fragment = Some(fragment.to_string());
            self.ids.clear();
        }
        refs.into_iter()
            .filter(|r| self.ids.insert(r.id.clone()))
            .collect()
    }
}

enum Walk {
    Discover(ArtifactRef),
    Pages {
        cursor: PageCursor,
        enumerator: MemberEnumerator,
        seen: SeenMembers,
    },
    Done,
}

/// Explores event streams through a transport and a query provider.
///
/// Cloning is cheap; every traversal owns its own cursor.
#[derive(Clone)]
pub struct Explorer {
    transport: Arc<dyn Transport>,
    provider: Arc<dyn QueryProvider>,
    config: ExplorerConfig,
}

impl Explorer {
    /// Create an explorer with default configuration
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, provider: Arc<dyn QueryProvider>) -> Self {
        Self {
            transport,
            provider,
            config: ExplorerConfig::default(),
        }
    }

    /// Replace the configuration
    #[must_use]
    pub fn with_config(mut self, config: ExplorerConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration
    #[must_use]
    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Resolve and classify the stream behind `artifact` without walking it
    ///
    /// # Errors
    ///
    /// Returns `NoEventStreamFound`, `UnsupportedVariant`, or
    /// `ProviderFailure`
    pub async fn discover(&self, artifact: &ArtifactRef) -> ExploreResult<EventLogDescriptor> {
        let links = LinkResolver::new(self.transport.clone())
            .with_event_log_rel(self.config.event_log_rel.clone())
            .resolve(artifact)
            .await?;
        let classification = Classifier::new(self.provider.clone())
            .classify(&links.root_url)
            .await?;

        Ok(EventLogDescriptor {
            root_url: links.root_url,
            variant: classification.variant,
            views: classification.views,
            event_log_template: links.event_log_template,
        })
    }

    /// Members of the stream behind `artifact`, in page order.
    ///
    /// Nothing is queried until the stream is polled. A discovery error is
    /// the first and only item; a provider failure while walking is yielded
    /// once and ends the stream.
    pub fn explore(&self, artifact: ArtifactRef) -> BoxStream<'static, ExploreResult<Member>> {
        self.explore_records(artifact)
            .map_ok(|record| record.member)
            .boxed()
    }

    /// Like [`Explorer::explore`], keeping listing metadata and the source
    /// fragment of every member
    pub fn explore_records(
        &self,
        artifact: ArtifactRef,
    ) -> BoxStream<'static, ExploreResult<MemberRecord>> {
        let explorer = self.clone();
        let pages = stream::unfold(Walk::Discover(artifact), move |walk| {
            let explorer = explorer.clone();
            async move { explorer.advance(walk).await }
        });
        fuse_on_error(pages.flatten().boxed()).boxed()
    }

    /// Members listed by a single fragment of a stream of the given variant
    pub fn members_of(
        &self,
        fragment: FragmentRef,
        variant: Variant,
    ) -> BoxStream<'static, ExploreResult<MemberRecord>> {
        let explorer = self.clone();
        let page = stream::once(async move {
            let enumerator = MemberEnumerator::new(explorer.provider.clone(), variant);
            match enumerator.list_members(&fragment).await {
                Ok(outcome) => explorer.materialize_page(fragment.url, outcome.into_members()),
                Err(err) => stream::once(ready(Err(err))).boxed(),
            }
        });
        fuse_on_error(page.flatten().boxed()).boxed()
    }

    async fn advance(
        &self,
        walk: Walk,
    ) -> Option<(BoxStream<'static, ExploreResult<MemberRecord>>, Walk)> {
        match walk {
            Walk::Done => None,
            Walk::Discover(artifact) => match self.discover(&artifact).await {
                Ok(descriptor) => {
                    let cursor = build_pages(self.provider.clone(), &descriptor, &self.config);
                    let enumerator = MemberEnumerator::new(self.provider.clone(), descriptor.variant);
                    Some((
                        stream::empty().boxed(),
                        Walk::Pages {
                            cursor,
                            enumerator,
                            seen: SeenMembers::default(),
                        },
                    ))
                }
                Err(err) => Some((stream::once(ready(Err(err))).boxed(), Walk::Done)),
            },
            Walk::Pages {
                mut cursor,
                enumerator,
                mut seen,
            } => {
                let page = match cursor.next_page().await {
                    Ok(Some(page)) => page,
                    Ok(None) => return None,
                    Err(err) => return Some((stream::once(ready(Err(err))).boxed(), Walk::Done)),
                };
                match enumerator.list_members(&page).await {
                    Ok(outcome) => {
                        let refs = seen.admit(&page.url, outcome.into_members());
                        let members = self.materialize_page(page.url, refs);
                        Some((
                            members,
                            Walk::Pages {
                                cursor,
                                enumerator,
                                seen,
                            },
                        ))
                    }
                    Err(err) => Some((stream::once(ready(Err(err))).boxed(), Walk::Done)),
                }
            }
        }
    }

    /// Materialize one page's members with bounded prefetch, keeping
    /// listing order and skipping excluded members
    fn materialize_page(
        &self,
        fragment: String,
        refs: Vec<MemberRef>,
    ) -> BoxStream<'static, ExploreResult<MemberRecord>> {
        let materializer = Materializer::new(self.provider.clone());
        stream::iter(refs)
            .map(move |member_ref| {
                let materializer = materializer.clone();
                let fragment = fragment.clone();
                async move {
                    let materialized = materializer.materialize(&member_ref).await?;
                    Ok::<_, ExploreError>(materialized.member.map(|member| MemberRecord {
                        member,
                        metadata: member_ref.metadata,
                        fragment,
                    }))
                }
            })
            .buffered(self.config.prefetch)
            .filter_map(|result: ExploreResult<Option<MemberRecord>>| ready(result.transpose()))
            .boxed()
    }
}

/// End the stream right after its first error
fn fuse_on_error<T, S>(items: S) -> impl Stream<Item = ExploreResult<T>>
where
    S: Stream<Item = ExploreResult<T>> + Unpin,
{
    // The flag is checked before polling again, so nothing past a fatal
    // error is ever requested from the inner stream.
    stream::unfold((items, false), |(mut items, failed)| async move {
        if failed {
            return None;
        }
        let item = items.next().await?;
        let failed = item.as_ref().err().is_some_and(ExploreError::is_fatal);
        Some((item, (items, failed)))
    })
}
