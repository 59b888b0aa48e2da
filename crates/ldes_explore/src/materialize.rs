//! Member content extraction.
//!
//! A member is read with a handful of small queries against its own
//! document: the activity envelope, the activity's types, the object's
//! types and, for relationship objects, the relationship triple. Each
//! query fills one field group of a [`MemberBuilder`].

use ldes_core::vocab::CLASS_RELATIONSHIP;
use ldes_core::{ExploreError, ExploreResult, Member, MemberRef, Relationship};
use ldes_query::{Bindings, Query, QueryOptions, QueryProvider, Term};
use std::fmt;
use std::sync::Arc;

/// Anomaly found while extracting a member
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionWarning {
    /// The document has no activity envelope; member excluded
    NoContent,
    /// A mandatory field is unbound; member excluded
    MissingMandatory {
        /// `actor` or `object`
        field: &'static str,
    },
    /// Several envelopes; the first was kept
    MultipleContent {
        /// Number of envelopes found
        count: usize,
    },
    /// The object is a relationship but not exactly one triple was found
    RelationshipUnresolved {
        /// Number of relationship bindings found
        count: usize,
    },
    /// A resource could not be queried for its types
    UnusableIri {
        /// Offending IRI
        iri: String,
    },
    /// The object has no IRI and the activity has none to reach it through;
    /// its types and relationship are left empty
    UnreachableObject {
        /// Document-local label of the object
        label: String,
    },
}

impl ExtractionWarning {
    /// Whether the member is dropped because of this warning
    #[must_use]
    pub const fn excludes_member(&self) -> bool {
        matches!(self, Self::NoContent | Self::MissingMandatory { .. })
    }
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoContent => f.write_str("no activity found"),
            Self::MissingMandatory { field } => write!(f, "missing mandatory field {field}"),
            Self::MultipleContent { count } => {
                write!(f, "{count} activities found, keeping the first")
            }
            Self::RelationshipUnresolved { count } => {
                write!(f, "expected one relationship, found {count}")
            }
            Self::UnusableIri { iri } => write!(f, "cannot query types of {iri}"),
            Self::UnreachableObject { label } => {
                write!(f, "object _:{label} cannot be reached from an unnamed activity")
            }
        }
    }
}

/// Result of materializing one member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    /// Member, absent when excluded
    pub member: Option<Member>,
    /// Warnings raised while extracting
    pub warnings: Vec<ExtractionWarning>,
}

/// How the object of an activity is queried
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectRef {
    /// The object has its own IRI
    Named(String),
    /// The object is a blank node, reached through the activity's IRI
    Nested {
        /// Activity whose `as:object` is the node
        activity: String,
    },
}

#[derive(Debug, Clone)]
struct ContentFields {
    id: String,
    named: bool,
    actor_url: String,
    actor_name: Option<String>,
    object: Term,
    target_url: Option<String>,
    target_name: Option<String>,
    context: Option<String>,
}

impl ContentFields {
    /// Fields of a row binding both actor and object. An activity without
    /// an IRI is identified by the member URL.
    fn from_row(row: &Bindings, member_url: &str) -> Option<Self> {
        let actor_url = row.string("actorUrl")?;
        let object = row.get("object")?.clone();
        let (id, named) = match row.get("id") {
            Some(Term::Iri(iri)) => (iri.clone(), true),
            _ => (member_url.to_string(), false),
        };
        Some(Self {
            id,
            named,
            actor_url,
            actor_name: row.string("actorName"),
            object,
            target_url: row.string("targetUrl"),
            target_name: row.string("targetName"),
            context: row.string("context"),
        })
    }
}

/// Accumulates the partial results of member extraction
#[derive(Debug, Clone)]
pub struct MemberBuilder {
    member_url: String,
    content: Option<ContentFields>,
    types: Vec<String>,
    object_types: Vec<String>,
    relationship: Option<Relationship>,
    warnings: Vec<ExtractionWarning>,
}

impl MemberBuilder {
    /// Start building the member at `member_url`
    pub fn new(member_url: impl Into<String>) -> Self {
        Self {
            member_url: member_url.into(),
            content: None,
            types: Vec::new(),
            object_types: Vec::new(),
            relationship: None,
            warnings: Vec::new(),
        }
    }

    /// Take the envelope from content rows. Returns `false` if the member
    /// must be excluded, with exactly one warning recorded.
    ///
    /// The first row binding both actor and object is kept; rows missing
    /// either are not counted as activities.
    pub fn content(&mut self, rows: &[Bindings]) -> bool {
        let Some(first) = rows.first() else {
            self.warn(ExtractionWarning::NoContent);
            return false;
        };
        let mut complete = rows
            .iter()
            .filter_map(|row| ContentFields::from_row(row, &self.member_url));
        let Some(content) = complete.next() else {
            let field = if first.get("actorUrl").is_none() {
                "actor"
            } else {
                "object"
            };
            self.warn(ExtractionWarning::MissingMandatory { field });
            return false;
        };
        let count = 1 + complete.count();

        self.content = Some(content);
        if count > 1 {
            self.warn(ExtractionWarning::MultipleContent { count });
        }
        true
    }

    /// Activity IRI, once content is set
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.content.as_ref().map(|c| c.id.as_str())
    }

    /// How to query the object, `None` for literal objects.
    ///
    /// A blank object of an unnamed activity cannot be reached and is
    /// reported with a warning.
    pub fn object_ref(&mut self) -> Option<ObjectRef> {
        let content = self.content.as_ref()?;
        match &content.object {
            Term::Iri(iri) => Some(ObjectRef::Named(iri.clone())),
            Term::Blank(_) if content.named => Some(ObjectRef::Nested {
                activity: content.id.clone(),
            }),
            Term::Blank(label) => {
                let label = label.clone();
                self.warn(ExtractionWarning::UnreachableObject { label });
                None
            }
            _ => None,
        }
    }

    /// Set the activity types
    pub fn types(&mut self, types: Vec<String>) {
        self.types = types;
    }

    /// Set the object types
    pub fn object_types(&mut self, types: Vec<String>) {
        self.object_types = types;
    }

    /// Whether the object is typed as an `as:Relationship`
    #[must_use]
    pub fn object_is_relationship(&self) -> bool {
        self.object_types.iter().any(|t| t == CLASS_RELATIONSHIP)
    }

    /// Take the relationship from relationship rows; exactly one complete
    /// row is required
    pub fn relationship(&mut self, rows: &[Bindings]) {
        let resolved = match rows {
            [row] => match (
                row.string("subject"),
                row.string("relationship"),
                row.string("object"),
            ) {
                (Some(subject), Some(relationship), Some(object)) => Some(Relationship {
                    subject,
                    relationship,
                    object,
                }),
                _ => None,
            },
            _ => None,
        };
        if resolved.is_none() {
            self.warn(ExtractionWarning::RelationshipUnresolved { count: rows.len() });
        }
        self.relationship = resolved;
    }

    /// Record a warning
    pub fn warn(&mut self, warning: ExtractionWarning) {
        if warning.excludes_member() {
            let err = ExploreError::MalformedMember {
                member: self.member_url.clone(),
                reason: warning.to_string(),
            };
            tracing::warn!(error = %err, "skipping member");
        } else {
            tracing::warn!(member = %self.member_url, "{warning}");
        }
        self.warnings.push(warning);
    }

    /// Finish the member
    #[must_use]
    pub fn build(self) -> Materialized {
        let member = self.content.map(|content| Member {
            id: content.id,
            actor_url: content.actor_url,
            actor_name: content.actor_name,
            object: content.object.value().to_string(),
            target_url: content.target_url,
            target_name: content.target_name,
            context: content.context,
            types: self.types,
            object_types: self.object_types,
            object_relationship: self.relationship,
        });
        Materialized {
            member,
            warnings: self.warnings,
        }
    }
}

/// Reads member documents into [`Member`] values
#[derive(Clone)]
pub struct Materializer {
    provider: Arc<dyn QueryProvider>,
}

impl Materializer {
    /// Create a materializer
    #[must_use]
    pub fn new(provider: Arc<dyn QueryProvider>) -> Self {
        Self { provider }
    }

    fn options(member_url: &str) -> QueryOptions {
        QueryOptions::source(member_url)
            .lenient(true)
            .follow_links(false)
    }

    /// Materialize the member listed as `member_ref`
    ///
    /// # Errors
    ///
    /// Returns `ProviderFailure` if any sub-query fails. Malformed content
    /// is not an error: the member is absent from the result instead.
    #[tracing::instrument(skip(self, member_ref), fields(member = %member_ref.id))]
    pub async fn materialize(&self, member_ref: &MemberRef) -> ExploreResult<Materialized> {
        let url = member_ref.id.as_str();
        let options = Self::options(url);
        let mut builder = MemberBuilder::new(url);

        let rows = self.provider.select_all(&Query::content(), &options).await?;
        if !builder.content(&rows) {
            return Ok(builder.build());
        }

        if let Some(id) = builder.id().map(str::to_string) {
            let types = self.types_of(&id, &options, &mut builder).await?;
            builder.types(types);
        }
        // Relationship queries only run once the same IRI was accepted for
        // the types query, so they cannot fail to build.
        match builder.object_ref() {
            Some(ObjectRef::Named(object)) => {
                let types = self.types_of(&object, &options, &mut builder).await?;
                builder.object_types(types);
                if builder.object_is_relationship() {
                    let rows = self
                        .provider
                        .select_all(&Query::relationship(&object)?, &options)
                        .await?;
                    builder.relationship(&rows);
                }
            }
            Some(ObjectRef::Nested { activity }) => {
                // An unusable activity IRI was reported with the activity types
                if let Ok(query) = Query::object_types(&activity) {
                    let types = self.select_types(&query, &options).await?;
                    builder.object_types(types);
                }
                if builder.object_is_relationship() {
                    let rows = self
                        .provider
                        .select_all(&Query::object_relationship(&activity)?, &options)
                        .await?;
                    builder.relationship(&rows);
                }
            }
            None => {}
        }

        let materialized = builder.build();
        tracing::debug!(warnings = materialized.warnings.len(), "materialized member");
        Ok(materialized)
    }

    async fn types_of(
        &self,
        resource: &str,
        options: &QueryOptions,
        builder: &mut MemberBuilder,
    ) -> ExploreResult<Vec<String>> {
        match Query::types(resource) {
            Ok(query) => self.select_types(&query, options).await,
            Err(_) => {
                builder.warn(ExtractionWarning::UnusableIri {
                    iri: resource.to_string(),
                });
                Ok(Vec::new())
            }
        }
    }

    async fn select_types(&self, query: &Query, options: &QueryOptions) -> ExploreResult<Vec<String>> {
        let rows = self.provider.select_all(query, options).await?;
        let mut types: Vec<String> = Vec::with_capacity(rows.len());
        for ty in rows.iter().filter_map(|row| row.value("type")) {
            if !types.iter().any(|t| t == ty) {
                types.push(ty.to_string());
            }
        }
        Ok(types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{content_row, type_row, ScriptedProvider};
    use ldes_core::vocab::AS_NS;
    use ldes_query::QueryKind;

    const MEMBER: &str = "https://pod.example/ldes/1/m1";

    fn materializer(provider: &Arc<ScriptedProvider>) -> Materializer {
        Materializer::new(provider.clone())
    }

    fn relationship_row(subject: &str) -> Bindings {
        Bindings::new()
            .with_iri("subject", subject)
            .with_iri("relationship", "https://schema.org/knows")
            .with_iri("object", "https://pod.example/bob")
    }

    /// Member whose object is an `as:Relationship`
    fn script_relationship_member(provider: &ScriptedProvider, rows: Vec<Bindings>) -> String {
        let id = format!("{MEMBER}#activity");
        let object = format!("{MEMBER}#rel");
        provider.on(QueryKind::Content, MEMBER, vec![content_row(&id, "https://pod.example/alice", &object)]);
        provider.on(QueryKind::Types, &object, vec![type_row(CLASS_RELATIONSHIP)]);
        provider.on(QueryKind::Relationship, &object, rows);
        object
    }

    #[tokio::test]
    async fn test_well_formed_member() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.script_activity(MEMBER);

        let out = materializer(&provider)
            .materialize(&MemberRef::new(MEMBER))
            .await
            .unwrap();
        assert!(out.warnings.is_empty());
        let member = out.member.unwrap();
        assert_eq!(member.id, format!("{MEMBER}#activity"));
        assert_eq!(member.actor_url, "https://pod.example/alice");
        assert_eq!(member.actor_name.as_deref(), Some("Alice"));
        assert_eq!(member.object, format!("{MEMBER}#object"));
        assert!(member.has_type(&format!("{AS_NS}Create")));
        assert!(member.object_has_type(&format!("{AS_NS}Note")));
        assert!(member.object_relationship.is_none());

        // Every sub-query reads only the member document, leniently
        for call in provider.calls() {
            assert_eq!(call.options.sources, vec![MEMBER.to_string()]);
            assert!(call.options.lenient);
            assert!(!call.options.follow_links);
        }
        assert!(provider.calls_of(QueryKind::Relationship).is_empty());
    }

    #[tokio::test]
    async fn test_missing_actor_excluded_with_one_warning() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.on(
            QueryKind::Content,
            MEMBER,
            vec![Bindings::new().with_iri("id", format!("{MEMBER}#activity"))],
        );

        let out = materializer(&provider)
            .materialize(&MemberRef::new(MEMBER))
            .await
            .unwrap();
        assert!(out.member.is_none());
        assert_eq!(
            out.warnings,
            vec![ExtractionWarning::MissingMandatory { field: "actor" }]
        );
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_object_excluded_with_one_warning() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.on(
            QueryKind::Content,
            MEMBER,
            vec![Bindings::new()
                .with_iri("id", format!("{MEMBER}#activity"))
                .with_iri("actorUrl", "https://pod.example/alice")],
        );

        let out = materializer(&provider)
            .materialize(&MemberRef::new(MEMBER))
            .await
            .unwrap();
        assert!(out.member.is_none());
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].excludes_member());
    }

    #[tokio::test]
    async fn test_no_content() {
        let provider = Arc::new(ScriptedProvider::new());
        let out = materializer(&provider)
            .materialize(&MemberRef::new(MEMBER))
            .await
            .unwrap();
        assert!(out.member.is_none());
        assert_eq!(out.warnings, vec![ExtractionWarning::NoContent]);
    }

    #[tokio::test]
    async fn test_multiple_content_keeps_first() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.on(
            QueryKind::Content,
            MEMBER,
            vec![
                content_row("https://pod.example/a#1", "https://pod.example/alice", "https://pod.example/o1"),
                content_row("https://pod.example/a#2", "https://pod.example/bob", "https://pod.example/o2"),
            ],
        );

        let out = materializer(&provider)
            .materialize(&MemberRef::new(MEMBER))
            .await
            .unwrap();
        let member = out.member.unwrap();
        assert_eq!(member.id, "https://pod.example/a#1");
        assert_eq!(out.warnings, vec![ExtractionWarning::MultipleContent { count: 2 }]);
    }

    #[tokio::test]
    async fn test_blank_id_falls_back_to_member_url() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.on(
            QueryKind::Content,
            MEMBER,
            vec![Bindings::new()
                .with("id", Term::Blank("b0".into()))
                .with_iri("actorUrl", "https://pod.example/alice")
                .with("object", Term::literal("hello"))],
        );

        let out = materializer(&provider)
            .materialize(&MemberRef::new(MEMBER))
            .await
            .unwrap();
        let member = out.member.unwrap();
        assert_eq!(member.id, MEMBER);
        assert_eq!(member.object, "hello");
        // Literal objects have no types to look up
        let typed: Vec<_> = provider
            .calls_of(QueryKind::Types)
            .into_iter()
            .filter_map(|c| c.subject)
            .collect();
        assert_eq!(typed, vec![MEMBER.to_string()]);
    }

    #[tokio::test]
    async fn test_relationship_resolved_with_one_binding() {
        let provider = Arc::new(ScriptedProvider::new());
        script_relationship_member(&provider, vec![relationship_row("https://pod.example/alice")]);

        let out = materializer(&provider)
            .materialize(&MemberRef::new(MEMBER))
            .await
            .unwrap();
        assert!(out.warnings.is_empty());
        let relationship = out.member.unwrap().object_relationship.unwrap();
        assert_eq!(relationship.subject, "https://pod.example/alice");
        assert_eq!(relationship.relationship, "https://schema.org/knows");
    }

    #[tokio::test]
    async fn test_relationship_absent_unless_one_binding() {
        for rows in [
            Vec::new(),
            vec![
                relationship_row("https://pod.example/alice"),
                relationship_row("https://pod.example/carol"),
            ],
        ] {
            let count = rows.len();
            let provider = Arc::new(ScriptedProvider::new());
            script_relationship_member(&provider, rows);

            let out = materializer(&provider)
                .materialize(&MemberRef::new(MEMBER))
                .await
                .unwrap();
            assert!(out.member.unwrap().object_relationship.is_none());
            assert_eq!(
                out.warnings,
                vec![ExtractionWarning::RelationshipUnresolved { count }]
            );
        }
    }

    #[tokio::test]
    async fn test_nested_relationship_row_is_not_an_activity() {
        let provider = Arc::new(ScriptedProvider::new());
        let object = script_relationship_member(&provider, vec![relationship_row("https://pod.example/alice")]);
        // The relationship node binds an object but no actor, and comes first
        let activity = content_row(&format!("{MEMBER}#activity"), "https://pod.example/alice", &object);
        provider.on(
            QueryKind::Content,
            MEMBER,
            vec![
                Bindings::new()
                    .with_iri("id", object.as_str())
                    .with_iri("object", "https://pod.example/bob"),
                activity,
            ],
        );

        let out = materializer(&provider)
            .materialize(&MemberRef::new(MEMBER))
            .await
            .unwrap();
        assert!(out.warnings.is_empty(), "{:?}", out.warnings);
        let member = out.member.unwrap();
        assert_eq!(member.id, format!("{MEMBER}#activity"));
        assert_eq!(member.object, object);
        assert!(member.object_relationship.is_some());
    }

    #[tokio::test]
    async fn test_blank_relationship_object_reached_through_activity() {
        let provider = Arc::new(ScriptedProvider::new());
        let id = format!("{MEMBER}#activity");
        provider.on(
            QueryKind::Content,
            MEMBER,
            vec![Bindings::new()
                .with_iri("id", id.as_str())
                .with_iri("actorUrl", "https://pod.example/alice")
                .with("object", Term::Blank("b0".into()))],
        );
        provider.on(QueryKind::ObjectTypes, &id, vec![type_row(CLASS_RELATIONSHIP)]);
        provider.on(
            QueryKind::ObjectRelationship,
            &id,
            vec![relationship_row("https://pod.example/alice")],
        );

        let out = materializer(&provider)
            .materialize(&MemberRef::new(MEMBER))
            .await
            .unwrap();
        assert!(out.warnings.is_empty());
        let member = out.member.unwrap();
        assert!(member.object_has_type(CLASS_RELATIONSHIP));
        let relationship = member.object_relationship.unwrap();
        assert_eq!(relationship.object, "https://pod.example/bob");

        // Only the activity itself is looked up by IRI
        let typed: Vec<_> = provider
            .calls_of(QueryKind::Types)
            .into_iter()
            .filter_map(|c| c.subject)
            .collect();
        assert_eq!(typed, vec![id]);
        assert!(provider.calls_of(QueryKind::Relationship).is_empty());
    }

    #[tokio::test]
    async fn test_blank_object_of_unnamed_activity_is_reported() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.on(
            QueryKind::Content,
            MEMBER,
            vec![Bindings::new()
                .with("id", Term::Blank("a0".into()))
                .with_iri("actorUrl", "https://pod.example/alice")
                .with("object", Term::Blank("b0".into()))],
        );

        let out = materializer(&provider)
            .materialize(&MemberRef::new(MEMBER))
            .await
            .unwrap();
        assert!(out.member.unwrap().object_types.is_empty());
        assert_eq!(
            out.warnings,
            vec![ExtractionWarning::UnreachableObject { label: "b0".into() }]
        );
        assert!(provider.calls_of(QueryKind::ObjectTypes).is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.script_activity(MEMBER);
        provider.fail(QueryKind::Types, &format!("{MEMBER}#object"));

        let err = materializer(&provider)
            .materialize(&MemberRef::new(MEMBER))
            .await
            .unwrap_err();
        assert!(matches!(err, ExploreError::ProviderFailure { .. }));
    }

    #[test]
    fn test_warning_display() {
        assert_eq!(
            ExtractionWarning::MissingMandatory { field: "actor" }.to_string(),
            "missing mandatory field actor"
        );
        assert!(!ExtractionWarning::MultipleContent { count: 3 }.excludes_member());
    }
}
