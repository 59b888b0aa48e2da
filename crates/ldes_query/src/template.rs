//! Query templates.
//!
//! Every query the explorer issues is one of these fixed templates. The only
//! interpolated values are IRIs, and each one is checked with
//! [`check_iri`] before it is placed between angle brackets.

use ldes_core::{check_iri, ExploreResult};

const PREFIXES: &str = "PREFIX ldes: <https://w3id.org/ldes#>
PREFIX tree: <https://w3id.org/tree#>
PREFIX ldp: <http://www.w3.org/ns/ldp#>
PREFIX dct: <http://purl.org/dc/terms/>
PREFIX as: <https://www.w3.org/ns/activitystreams#>
";

/// Which template a query was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// Stream, views, container management, and membership in one pass
    Classify,
    /// Outgoing relations of a fragment node
    Relations,
    /// `ldp:contains` listing of a container fragment
    ContainerMembers,
    /// `tree:member` links of a stream
    StreamMembers,
    /// Actor/object/target/context of an activity
    Content,
    /// `rdf:type` of a resource
    Types,
    /// Subject/relationship/object of an `as:Relationship`
    Relationship,
    /// `rdf:type` of an activity's object, reached through the activity
    ObjectTypes,
    /// Subject/relationship/object of an activity's object, reached
    /// through the activity
    ObjectRelationship,
}

impl QueryKind {
    /// Short name for logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Classify => "classify",
            Self::Relations => "relations",
            Self::ContainerMembers => "container_members",
            Self::StreamMembers => "stream_members",
            Self::Content => "content",
            Self::Types => "types",
            Self::Relationship => "relationship",
            Self::ObjectTypes => "object_types",
            Self::ObjectRelationship => "object_relationship",
        }
    }
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A query built from a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    kind: QueryKind,
    subject: Option<String>,
    text: String,
}

impl Query {
    fn build(kind: QueryKind, body: &str) -> Self {
        Self {
            kind,
            subject: None,
            text: format!("{PREFIXES}\n{body}"),
        }
    }

    fn about(mut self, subject: &str) -> Self {
        self.subject = Some(subject.to_string());
        self
    }

    /// Template the query was built from
    #[must_use]
    pub const fn kind(&self) -> QueryKind {
        self.kind
    }

    /// IRI interpolated into the template, if any
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Query text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Classify the stream reachable from the sources.
    ///
    /// One row per (stream, view); `?managed` and `?hasMember` are booleans.
    #[must_use]
    pub fn classify() -> Self {
        Self::build(
            QueryKind::Classify,
            "SELECT ?stream ?view ?viewDescription ?managed ?hasMember
WHERE {
  ?stream a ldes:EventStream.
  OPTIONAL {
    ?stream tree:view ?view.
    OPTIONAL { ?view tree:viewDescription ?viewDescription. }
    BIND(EXISTS {
      ?view tree:viewDescription ?description.
      ?description ldes:managedBy ?client.
      ?client a ldes:LDESinLDPClient.
    } AS ?managed)
  }
  BIND(EXISTS { ?stream tree:member ?anyMember. } AS ?hasMember)
}",
        )
    }

    /// Outgoing relations of `node`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIri` if `node` cannot be interpolated
    pub fn relations(node: &str) -> ExploreResult<Self> {
        let node = check_iri(node)?;
        Ok(Self::build(
            QueryKind::Relations,
            &format!(
                "SELECT ?relation ?relationType ?node ?value ?path
WHERE {{
  <{node}> a tree:Node;
    tree:relation ?relation.
  ?relation a ?relationType;
    tree:node ?node.
  OPTIONAL {{ ?relation tree:value ?value. }}
  OPTIONAL {{ ?relation tree:path ?path. }}
}}"
            ),
        )
        .about(node))
    }

    /// Members contained by the container `fragment`, with modification times.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIri` if `fragment` cannot be interpolated
    pub fn container_members(fragment: &str) -> ExploreResult<Self> {
        let fragment = check_iri(fragment)?;
        Ok(Self::build(
            QueryKind::ContainerMembers,
            &format!(
                "SELECT ?member ?modified
WHERE {{
  <{fragment}> a ldp:BasicContainer;
    ldp:contains ?member.
  OPTIONAL {{ ?member dct:modified ?modified. }}
}}"
            ),
        )
        .about(fragment))
    }

    /// Members linked from any stream in the sources
    #[must_use]
    pub fn stream_members() -> Self {
        Self::build(
            QueryKind::StreamMembers,
            "SELECT ?member
WHERE {
  ?stream tree:member ?member.
}",
        )
    }

    /// Activity envelope of the member document in the sources.
    ///
    /// Activities are anchored on `as:actor`, so a nested relationship or
    /// note carrying only `as:object` is never taken for the envelope. A
    /// missing object shows up as an unbound variable rather than an empty
    /// result.
    #[must_use]
    pub fn content() -> Self {
        Self::build(
            QueryKind::Content,
            "SELECT ?id ?actorUrl ?actorName ?object ?targetUrl ?targetName ?context
WHERE {
  { SELECT DISTINCT ?id WHERE { ?id as:actor ?anchor. } }
  OPTIONAL {
    ?id as:actor ?actorUrl.
    OPTIONAL { ?actorUrl as:name ?actorName. }
  }
  OPTIONAL { ?id as:object ?object. }
  OPTIONAL {
    ?id as:target ?targetUrl.
    OPTIONAL { ?targetUrl as:name ?targetName. }
  }
  OPTIONAL { ?id as:context ?context. }
}",
        )
    }

    /// Types of `resource`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIri` if `resource` cannot be interpolated
    pub fn types(resource: &str) -> ExploreResult<Self> {
        let resource = check_iri(resource)?;
        Ok(Self::build(
            QueryKind::Types,
            &format!(
                "SELECT DISTINCT ?type
WHERE {{
  <{resource}> a ?type.
}}"
            ),
        )
        .about(resource))
    }

    /// Subject, relationship, and object of the relationship `object`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIri` if `object` cannot be interpolated
    pub fn relationship(object: &str) -> ExploreResult<Self> {
        let object = check_iri(object)?;
        Ok(Self::build(
            QueryKind::Relationship,
            &format!(
                "SELECT ?subject ?relationship ?object
WHERE {{
  <{object}> as:subject ?subject;
    as:relationship ?relationship;
    as:object ?object.
}}"
            ),
        )
        .about(object))
    }

    /// Types of the object of `activity`, for objects without an IRI of
    /// their own.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIri` if `activity` cannot be interpolated
    pub fn object_types(activity: &str) -> ExploreResult<Self> {
        let activity = check_iri(activity)?;
        Ok(Self::build(
            QueryKind::ObjectTypes,
            &format!(
                "SELECT DISTINCT ?type
WHERE {{
  <{activity}> as:object ?node.
  ?node a ?type.
}}"
            ),
        )
        .about(activity))
    }

    /// Subject, relationship, and object of the object of `activity`, for
    /// objects without an IRI of their own.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIri` if `activity` cannot be interpolated
    pub fn object_relationship(activity: &str) -> ExploreResult<Self> {
        let activity = check_iri(activity)?;
        Ok(Self::build(
            QueryKind::ObjectRelationship,
            &format!(
                "SELECT ?subject ?relationship ?object
WHERE {{
  <{activity}> as:object ?node.
  ?node as:subject ?subject;
    as:relationship ?relationship;
    as:object ?object.
}}"
            ),
        )
        .about(activity))
    }
}
