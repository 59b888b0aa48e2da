//! Data model of an explored event stream.
//!
//! Every value here is an immutable snapshot of remote state taken at query
//! time.

use crate::value::ComparisonValue;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Caller-supplied resource URL, not assumed to be the stream root
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    /// Wrap an artifact URL
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// URL as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArtifactRef {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

/// Fragmentation strategy of an event stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    /// Fragments are LDP containers listing their members
    ContainerBased,
    /// Fragments are TREE nodes linked by typed relations
    RelationBased,
    /// Members hang directly off the root, no fragmentation
    Flat,
}

impl Variant {
    /// Whether the variant is walked through a page graph
    #[must_use]
    pub const fn is_paginated(self) -> bool {
        !matches!(self, Self::Flat)
    }

    /// Whether listings carry per-member modification timestamps
    #[must_use]
    pub const fn has_member_timestamps(self) -> bool {
        matches!(self, Self::ContainerBased)
    }

    /// Whether the most recent fragment is mutable and must be revalidated
    #[must_use]
    pub const fn has_mutable_tail(self) -> bool {
        matches!(self, Self::ContainerBased)
    }

    /// Short name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ContainerBased => "container",
            Self::RelationBased => "relation",
            Self::Flat => "flat",
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry point into the stream's fragmentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDescriptor {
    /// View node URL
    pub view_url: String,
    /// View description URL, if advertised
    pub view_description_url: Option<String>,
    /// Whether the description is managed by an LDES-in-LDP client
    pub managed_by_container_client: bool,
}

impl ViewDescriptor {
    /// Create a view with no description
    pub fn new(view_url: impl Into<String>) -> Self {
        Self {
            view_url: view_url.into(),
            view_description_url: None,
            managed_by_container_client: false,
        }
    }

    /// Mark the view as container-managed
    #[must_use]
    pub fn container_managed(mut self) -> Self {
        self.managed_by_container_client = true;
        self
    }
}

/// Discovered event stream, fixed for the lifetime of a traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLogDescriptor {
    /// Event stream root URL
    pub root_url: String,
    /// Fragmentation strategy
    pub variant: Variant,
    /// Views in discovery order
    pub views: Vec<ViewDescriptor>,
    /// Event-log template link, when the artifact advertises one
    pub event_log_template: Option<String>,
}

/// Directed, ordered edge between two fragments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Relation identifier (often a blank node label)
    pub relation_id: String,
    /// Relation type IRI, e.g. `tree:GreaterThanOrEqualToRelation`
    pub relation_kind: String,
    /// Fragment the relation belongs to
    pub source_node: String,
    /// Fragment the relation points to
    pub target_node: String,
    /// Parsed `tree:value`
    pub comparison_value: Option<ComparisonValue>,
    /// Property path constrained by the value
    pub path: Option<String>,
}

/// One page of the log, produced lazily by the page cursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentRef {
    /// Fragment node URL
    pub url: String,
    /// Relation through which the fragment was reached
    pub relation: Option<Relation>,
    /// Whether this is the most recent fragment known to the cursor
    pub is_tail: bool,
}

impl FragmentRef {
    /// Fragment with no incoming relation (a view or the root)
    pub fn entry(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            relation: None,
            is_tail: false,
        }
    }

    /// Fragment reached through a relation
    #[must_use]
    pub fn via(relation: Relation) -> Self {
        Self {
            url: relation.target_node.clone(),
            relation: Some(relation),
            is_tail: false,
        }
    }

    /// Set the tail flag
    #[must_use]
    pub fn tail(mut self, is_tail: bool) -> Self {
        self.is_tail = is_tail;
        self
    }
}

/// Per-member metadata supplied by container listings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// `dcterms:modified` of the member resource
    pub date_time: Option<DateTime<FixedOffset>>,
}

/// Member identifier as listed by a fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRef {
    /// Member URL
    pub id: String,
    /// Listing metadata (container-based streams only)
    pub metadata: Option<Metadata>,
}

impl MemberRef {
    /// Member without metadata
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: None,
        }
    }
}

/// Subject/relationship/object triple of an `as:Relationship` object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// `as:subject`
    pub subject: String,
    /// `as:relationship`
    pub relationship: String,
    /// `as:object`
    pub object: String,
}

/// Materialized log member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Activity IRI
    pub id: String,
    /// `as:actor`
    pub actor_url: String,
    /// `as:name` of the actor
    pub actor_name: Option<String>,
    /// `as:object`
    pub object: String,
    /// `as:target`
    pub target_url: Option<String>,
    /// `as:name` of the target
    pub target_name: Option<String>,
    /// `as:context`
    pub context: Option<String>,
    /// Types of the activity
    pub types: Vec<String>,
    /// Types of the object
    pub object_types: Vec<String>,
    /// Resolved relationship; `None` when the object is not a relationship
    /// or could not be resolved
    pub object_relationship: Option<Relationship>,
}

impl Member {
    /// Whether the activity carries the given type
    #[must_use]
    pub fn has_type(&self, iri: &str) -> bool {
        self.types.iter().any(|t| t == iri)
    }

    /// Whether the object carries the given type
    #[must_use]
    pub fn object_has_type(&self, iri: &str) -> bool {
        self.object_types.iter().any(|t| t == iri)
    }
}

/// Member together with the page that yielded it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    /// Materialized member
    pub member: Member,
    /// Listing metadata, if the variant provides it
    pub metadata: Option<Metadata>,
    /// Fragment URL that listed the member
    pub fragment: String,
}
