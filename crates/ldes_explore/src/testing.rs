//! Scripted collaborators for tests.

use async_trait::async_trait;
use futures::{stream, StreamExt};
use ldes_core::vocab::{AS_NS, REL_EVENT_STREAM, TREE_NS};
use ldes_query::{
    BindingStream, Bindings, Query, QueryError, QueryKind, QueryOptions, QueryProvider,
    QueryResult, Term,
};
use ldes_transport::{HeadResponse, Link, Transport, TransportError, TransportResult};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub const ARTIFACT: &str = "https://pod.example/artifacts/a1";
pub const ROOT: &str = "https://pod.example/ldes/";
pub const F1: &str = "https://pod.example/ldes/1/";
pub const F2: &str = "https://pod.example/ldes/2/";
pub const GTE: &str = "https://w3id.org/tree#GreaterThanOrEqualToRelation";

/// A query as the provider saw it
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub kind: QueryKind,
    pub subject: Option<String>,
    pub options: QueryOptions,
}

type Key = (QueryKind, String);

/// Provider answering from a table keyed by template and subject IRI
/// (or first source for templates without one)
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<HashMap<Key, Vec<Bindings>>>,
    failures: Mutex<HashSet<Key>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(query: &Query, options: &QueryOptions) -> Key {
        let subject = query
            .subject()
            .map(str::to_string)
            .or_else(|| options.sources.first().cloned())
            .unwrap_or_default();
        (query.kind(), subject)
    }

    pub fn on(&self, kind: QueryKind, key: &str, rows: Vec<Bindings>) {
        self.responses
            .lock()
            .unwrap()
            .insert((kind, key.to_string()), rows);
    }

    pub fn fail(&self, kind: QueryKind, key: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert((kind, key.to_string()));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, kind: QueryKind) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.kind == kind).collect()
    }

    fn answer(&self, query: &Query, options: &QueryOptions) -> QueryResult<Vec<Bindings>> {
        self.calls.lock().unwrap().push(RecordedCall {
            kind: query.kind(),
            subject: query.subject().map(str::to_string),
            options: options.clone(),
        });
        let key = Self::key(query, options);
        if self.failures.lock().unwrap().contains(&key) {
            return Err(QueryError::Request(format!("scripted failure for {}", key.1)));
        }
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }

    /// Classification row for a container-managed stream
    pub fn script_container_stream(&self, root: &str) {
        self.on(
            QueryKind::Classify,
            root,
            vec![Bindings::new()
                .with_iri("stream", format!("{root}#EventStream"))
                .with_iri("view", root)
                .with_iri("viewDescription", format!("{root}#ViewDescription"))
                .with("managed", boolean(true))
                .with("hasMember", boolean(false))],
        );
    }

    /// Relations of `node`, in the order given
    pub fn script_relations(&self, node: &str, targets: &[(&str, Option<&str>)]) {
        let rows = targets
            .iter()
            .enumerate()
            .map(|(i, (target, value))| relation_row(&format!("_:r{i}"), target, *value))
            .collect();
        self.on(QueryKind::Relations, node, rows);
    }

    /// Container listing with modification times
    pub fn script_container(&self, fragment: &str, members: &[(&str, &str)]) {
        let rows = members
            .iter()
            .map(|(member, modified)| {
                Bindings::new().with_iri("member", *member).with(
                    "modified",
                    Term::typed(*modified, "http://www.w3.org/2001/XMLSchema#dateTime"),
                )
            })
            .collect();
        self.on(QueryKind::ContainerMembers, fragment, rows);
    }

    /// `tree:member` listing of a page
    pub fn script_stream_members(&self, page: &str, members: &[&str]) {
        let rows = members
            .iter()
            .map(|m| Bindings::new().with_iri("member", *m))
            .collect();
        self.on(QueryKind::StreamMembers, page, rows);
    }

    /// A well-formed `as:Create` activity at `member`
    pub fn script_activity(&self, member: &str) {
        let id = format!("{member}#activity");
        let object = format!("{member}#object");
        self.on(QueryKind::Content, member, vec![content_row(&id, "https://pod.example/alice", &object)]);
        self.on(QueryKind::Types, &id, vec![type_row(&format!("{AS_NS}Create"))]);
        self.on(QueryKind::Types, &object, vec![type_row(&format!("{AS_NS}Note"))]);
    }
}

#[async_trait]
impl QueryProvider for ScriptedProvider {
    async fn select(&self, query: &Query, options: &QueryOptions) -> QueryResult<BindingStream> {
        let rows = self.answer(query, options)?;
        Ok(stream::iter(rows.into_iter().map(Ok)).boxed())
    }

    async fn ask(&self, query: &Query, options: &QueryOptions) -> QueryResult<bool> {
        Ok(!self.answer(query, options)?.is_empty())
    }
}

pub fn boolean(value: bool) -> Term {
    Term::typed(value.to_string(), "http://www.w3.org/2001/XMLSchema#boolean")
}

pub fn relation_row(relation: &str, target: &str, value: Option<&str>) -> Bindings {
    let mut row = Bindings::new()
        .with("relation", Term::Blank(relation.to_string()))
        .with_iri("relationType", GTE)
        .with_iri("node", target)
        .with_iri("path", format!("{TREE_NS}timestamp"));
    if let Some(value) = value {
        row.insert("value", Term::literal(value));
    }
    row
}

pub fn content_row(id: &str, actor: &str, object: &str) -> Bindings {
    Bindings::new()
        .with_iri("id", id)
        .with_iri("actorUrl", actor)
        .with_literal("actorName", "Alice")
        .with_iri("object", object)
}

pub fn type_row(iri: &str) -> Bindings {
    Bindings::new().with_iri("type", iri)
}

/// Transport answering HEAD requests from a fixed table
#[derive(Default)]
pub struct StaticTransport {
    links: HashMap<String, Vec<Link>>,
    failing: HashSet<String>,
}

impl StaticTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_link(mut self, url: &str, target: &str, rel: &str) -> Self {
        self.links.entry(url.to_string()).or_default().push(Link {
            target: target.to_string(),
            rels: vec![rel.to_string()],
            params: Vec::new(),
        });
        self
    }

    pub fn with_event_stream(self, url: &str, root: &str) -> Self {
        self.with_link(url, root, REL_EVENT_STREAM)
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }
}

#[async_trait]
impl Transport for StaticTransport {
    async fn head(&self, url: &str) -> TransportResult<HeadResponse> {
        if self.failing.contains(url) {
            return Err(TransportError::ConnectionFailed(url.to_string()));
        }
        match self.links.get(url) {
            Some(links) => Ok(HeadResponse {
                status: 200,
                links: links.clone(),
            }),
            None => Ok(HeadResponse {
                status: 404,
                links: Vec::new(),
            }),
        }
    }
}

/// Container-based log: `F1` (sealed, 2 members) then `F2` (tail, 1 member).
/// Relations are discovered tail first to exercise ordering.
pub fn container_log() -> (StaticTransport, ScriptedProvider) {
    let transport = StaticTransport::new().with_event_stream(ARTIFACT, ROOT);
    let provider = ScriptedProvider::new();
    provider.script_container_stream(ROOT);
    provider.script_relations(
        ROOT,
        &[
            (F2, Some("2022-02-01T00:00:00Z")),
            (F1, Some("2022-01-01T00:00:00Z")),
        ],
    );
    provider.script_container(
        F1,
        &[
            ("https://pod.example/ldes/1/m1", "2022-01-02T00:00:00Z"),
            ("https://pod.example/ldes/1/m2", "2022-01-03T00:00:00Z"),
        ],
    );
    provider.script_container(F2, &[("https://pod.example/ldes/2/m3", "2022-02-02T00:00:00Z")]);
    for member in [
        "https://pod.example/ldes/1/m1",
        "https://pod.example/ldes/1/m2",
        "https://pod.example/ldes/2/m3",
    ] {
        provider.script_activity(member);
    }
    (transport, provider)
}
