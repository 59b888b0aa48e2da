//! RDF terms and solution bindings.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// RDF term bound to a query variable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    /// Named node
    Iri(String),
    /// Blank node label
    Blank(String),
    /// Literal with optional datatype or language tag
    Literal {
        /// Lexical form
        value: String,
        /// Datatype IRI
        datatype: Option<String>,
        /// Language tag
        language: Option<String>,
    },
}

impl Term {
    /// Plain literal
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    /// Literal with a datatype
    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    /// IRI, blank node label, or lexical form
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Iri(v) | Self::Blank(v) => v,
            Self::Literal { value, .. } => value,
        }
    }

    /// Interpret the term as an `xsd:boolean`
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Literal { value, .. } => match value.as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

/// One solution: variable name to term, in projection order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bindings(IndexMap<String, Term>);

impl Bindings {
    /// Empty solution
    #[must_use]
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Bind a variable
    #[must_use]
    pub fn with(mut self, var: impl Into<String>, term: Term) -> Self {
        self.0.insert(var.into(), term);
        self
    }

    /// Bind a variable to an IRI
    #[must_use]
    pub fn with_iri(self, var: impl Into<String>, iri: impl Into<String>) -> Self {
        self.with(var, Term::Iri(iri.into()))
    }

    /// Bind a variable to a plain literal
    #[must_use]
    pub fn with_literal(self, var: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(var, Term::literal(value))
    }

    /// Insert a binding
    pub fn insert(&mut self, var: impl Into<String>, term: Term) {
        self.0.insert(var.into(), term);
    }

    /// Term bound to `var`
    #[must_use]
    pub fn get(&self, var: &str) -> Option<&Term> {
        self.0.get(var)
    }

    /// Value of the term bound to `var`
    #[must_use]
    pub fn value(&self, var: &str) -> Option<&str> {
        self.get(var).map(Term::value)
    }

    /// Owned value of the term bound to `var`
    #[must_use]
    pub fn string(&self, var: &str) -> Option<String> {
        self.value(var).map(str::to_string)
    }

    /// Number of bound variables
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is bound
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Term)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (String, Term)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
