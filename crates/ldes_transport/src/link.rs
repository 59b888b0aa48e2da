//! `Link` header parsing (RFC 8288).
//!
//! A field value is a comma-separated list of `<target>; param=value`
//! entries. Commas and semicolons inside `<...>` or quoted strings do not
//! split. Entries that cannot be parsed are skipped.

use serde::{Deserialize, Serialize};

/// One link from a `Link` header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Target URI exactly as written between the angle brackets
    pub target: String,
    /// Relation types from the `rel` parameter
    pub rels: Vec<String>,
    /// Other parameters, names lowercased, values unquoted
    pub params: Vec<(String, String)>,
}

impl Link {
    /// Whether the link carries relation type `rel`
    #[must_use]
    pub fn has_rel(&self, rel: &str) -> bool {
        self.rels.iter().any(|r| r == rel)
    }
}

/// Parse one `Link` header field value
#[must_use]
pub fn parse_link_header(value: &str) -> Vec<Link> {
    split_outside(value, ',')
        .into_iter()
        .filter_map(|entry| {
            let link = parse_entry(entry);
            if link.is_none() && !entry.trim().is_empty() {
                tracing::debug!(entry = entry.trim(), "skipping unparsable link");
            }
            link
        })
        .collect()
}

fn parse_entry(entry: &str) -> Option<Link> {
    let entry = entry.trim();
    let rest = entry.strip_prefix('<')?;
    let close = rest.find('>')?;
    let target = rest[..close].trim().to_string();
    let mut link = Link {
        target,
        rels: Vec::new(),
        params: Vec::new(),
    };

    for param in split_outside(&rest[close + 1..], ';') {
        let param = param.trim();
        if param.is_empty() {
            continue;
        }
        let (name, raw) = match param.split_once('=') {
            Some((name, raw)) => (name.trim().to_ascii_lowercase(), unquote(raw.trim())),
            None => (param.to_ascii_lowercase(), String::new()),
        };
        if name == "rel" {
            // Only the first rel parameter counts.
            if link.rels.is_empty() {
                link.rels = raw.split_whitespace().map(str::to_string).collect();
            }
        } else {
            link.params.push((name, raw));
        }
    }
    Some(link)
}

/// Unwrap a quoted-string, resolving backslash escapes
fn unquote(raw: &str) -> String {
    let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) else {
        return raw.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Split on `sep` where it is not inside `<...>` or a quoted string
fn split_outside(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_angle = false;
    let mut in_quote = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quote => escaped = true,
            '"' if !in_angle => in_quote = !in_quote,
            '<' if !in_quote => in_angle = true,
            '>' if !in_quote => in_angle = false,
            c if c == sep && !in_angle && !in_quote => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}
