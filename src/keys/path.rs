//! Path key patterns.
//!
//! A path key is written `domain/path`, e.g. `github.com/htc/*`. A `*`
//! segment consumes one or more URL path segments up to the next literal
//! segment. The pattern must account for the whole URL path; empty
//! segments (a trailing slash) are ignored on both sides.

use url::Url;

use super::domain::domain_matches;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Literal(String),
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    domain: String,
    segments: Vec<PathSegment>,
}

impl PathPattern {
    /// Parse `domain/path`. Returns `None` when either part is missing.
    pub fn parse(source: &str) -> Option<Self> {
        let trimmed = source
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        let (domain, path) = trimmed.split_once('/')?;
        if domain.is_empty() {
            return None;
        }

        let segments: Vec<PathSegment> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s {
                "*" => PathSegment::Wildcard,
                literal => PathSegment::Literal(literal.to_string()),
            })
            .collect();
        if segments.is_empty() {
            return None;
        }

        Some(Self {
            source: source.to_string(),
            domain: domain.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn matches_url(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        if !domain_matches(&self.domain, host) {
            return false;
        }
        let path: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        match_segments(&self.segments, &path)
    }
}

/// Segment-wise glob match in O(pattern x path).
///
/// `matched[j]` holds when the pattern segments seen so far account for
/// exactly the first `j` path segments.
fn match_segments(pattern: &[PathSegment], path: &[&str]) -> bool {
    let mut matched = vec![false; path.len() + 1];
    matched[0] = true;

    for segment in pattern {
        let mut next = vec![false; path.len() + 1];
        match segment {
            PathSegment::Wildcard => {
                let mut reachable = false;
                for j in 1..=path.len() {
                    reachable |= matched[j - 1];
                    next[j] = reachable;
                }
            }
            PathSegment::Literal(literal) => {
                for j in 1..=path.len() {
                    next[j] = matched[j - 1] && path[j - 1] == literal.as_str();
                }
            }
        }
        if !next.contains(&true) {
            return false;
        }
        matched = next;
    }

    matched[path.len()]
}
