//! Domain matchers.

use std::fmt;

use regex::Regex;

fn strip_www(host: &str) -> &str {
    match host.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("www.") => &host[4..],
        _ => host,
    }
}

/// Case-insensitive domain equality, ignoring one leading `www.` on either
/// side. Subdomains and superstrings do not match.
pub fn domain_matches(domain: &str, host: &str) -> bool {
    let domain = domain.trim();
    let host = host.trim_end_matches('.');
    domain.eq_ignore_ascii_case(host) || strip_www(domain).eq_ignore_ascii_case(strip_www(host))
}

/// [`domain_matches`], plus any `*.domain` host at any depth.
pub fn subdomain_matches(domain: &str, host: &str) -> bool {
    if domain_matches(domain, host) {
        return true;
    }
    let domain = domain.trim();
    let host = host.trim_end_matches('.');
    if host.len() <= domain.len() + 1 {
        return false;
    }
    let split = host.len() - domain.len();
    host.as_bytes()[split - 1] == b'.'
        && host
            .get(split..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(domain))
}

/// Domain pattern where `*` stands for any run of characters within one
/// label. Literal parts match case-sensitively against the whole hostname.
#[derive(Clone)]
pub struct DomainPattern {
    source: String,
    regex: Regex,
}

impl DomainPattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let body = source
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("[^.]*");
        let regex = Regex::new(&format!("^{}$", body))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, host: &str) -> bool {
        self.regex.is_match(host.trim_end_matches('.'))
    }
}

impl PartialEq for DomainPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for DomainPattern {}

impl fmt::Debug for DomainPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DomainPattern").field(&self.source).finish()
    }
}
