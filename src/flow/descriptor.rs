//! Normalized view of one outbound connection attempt.

use serde::{Deserialize, Serialize};
use url::Url;

/// Remote port of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub enum Port {
    Dns,
    Http,
    Https,
    Other(u16),
}

impl Port {
    pub fn number(&self) -> u16 {
        match self {
            Port::Dns => 53,
            Port::Http => 80,
            Port::Https => 443,
            Port::Other(n) => *n,
        }
    }
}

impl From<u16> for Port {
    fn from(n: u16) -> Self {
        match n {
            53 => Port::Dns,
            80 => Port::Http,
            443 => Port::Https,
            n => Port::Other(n),
        }
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.number()
    }
}

/// Transport protocol of a flow, by IP protocol number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum IpProtocol {
    Tcp,
    Udp,
    Other(u8),
}

impl From<u8> for IpProtocol {
    fn from(n: u8) -> Self {
        match n {
            6 => IpProtocol::Tcp,
            17 => IpProtocol::Udp,
            n => IpProtocol::Other(n),
        }
    }
}

impl From<IpProtocol> for u8 {
    fn from(protocol: IpProtocol) -> Self {
        match protocol {
            IpProtocol::Tcp => 6,
            IpProtocol::Udp => 17,
            IpProtocol::Other(n) => n,
        }
    }
}

/// One observation of an outbound flow.
///
/// A connection is usually observed twice: once when it opens (no payload
/// yet) and once after outbound bytes were peeked. Each observation is its
/// own value; see [`FlowDescriptor::completed_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<Port>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<IpProtocol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u32>,
}

impl FlowDescriptor {
    /// Descriptor carrying only the owning user, used by the user-id phase.
    pub fn for_user(user_id: Option<u32>) -> Self {
        Self {
            user_id,
            ..Default::default()
        }
    }

    /// Host to match domain keys against: the hostname, else the URL's host.
    pub fn host(&self) -> Option<String> {
        FlowTarget::of(self).host
    }

    pub fn parsed_url(&self) -> Option<Url> {
        self.url.as_deref().and_then(|u| Url::parse(u).ok())
    }

    /// Whether a hostname or URL is known for this flow.
    pub fn has_locator(&self) -> bool {
        self.hostname.as_deref().is_some_and(|h| !h.is_empty())
            || self.url.as_deref().is_some_and(|u| !u.is_empty())
    }

    /// The locator decisions are merged on: URL, else hostname, else IP.
    pub fn locator(&self) -> Option<&str> {
        self.url
            .as_deref()
            .filter(|u| !u.is_empty())
            .or_else(|| self.hostname.as_deref().filter(|h| !h.is_empty()))
            .or(self.ip_address.as_deref())
    }

    pub fn is_dns_request(&self, dns_port: u16) -> bool {
        self.protocol == Some(IpProtocol::Udp)
            && self.port.map(|p| p.number()) == Some(dns_port)
    }
}

/// Locators of one flow, derived once and shared by every key check.
#[derive(Debug, Clone)]
pub struct FlowTarget<'a> {
    pub flow: &'a FlowDescriptor,
    url: Option<Url>,
    host: Option<String>,
}

impl<'a> FlowTarget<'a> {
    pub fn of(flow: &'a FlowDescriptor) -> Self {
        let url = flow.parsed_url();
        let host = match &flow.hostname {
            Some(h) if !h.is_empty() => Some(h.trim_end_matches('.').to_string()),
            _ => url.as_ref().and_then(|u| u.host_str().map(str::to_string)),
        };
        Self { flow, url, host }
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn ip_address(&self) -> Option<&str> {
        self.flow.ip_address.as_deref()
    }

    pub fn bundle_id(&self) -> Option<&str> {
        self.flow.bundle_id.as_deref()
    }
}
