//! Heuristic flow parsing.
//!
//! Builds [`FlowDescriptor`] values from the OS flow description text and
//! recovers a hostname from peeked outbound bytes:
//! - HTTP/1.x request line plus `Host:` header
//! - TLS ClientHello `server_name` extension

use std::net::{IpAddr, Ipv6Addr};

use lazy_static::lazy_static;
use regex::Regex;

use super::descriptor::{FlowDescriptor, IpProtocol, Port};

lazy_static! {
    /// `key = value` lines of a flow description
    static ref DESCRIPTION_LINE: Regex = Regex::new(
        r"(?m)^[ \t]*([A-Za-z]+)[ \t]*=[ \t]*(.*?)[ \t]*\r?$"
    ).unwrap();

    /// HTTP/1.x request line
    static ref REQUEST_LINE: Regex = Regex::new(
        r"^(GET|POST|PUT|HEAD|DELETE|OPTIONS|PATCH|CONNECT|TRACE) (\S+) HTTP/1\.[01]\r?$"
    ).unwrap();

    /// Host header, port discarded
    static ref HOST_HEADER: Regex = Regex::new(
        r"(?mi)^host:[ \t]*([^\s:]+)(?::\d+)?[ \t]*\r?$"
    ).unwrap();
}

const TLS_HANDSHAKE: u8 = 0x16;
const TLS_CLIENT_HELLO: u8 = 0x01;
const TLS_EXT_SERVER_NAME: u16 = 0x0000;

impl FlowDescriptor {
    /// Parse the textual description the OS attaches to a new flow.
    ///
    /// Unknown fields are ignored; `(null)` values are treated as absent.
    pub fn from_description(description: &str, user_id: Option<u32>) -> Self {
        let mut flow = FlowDescriptor::for_user(user_id);

        for caps in DESCRIPTION_LINE.captures_iter(description) {
            let value = &caps[2];
            if value.is_empty() || value == "(null)" {
                continue;
            }
            match &caps[1] {
                "sourceAppIdentifier" => {
                    flow.bundle_id = Some(value.trim_start_matches('.').to_string());
                }
                "hostname" => flow.hostname = Some(value.to_string()),
                "url" => flow.url = Some(value.to_string()),
                "remoteEndpoint" => {
                    if let Some((ip, port)) = parse_endpoint(value) {
                        flow.ip_address = Some(ip);
                        flow.port = port.map(Port::from);
                    }
                }
                "protocol" => {
                    if let Ok(n) = value.parse::<u8>() {
                        flow.protocol = Some(IpProtocol::from(n));
                    }
                }
                _ => {}
            }
        }

        flow
    }

    /// The completed view of this flow after peeking outbound bytes.
    ///
    /// Returns a new descriptor; a hostname already known is kept.
    pub fn completed_with(&self, outbound: &[u8]) -> Self {
        let mut completed = self.clone();

        if let Some(request) = parse_http_request(outbound) {
            if completed.hostname.is_none() {
                completed.hostname = request.host.clone();
            }
            if request.url.is_some() {
                completed.url = request.url;
            }
        } else if let Some(sni) = parse_tls_sni(outbound) {
            if completed.hostname.is_none() {
                completed.hostname = Some(sni);
            }
        }

        completed
    }
}

/// Split `ip:port`, `[ipv6]:port` or the `ipv6.port` form the OS prints.
fn parse_endpoint(endpoint: &str) -> Option<(String, Option<u16>)> {
    if let Some(rest) = endpoint.strip_prefix('[') {
        let (ip, tail) = rest.split_once(']')?;
        let port = tail.strip_prefix(':').and_then(|p| p.parse().ok());
        return Some((ip.to_string(), port));
    }

    if endpoint.matches(':').count() > 1 {
        if let Some((ip, port)) = endpoint.rsplit_once('.') {
            if ip.parse::<Ipv6Addr>().is_ok() {
                return Some((ip.to_string(), port.parse().ok()));
            }
        }
        return Some((endpoint.to_string(), None));
    }

    match endpoint.rsplit_once(':') {
        Some((ip, port)) => Some((ip.to_string(), port.parse().ok())),
        None if endpoint.parse::<IpAddr>().is_ok() => Some((endpoint.to_string(), None)),
        None => None,
    }
}

#[derive(Debug, PartialEq)]
struct HttpRequest {
    host: Option<String>,
    url: Option<String>,
}

fn parse_http_request(bytes: &[u8]) -> Option<HttpRequest> {
    let text = String::from_utf8_lossy(bytes);
    let first_line = text.lines().next()?;
    let caps = REQUEST_LINE.captures(first_line)?;
    let method = &caps[1];
    let target = &caps[2];

    if method == "CONNECT" {
        let host = target.split(':').next().map(str::to_string);
        return Some(HttpRequest { host, url: None });
    }

    if target.starts_with("http://") || target.starts_with("https://") {
        let host = url::Url::parse(target)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string));
        return Some(HttpRequest {
            host,
            url: Some(target.to_string()),
        });
    }

    let host = HOST_HEADER
        .captures(header_block(&text))
        .map(|c| c[1].to_string());
    let url = host.as_ref().map(|h| format!("http://{}{}", h, target));
    Some(HttpRequest { host, url })
}

/// Request line and headers, without any body bytes that were peeked.
fn header_block(text: &str) -> &str {
    let end = ["\r\n\r\n", "\n\n"]
        .iter()
        .filter_map(|sep| text.find(sep))
        .min()
        .unwrap_or(text.len());
    &text[..end]
}

/// Read cursor over a TLS record; every read is bounds-checked.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.bytes.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn u16(&mut self) -> Option<u16> {
        self.take(2).map(|b| u16::from_be_bytes([b[0], b[1]]))
    }

    fn skip_u8_prefixed(&mut self) -> Option<()> {
        let len = self.u8()? as usize;
        self.take(len).map(|_| ())
    }

    fn skip_u16_prefixed(&mut self) -> Option<()> {
        let len = self.u16()? as usize;
        self.take(len).map(|_| ())
    }
}

fn parse_tls_sni(bytes: &[u8]) -> Option<String> {
    let mut cur = Cursor { bytes, pos: 0 };
    if cur.u8()? != TLS_HANDSHAKE {
        return None;
    }
    cur.take(2)?; // record version
    cur.take(2)?; // record length
    if cur.u8()? != TLS_CLIENT_HELLO {
        return None;
    }
    cur.take(3)?; // handshake length
    cur.take(2)?; // client version
    cur.take(32)?; // random
    cur.skip_u8_prefixed()?; // session id
    cur.skip_u16_prefixed()?; // cipher suites
    cur.skip_u8_prefixed()?; // compression methods

    let extensions_len = cur.u16()? as usize;
    let mut ext = Cursor {
        bytes: cur.take(extensions_len)?,
        pos: 0,
    };

    while let Some(ext_type) = ext.u16() {
        let len = ext.u16()? as usize;
        let body = ext.take(len)?;
        if ext_type != TLS_EXT_SERVER_NAME {
            continue;
        }
        let mut names = Cursor { bytes: body, pos: 0 };
        names.u16()?; // list length
        while let Some(name_type) = names.u8() {
            let name_len = names.u16()? as usize;
            let name = names.take(name_len)?;
            if name_type == 0 {
                return std::str::from_utf8(name).ok().map(str::to_string);
            }
        }
        return None;
    }

    None
}
