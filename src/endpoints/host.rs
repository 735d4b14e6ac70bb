//! Host extraction and classification.

use std::fmt;
use std::net::IpAddr;

use url::Url;

use crate::error::AddressError;

/// Whether a host is an IP literal or a DNS name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    Ip(IpAddr),
    Dns,
}

/// A normalized destination host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    /// Lower-cased host name, without brackets or a trailing root dot.
    name: String,
    kind: HostKind,
}

impl Host {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> HostKind {
        self.kind
    }

    pub fn is_ip(&self) -> bool {
        matches!(self.kind, HostKind::Ip(_))
    }

    /// True for IP literals in 127.0.0.0/8, including the IPv4-mapped IPv6 form.
    pub fn is_loopback_ip(&self) -> bool {
        match self.kind {
            HostKind::Ip(IpAddr::V4(ip)) => ip.is_loopback(),
            HostKind::Ip(IpAddr::V6(ip)) => ip.to_ipv4_mapped().is_some_and(|v4| v4.is_loopback()),
            HostKind::Dns => false,
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Parse an http(s) URL or a bare `host[:port][/path]` and classify its host.
pub fn classify(address: &str) -> Result<Host, AddressError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(AddressError::Empty);
    }

    let parsed = if has_scheme(address) {
        Url::parse(address)?
    } else {
        Url::parse(&format!("https://{address}"))?
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AddressError::UnsupportedScheme {
            scheme: parsed.scheme().to_string(),
        });
    }

    match parsed.host() {
        Some(url::Host::Ipv4(ip)) => Ok(Host {
            name: ip.to_string(),
            kind: HostKind::Ip(IpAddr::V4(ip)),
        }),
        Some(url::Host::Ipv6(ip)) => Ok(Host {
            name: ip.to_string(),
            kind: HostKind::Ip(IpAddr::V6(ip)),
        }),
        Some(url::Host::Domain(domain)) => {
            let domain = domain.strip_suffix('.').unwrap_or(domain);
            if domain.is_empty() {
                return Err(AddressError::MissingHost);
            }
            Ok(Host {
                name: domain.to_ascii_lowercase(),
                kind: HostKind::Dns,
            })
        }
        None => Err(AddressError::MissingHost),
    }
}

/// True when `address` starts with `scheme://`. A `://` that only appears
/// after a path or query character does not count.
fn has_scheme(address: &str) -> bool {
    address.split_once("://").is_some_and(|(scheme, _)| {
        let mut chars = scheme.chars();
        chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}
