//! Validation of user-supplied origin URLs.
//!
//! The relay fetches whatever manifest URL the player hands it, which makes
//! `url`/`originPath` an SSRF vector. Well-formedness (absolute http/https
//! URL with a host) is always enforced; private/reserved address ranges are
//! additionally rejected unless the deployment opts in to them
//! (`ALLOW_PRIVATE_ORIGINS`, on by default in dev).
//!
//! Hostnames are accepted without DNS resolution — DNS rebinding is a known
//! limitation; full mitigation requires async DNS lookup.

use crate::error::RelayError;
use std::net::{Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

/// Validate a manifest or origin-path URL and return its parsed form.
///
/// # Errors
/// Returns [`RelayError::InvalidOrigin`] for:
/// - Relative or unparseable URLs
/// - Non-HTTP(S) schemes
/// - URLs without a host
/// - With `block_private`: IPv4 private/reserved ranges, IPv6 loopback,
///   link-local and unique-local addresses
pub fn validate_manifest_url(url: &str, block_private: bool) -> Result<Url, RelayError> {
    let parsed =
        Url::parse(url).map_err(|_| RelayError::InvalidOrigin(format!("Invalid URL: {url}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(RelayError::InvalidOrigin(format!(
                "Scheme '{scheme}' not allowed — only http/https permitted"
            )));
        }
    }

    let host = parsed
        .host()
        .ok_or_else(|| RelayError::InvalidOrigin(format!("No host in URL: {url}")))?;

    if block_private {
        match host {
            Host::Ipv4(ip) if is_blocked_ipv4(ip) => {
                return Err(RelayError::InvalidOrigin(format!(
                    "Private or reserved IPv4 address not allowed: {ip}"
                )));
            }
            Host::Ipv6(ip) if is_blocked_ipv6(ip) => {
                return Err(RelayError::InvalidOrigin(format!(
                    "Private or reserved IPv6 address not allowed: {ip}"
                )));
            }
            _ => {}
        }
    }

    Ok(parsed)
}

/// Returns `true` for IPv4 addresses in private or reserved ranges.
///
/// Blocked ranges:
/// - `0.0.0.0/8`      — "this" network (RFC 1122)
/// - `10.0.0.0/8`     — RFC 1918 private
/// - `127.0.0.0/8`    — loopback
/// - `169.254.0.0/16` — link-local / cloud-metadata
/// - `172.16.0.0/12`  — RFC 1918 private
/// - `192.168.0.0/16` — RFC 1918 private
fn is_blocked_ipv4(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    let (a, b) = (octets[0], octets[1]);

    a == 0
        || a == 10
        || a == 127
        || (a == 169 && b == 254)
        || (a == 172 && (16..=31).contains(&b))
        || (a == 192 && b == 168)
}

/// Returns `true` for IPv6 addresses in private or reserved ranges
/// (loopback, `fe80::/10` link-local, `fc00::/7` unique-local).
fn is_blocked_ipv6(ip: Ipv6Addr) -> bool {
    let s = ip.segments();

    ip.is_loopback() || (s[0] & 0xffc0) == 0xfe80 || (s[0] & 0xfe00) == 0xfc00
}
