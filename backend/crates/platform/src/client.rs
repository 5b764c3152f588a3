//! Client identification utilities
//!
//! Every caller that needs "the client IP" goes through
//! [`client_ip_literal`] so the forwarded-header policy is applied once.

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Header set by reverse proxies in front of the gate
pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Determine the textual client address for a request
///
/// If the `X-Forwarded-For` header is present its first comma-separated
/// entry is returned as-is, even when it is blank or not an address;
/// the peer address is only consulted when the header is absent.
///
/// ## Arguments
/// * `headers` - HTTP request headers
/// * `peer` - Directly observed peer address, if known
pub fn client_ip_literal(headers: &HeaderMap, peer: Option<IpAddr>) -> Option<String> {
    if let Some(value) = headers.get(FORWARDED_FOR) {
        let forwarded = value.to_str().unwrap_or_default();
        let first = forwarded.split(',').next().unwrap_or_default();
        return Some(first.trim().to_string());
    }
    peer.map(|ip| ip.to_string())
}

/// Parse a client address literal
///
/// IPv4-mapped IPv6 addresses are folded to plain IPv4 so they compare
/// against IPv4 networks.
pub fn parse_client_ip(literal: &str) -> Option<IpAddr> {
    literal
        .trim()
        .parse::<IpAddr>()
        .ok()
        .map(|ip| ip.to_canonical())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_for_takes_first_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_static("1.1.1.1, 2.2.2.2"));

        let peer: IpAddr = "3.3.3.3".parse().unwrap();
        assert_eq!(
            client_ip_literal(&headers, Some(peer)),
            Some("1.1.1.1".to_string())
        );
    }

    #[test]
    fn test_peer_used_without_forwarded_header() {
        let headers = HeaderMap::new();
        let peer: IpAddr = "3.3.3.3".parse().unwrap();
        assert_eq!(
            client_ip_literal(&headers, Some(peer)),
            Some("3.3.3.3".to_string())
        );
        assert_eq!(client_ip_literal(&headers, None), None);
    }

    #[test]
    fn test_blank_forwarded_header_does_not_fall_back() {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_static(""));

        let peer: IpAddr = "127.0.0.1".parse().unwrap();
        let literal = client_ip_literal(&headers, Some(peer));
        assert_eq!(literal, Some(String::new()));
        assert_eq!(parse_client_ip(""), None);
    }

    #[test]
    fn test_parse_client_ip_canonicalizes_mapped_v4() {
        let ip = parse_client_ip("::ffff:1.2.3.4").unwrap();
        assert_eq!(ip, "1.2.3.4".parse::<IpAddr>().unwrap());
        assert!(parse_client_ip("not_an_ip_address").is_none());
    }
}
