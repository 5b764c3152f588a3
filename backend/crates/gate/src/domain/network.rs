//! Exempt networks
//!
//! Ranges are kept sorted by their first address so a lookup can stop
//! as soon as the ranges start beyond the client address.

use crate::error::InvalidIpLiteral;
use ipnet::IpNet;
use std::net::IpAddr;

/// An exempt IP network (address + prefix length)
pub type NetworkRange = IpNet;

/// Sorted, de-duplicated set of exempt networks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkMatcher {
    ranges: Vec<NetworkRange>,
}

impl NetworkMatcher {
    /// Build from raw address / CIDR entries
    ///
    /// Entries that do not parse are skipped, logged, and returned so the
    /// caller can report them; the remaining entries still load.
    pub fn build<I, S>(entries: I) -> (Self, Vec<InvalidIpLiteral>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ranges = Vec::new();
        let mut rejected = Vec::new();

        for entry in entries {
            let entry = entry.as_ref();
            match parse_range(entry) {
                Some(range) => ranges.push(range),
                None => {
                    tracing::warn!(entry = %entry, "Could not exclude supplied ip address");
                    rejected.push(InvalidIpLiteral {
                        entry: entry.to_string(),
                    });
                }
            }
        }

        ranges.sort_by_key(|range| (range.network(), range.prefix_len()));
        ranges.dedup();

        (Self { ranges }, rejected)
    }

    pub fn ranges(&self) -> &[NetworkRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Whether `ip` falls in any exempt network
    pub fn contains(&self, ip: IpAddr) -> bool {
        let ip = ip.to_canonical();
        for range in &self.ranges {
            // every later range starts even further away
            if range.network() > ip {
                break;
            }
            if range.contains(&ip) {
                return true;
            }
        }
        false
    }

    /// Parse and test a client address literal
    ///
    /// Unparseable input is never exempt.
    pub fn contains_literal(&self, literal: &str) -> bool {
        platform::client::parse_client_ip(literal).is_some_and(|ip| self.contains(ip))
    }
}

/// Accepts `a.b.c.d`, `a.b.c.d/n` and the IPv6 equivalents.
/// Host bits below the prefix are cleared.
fn parse_range(entry: &str) -> Option<NetworkRange> {
    let entry = entry.trim();
    if let Ok(net) = entry.parse::<IpNet>() {
        return Some(canonical_range(net.trunc()));
    }
    let addr = entry.parse::<IpAddr>().ok()?.to_canonical();
    let prefix = match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };
    IpNet::new(addr, prefix).ok()
}

/// Clients are matched by canonical address, so an IPv4-mapped block
/// (`::ffff:a.b.c.d/n`, n >= 96) becomes the IPv4 block it maps.
fn canonical_range(net: IpNet) -> IpNet {
    match (net, net.network().to_canonical()) {
        (IpNet::V6(v6), IpAddr::V4(v4)) if v6.prefix_len() >= 96 => {
            IpNet::new(IpAddr::V4(v4), v6.prefix_len() - 96).unwrap_or(net)
        }
        _ => net,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::net::Ipv4Addr;

    fn matcher(entries: &[&str]) -> NetworkMatcher {
        let (matcher, rejected) = NetworkMatcher::build(entries);
        assert!(rejected.is_empty());
        matcher
    }

    fn linear_contains(matcher: &NetworkMatcher, ip: IpAddr) -> bool {
        matcher.ranges().iter().any(|range| range.contains(&ip))
    }

    #[test]
    fn test_empty_matcher_contains_nothing() {
        let matcher = NetworkMatcher::default();
        assert!(!matcher.contains_literal("1.1.1.1"));
    }

    #[test]
    fn test_contains_exact_and_network() {
        let matcher = matcher(&["1.2.0.0/16", "127.0.0.1/32"]);
        assert!(matcher.contains_literal("127.0.0.1"));
        assert!(matcher.contains_literal("1.2.3.4"));
        assert!(!matcher.contains_literal("1.1.1.1"));
        assert!(!matcher.contains_literal("2.2.2.2"));
    }

    #[test]
    fn test_invalid_literal_is_not_exempt() {
        let matcher = matcher(&["0.0.0.0/0"]);
        assert!(!matcher.contains_literal(""));
        assert!(!matcher.contains_literal("not_an_ip_address"));
    }

    #[test]
    fn test_build_skips_invalid_entries() {
        let (matcher, rejected) =
            NetworkMatcher::build(["1.2.0.0/16", "127.0.0.1", "not_an_ip_address"]);
        assert_eq!(
            matcher.ranges(),
            &[
                "1.2.0.0/16".parse::<IpNet>().unwrap(),
                "127.0.0.1/32".parse::<IpNet>().unwrap(),
            ]
        );
        assert_eq!(rejected.len(), 1);
        assert!(
            rejected[0]
                .to_string()
                .starts_with("Could not exclude supplied ip address")
        );
    }

    #[test]
    fn test_build_sorts_and_dedups() {
        let matcher = matcher(&["127.0.0.1", "10.0.0.0/8", "127.0.0.1/32", "10.1.2.3/8"]);
        assert_eq!(
            matcher.ranges(),
            &[
                "10.0.0.0/8".parse::<IpNet>().unwrap(),
                "127.0.0.1/32".parse::<IpNet>().unwrap(),
            ]
        );
    }

    #[test]
    fn test_ipv6_ranges() {
        let matcher = matcher(&["2001:db8::/32", "10.0.0.0/8"]);
        assert!(matcher.contains_literal("2001:db8::1"));
        assert!(matcher.contains_literal("::ffff:10.1.1.1"));
        assert!(!matcher.contains_literal("2001:db9::1"));
        assert!(!matcher.contains_literal("11.0.0.1"));
    }

    #[test]
    fn test_mapped_cidr_matches_ipv4_clients() {
        let matcher = matcher(&["::ffff:10.0.0.0/104", "::ffff:192.0.2.7"]);
        assert_eq!(
            matcher.ranges(),
            &[
                "10.0.0.0/8".parse::<IpNet>().unwrap(),
                "192.0.2.7/32".parse::<IpNet>().unwrap(),
            ]
        );
        assert!(matcher.contains_literal("10.20.30.40"));
        assert!(matcher.contains_literal("::ffff:10.20.30.40"));
        assert!(!matcher.contains_literal("11.0.0.1"));
    }

    proptest! {
        #[test]
        fn prop_early_exit_agrees_with_linear_scan(
            nets in proptest::collection::vec((any::<u32>(), 0u8..=32), 0..12),
            ip in any::<u32>(),
        ) {
            let entries: Vec<String> = nets
                .iter()
                .map(|(addr, prefix)| format!("{}/{}", Ipv4Addr::from(*addr), prefix))
                .collect();
            let (matcher, rejected) = NetworkMatcher::build(&entries);
            prop_assert!(rejected.is_empty());

            let ip = IpAddr::V4(Ipv4Addr::from(ip));
            prop_assert_eq!(matcher.contains(ip), linear_contains(&matcher, ip));
        }
    }
}
