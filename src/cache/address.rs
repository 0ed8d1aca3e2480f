//! Address Module
//!
//! Defines the immutable address value stored by the cache.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CacheError;

// == Address ==
/// A network address, optionally labelled with the host name it was resolved from.
///
/// Identity is the IP alone: two addresses with the same IP and different host
/// names are equal, hash the same and occupy the same cache slot.
#[derive(Debug, Clone)]
pub struct Address {
    ip: IpAddr,
    host: Option<Arc<str>>,
}

impl Address {
    // == Constructors ==
    /// Creates an address without a host name.
    pub fn new(ip: IpAddr) -> Self {
        Self { ip, host: None }
    }

    /// Creates an address labelled with the host name it was resolved from.
    pub fn with_host(host: impl Into<Arc<str>>, ip: IpAddr) -> Self {
        Self {
            ip,
            host: Some(host.into()),
        }
    }

    /// The IP this address points at.
    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    /// Host name, if the address came from a resolution.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Identity key used by the cache index.
    pub fn key(&self) -> IpAddr {
        self.ip
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.ip == other.ip
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ip.hash(state);
    }
}

impl From<IpAddr> for Address {
    fn from(ip: IpAddr) -> Self {
        Self::new(ip)
    }
}

// == Text Form ==
/// Formats as `ip` or `host/ip`.
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            Some(host) => write!(f, "{}/{}", host, self.ip),
            None => write!(f, "{}", self.ip),
        }
    }
}

/// Parses `ip`, `host/ip` or `/ip`.
impl FromStr for Address {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (host, ip) = match s.rsplit_once('/') {
            Some((host, ip)) => (host.trim(), ip.trim()),
            None => ("", s),
        };

        let ip: IpAddr = ip
            .parse()
            .map_err(|_| CacheError::InvalidAddress(s.to_string()))?;

        if host.is_empty() {
            Ok(Self::new(ip))
        } else {
            Ok(Self::with_host(host, ip))
        }
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_parse_plain_ip() {
        let address: Address = "10.107.1.1".parse().unwrap();
        assert_eq!(address.ip(), IpAddr::V4(Ipv4Addr::new(10, 107, 1, 1)));
        assert!(address.host().is_none());
    }

    #[test]
    fn test_parse_host_and_ip() {
        let address: Address = "gateway.local/10.107.1.2".parse().unwrap();
        assert_eq!(address.host(), Some("gateway.local"));
        assert_eq!(address.to_string(), "gateway.local/10.107.1.2");

        let bare: Address = "/10.107.1.2".parse().unwrap();
        assert!(bare.host().is_none());
    }

    #[test]
    fn test_parse_ipv6() {
        let address: Address = "::1".parse().unwrap();
        assert_eq!(address.ip(), IpAddr::V6(Ipv6Addr::LOCALHOST));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            "not-an-ip".parse::<Address>(),
            Err(CacheError::InvalidAddress(_))
        ));
        assert!(matches!(
            "host/999.1.1.1".parse::<Address>(),
            Err(CacheError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_identity_ignores_host() {
        let plain: Address = "10.0.0.7".parse().unwrap();
        let named: Address = "db/10.0.0.7".parse().unwrap();
        assert_eq!(plain, named);

        let set: HashSet<Address> = [plain, named].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_serde_uses_text_form() {
        let address: Address = "db/10.0.0.7".parse().unwrap();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, r#""db/10.0.0.7""#);

        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back.host(), Some("db"));
    }
}
