//! Broker address validation.
//!
//! The configured broker host is checked once, when the publisher
//! initializes, before a connection is requested. An IPv4 literal is used
//! as-is; anything else must be a syntactically valid DNS hostname and is
//! left to the transport to resolve.

use core::fmt;
use core::net::Ipv4Addr;

use thiserror::Error;

use crate::config::{short_string, ShortString};

/// A validated broker host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BrokerAddress {
    /// Dotted-quad IPv4 address.
    Ip(Ipv4Addr),
    /// DNS hostname.
    Host(ShortString),
}

/// Reason a broker host was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BrokerAddressError {
    /// Host string is empty.
    #[error("broker host is empty")]
    Empty,
    /// Looks like an IPv4 address but does not parse as one.
    #[error("invalid IPv4 address: {0}")]
    InvalidIp(ShortString),
    /// Not a valid hostname.
    #[error("invalid hostname: {0}")]
    InvalidHost(ShortString),
}

impl BrokerAddress {
    /// Validate a configured broker host.
    ///
    /// ```
    /// use rs_linewatch::broker::BrokerAddress;
    /// use core::net::Ipv4Addr;
    ///
    /// assert_eq!(
    ///     BrokerAddress::resolve("192.168.1.10"),
    ///     Ok(BrokerAddress::Ip(Ipv4Addr::new(192, 168, 1, 10)))
    /// );
    /// assert!(BrokerAddress::resolve("broker.local").is_ok());
    /// assert!(BrokerAddress::resolve("192.168.1.300").is_err());
    /// ```
    pub fn resolve(host: &str) -> Result<Self, BrokerAddressError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(BrokerAddressError::Empty);
        }

        if host.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
            return host
                .parse::<Ipv4Addr>()
                .map(BrokerAddress::Ip)
                .map_err(|_| BrokerAddressError::InvalidIp(short_string(host)));
        }

        let mut name = ShortString::new();
        if is_valid_hostname(host) && name.push_str(host).is_ok() {
            Ok(BrokerAddress::Host(name))
        } else {
            Err(BrokerAddressError::InvalidHost(short_string(host)))
        }
    }

    /// Returns the IPv4 address if the broker was given as one.
    pub fn ip(&self) -> Option<Ipv4Addr> {
        match self {
            BrokerAddress::Ip(ip) => Some(*ip),
            BrokerAddress::Host(_) => None,
        }
    }
}

impl fmt::Display for BrokerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokerAddress::Ip(ip) => write!(f, "{}", ip),
            BrokerAddress::Host(host) => f.write_str(host),
        }
    }
}

fn is_valid_hostname(host: &str) -> bool {
    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}
