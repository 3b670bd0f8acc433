//! Canonical `(ip, port)` endpoints.
//!
//! Endpoints are compared and hashed as plain tuples; the textual
//! `"<ip>:<port>"` form only exists at display boundaries.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

/// One side of an observed TCP flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint {
    pub ip: IpAddr,
    pub port: u16,
}

impl Endpoint {
    pub fn new(ip: IpAddr, port: u16) -> Endpoint {
        Endpoint { ip, port }
    }

    pub fn v4(a: u8, b: u8, c: u8, d: u8, port: u16) -> Endpoint {
        Endpoint::new(IpAddr::V4(Ipv4Addr::new(a, b, c, d)), port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s.rsplit_once(':').ok_or("missing ':' separator")?;
        let ip = host.parse::<IpAddr>().map_err(|_| "invalid ip address")?;
        let port = port.parse::<u16>().map_err(|_| "invalid port")?;
        Ok(Endpoint::new(ip, port))
    }
}
