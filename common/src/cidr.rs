// Copyright 2024. The Tessera Project Contributors
//
// Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
// following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
// disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
// following disclaimer in the documentation and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
// products derived from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
// INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
// SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
// WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
// USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! CIDR-style address filters, as read from `Swarm.AddrFilters` (§6). §4.1 step 3 requires a
//! malformed filter to be fatal at construction.

use std::net::IpAddr;

use multiaddr::{Multiaddr, Protocol};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("malformed address filter '{0}'")]
pub struct CidrParseError(String);

#[derive(Debug, Clone, Copy)]
pub struct Cidr {
    network: IpAddr,
    prefix_len: u8,
}

impl Cidr {
    fn contains(&self, addr: &IpAddr) -> bool {
        match (self.network, addr) {
            (IpAddr::V4(net), IpAddr::V4(addr)) => {
                let mask = if self.prefix_len == 0 {
                    0u32
                } else {
                    !0u32 << (32u32.saturating_sub(self.prefix_len as u32))
                };
                u32::from(net) & mask == u32::from(*addr) & mask
            },
            (IpAddr::V6(net), IpAddr::V6(addr)) => {
                let net = u128::from(net);
                let addr = u128::from(*addr);
                let mask = if self.prefix_len == 0 {
                    0
                } else {
                    !0u128 << (128u32.saturating_sub(self.prefix_len as u32))
                };
                net & mask == addr & mask
            },
            _ => false,
        }
    }
}

/// Parses a list of CIDR strings (`"127.0.0.1/32"`, `"10.0.0.0/8"`). Any entry that fails to
/// parse is a fatal configuration error, never silently dropped.
pub fn parse_cidrs(filters: &[String]) -> Result<Vec<Cidr>, CidrParseError> {
    filters.iter().map(|s| parse_one(s)).collect()
}

fn parse_one(s: &str) -> Result<Cidr, CidrParseError> {
    let (addr, prefix) = s.split_once('/').ok_or_else(|| CidrParseError(s.to_string()))?;
    let network: IpAddr = addr.parse().map_err(|_| CidrParseError(s.to_string()))?;
    let prefix_len: u8 = prefix.parse().map_err(|_| CidrParseError(s.to_string()))?;
    let max = if network.is_ipv4() { 32 } else { 128 };
    if prefix_len > max {
        return Err(CidrParseError(s.to_string()));
    }
    Ok(Cidr { network, prefix_len })
}

/// Returns true if `addr` should be kept, i.e. it does not match any configured filter.
/// An address with no IP component (e.g. `/dns/example.com/tcp/4001`) always passes.
pub fn is_allowed(addr: &Multiaddr, filters: &[Cidr]) -> bool {
    let ip = addr.iter().find_map(|p| match p {
        Protocol::Ip4(ip) => Some(IpAddr::V4(ip)),
        Protocol::Ip6(ip) => Some(IpAddr::V6(ip)),
        _ => None,
    });
    match ip {
        Some(ip) => !filters.iter().any(|f| f.contains(&ip)),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_filter() {
        assert!(parse_cidrs(&["not-a-cidr".to_string()]).is_err());
        assert!(parse_cidrs(&["10.0.0.0/99".to_string()]).is_err());
    }

    #[test]
    fn filters_matching_loopback() {
        let filters = parse_cidrs(&["127.0.0.0/8".to_string()]).unwrap();
        let loopback: Multiaddr = "/ip4/127.0.0.1/tcp/4001".parse().unwrap();
        let public: Multiaddr = "/ip4/8.8.8.8/tcp/4001".parse().unwrap();
        assert!(!is_allowed(&loopback, &filters));
        assert!(is_allowed(&public, &filters));
    }

    #[test]
    fn dns_addresses_always_pass() {
        let filters = parse_cidrs(&["0.0.0.0/0".to_string()]).unwrap();
        let dns: Multiaddr = "/dns4/example.com/tcp/4001".parse().unwrap();
        assert!(is_allowed(&dns, &filters));
    }
}
