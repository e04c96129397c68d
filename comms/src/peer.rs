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

use std::time::{Duration, SystemTime};

use multiaddr::Multiaddr;

use crate::identity::{NodeIdentifier, PeerFeatures};

/// A record of a peer we know about: its identifier, the addresses we've seen it reachable at,
/// and when we last successfully connected. The bootstrapper, mDNS discovery and the DHT all
/// funnel what they learn into `Peerstore` entries of this shape.
#[derive(Debug, Clone)]
pub struct Peer {
    identifier: NodeIdentifier,
    addresses: Vec<Multiaddr>,
    features: PeerFeatures,
    last_connected_at: Option<SystemTime>,
}

impl Peer {
    pub fn new(identifier: NodeIdentifier, addresses: Vec<Multiaddr>, features: PeerFeatures) -> Self {
        Self {
            identifier,
            addresses,
            features,
            last_connected_at: None,
        }
    }

    pub fn identifier(&self) -> NodeIdentifier {
        self.identifier
    }

    pub fn addresses(&self) -> &[Multiaddr] {
        &self.addresses
    }

    pub fn features(&self) -> PeerFeatures {
        self.features
    }

    pub fn last_connected_at(&self) -> Option<SystemTime> {
        self.last_connected_at
    }

    pub fn mark_connected(&mut self) {
        self.last_connected_at = Some(SystemTime::now());
    }

    pub fn add_address(&mut self, addr: Multiaddr) {
        if !self.addresses.contains(&addr) {
            self.addresses.push(addr);
        }
    }

    pub fn supports(&self, features: PeerFeatures) -> bool {
        self.features.contains(features)
    }

    /// §9 edge case: a peer not seen within this window is considered stale by the bootstrapper
    /// and the DHT router's periodic table maintenance, and is a candidate for eviction.
    pub fn is_stale(&self, max_age: Duration) -> bool {
        match self.last_connected_at {
            Some(t) => t.elapsed().unwrap_or(Duration::ZERO) > max_age,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identifier() -> NodeIdentifier {
        use libp2p::identity::Keypair;
        NodeIdentifier::from_public_key(&Keypair::generate_ed25519())
    }

    #[test]
    fn fresh_peer_with_no_history_is_stale() {
        let peer = Peer::new(identifier(), Vec::new(), PeerFeatures::default());
        assert!(peer.is_stale(Duration::from_secs(3600)));
    }

    #[test]
    fn recently_connected_peer_is_not_stale() {
        let mut peer = Peer::new(identifier(), Vec::new(), PeerFeatures::default());
        peer.mark_connected();
        assert!(!peer.is_stale(Duration::from_secs(3600)));
    }

    #[test]
    fn addresses_are_deduplicated() {
        let addr: Multiaddr = "/ip4/127.0.0.1/tcp/4001".parse().unwrap();
        let mut peer = Peer::new(identifier(), vec![addr.clone()], PeerFeatures::default());
        peer.add_address(addr);
        assert_eq!(peer.addresses().len(), 1);
    }
}
