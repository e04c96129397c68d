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

use std::{collections::HashMap, sync::Arc};

use multiaddr::Multiaddr;
use tokio::sync::RwLock;

use crate::{
    identity::NodeIdentifier,
    peer::Peer,
};

/// Shared table of known peers, addressable by identifier. Every subsystem that learns about a
/// peer (the bootstrapper, mDNS discovery, the DHT router, inbound connections) writes into the
/// same `Peerstore`; nothing keeps a private copy of peer addresses.
#[derive(Clone, Default)]
pub struct Peerstore {
    inner: Arc<RwLock<HashMap<NodeIdentifier, Peer>>>,
}

impl Peerstore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, peer: Peer) {
        self.inner.write().await.insert(peer.identifier(), peer);
    }

    pub async fn get(&self, identifier: &NodeIdentifier) -> Option<Peer> {
        self.inner.read().await.get(identifier).cloned()
    }

    /// Merges newly observed addresses for `identifier` into its existing record, creating one
    /// if this is the first time we've seen this peer.
    pub async fn add_addresses(&self, identifier: NodeIdentifier, addresses: impl IntoIterator<Item = Multiaddr>) {
        let mut guard = self.inner.write().await;
        let peer = guard
            .entry(identifier)
            .or_insert_with(|| Peer::new(identifier, Vec::new(), crate::identity::PeerFeatures::empty()));
        for addr in addresses {
            peer.add_address(addr);
        }
    }

    pub async fn mark_connected(&self, identifier: &NodeIdentifier) {
        if let Some(peer) = self.inner.write().await.get_mut(identifier) {
            peer.mark_connected();
        }
    }

    pub async fn remove(&self, identifier: &NodeIdentifier) -> Option<Peer> {
        self.inner.write().await.remove(identifier)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn all(&self) -> Vec<Peer> {
        self.inner.read().await.values().cloned().collect()
    }

    /// Evicts every peer whose last connection is older than `max_age`. Used by the peer host's
    /// periodic maintenance tick (§4.2).
    pub async fn evict_stale(&self, max_age: std::time::Duration) -> usize {
        let mut guard = self.inner.write().await;
        let before = guard.len();
        guard.retain(|_, peer| !peer.is_stale(max_age));
        before - guard.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identifier() -> NodeIdentifier {
        use libp2p::identity::Keypair;
        NodeIdentifier::from_public_key(&Keypair::generate_ed25519())
    }

    #[tokio::test]
    async fn insert_and_get_round_trips() {
        let store = Peerstore::new();
        let id = identifier();
        store.insert(Peer::new(id, Vec::new(), crate::identity::PeerFeatures::default())).await;
        assert!(store.get(&id).await.is_some());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn add_addresses_creates_entry_on_first_sight() {
        let store = Peerstore::new();
        let id = identifier();
        let addr: Multiaddr = "/ip4/10.0.0.1/tcp/4001".parse().unwrap();
        store.add_addresses(id, vec![addr.clone()]).await;
        let peer = store.get(&id).await.unwrap();
        assert_eq!(peer.addresses(), &[addr]);
    }

    #[tokio::test]
    async fn evict_stale_removes_peers_with_no_recent_connection() {
        let store = Peerstore::new();
        let id = identifier();
        store.insert(Peer::new(id, Vec::new(), crate::identity::PeerFeatures::default())).await;
        let removed = store.evict_stale(std::time::Duration::from_secs(0)).await;
        assert_eq!(removed, 1);
        assert!(store.is_empty().await);
    }
}
