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

//! Local-only router, installed while the node is offline (§4.1's construct-offline: "installs an
//! offline router keyed by the local private key"). Serves only from the repository's datastore;
//! never touches the network.

use std::time::Duration;

use async_trait::async_trait;
use tessera_comms::NodeIdentifier;
use tessera_repo::Datastore;

use crate::{
    error::RoutingError,
    routing_trait::{PeerInfo, Routing, ValueWithSource},
};

pub struct OfflineRouting {
    datastore: Datastore,
    local_identifier: NodeIdentifier,
}

impl OfflineRouting {
    pub fn new(datastore: Datastore, local_identifier: NodeIdentifier) -> Self {
        Self { datastore, local_identifier }
    }
}

#[async_trait]
impl Routing for OfflineRouting {
    async fn find_providers_async(&self, _key: &[u8], _max: usize) -> Result<Vec<PeerInfo>, RoutingError> {
        // No network to ask; an offline node cannot discover remote providers.
        Ok(Vec::new())
    }

    async fn put_value(&self, key: &[u8], value: &[u8]) -> Result<(), RoutingError> {
        self.datastore.put(key, value)?;
        Ok(())
    }

    async fn get_value(&self, key: &[u8]) -> Result<Vec<u8>, RoutingError> {
        self.datastore.get(key)?.ok_or(RoutingError::NotFound)
    }

    async fn get_values(&self, key: &[u8], n: usize) -> Result<Vec<ValueWithSource>, RoutingError> {
        match self.datastore.get(key)? {
            Some(value) if n > 0 => Ok(vec![ValueWithSource {
                value,
                source: self.local_identifier,
            }]),
            _ => Ok(Vec::new()),
        }
    }

    async fn provide(&self, key: &[u8]) -> Result<(), RoutingError> {
        // Recorded so a later online transition's reprovide loop can find it, but there is no
        // network announcement to make while offline.
        self.datastore.put(&providing_key(key), b"1")?;
        Ok(())
    }

    async fn find_peer(&self, _id: &NodeIdentifier) -> Result<PeerInfo, RoutingError> {
        // §4.5: "lookups for peers not in the peerstore fail deterministically." This router
        // holds no peerstore at all, so every lookup fails.
        Err(RoutingError::NotFound)
    }

    async fn ping(&self, _id: &NodeIdentifier) -> Result<Duration, RoutingError> {
        Err(RoutingError::Unsupported("ping requires a peer host"))
    }

    async fn bootstrap(&self) -> Result<(), RoutingError> {
        Ok(())
    }
}

fn providing_key(key: &[u8]) -> Vec<u8> {
    let mut k = b"/providing/".to_vec();
    k.extend_from_slice(key);
    k
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identifier() -> NodeIdentifier {
        use libp2p::identity::Keypair;
        NodeIdentifier::from(libp2p::PeerId::from(Keypair::generate_ed25519().public()))
    }

    fn datastore() -> Datastore {
        tessera_repo::Repository::open_temporary().unwrap().datastore().unwrap()
    }

    #[tokio::test]
    async fn put_then_get_round_trips_locally() {
        let router = OfflineRouting::new(datastore(), identifier());
        router.put_value(b"k", b"v").await.unwrap();
        assert_eq!(router.get_value(b"k").await.unwrap(), b"v".to_vec());
    }

    #[tokio::test]
    async fn get_value_on_absent_key_is_not_found() {
        let router = OfflineRouting::new(datastore(), identifier());
        assert!(matches!(router.get_value(b"missing").await, Err(RoutingError::NotFound)));
    }

    #[tokio::test]
    async fn find_peer_always_fails() {
        let router = OfflineRouting::new(datastore(), identifier());
        assert!(router.find_peer(&identifier()).await.is_err());
    }

    #[tokio::test]
    async fn ping_is_unsupported() {
        let router = OfflineRouting::new(datastore(), identifier());
        assert!(matches!(router.ping(&identifier()).await, Err(RoutingError::Unsupported(_))));
    }
}
