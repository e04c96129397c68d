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

//! Kademlia-style routing. Holds no libp2p state of its own — every operation is dispatched over
//! the peer host's command channel (`DhtHandle`), which is the only thing in the process allowed
//! to touch the swarm the DHT behaviour lives in. This is how the "cyclic reference" between the
//! routed host and its DHT routing backend (§9) is broken.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tessera_comms::{CommsNode, NodeIdentifier, NodeIdentity};

use crate::{
    error::RoutingError,
    routing_trait::{PeerInfo, Routing, ValueWithSource},
};

pub struct DhtRouting {
    comms: CommsNode,
    node_identity: Arc<NodeIdentity>,
}

impl DhtRouting {
    pub fn new(comms: CommsNode, node_identity: Arc<NodeIdentity>) -> Self {
        Self { comms, node_identity }
    }
}

#[async_trait]
impl Routing for DhtRouting {
    async fn find_providers_async(&self, key: &[u8], max: usize) -> Result<Vec<PeerInfo>, RoutingError> {
        let dht = self.comms.dht_handle();
        let providers = dht.get_providers(key.to_vec()).await?;
        let mut out = Vec::with_capacity(providers.len().min(max));
        for peer in providers.into_iter().take(max) {
            let addresses = dht.find_peer(peer).await.unwrap_or_default();
            out.push(PeerInfo {
                id: NodeIdentifier::from(peer),
                addresses,
            });
        }
        Ok(out)
    }

    async fn put_value(&self, key: &[u8], value: &[u8]) -> Result<(), RoutingError> {
        self.comms.dht_handle().put_record(key.to_vec(), value.to_vec()).await?;
        Ok(())
    }

    async fn get_value(&self, key: &[u8]) -> Result<Vec<u8>, RoutingError> {
        let mut values = self.comms.dht_handle().get_record(key.to_vec()).await?;
        values.pop().ok_or(RoutingError::NotFound)
    }

    async fn get_values(&self, key: &[u8], n: usize) -> Result<Vec<ValueWithSource>, RoutingError> {
        // The command-channel abstraction collapses the DHT's per-peer quorum responses into a
        // single aggregated value list (see node.rs's GetRecordOk handling), so every entry is
        // stamped with the local identity rather than the peer it actually came from.
        let values = self.comms.dht_handle().get_record(key.to_vec()).await?;
        Ok(values
            .into_iter()
            .take(n)
            .map(|value| ValueWithSource {
                value,
                source: self.node_identity.identifier(),
            })
            .collect())
    }

    async fn provide(&self, key: &[u8]) -> Result<(), RoutingError> {
        self.comms.dht_handle().start_providing(key.to_vec()).await?;
        Ok(())
    }

    async fn find_peer(&self, id: &NodeIdentifier) -> Result<PeerInfo, RoutingError> {
        let addresses = self.comms.dht_handle().find_peer(id.as_peer_id()).await?;
        if addresses.is_empty() {
            return Err(RoutingError::NotFound);
        }
        Ok(PeerInfo { id: *id, addresses })
    }

    async fn ping(&self, id: &NodeIdentifier) -> Result<Duration, RoutingError> {
        Ok(self.comms.ping(id.as_peer_id()).await?)
    }

    async fn bootstrap(&self) -> Result<(), RoutingError> {
        self.comms.dht_handle().bootstrap().await?;
        Ok(())
    }
}
