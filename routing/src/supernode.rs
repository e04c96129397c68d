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

//! Supernode client (§4.5): every routing call is encoded as one typed message and dispatched,
//! round-robin, to one of a fixed set of servers through an injected proxy. The proxy is the
//! seam the node-core spec calls out explicitly so that the transport (a direct stream to the
//! supernode, an HTTP call, a test double) is swappable independently of the routing semantics.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use multiaddr::Multiaddr;
use serde::{Deserialize, Serialize};
use tessera_comms::{NodeIdentifier, NodeIdentity};

use crate::{
    error::RoutingError,
    routing_trait::{PeerInfo, Routing, ValueWithSource},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SupernodeRequest {
    FindProvidersAsync { key: Vec<u8>, max: usize },
    PutValue { key: Vec<u8>, value: Vec<u8>, publisher: Vec<u8>, signature: Vec<u8> },
    GetValue { key: Vec<u8> },
    GetValues { key: Vec<u8>, n: usize },
    Provide { key: Vec<u8> },
    FindPeer { id: Vec<u8> },
    Ping,
    Bootstrap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SupernodeResponse {
    Providers(Vec<SupernodePeerInfo>),
    Stored,
    Value(Option<Vec<u8>>),
    ClosestPeers(Vec<SupernodePeerInfo>),
    Provided,
    Bootstrapped,
    /// `Ping` is always answered this way; see §4.5's design note and §9's open question.
    Unsupported,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupernodePeerInfo {
    pub id: Vec<u8>,
    pub addresses: Vec<String>,
}

/// The injected transport seam: encodes/decodes `SupernodeRequest`/`SupernodeResponse` and moves
/// them to/from a chosen server address. A real implementation rides the peer host's supernode
/// request-response protocol; tests substitute a hand-rolled double.
#[async_trait]
pub trait SupernodeTransport: Send + Sync {
    async fn send(&self, server: &Multiaddr, request: SupernodeRequest) -> Result<SupernodeResponse, RoutingError>;
}

pub struct SupernodeClient<T: SupernodeTransport> {
    transport: T,
    servers: Vec<Multiaddr>,
    next_server: AtomicUsize,
    node_identity: Arc<NodeIdentity>,
}

impl<T: SupernodeTransport> SupernodeClient<T> {
    pub fn new(transport: T, servers: Vec<Multiaddr>, node_identity: Arc<NodeIdentity>) -> Self {
        Self {
            transport,
            servers,
            next_server: AtomicUsize::new(0),
            node_identity,
        }
    }

    fn next_server(&self) -> Result<&Multiaddr, RoutingError> {
        if self.servers.is_empty() {
            return Err(RoutingError::NoServersConfigured);
        }
        let index = self.next_server.fetch_add(1, Ordering::Relaxed) % self.servers.len();
        Ok(&self.servers[index])
    }

    async fn dispatch(&self, request: SupernodeRequest) -> Result<SupernodeResponse, RoutingError> {
        let server = self.next_server()?;
        self.transport.send(server, request).await
    }
}

#[async_trait]
impl<T: SupernodeTransport + Send + Sync> Routing for SupernodeClient<T> {
    async fn find_providers_async(&self, key: &[u8], max: usize) -> Result<Vec<PeerInfo>, RoutingError> {
        match self.dispatch(SupernodeRequest::FindProvidersAsync { key: key.to_vec(), max }).await? {
            SupernodeResponse::Providers(providers) => providers.into_iter().map(to_peer_info).collect(),
            _ => Err(RoutingError::Transport("unexpected response to FindProvidersAsync".into())),
        }
    }

    async fn put_value(&self, key: &[u8], value: &[u8]) -> Result<(), RoutingError> {
        let publisher = self.node_identity.identifier().to_string().into_bytes();
        let mut signable = Vec::with_capacity(key.len() + value.len() + publisher.len());
        signable.extend_from_slice(key);
        signable.extend_from_slice(value);
        signable.extend_from_slice(&publisher);
        let signature = self.node_identity.sign(&signable);

        match self
            .dispatch(SupernodeRequest::PutValue {
                key: key.to_vec(),
                value: value.to_vec(),
                publisher,
                signature,
            })
            .await?
        {
            SupernodeResponse::Stored => Ok(()),
            _ => Err(RoutingError::Transport("unexpected response to PutValue".into())),
        }
    }

    async fn get_value(&self, key: &[u8]) -> Result<Vec<u8>, RoutingError> {
        match self.dispatch(SupernodeRequest::GetValue { key: key.to_vec() }).await? {
            SupernodeResponse::Value(Some(value)) => Ok(value),
            SupernodeResponse::Value(None) => Err(RoutingError::NotFound),
            _ => Err(RoutingError::Transport("unexpected response to GetValue".into())),
        }
    }

    async fn get_values(&self, key: &[u8], n: usize) -> Result<Vec<ValueWithSource>, RoutingError> {
        // §4.5: "GetValues always returns a single result (source = local id) because the proxy
        // collapses fan-out." We honor that even when n > 1.
        let _ = n;
        match self.get_value(key).await {
            Ok(value) => Ok(vec![ValueWithSource {
                value,
                source: self.node_identity.identifier(),
            }]),
            Err(RoutingError::NotFound) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn provide(&self, key: &[u8]) -> Result<(), RoutingError> {
        match self.dispatch(SupernodeRequest::Provide { key: key.to_vec() }).await? {
            SupernodeResponse::Provided => Ok(()),
            _ => Err(RoutingError::Transport("unexpected response to Provide".into())),
        }
    }

    async fn find_peer(&self, id: &NodeIdentifier) -> Result<PeerInfo, RoutingError> {
        match self.dispatch(SupernodeRequest::FindPeer { id: id.to_string().into_bytes() }).await? {
            SupernodeResponse::ClosestPeers(peers) => {
                // "inspects the closer-peers list ... returns the entry whose id equals the
                // query; otherwise fails not found."
                let wanted = id.to_string();
                peers
                    .into_iter()
                    .find(|p| String::from_utf8_lossy(&p.id) == wanted)
                    .map(to_peer_info)
                    .transpose()?
                    .ok_or(RoutingError::NotFound)
            }
            _ => Err(RoutingError::Transport("unexpected response to FindPeer".into())),
        }
    }

    async fn ping(&self, _id: &NodeIdentifier) -> Result<Duration, RoutingError> {
        // §4.5: "Ping is unsupported and fails deterministically." §9 leaves a transparent
        // fallback to a direct host ping as a caller decision; this core does not perform one.
        Err(RoutingError::Unsupported("supernode client does not support ping"))
    }

    async fn bootstrap(&self) -> Result<(), RoutingError> {
        match self.dispatch(SupernodeRequest::Bootstrap).await? {
            SupernodeResponse::Bootstrapped => Ok(()),
            _ => Err(RoutingError::Transport("unexpected response to Bootstrap".into())),
        }
    }
}

fn to_peer_info(info: SupernodePeerInfo) -> Result<PeerInfo, RoutingError> {
    let id: NodeIdentifier = String::from_utf8_lossy(&info.id)
        .parse()
        .map_err(|_| RoutingError::Transport("malformed peer id in supernode response".into()))?;
    let addresses = info
        .addresses
        .iter()
        .filter_map(|a| a.parse().ok())
        .collect();
    Ok(PeerInfo { id, addresses })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    struct MockTransport {
        responses: Mutex<Vec<SupernodeResponse>>,
        calls: Mutex<Vec<Multiaddr>>,
    }

    #[async_trait]
    impl SupernodeTransport for MockTransport {
        async fn send(&self, server: &Multiaddr, _request: SupernodeRequest) -> Result<SupernodeResponse, RoutingError> {
            self.calls.lock().await.push(server.clone());
            self.responses.lock().await.pop().ok_or(RoutingError::Transport("no more mock responses".into()))
        }
    }

    fn identity() -> Arc<NodeIdentity> {
        NodeIdentity::generate(Vec::new(), Default::default())
    }

    #[tokio::test]
    async fn find_peer_returns_not_found_when_id_absent_from_response() {
        let transport = MockTransport {
            responses: Mutex::new(vec![SupernodeResponse::ClosestPeers(Vec::new())]),
            calls: Mutex::new(Vec::new()),
        };
        let servers = vec!["/ip4/127.0.0.1/tcp/4001".parse().unwrap()];
        let client = SupernodeClient::new(transport, servers, identity());
        let other = {
            use libp2p::identity::Keypair;
            NodeIdentifier::from(libp2p::PeerId::from(Keypair::generate_ed25519().public()))
        };
        assert!(matches!(client.find_peer(&other).await, Err(RoutingError::NotFound)));
    }

    #[tokio::test]
    async fn ping_is_unsupported() {
        let transport = MockTransport {
            responses: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        };
        let client = SupernodeClient::new(transport, Vec::new(), identity());
        let other = {
            use libp2p::identity::Keypair;
            NodeIdentifier::from(libp2p::PeerId::from(Keypair::generate_ed25519().public()))
        };
        assert!(matches!(client.ping(&other).await, Err(RoutingError::Unsupported(_))));
    }

    #[tokio::test]
    async fn get_values_collapses_to_single_entry() {
        let transport = MockTransport {
            responses: Mutex::new(vec![SupernodeResponse::Value(Some(b"v".to_vec()))]),
            calls: Mutex::new(Vec::new()),
        };
        let servers = vec!["/ip4/127.0.0.1/tcp/4001".parse().unwrap()];
        let client = SupernodeClient::new(transport, servers, identity());
        let values = client.get_values(b"k", 5).await.unwrap();
        assert_eq!(values.len(), 1);
    }

    #[tokio::test]
    async fn dispatch_without_servers_fails_fast() {
        let transport = MockTransport {
            responses: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        };
        let client = SupernodeClient::new(transport, Vec::new(), identity());
        assert!(matches!(client.get_value(b"k").await, Err(RoutingError::NoServersConfigured)));
    }
}
