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

//! The real `SupernodeTransport` (§4.5): rides the peer host's supernode request-response
//! protocol rather than a direct stream or HTTP call, since that protocol is already wired into
//! `TesseraBehaviour` behind the `enable_supernode_proxy` toggle. Encodes/decodes exactly the way
//! `exchange::wire` encodes `ExchangeRequest`/`ExchangeResponse` over `ExchangeMessage`.

use async_trait::async_trait;
use multiaddr::{Multiaddr, Protocol};
use tessera_comms::{behaviour::SupernodeMessage, CommsNode};
use tessera_routing::{RoutingError, SupernodeRequest, SupernodeResponse, SupernodeTransport};

/// A server multiaddr without a trailing `/p2p/<peer id>` component can't be dialed by peer id at
/// all; this is the same shape of information `comms::node::extract_peer_id` pulls out of a dial
/// address, reimplemented here because that helper isn't part of the crate's public surface.
fn peer_id_from_multiaddr(address: &Multiaddr) -> Option<libp2p::PeerId> {
    address.iter().find_map(|proto| match proto {
        Protocol::P2p(peer_id) => Some(peer_id),
        _ => None,
    })
}

pub struct CommsSupernodeTransport {
    comms: CommsNode,
}

impl CommsSupernodeTransport {
    pub fn new(comms: CommsNode) -> Self {
        Self { comms }
    }
}

#[async_trait]
impl SupernodeTransport for CommsSupernodeTransport {
    async fn send(&self, server: &Multiaddr, request: SupernodeRequest) -> Result<SupernodeResponse, RoutingError> {
        let peer = peer_id_from_multiaddr(server)
            .ok_or_else(|| RoutingError::Transport(format!("supernode address {server} carries no peer id")))?;

        let payload = bincode::serialize(&request).map_err(|e| RoutingError::Transport(e.to_string()))?;
        let reply = self
            .comms
            .send_supernode_request(peer, SupernodeMessage(payload))
            .await
            .map_err(|e| RoutingError::Transport(e.to_string()))?;

        bincode::deserialize(&reply.0).map_err(|e| RoutingError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_peer_id_from_address_with_p2p_suffix() {
        let keypair = libp2p::identity::Keypair::generate_ed25519();
        let peer_id = libp2p::PeerId::from(keypair.public());
        let address: Multiaddr = format!("/ip4/127.0.0.1/tcp/4001/p2p/{peer_id}").parse().unwrap();
        assert_eq!(peer_id_from_multiaddr(&address), Some(peer_id));
    }

    #[test]
    fn address_without_p2p_suffix_has_no_peer_id() {
        let address: Multiaddr = "/ip4/127.0.0.1/tcp/4001".parse().unwrap();
        assert_eq!(peer_id_from_multiaddr(&address), None);
    }
}
