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

//! The single composed `NetworkBehaviour` the swarm is built from. §4.2/§4.5's protocol
//! extensions (exchange, DHT routing, supernode routing) are not separately pluggable at the
//! libp2p layer the way the node-core spec frames them; libp2p requires one concrete behaviour
//! type per swarm, so each extension is a `Toggle`-wrapped field here, present or absent
//! depending on which `Routing`/`Exchange` implementation the node was built with.

use libp2p::{
    identify, mdns, ping,
    kad::{self, store::MemoryStore},
    request_response::{self, cbor, ProtocolSupport},
    swarm::{behaviour::toggle::Toggle, NetworkBehaviour},
    StreamProtocol,
};
use serde::{Deserialize, Serialize};

/// An opaque, length-prefixed payload exchanged over the block-exchange protocol. The actual
/// wantlist/ledger semantics live in `tessera_exchange`; this crate only ships bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeMessage(pub Vec<u8>);

/// An opaque payload exchanged with a configured supernode over the routing proxy protocol
/// (§4.5). The supernode RPC semantics live in `tessera_routing`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupernodeMessage(pub Vec<u8>);

pub const EXCHANGE_PROTOCOL: &str = "/tessera/exchange/1.0.0";
pub const SUPERNODE_PROTOCOL: &str = "/tessera/supernode-routing/1.0.0";

#[derive(NetworkBehaviour)]
pub struct TesseraBehaviour {
    pub identify: identify::Behaviour,
    pub ping: ping::Behaviour,
    pub mdns: Toggle<mdns::tokio::Behaviour>,
    pub kad: Toggle<kad::Behaviour<MemoryStore>>,
    pub exchange: Toggle<cbor::Behaviour<ExchangeMessage, ExchangeMessage>>,
    pub supernode: Toggle<cbor::Behaviour<SupernodeMessage, SupernodeMessage>>,
}

pub struct BehaviourConfig {
    pub local_peer_id: libp2p::PeerId,
    pub identify_protocol_version: String,
    pub agent_version: String,
    pub enable_mdns: bool,
    pub enable_kad: bool,
    pub enable_exchange: bool,
    pub enable_supernode_proxy: bool,
}

impl TesseraBehaviour {
    pub fn new(local_key: &libp2p::identity::Keypair, config: BehaviourConfig) -> Result<Self, std::io::Error> {
        let identify = identify::Behaviour::new(identify::Config::new(config.identify_protocol_version, local_key.public()).with_agent_version(config.agent_version));

        let ping = ping::Behaviour::new(ping::Config::new());

        let mdns = if config.enable_mdns {
            Toggle::from(Some(mdns::tokio::Behaviour::new(mdns::Config::default(), config.local_peer_id)?))
        } else {
            Toggle::from(None)
        };

        let kad = if config.enable_kad {
            let store = MemoryStore::new(config.local_peer_id);
            Toggle::from(Some(kad::Behaviour::new(config.local_peer_id, store)))
        } else {
            Toggle::from(None)
        };

        let exchange = if config.enable_exchange {
            Toggle::from(Some(cbor::Behaviour::new(
                [(StreamProtocol::new(EXCHANGE_PROTOCOL), ProtocolSupport::Full)],
                request_response::Config::default(),
            )))
        } else {
            Toggle::from(None)
        };

        let supernode = if config.enable_supernode_proxy {
            Toggle::from(Some(cbor::Behaviour::new(
                [(StreamProtocol::new(SUPERNODE_PROTOCOL), ProtocolSupport::Full)],
                request_response::Config::default(),
            )))
        } else {
            Toggle::from(None)
        };

        Ok(Self {
            identify,
            ping,
            mdns,
            kad,
            exchange,
            supernode,
        })
    }
}
