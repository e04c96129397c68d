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

//! `CommsBuilder`: assembles an `UnspawnedCommsNode` without starting the swarm task. Mirrors the
//! teacher's `CommsBuilder::new().with_node_identity()...with_shutdown_signal()` chain; listening
//! and dialing only begin once the built node is handed to `UnspawnedCommsNode::spawn`, matching
//! §4.2's "build before listen" ordering.

use std::{sync::Arc, time::Duration};

use libp2p::{swarm::Config as SwarmConfig, SwarmBuilder};
use multiaddr::Multiaddr;
use tessera_shutdown::ShutdownSignal;
use thiserror::Error;

use crate::{
    bandwidth::BandwidthReporter,
    behaviour::{BehaviourConfig, TesseraBehaviour},
    identity::NodeIdentity,
    node::UnspawnedCommsNode,
    peerstore::Peerstore,
};

#[derive(Debug, Error)]
pub enum CommsError {
    #[error("no node identity configured; call with_node_identity before build")]
    MissingIdentity,
    #[error("failed to construct transport: {0}")]
    Transport(String),
    #[error("failed to listen on {address}: {source}")]
    Listen { address: Multiaddr, source: libp2p::TransportError<std::io::Error> },
    #[error("dial to {address} failed: {source}")]
    Dial { address: Multiaddr, source: String },
    #[error("peer host shut down before the request completed")]
    ShuttingDown,
}

pub struct CommsBuilder {
    node_identity: Option<Arc<NodeIdentity>>,
    shutdown_signal: Option<ShutdownSignal>,
    listen_addresses: Vec<Multiaddr>,
    peerstore: Peerstore,
    bandwidth: Arc<BandwidthReporter>,
    enable_mdns: bool,
    enable_kad: bool,
    enable_exchange: bool,
    enable_supernode_proxy: bool,
    identify_protocol_version: String,
    agent_version: String,
    idle_connection_timeout: Duration,
}

impl CommsBuilder {
    pub fn new() -> Self {
        Self {
            node_identity: None,
            shutdown_signal: None,
            listen_addresses: Vec::new(),
            peerstore: Peerstore::new(),
            bandwidth: Arc::new(BandwidthReporter::new()),
            enable_mdns: false,
            enable_kad: false,
            enable_exchange: false,
            enable_supernode_proxy: false,
            identify_protocol_version: "/tessera/1.0.0".to_string(),
            agent_version: "tessera".to_string(),
            idle_connection_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_node_identity(mut self, node_identity: Arc<NodeIdentity>) -> Self {
        self.node_identity = Some(node_identity);
        self
    }

    pub fn with_shutdown_signal(mut self, shutdown_signal: ShutdownSignal) -> Self {
        self.shutdown_signal = Some(shutdown_signal);
        self
    }

    pub fn with_listener_addresses(mut self, addresses: Vec<Multiaddr>) -> Self {
        self.listen_addresses = addresses;
        self
    }

    pub fn with_peerstore(mut self, peerstore: Peerstore) -> Self {
        self.peerstore = peerstore;
        self
    }

    pub fn with_bandwidth_reporter(mut self, bandwidth: Arc<BandwidthReporter>) -> Self {
        self.bandwidth = bandwidth;
        self
    }

    pub fn with_mdns(mut self, enabled: bool) -> Self {
        self.enable_mdns = enabled;
        self
    }

    pub fn with_dht_routing(mut self, enabled: bool) -> Self {
        self.enable_kad = enabled;
        self
    }

    pub fn with_exchange_protocol(mut self, enabled: bool) -> Self {
        self.enable_exchange = enabled;
        self
    }

    pub fn with_supernode_proxy(mut self, enabled: bool) -> Self {
        self.enable_supernode_proxy = enabled;
        self
    }

    pub fn build(self) -> Result<UnspawnedCommsNode, CommsError> {
        let node_identity = self.node_identity.ok_or(CommsError::MissingIdentity)?;
        let shutdown_signal = self.shutdown_signal.ok_or(CommsError::MissingIdentity)?;
        let local_peer_id = node_identity.identifier().as_peer_id();

        let behaviour_config = BehaviourConfig {
            local_peer_id,
            identify_protocol_version: self.identify_protocol_version,
            agent_version: self.agent_version,
            enable_mdns: self.enable_mdns,
            enable_kad: self.enable_kad,
            enable_exchange: self.enable_exchange,
            enable_supernode_proxy: self.enable_supernode_proxy,
        };

        let idle_timeout = self.idle_connection_timeout;
        let swarm = SwarmBuilder::with_existing_identity(node_identity.keypair().clone())
            .with_tokio()
            .with_tcp(
                libp2p::tcp::Config::default(),
                libp2p::noise::Config::new,
                libp2p::yamux::Config::default,
            )
            .map_err(|e| CommsError::Transport(e.to_string()))?
            .with_dns()
            .map_err(|e| CommsError::Transport(e.to_string()))?
            .with_behaviour(|key| TesseraBehaviour::new(key, behaviour_config).map_err(|e| e.to_string()))
            .map_err(|e| CommsError::Transport(e))?
            .with_swarm_config(|c| c.with_idle_connection_timeout(idle_timeout))
            .build();

        Ok(UnspawnedCommsNode::new(
            swarm,
            node_identity,
            shutdown_signal,
            self.listen_addresses,
            self.peerstore,
            self.bandwidth,
        ))
    }
}

impl Default for CommsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
