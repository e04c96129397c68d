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

//! §4.5's polymorphic routing capability set. Three concrete implementations exist: `DhtRouting`,
//! `OfflineRouting`, `SupernodeClient`. Callers (the name system, the reprovide loop) depend only
//! on this trait.

use std::time::Duration;

use async_trait::async_trait;
use multiaddr::Multiaddr;
use tessera_comms::NodeIdentifier;

use crate::error::RoutingError;

/// A peer and the addresses it was last seen at, as returned by `find_peer`/`find_providers_async`.
#[derive(Debug, Clone)]
pub struct PeerInfo {
    pub id: NodeIdentifier,
    pub addresses: Vec<Multiaddr>,
}

/// One value returned from `get_values`, stamped with where it came from. Implementations that
/// cannot differentiate sources (the supernode client; this port's DHT adapter, constrained by
/// the single-swarm command channel) stamp every entry with the local identity.
#[derive(Debug, Clone)]
pub struct ValueWithSource {
    pub value: Vec<u8>,
    pub source: NodeIdentifier,
}

#[async_trait]
pub trait Routing: Send + Sync {
    /// Finite, non-restartable: collects at most `max` provider records for `key` and returns.
    async fn find_providers_async(&self, key: &[u8], max: usize) -> Result<Vec<PeerInfo>, RoutingError>;

    /// Stores a signed record at `key`.
    async fn put_value(&self, key: &[u8], value: &[u8]) -> Result<(), RoutingError>;

    async fn get_value(&self, key: &[u8]) -> Result<Vec<u8>, RoutingError>;

    /// May return fewer than `n` entries.
    async fn get_values(&self, key: &[u8], n: usize) -> Result<Vec<ValueWithSource>, RoutingError>;

    /// Announces local availability of `key`.
    async fn provide(&self, key: &[u8]) -> Result<(), RoutingError>;

    async fn find_peer(&self, id: &NodeIdentifier) -> Result<PeerInfo, RoutingError>;

    async fn ping(&self, id: &NodeIdentifier) -> Result<Duration, RoutingError>;

    /// Re-seeds any internal routing tables.
    async fn bootstrap(&self) -> Result<(), RoutingError>;
}
