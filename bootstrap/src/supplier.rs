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

//! §4.3's peer-supplier seam: where the bootstrapper gets the candidate peer set it samples from
//! on each tick.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use multiaddr::Multiaddr;
use tessera_common::config::RepositoryConfig;

#[async_trait]
pub trait PeerSupplier: Send + Sync {
    async fn peers(&self) -> Vec<Multiaddr>;
}

/// A fixed, unchanging peer set.
pub struct StaticPeerSupplier(Vec<Multiaddr>);

impl StaticPeerSupplier {
    pub fn new(peers: Vec<Multiaddr>) -> Self {
        Self(peers)
    }
}

#[async_trait]
impl PeerSupplier for StaticPeerSupplier {
    async fn peers(&self) -> Vec<Multiaddr> {
        self.0.clone()
    }
}

/// The default supplier: re-reads `bootstrap` from a shared config handle on every call, so a
/// config reload between ticks is picked up without restarting the bootstrapper.
pub struct ConfigPeerSupplier {
    config: Arc<RwLock<RepositoryConfig>>,
}

impl ConfigPeerSupplier {
    pub fn new(config: Arc<RwLock<RepositoryConfig>>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PeerSupplier for ConfigPeerSupplier {
    async fn peers(&self) -> Vec<Multiaddr> {
        let config = self.config.read().expect("poisoned").clone();
        match config.parse_bootstrap_addresses() {
            Ok(peers) => peers,
            Err(err) => {
                log::warn!(target: "tessera::bootstrap::supplier", "malformed bootstrap address in config: {err}");
                Vec::new()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_supplier_returns_its_fixed_set() {
        let addr: Multiaddr = "/ip4/127.0.0.1/tcp/4001".parse().unwrap();
        let supplier = StaticPeerSupplier::new(vec![addr.clone()]);
        assert_eq!(supplier.peers().await, vec![addr]);
    }
}
