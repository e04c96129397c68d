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

//! The reprovide loop (§4.1 step 7): periodic re-announcement of locally held block keys to
//! routing, so that providers remain discoverable as DHT/supernode records expire.

use std::time::Duration;

use log::{debug, warn};
use tessera_repo::Blockstore;
use tessera_routing::Routing;
use tessera_shutdown::ShutdownSignal;

const LOG_TARGET: &str = "tessera::exchange::reprovide";

pub struct ReprovideLoop<R: Routing> {
    blockstore: Blockstore,
    routing: std::sync::Arc<R>,
    interval: Duration,
}

impl<R: Routing> ReprovideLoop<R> {
    pub fn new(blockstore: Blockstore, routing: std::sync::Arc<R>, interval: Duration) -> Self {
        Self { blockstore, routing, interval }
    }

    /// Runs until `shutdown_signal` resolves. Each tick re-announces every locally held block;
    /// a failure to announce one key is logged and does not interrupt the rest of the tick.
    pub async fn run(&self, mut shutdown_signal: ShutdownSignal) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown_signal => break,
                _ = ticker.tick() => self.reprovide_once().await,
            }
        }
    }

    async fn reprovide_once(&self) {
        let keys = match self.blockstore.all_keys() {
            Ok(keys) => keys,
            Err(err) => {
                warn!(target: LOG_TARGET, "failed to list local blocks for reprovide: {err}");
                return;
            },
        };

        debug!(target: LOG_TARGET, "reproviding {} local block(s)", keys.len());
        for cid in keys {
            if let Err(err) = self.routing.provide(&cid.to_bytes()).await {
                warn!(target: LOG_TARGET, "failed to reprovide {cid}: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use async_trait::async_trait;
    use multihash::Multihash;
    use sha2::{Digest, Sha256};
    use tessera_comms::NodeIdentifier;
    use tessera_routing::{PeerInfo, RoutingError, ValueWithSource};

    use super::*;

    struct CountingRouting {
        provide_calls: AtomicUsize,
    }

    #[async_trait]
    impl Routing for CountingRouting {
        async fn find_providers_async(&self, _key: &[u8], _max: usize) -> Result<Vec<PeerInfo>, RoutingError> {
            Ok(Vec::new())
        }

        async fn put_value(&self, _key: &[u8], _value: &[u8]) -> Result<(), RoutingError> {
            Ok(())
        }

        async fn get_value(&self, _key: &[u8]) -> Result<Vec<u8>, RoutingError> {
            Err(RoutingError::NotFound)
        }

        async fn get_values(&self, _key: &[u8], _n: usize) -> Result<Vec<ValueWithSource>, RoutingError> {
            Ok(Vec::new())
        }

        async fn provide(&self, _key: &[u8]) -> Result<(), RoutingError> {
            self.provide_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn find_peer(&self, _id: &NodeIdentifier) -> Result<PeerInfo, RoutingError> {
            Err(RoutingError::NotFound)
        }

        async fn ping(&self, _id: &NodeIdentifier) -> Result<Duration, RoutingError> {
            Err(RoutingError::Unsupported("ping"))
        }

        async fn bootstrap(&self) -> Result<(), RoutingError> {
            Ok(())
        }
    }

    fn cid_for(data: &[u8]) -> cid::Cid {
        let digest = Sha256::digest(data);
        let hash = Multihash::wrap(0x12, &digest).unwrap();
        cid::Cid::new_v1(0x55, hash)
    }

    #[tokio::test(start_paused = true)]
    async fn reprovide_tick_announces_every_local_block() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let blockstore = Blockstore::new(db.open_tree("blocks").unwrap());
        let data = b"block".to_vec();
        let cid = cid_for(&data);
        blockstore.put(&cid, &data).unwrap();

        let routing = Arc::new(CountingRouting { provide_calls: AtomicUsize::new(0) });
        let loop_ = ReprovideLoop::new(blockstore, routing.clone(), Duration::from_secs(60));
        loop_.reprovide_once().await;

        assert_eq!(routing.provide_calls.load(Ordering::SeqCst), 1);
    }
}
