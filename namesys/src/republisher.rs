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

//! §4.4: periodically re-signs and re-publishes owned name-system records so they do not expire
//! before their next tick. Ticks are serialized by construction: `run` drives one tick at a time
//! from a single task, so a slow tick simply delays the next one rather than overlapping it.
//!
//! Unlike the original this core is grounded on, which republishes `vals[0]` without checking its
//! signature, `republish_one` here verifies the stored record before re-publishing it and skips
//! silently on a mismatch — a record nobody can still prove ownership of should age out, not be
//! kept alive forever by a republisher that can no longer tell who it belongs to.

use std::{collections::HashSet, sync::Arc, time::Duration};

use log::{debug, info, warn};
use tessera_comms::{NodeIdentifier, NodeIdentity};
use tessera_routing::{Routing, RoutingError};
use tessera_shutdown::ShutdownSignal;
use tokio::sync::Mutex;

use crate::{error::NamesysError, record::NameEntry};

pub const DEFAULT_REPUBLISH_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

pub struct Republisher<R: Routing> {
    routing: Arc<R>,
    identity: Arc<NodeIdentity>,
    owned: Mutex<HashSet<NodeIdentifier>>,
    interval: Duration,
}

const LOG_TARGET: &str = "tessera::namesys::republisher";

impl<R: Routing> Republisher<R> {
    pub fn new(routing: Arc<R>, identity: Arc<NodeIdentity>, interval: Duration) -> Self {
        Self {
            routing,
            identity,
            owned: Mutex::new(HashSet::new()),
            interval,
        }
    }

    /// Adds `id` to the owned set. Concurrent-safe; registering an already-owned id is a no-op.
    pub async fn register(&self, id: NodeIdentifier) {
        self.owned.lock().await.insert(id);
    }

    /// Ticks at `interval` until `shutdown_signal` resolves. An empty owned set makes every tick
    /// a no-op.
    pub async fn run(&self, mut shutdown_signal: ShutdownSignal) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown_signal => break,
                _ = ticker.tick() => self.tick().await,
            }
        }
    }

    async fn tick(&self) {
        let owned: Vec<NodeIdentifier> = self.owned.lock().await.iter().copied().collect();
        if owned.is_empty() {
            debug!(target: LOG_TARGET, "republish tick: nothing owned, skipping");
            return;
        }

        for id in owned {
            if let Err(err) = self.republish_one(&id).await {
                warn!(target: LOG_TARGET, "republish of {id} aborted: {err}");
                break;
            }
        }
    }

    /// Fetches the entry locally (no network round trip beyond routing's own cache probe); if
    /// absent, skips silently. Otherwise verifies the stored record and, only if it still
    /// verifies and `id` is this node's own identity, re-signs and re-publishes it under the
    /// same key.
    async fn republish_one(&self, id: &NodeIdentifier) -> Result<(), NamesysError> {
        let key = crate::record::name_record_key(id);
        let bytes = match self.routing.get_value(&key).await {
            Ok(bytes) => bytes,
            Err(RoutingError::NotFound) => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let entry = match NameEntry::decode(&bytes) {
            Ok(entry) => entry,
            Err(_) => return Ok(()),
        };

        if entry.verify().is_err() {
            debug!(target: LOG_TARGET, "stored record for {id} no longer verifies, skipping");
            return Ok(());
        }

        if *id != self.identity.identifier() {
            // This core holds exactly one private key. An owned id that isn't our own identity
            // has no local signing material to republish with.
            debug!(target: LOG_TARGET, "no local private key for owned id {id}, skipping");
            return Ok(());
        }

        let refreshed = NameEntry::sign(&self.identity, entry.path.clone());
        self.routing.put_value(&key, &refreshed.encode()?).await?;
        info!(target: LOG_TARGET, "republished name record for {id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration as StdDuration};

    use async_trait::async_trait;
    use tessera_comms::PeerFeatures;
    use tessera_routing::{PeerInfo, ValueWithSource};

    use super::*;

    struct StoreRouting {
        stored: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
    }

    #[async_trait]
    impl Routing for StoreRouting {
        async fn find_providers_async(&self, _key: &[u8], _max: usize) -> Result<Vec<PeerInfo>, RoutingError> {
            Ok(Vec::new())
        }

        async fn put_value(&self, key: &[u8], value: &[u8]) -> Result<(), RoutingError> {
            self.stored.lock().await.insert(key.to_vec(), value.to_vec());
            Ok(())
        }

        async fn get_value(&self, key: &[u8]) -> Result<Vec<u8>, RoutingError> {
            self.stored.lock().await.get(key).cloned().ok_or(RoutingError::NotFound)
        }

        async fn get_values(&self, _key: &[u8], _n: usize) -> Result<Vec<ValueWithSource>, RoutingError> {
            Ok(Vec::new())
        }

        async fn provide(&self, _key: &[u8]) -> Result<(), RoutingError> {
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

    #[tokio::test]
    async fn tick_with_empty_owned_set_is_a_no_op() {
        let identity = NodeIdentity::generate(Vec::new(), PeerFeatures::default());
        let routing = Arc::new(StoreRouting { stored: Mutex::new(HashMap::new()) });
        let republisher = Republisher::new(routing, identity, StdDuration::from_secs(1));
        republisher.tick().await;
    }

    #[tokio::test]
    async fn republishes_an_owned_entry_that_still_verifies() {
        let identity = NodeIdentity::generate(Vec::new(), PeerFeatures::default());
        let entry = NameEntry::sign(&identity, "/ipfs/bafy-example");
        let key = crate::record::name_record_key(&identity.identifier());
        let mut stored = HashMap::new();
        stored.insert(key.clone(), entry.encode().unwrap());
        let routing = Arc::new(StoreRouting { stored: Mutex::new(stored) });

        let republisher = Republisher::new(routing.clone(), identity.clone(), StdDuration::from_secs(1));
        republisher.register(identity.identifier()).await;
        republisher.tick().await;

        let refreshed = routing.get_value(&key).await.unwrap();
        let decoded = NameEntry::decode(&refreshed).unwrap();
        assert_eq!(decoded.path, "/ipfs/bafy-example");
        decoded.verify().unwrap();
    }

    #[tokio::test]
    async fn skips_an_owned_entry_whose_signature_no_longer_verifies() {
        let identity = NodeIdentity::generate(Vec::new(), PeerFeatures::default());
        let mut entry = NameEntry::sign(&identity, "/ipfs/bafy-example");
        entry.path = "/ipfs/bafy-tampered".to_string();
        let key = crate::record::name_record_key(&identity.identifier());
        let mut stored = HashMap::new();
        stored.insert(key.clone(), entry.encode().unwrap());
        let routing = Arc::new(StoreRouting { stored: Mutex::new(stored) });

        let republisher = Republisher::new(routing.clone(), identity.clone(), StdDuration::from_secs(1));
        republisher.register(identity.identifier()).await;
        republisher.tick().await;

        // Tampered record left untouched: no verifying re-sign was performed on top of it.
        let untouched = routing.get_value(&key).await.unwrap();
        assert_eq!(NameEntry::decode(&untouched).unwrap().path, "/ipfs/bafy-tampered");
    }

    #[tokio::test]
    async fn missing_entry_for_an_owned_id_is_skipped_silently() {
        let identity = NodeIdentity::generate(Vec::new(), PeerFeatures::default());
        let routing = Arc::new(StoreRouting { stored: Mutex::new(HashMap::new()) });
        let republisher = Republisher::new(routing, identity.clone(), StdDuration::from_secs(1));
        republisher.register(identity.identifier()).await;
        republisher.tick().await;
    }
}
