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

//! §4.6 publishing: the inverse of resolution. Encode path + sign + store via routing, at both
//! the name-record key and (so DHT validators can look it up independently) the public-key key.

use std::sync::Arc;

use tessera_comms::NodeIdentity;
use tessera_routing::Routing;

use crate::{
    error::NamesysError,
    record::{name_record_key, public_key_record_key, NameEntry},
};

pub struct Publisher<R: Routing> {
    routing: Arc<R>,
}

impl<R: Routing> Publisher<R> {
    pub fn new(routing: Arc<R>) -> Self {
        Self { routing }
    }

    pub async fn publish(&self, identity: &NodeIdentity, path: impl Into<String>) -> Result<(), NamesysError> {
        let entry = NameEntry::sign(identity, path);
        let encoded = entry.encode()?;
        self.routing.put_value(&name_record_key(&identity.identifier()), &encoded).await?;
        self.routing
            .put_value(&public_key_record_key(&identity.identifier()), &entry.publisher_public_key)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::{collections::HashMap, time::Duration};
    use tessera_comms::{NodeIdentifier, PeerFeatures};
    use tessera_routing::{PeerInfo, RoutingError, ValueWithSource};
    use tokio::sync::Mutex;

    use super::*;

    struct RecordingRouting {
        stored: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
    }

    #[async_trait]
    impl Routing for RecordingRouting {
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
    async fn publish_stores_both_the_name_record_and_the_public_key_record() {
        let identity = NodeIdentity::generate(Vec::new(), PeerFeatures::default());
        let routing = Arc::new(RecordingRouting { stored: Mutex::new(HashMap::new()) });
        let publisher = Publisher::new(routing.clone());
        publisher.publish(&identity, "/ipfs/bafy-example").await.unwrap();

        let name_bytes = routing.get_value(&name_record_key(&identity.identifier())).await.unwrap();
        let entry = NameEntry::decode(&name_bytes).unwrap();
        assert_eq!(entry.path, "/ipfs/bafy-example");

        assert!(routing.get_value(&public_key_record_key(&identity.identifier())).await.is_ok());
    }
}
