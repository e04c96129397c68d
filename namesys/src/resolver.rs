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

//! §4.6 resolution: record key from the publisher's public key, fetch via routing, verify, return
//! the embedded path.

use std::sync::Arc;

use tessera_comms::NodeIdentifier;
use tessera_routing::{Routing, RoutingError};

use crate::{
    error::NamesysError,
    record::{name_record_key, NameEntry},
};

pub struct Resolver<R: Routing> {
    routing: Arc<R>,
}

impl<R: Routing> Resolver<R> {
    pub fn new(routing: Arc<R>) -> Self {
        Self { routing }
    }

    pub async fn resolve(&self, publisher: &NodeIdentifier) -> Result<String, NamesysError> {
        let key = name_record_key(publisher);
        let bytes = match self.routing.get_value(&key).await {
            Ok(bytes) => bytes,
            Err(RoutingError::NotFound) => return Err(NamesysError::NotFound),
            Err(e) => return Err(e.into()),
        };

        let entry = NameEntry::decode(&bytes)?;
        if &entry.publisher()? != publisher {
            return Err(NamesysError::PublisherMismatch);
        }
        entry.verify()?;
        Ok(entry.path)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::time::Duration;
    use tessera_comms::{NodeIdentity, PeerFeatures};
    use tessera_routing::{PeerInfo, ValueWithSource};
    use tokio::sync::Mutex;

    use super::*;

    struct StoreRouting {
        stored: Mutex<Option<Vec<u8>>>,
    }

    #[async_trait]
    impl Routing for StoreRouting {
        async fn find_providers_async(&self, _key: &[u8], _max: usize) -> Result<Vec<PeerInfo>, RoutingError> {
            Ok(Vec::new())
        }

        async fn put_value(&self, _key: &[u8], value: &[u8]) -> Result<(), RoutingError> {
            *self.stored.lock().await = Some(value.to_vec());
            Ok(())
        }

        async fn get_value(&self, _key: &[u8]) -> Result<Vec<u8>, RoutingError> {
            self.stored.lock().await.clone().ok_or(RoutingError::NotFound)
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
    async fn resolves_a_stored_signed_entry() {
        let identity = NodeIdentity::generate(Vec::new(), PeerFeatures::default());
        let entry = NameEntry::sign(&identity, "/ipfs/bafy-example");
        let routing = Arc::new(StoreRouting { stored: Mutex::new(Some(entry.encode().unwrap())) });
        let resolver = Resolver::new(routing);
        let path = resolver.resolve(&identity.identifier()).await.unwrap();
        assert_eq!(path, "/ipfs/bafy-example");
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let identity = NodeIdentity::generate(Vec::new(), PeerFeatures::default());
        let routing = Arc::new(StoreRouting { stored: Mutex::new(None) });
        let resolver = Resolver::new(routing);
        assert!(matches!(resolver.resolve(&identity.identifier()).await, Err(NamesysError::NotFound)));
    }
}
