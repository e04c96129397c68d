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

//! §9's "Polymorphism over routing" note, applied at the composition site: the three concrete
//! routing backends are chosen once at construction time, then erased behind `Arc<dyn Routing>`
//! so the rest of the node (the name system, the exchange, the reprovide loop) needs exactly one
//! instantiation of each generic subsystem rather than three. `BoxedRouting` is the `Sized`
//! newtype that makes that erased trait object usable everywhere a `Routing: Sized` bound is
//! required.

use std::time::Duration;

use async_trait::async_trait;
use tessera_comms::NodeIdentifier;

use crate::{
    error::RoutingError,
    routing_trait::{PeerInfo, Routing, ValueWithSource},
};

#[derive(Clone)]
pub struct BoxedRouting(std::sync::Arc<dyn Routing>);

impl BoxedRouting {
    pub fn new(routing: std::sync::Arc<dyn Routing>) -> Self {
        Self(routing)
    }
}

#[async_trait]
impl Routing for BoxedRouting {
    async fn find_providers_async(&self, key: &[u8], max: usize) -> Result<Vec<PeerInfo>, RoutingError> {
        self.0.find_providers_async(key, max).await
    }

    async fn put_value(&self, key: &[u8], value: &[u8]) -> Result<(), RoutingError> {
        self.0.put_value(key, value).await
    }

    async fn get_value(&self, key: &[u8]) -> Result<Vec<u8>, RoutingError> {
        self.0.get_value(key).await
    }

    async fn get_values(&self, key: &[u8], n: usize) -> Result<Vec<ValueWithSource>, RoutingError> {
        self.0.get_values(key, n).await
    }

    async fn provide(&self, key: &[u8]) -> Result<(), RoutingError> {
        self.0.provide(key).await
    }

    async fn find_peer(&self, id: &NodeIdentifier) -> Result<PeerInfo, RoutingError> {
        self.0.find_peer(id).await
    }

    async fn ping(&self, id: &NodeIdentifier) -> Result<Duration, RoutingError> {
        self.0.ping(id).await
    }

    async fn bootstrap(&self) -> Result<(), RoutingError> {
        self.0.bootstrap().await
    }
}
