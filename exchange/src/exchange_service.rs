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

//! The block-exchange protocol (§4.2 step 4): built from "context, identity, the host's exchange
//! network interface, the blockstore and a strategy flag". Answers inbound wants from the local
//! blockstore under `strategy`, and drives outbound wants to providers discovered via routing.

use std::sync::Arc;

use async_trait::async_trait;
use cid::Cid;
use log::{debug, trace, warn};
use tessera_comms::CommsNode;
use tessera_repo::Blockstore;
use tessera_routing::Routing;
use tessera_shutdown::ShutdownSignal;

use crate::{
    error::ExchangeError,
    strategy::Strategy,
    wire::{ExchangeRequest, ExchangeResponse},
};

const LOG_TARGET: &str = "tessera::exchange::exchange_service";

/// The block-exchange capability: fetch a block the local store doesn't have, from whichever
/// provider routing knows about.
#[async_trait]
pub trait Exchange: Send + Sync {
    async fn get_block(&self, cid: &Cid) -> Result<Vec<u8>, ExchangeError>;

    /// Runs the inbound-request answering loop until `shutdown_signal` resolves. Spawned once at
    /// node construction time; never returns before shutdown.
    async fn run(&self, shutdown_signal: ShutdownSignal);
}

/// The exchange built from a comms node, a local blockstore, a routing backend used to discover
/// providers, and a send strategy. Named for the want/have exchange protocol it implements,
/// structurally equivalent to go-ipfs's bitswap.
pub struct BitswapExchange<R: Routing, S: Strategy> {
    comms: CommsNode,
    blockstore: Blockstore,
    routing: Arc<R>,
    strategy: S,
    max_providers_tried: usize,
}

impl<R: Routing, S: Strategy> BitswapExchange<R, S> {
    pub fn new(comms: CommsNode, blockstore: Blockstore, routing: Arc<R>, strategy: S) -> Self {
        Self {
            comms,
            blockstore,
            routing,
            strategy,
            max_providers_tried: 5,
        }
    }
}

#[async_trait]
impl<R: Routing, S: Strategy> Exchange for BitswapExchange<R, S> {
    async fn get_block(&self, cid: &Cid) -> Result<Vec<u8>, ExchangeError> {
        if let Some(data) = self.blockstore.get(cid)? {
            return Ok(data);
        }

        let providers = self.routing.find_providers_async(&cid.to_bytes(), self.max_providers_tried).await?;
        if providers.is_empty() {
            return Err(ExchangeError::NoProviders);
        }

        let request = ExchangeRequest::want(cid).encode()?;
        for provider in providers {
            let reply = match self.comms.send_exchange_request(provider.id.as_peer_id(), request.clone()).await {
                Ok(reply) => reply,
                Err(err) => {
                    debug!(target: LOG_TARGET, "exchange request to {} failed: {err}", provider.id);
                    continue;
                },
            };
            match ExchangeResponse::decode(&reply)? {
                ExchangeResponse::HaveBlock { data, .. } => {
                    // Trust the provider but not blindly: this still runs through the verifying
                    // `Blockstore::put`, which rejects data whose digest doesn't match `cid`.
                    self.blockstore.put(cid, &data)?;
                    return Ok(data);
                },
                ExchangeResponse::DontHave { .. } => continue,
            }
        }

        Err(ExchangeError::NotFound)
    }

    async fn run(&self, shutdown_signal: ShutdownSignal) {
        let mut requests = match self.comms.take_exchange_requests().await {
            Some(requests) => requests,
            None => {
                warn!(target: LOG_TARGET, "exchange request channel already taken; inbound wants will go unanswered");
                shutdown_signal.wait().await;
                return;
            },
        };

        let mut shutdown_signal = shutdown_signal;
        loop {
            tokio::select! {
                _ = &mut shutdown_signal => break,
                inbound = requests.recv() => {
                    let Some(inbound) = inbound else { break };
                    self.handle_inbound(inbound).await;
                },
            }
        }
    }
}

impl<R: Routing, S: Strategy> BitswapExchange<R, S> {
    async fn handle_inbound(&self, inbound: tessera_comms::InboundExchangeRequest) {
        let response = match ExchangeRequest::decode(&inbound.message) {
            Ok(request) => self.answer(&inbound.peer, request),
            Err(err) => {
                warn!(target: LOG_TARGET, "dropping malformed exchange request from {}: {err}", inbound.peer);
                return;
            },
        };

        let Ok(response) = response else {
            warn!(target: LOG_TARGET, "failed to encode exchange response to {}", inbound.peer);
            return;
        };

        if let Err(err) = self.comms.respond_exchange(inbound.channel, response).await {
            debug!(target: LOG_TARGET, "failed to send exchange response to {}: {err}", inbound.peer);
        }
    }

    fn answer(
        &self,
        requester: &tessera_comms::NodeIdentifier,
        request: ExchangeRequest,
    ) -> Result<tessera_comms::behaviour::ExchangeMessage, ExchangeError> {
        let cid = request.cid()?;
        if !self.strategy.should_send(requester) {
            trace!(target: LOG_TARGET, "strategy declined to send {cid} to {requester}");
            return ExchangeResponse::dont_have(&cid).encode();
        }

        match self.blockstore.get(&cid)? {
            Some(data) => ExchangeResponse::have(&cid, data).encode(),
            None => ExchangeResponse::dont_have(&cid).encode(),
        }
    }
}
