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

//! The layered object store above the raw blockstore (§2 item 4): a `BlockService` that adds
//! networked fetch via the exchange, a minimal `DagService` that interprets blocks as
//! merkle-linked nodes, the exchange protocol itself (always-yes strategy, per §4.2 step 4), and
//! the reprovide loop (§4.1 step 7).

pub mod block_service;
pub mod dag_service;
pub mod error;
pub mod exchange_service;
pub mod reprovide;
pub mod strategy;
pub mod wire;

pub use block_service::BlockService;
pub use dag_service::{DagNode, DagService};
pub use error::ExchangeError;
pub use exchange_service::{BitswapExchange, Exchange};
pub use reprovide::ReprovideLoop;
pub use strategy::{Strategy, YesManStrategy};
pub use wire::{ExchangeRequest, ExchangeResponse};
