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

//! Block service (§2 item 4): the local-first, network-backed object store. `get` never returns
//! an unverified block, since both the local blockstore and the exchange's `get_block` path run
//! every write through `Blockstore::put`'s digest check.

use std::sync::Arc;

use cid::Cid;

use crate::{error::ExchangeError, exchange_service::Exchange};

pub struct BlockService<E: Exchange> {
    blockstore: tessera_repo::Blockstore,
    exchange: Arc<E>,
}

impl<E: Exchange> BlockService<E> {
    pub fn new(blockstore: tessera_repo::Blockstore, exchange: Arc<E>) -> Self {
        Self { blockstore, exchange }
    }

    pub async fn get(&self, cid: &Cid) -> Result<Vec<u8>, ExchangeError> {
        if let Some(data) = self.blockstore.get(cid)? {
            return Ok(data);
        }
        self.exchange.get_block(cid).await
    }

    pub fn has_locally(&self, cid: &Cid) -> Result<bool, ExchangeError> {
        Ok(self.blockstore.has(cid)?)
    }

    pub fn put(&self, cid: &Cid, data: &[u8]) -> Result<(), ExchangeError> {
        Ok(self.blockstore.put(cid, data)?)
    }
}
