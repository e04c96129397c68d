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

//! Raw content-addressed storage (§2 item 4: "Blockstore is raw CAS"). The networked fetch
//! (block service) and merkle-graph interpretation (DAG service) that sit above this layer are
//! out of scope — they belong to `tessera_exchange`.

use cid::Cid;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlockstoreError {
    #[error("blockstore I/O error: {0}")]
    Io(#[from] sled::Error),
    #[error("block content does not match its claimed content address")]
    DigestMismatch,
}

#[derive(Clone)]
pub struct Blockstore {
    tree: sled::Tree,
}

impl Blockstore {
    pub(crate) fn new(tree: sled::Tree) -> Self {
        Self { tree }
    }

    pub fn has(&self, cid: &Cid) -> Result<bool, BlockstoreError> {
        Ok(self.tree.contains_key(cid.to_bytes())?)
    }

    pub fn get(&self, cid: &Cid) -> Result<Option<Vec<u8>>, BlockstoreError> {
        Ok(self.tree.get(cid.to_bytes())?.map(|v| v.to_vec()))
    }

    /// Stores `data` under `cid`, verifying the digest matches before writing. A mismatch here
    /// would mean the caller mislabeled a block, which is always a bug, never a transient error.
    pub fn put(&self, cid: &Cid, data: &[u8]) -> Result<(), BlockstoreError> {
        if !digest_matches(cid, data) {
            return Err(BlockstoreError::DigestMismatch);
        }
        self.tree.insert(cid.to_bytes(), data)?;
        Ok(())
    }

    pub fn delete(&self, cid: &Cid) -> Result<(), BlockstoreError> {
        self.tree.remove(cid.to_bytes())?;
        Ok(())
    }

    /// All locally held content addresses. Used by the reprovide loop (§4.1 step 7) to announce
    /// local availability of every held block to routing.
    pub fn all_keys(&self) -> Result<Vec<Cid>, BlockstoreError> {
        self.tree
            .iter()
            .keys()
            .map(|k| {
                let k = k?;
                Cid::try_from(k.as_ref()).map_err(|_| BlockstoreError::Io(sled::Error::Unsupported("corrupt cid key".into())))
            })
            .collect()
    }
}

fn digest_matches(cid: &Cid, data: &[u8]) -> bool {
    // Only sha2-256 (multicodec 0x12) is validated here; other hash functions pass through
    // unchecked rather than rejecting content this blockstore cannot verify.
    if cid.hash().code() != 0x12 {
        return true;
    }
    let digest = Sha256::digest(data);
    cid.hash().digest() == digest.as_slice()
}

#[cfg(test)]
mod tests {
    use super::*;
    use multihash::Multihash;

    fn blockstore() -> Blockstore {
        let db = sled::Config::new().temporary(true).open().unwrap();
        Blockstore::new(db.open_tree("blocks").unwrap())
    }

    fn cid_for(data: &[u8]) -> Cid {
        let digest = Sha256::digest(data);
        let hash = Multihash::wrap(0x12, &digest).unwrap();
        Cid::new_v1(0x55, hash)
    }

    #[test]
    fn put_then_get_round_trips() {
        let bs = blockstore();
        let data = b"hello world".to_vec();
        let cid = cid_for(&data);
        bs.put(&cid, &data).unwrap();
        assert_eq!(bs.get(&cid).unwrap(), Some(data));
    }

    #[test]
    fn put_rejects_mismatched_digest() {
        let bs = blockstore();
        let cid = cid_for(b"hello world");
        assert!(bs.put(&cid, b"different content").is_err());
    }

    #[test]
    fn all_keys_lists_every_stored_block() {
        let bs = blockstore();
        let data = b"block-a".to_vec();
        let cid = cid_for(&data);
        bs.put(&cid, &data).unwrap();
        assert_eq!(bs.all_keys().unwrap(), vec![cid]);
    }
}
