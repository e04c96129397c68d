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

//! The repository: "all durable state — keypair, bootstrap list, configuration, blocks, records —
//! lives in the repository. The core owns none of these file layouts" (§6). Per §3's teardown
//! constraint, the repository closes last; `Repository::close` is idempotent.

use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};

use thiserror::Error;

use crate::{blockstore::Blockstore, datastore::Datastore};

const IDENTITY_TREE: &str = "identity";
const DATASTORE_TREE: &str = "datastore";
const BLOCKSTORE_TREE: &str = "blocks";
const PRIVATE_KEY_KEY: &[u8] = b"private_key";

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("repository already initialized at {0}")]
    AlreadyInitialized(PathBuf),
    #[error("repository I/O error: {0}")]
    Io(#[from] sled::Error),
}

/// A handle on the node's on-disk state. Single-owner: the repository is opened once in
/// `construct-offline`/`construct-online` and shared by reference from then on.
pub struct Repository {
    db: sled::Db,
    path: PathBuf,
    closed: AtomicBool,
}

impl Repository {
    /// Opens (creating if absent) the repository rooted at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let path = path.as_ref().to_path_buf();
        let db = sled::open(&path)?;
        Ok(Self {
            db,
            path,
            closed: AtomicBool::new(false),
        })
    }

    /// Opens an in-memory repository for tests.
    pub fn open_temporary() -> Result<Self, RepoError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self {
            db,
            path: PathBuf::new(),
            closed: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn datastore(&self) -> Result<Datastore, RepoError> {
        Ok(Datastore::new(self.db.open_tree(DATASTORE_TREE)?))
    }

    pub fn blockstore(&self) -> Result<Blockstore, RepoError> {
        Ok(Blockstore::new(self.db.open_tree(BLOCKSTORE_TREE)?))
    }

    /// Loads the base64-encoded private key saved by a previous `save_private_key`, if any.
    pub fn load_private_key(&self) -> Result<Option<String>, RepoError> {
        let tree = self.db.open_tree(IDENTITY_TREE)?;
        Ok(tree.get(PRIVATE_KEY_KEY)?.map(|v| String::from_utf8_lossy(&v).into_owned()))
    }

    /// Persists a freshly generated private key. §4.1's "already initialized" error applies at
    /// the node level, not here — this call simply overwrites, and callers are responsible for
    /// only invoking it once per repository lifetime.
    pub fn save_private_key(&self, private_key_b64: &str) -> Result<(), RepoError> {
        let tree = self.db.open_tree(IDENTITY_TREE)?;
        tree.insert(PRIVATE_KEY_KEY, private_key_b64.as_bytes())?;
        Ok(())
    }

    /// Flushes and releases the underlying store. Idempotent: a second call is a no-op, matching
    /// §3's "every subsystem added to the node is registered for teardown exactly once" alongside
    /// the outer node's own idempotent `close`.
    pub fn close(&self) -> Result<(), RepoError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.db.flush()?;
        Ok(())
    }
}

impl Drop for Repository {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_key_round_trips() {
        let repo = Repository::open_temporary().unwrap();
        assert_eq!(repo.load_private_key().unwrap(), None);
        repo.save_private_key("c3VwZXItc2VjcmV0").unwrap();
        assert_eq!(repo.load_private_key().unwrap(), Some("c3VwZXItc2VjcmV0".to_string()));
    }

    #[test]
    fn close_is_idempotent() {
        let repo = Repository::open_temporary().unwrap();
        repo.close().unwrap();
        repo.close().unwrap();
    }

    #[test]
    fn datastore_and_blockstore_are_independent_trees() {
        let repo = Repository::open_temporary().unwrap();
        let ds = repo.datastore().unwrap();
        ds.put(b"k", b"v").unwrap();
        let bs = repo.blockstore().unwrap();
        assert!(!bs.has(&cid_for(b"k")).unwrap());
    }

    fn cid_for(_data: &[u8]) -> cid::Cid {
        use multihash::Multihash;
        let hash = Multihash::wrap(0x12, &[0u8; 32]).unwrap();
        cid::Cid::new_v1(0x55, hash)
    }
}
