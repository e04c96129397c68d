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

//! Arbitrary key/value records (§2 item 1). The name system's resolved/hosted records and the
//! offline router's stored values both live here, under their own sled trees.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatastoreError {
    #[error("datastore I/O error: {0}")]
    Io(#[from] sled::Error),
}

/// A single sled tree addressed by opaque byte keys. Cloning is cheap; `sled::Tree` is already a
/// handle onto shared state.
#[derive(Clone)]
pub struct Datastore {
    tree: sled::Tree,
}

impl Datastore {
    pub(crate) fn new(tree: sled::Tree) -> Self {
        Self { tree }
    }

    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<(), DatastoreError> {
        self.tree.insert(key, value)?;
        Ok(())
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, DatastoreError> {
        Ok(self.tree.get(key)?.map(|v| v.to_vec()))
    }

    pub fn has(&self, key: &[u8]) -> Result<bool, DatastoreError> {
        Ok(self.tree.contains_key(key)?)
    }

    pub fn delete(&self, key: &[u8]) -> Result<(), DatastoreError> {
        self.tree.remove(key)?;
        Ok(())
    }

    pub fn keys_with_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, DatastoreError> {
        self.tree
            .scan_prefix(prefix)
            .map(|entry| entry.map(|(k, _)| k.to_vec()).map_err(DatastoreError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datastore() -> Datastore {
        let db = sled::Config::new().temporary(true).open().unwrap();
        Datastore::new(db.open_tree("test").unwrap())
    }

    #[test]
    fn put_then_get_round_trips() {
        let ds = datastore();
        ds.put(b"k", b"v").unwrap();
        assert_eq!(ds.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn missing_key_returns_none() {
        let ds = datastore();
        assert_eq!(ds.get(b"missing").unwrap(), None);
    }

    #[test]
    fn delete_removes_key() {
        let ds = datastore();
        ds.put(b"k", b"v").unwrap();
        ds.delete(b"k").unwrap();
        assert!(!ds.has(b"k").unwrap());
    }
}
