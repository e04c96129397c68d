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

//! DAG service (§2 item 4, §GLOSSARY "DAG"): interprets blocks fetched through the block service
//! as nodes of a directed acyclic graph, where a node's payload references other blocks by
//! content address under a named link.

use std::sync::Arc;

use cid::Cid;
use serde::{Deserialize, Serialize};

use crate::{block_service::BlockService, error::ExchangeError, exchange_service::Exchange};

/// One node of the merkle-linked graph: opaque data plus zero or more named links to other nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DagNode {
    pub data: Vec<u8>,
    pub links: Vec<(String, Vec<u8>)>,
}

impl DagNode {
    pub fn leaf(data: Vec<u8>) -> Self {
        Self { data, links: Vec::new() }
    }

    pub fn with_link(mut self, name: impl Into<String>, target: &Cid) -> Self {
        self.links.push((name.into(), target.to_bytes()));
        self
    }

    pub fn link(&self, name: &str) -> Result<Cid, ExchangeError> {
        self.links
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, cid)| Cid::try_from(cid.as_slice()).map_err(|e| ExchangeError::MalformedDag(e.to_string())))
            .ok_or_else(|| ExchangeError::NoSuchLink(name.to_string()))?
    }

    fn encode(&self) -> Result<Vec<u8>, ExchangeError> {
        bincode::serialize(self).map_err(|e| ExchangeError::MalformedDag(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<Self, ExchangeError> {
        bincode::deserialize(bytes).map_err(|e| ExchangeError::MalformedDag(e.to_string()))
    }
}

pub struct DagService<E: Exchange> {
    blocks: Arc<BlockService<E>>,
}

impl<E: Exchange> DagService<E> {
    pub fn new(blocks: Arc<BlockService<E>>) -> Self {
        Self { blocks }
    }

    pub async fn get_node(&self, cid: &Cid) -> Result<DagNode, ExchangeError> {
        let bytes = self.blocks.get(cid).await?;
        DagNode::decode(&bytes)
    }

    pub fn put_node(&self, cid: &Cid, node: &DagNode) -> Result<(), ExchangeError> {
        let bytes = node.encode()?;
        self.blocks.put(cid, &bytes)
    }

    /// Walks a `/`-separated path of link names starting at `root`, fetching each intermediate
    /// node (possibly over the network) along the way.
    pub async fn resolve_path(&self, root: &Cid, path: &str) -> Result<DagNode, ExchangeError> {
        let mut node = self.get_node(root).await?;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let next_cid = node.link(segment)?;
            node = self.get_node(&next_cid).await?;
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_lookup_finds_named_target() {
        use multihash::Multihash;
        let hash = Multihash::wrap(0x12, &[1u8; 32]).unwrap();
        let target = Cid::new_v1(0x55, hash);
        let node = DagNode::leaf(b"root".to_vec()).with_link("child", &target);
        assert_eq!(node.link("child").unwrap(), target);
    }

    #[test]
    fn link_lookup_fails_for_missing_name() {
        let node = DagNode::leaf(b"root".to_vec());
        assert!(node.link("missing").is_err());
    }
}
