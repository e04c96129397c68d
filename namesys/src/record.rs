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

//! `NameEntry` (§3): a signed record binding a publisher to a path, plus the deterministic record
//! key derivation (§6) that produces the two related keys ("public-key record", "name record")
//! the name system uses in concert.

use libp2p::identity::PublicKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tessera_comms::{NodeIdentifier, NodeIdentity};

use crate::error::NamesysError;

/// A signed record binding a [`NodeIdentifier`] (the publisher) to a path. The publisher's
/// public key travels with the record so a verifier never needs a prior peerstore entry for it;
/// this mirrors the way IPNS entries embed the signing key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NameEntry {
    pub publisher: Vec<u8>,
    pub publisher_public_key: Vec<u8>,
    pub path: String,
    pub signature: Vec<u8>,
}

impl NameEntry {
    /// Builds and signs a new entry binding `identity`'s public key to `path`.
    pub fn sign(identity: &NodeIdentity, path: impl Into<String>) -> Self {
        let path = path.into();
        let signature = identity.sign(path.as_bytes());
        Self {
            publisher: identity.identifier().as_peer_id().to_bytes(),
            publisher_public_key: identity.keypair().public().encode_protobuf(),
            path,
            signature,
        }
    }

    pub fn publisher(&self) -> Result<NodeIdentifier, NamesysError> {
        libp2p::PeerId::from_bytes(&self.publisher)
            .map(NodeIdentifier::from)
            .map_err(|e| NamesysError::MalformedRecord(e.to_string()))
    }

    /// Checks that the embedded public key derives the claimed publisher id, and that the
    /// signature verifies the path under that key. Both checks must pass before a record is
    /// trusted for resolution or republishing.
    pub fn verify(&self) -> Result<(), NamesysError> {
        let public_key =
            PublicKey::try_decode_protobuf(&self.publisher_public_key).map_err(|e| NamesysError::MalformedRecord(e.to_string()))?;
        let derived = NodeIdentifier::from(libp2p::PeerId::from(public_key.clone()));
        if derived != self.publisher()? {
            return Err(NamesysError::PublisherMismatch);
        }
        if !public_key.verify(self.path.as_bytes(), &self.signature) {
            return Err(NamesysError::InvalidSignature);
        }
        Ok(())
    }

    pub fn encode(&self) -> Result<Vec<u8>, NamesysError> {
        bincode::serialize(self).map_err(|e| NamesysError::MalformedRecord(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, NamesysError> {
        bincode::deserialize(bytes).map_err(|e| NamesysError::MalformedRecord(e.to_string()))
    }
}

/// The record key under which a publisher's name record is stored: `/name-record/` followed by
/// the SHA-256 digest of the publisher's peer-id bytes.
pub fn name_record_key(publisher: &NodeIdentifier) -> Vec<u8> {
    derive_key(b"/name-record/", publisher)
}

/// The record key under which a publisher's standalone public key is stored, used by routers
/// (e.g. the DHT) that need the key independently of a name record to validate other records.
pub fn public_key_record_key(publisher: &NodeIdentifier) -> Vec<u8> {
    derive_key(b"/pk/", publisher)
}

fn derive_key(prefix: &[u8], publisher: &NodeIdentifier) -> Vec<u8> {
    let digest = Sha256::digest(publisher.as_peer_id().to_bytes());
    let mut key = prefix.to_vec();
    key.extend_from_slice(&digest);
    key
}

#[cfg(test)]
mod tests {
    use tessera_comms::PeerFeatures;

    use super::*;

    #[test]
    fn signed_entry_verifies() {
        let identity = NodeIdentity::generate(Vec::new(), PeerFeatures::default());
        let entry = NameEntry::sign(&identity, "/ipfs/bafy-example");
        entry.verify().unwrap();
        assert_eq!(entry.publisher().unwrap(), identity.identifier());
    }

    #[test]
    fn tampered_path_fails_verification() {
        let identity = NodeIdentity::generate(Vec::new(), PeerFeatures::default());
        let mut entry = NameEntry::sign(&identity, "/ipfs/bafy-example");
        entry.path = "/ipfs/bafy-tampered".to_string();
        assert!(matches!(entry.verify(), Err(NamesysError::InvalidSignature)));
    }

    #[test]
    fn record_key_is_deterministic_and_distinguishes_kinds() {
        let identity = NodeIdentity::generate(Vec::new(), PeerFeatures::default());
        let id = identity.identifier();
        assert_eq!(name_record_key(&id), name_record_key(&id));
        assert_ne!(name_record_key(&id), public_key_record_key(&id));
    }

    #[test]
    fn encode_decode_round_trips() {
        let identity = NodeIdentity::generate(Vec::new(), PeerFeatures::default());
        let entry = NameEntry::sign(&identity, "/ipfs/bafy-example");
        let bytes = entry.encode().unwrap();
        let decoded = NameEntry::decode(&bytes).unwrap();
        assert_eq!(decoded, entry);
    }
}
