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

//! §3's `NodeIdentifier` and `KeyPair`: a stable node identity derived from a long-lived keypair.

use std::{fmt, sync::Arc};

use libp2p::identity::{self, Keypair};
use multiaddr::Multiaddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("configured peer id '{configured}' does not match private-key-derived id '{derived}'")]
    Mismatch { configured: String, derived: String },
    #[error("no private key configured for this identity; an init step must generate and persist one first")]
    NotSet,
    #[error("identity already loaded for this node")]
    AlreadyLoaded,
    #[error("malformed private key: {0}")]
    Malformed(String),
}

/// Opaque node identifier; canonically the multihash of the node's public key. Wraps
/// `libp2p::PeerId` rather than reinventing multihash encoding.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct NodeIdentifier(libp2p::PeerId);

impl NodeIdentifier {
    pub fn from_public_key(keypair: &Keypair) -> Self {
        Self(libp2p::PeerId::from(keypair.public()))
    }

    pub fn as_peer_id(&self) -> libp2p::PeerId {
        self.0
    }
}

impl fmt::Display for NodeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<libp2p::PeerId> for NodeIdentifier {
    fn from(peer_id: libp2p::PeerId) -> Self {
        Self(peer_id)
    }
}

impl std::str::FromStr for NodeIdentifier {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<libp2p::PeerId>()
            .map(NodeIdentifier)
            .map_err(|e| IdentityError::Malformed(e.to_string()))
    }
}

bitflags::bitflags! {
    /// Mirrors the teacher's `PeerFeatures`: capability bits advertised alongside a peer's
    /// address so dialers can skip peers that can't serve a given role.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct PeerFeatures: u32 {
        const COMMUNICATION_NODE = 0b0000_0001;
        const DHT_ROUTING = 0b0000_0010;
    }
}

impl Default for PeerFeatures {
    fn default() -> Self {
        PeerFeatures::COMMUNICATION_NODE
    }
}

/// A long-lived asymmetric keypair plus the node identifier and addresses derived from it.
///
/// §3 invariant: "Identity, once set, is not replaced." `NodeIdentity` is constructed exactly
/// once per node (in `construct-offline`/`construct-online`) and handed out as `Arc<NodeIdentity>`
/// from then on.
pub struct NodeIdentity {
    keypair: Keypair,
    identifier: NodeIdentifier,
    public_addresses: std::sync::RwLock<Vec<Multiaddr>>,
    features: PeerFeatures,
}

impl NodeIdentity {
    pub fn new(keypair: Keypair, public_addresses: Vec<Multiaddr>, features: PeerFeatures) -> Arc<Self> {
        let identifier = NodeIdentifier::from_public_key(&keypair);
        Arc::new(Self {
            keypair,
            identifier,
            public_addresses: std::sync::RwLock::new(public_addresses),
            features,
        })
    }

    pub fn generate(public_addresses: Vec<Multiaddr>, features: PeerFeatures) -> Arc<Self> {
        Self::new(Keypair::generate_ed25519(), public_addresses, features)
    }

    /// Loads an identity from its base64-encoded protobuf keypair bytes, verifying it derives
    /// the `expected` identifier if one is configured. §4.1 construct-online step 1 and the
    /// identity-mismatch scenario of §8 both require this check before any subsystem starts.
    pub fn load(private_key_b64: &str, expected: Option<&str>, public_addresses: Vec<Multiaddr>) -> Result<Arc<Self>, IdentityError> {
        use base64::Engine;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(private_key_b64)
            .map_err(|e| IdentityError::Malformed(e.to_string()))?;
        let keypair = identity::Keypair::from_protobuf_encoding(&bytes).map_err(|e| IdentityError::Malformed(e.to_string()))?;
        let derived = NodeIdentifier::from_public_key(&keypair);
        if let Some(expected) = expected {
            let expected: NodeIdentifier = expected.parse()?;
            if expected != derived {
                return Err(IdentityError::Mismatch {
                    configured: expected.to_string(),
                    derived: derived.to_string(),
                });
            }
        }
        Ok(Arc::new(Self {
            keypair,
            identifier: derived,
            public_addresses: std::sync::RwLock::new(public_addresses),
            features: PeerFeatures::default(),
        }))
    }

    pub fn identifier(&self) -> NodeIdentifier {
        self.identifier
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn features(&self) -> PeerFeatures {
        self.features
    }

    pub fn public_addresses(&self) -> Vec<Multiaddr> {
        self.public_addresses.read().expect("poisoned").clone()
    }

    pub fn add_public_address(&self, addr: Multiaddr) {
        let mut addrs = self.public_addresses.write().expect("poisoned");
        if !addrs.contains(&addr) {
            addrs.push(addr);
        }
    }

    /// Signs `message` under this identity's private key. Used by the name system (§4.6) and the
    /// supernode routing client (§4.5) to produce signed records.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.keypair.sign(message).expect("ed25519 signing does not fail")
    }
}

impl fmt::Debug for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeIdentity")
            .field("identifier", &self.identifier)
            .field("features", &self.features)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_identity_round_trips_through_protobuf() {
        let identity = NodeIdentity::generate(Vec::new(), PeerFeatures::default());
        let bytes = identity.keypair().to_protobuf_encoding().unwrap();
        use base64::Engine;
        let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
        let loaded = NodeIdentity::load(&b64, Some(&identity.identifier().to_string()), Vec::new()).unwrap();
        assert_eq!(loaded.identifier(), identity.identifier());
    }

    #[test]
    fn mismatched_configured_id_is_fatal() {
        let identity = NodeIdentity::generate(Vec::new(), PeerFeatures::default());
        let bytes = identity.keypair().to_protobuf_encoding().unwrap();
        use base64::Engine;
        let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
        let other = NodeIdentity::generate(Vec::new(), PeerFeatures::default());
        let err = NodeIdentity::load(&b64, Some(&other.identifier().to_string()), Vec::new()).unwrap_err();
        assert!(matches!(err, IdentityError::Mismatch { .. }));
    }
}
