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

//! The wire format carried inside `tessera_comms::ExchangeMessage`'s opaque byte payload. Comms
//! only knows about bytes; this module is where those bytes become a wantlist protocol.

use cid::Cid;
use serde::{Deserialize, Serialize};
use tessera_comms::behaviour::ExchangeMessage;

use crate::error::ExchangeError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExchangeRequest {
    /// "Do you have this block? If so, send it."
    Want { cid: Vec<u8> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExchangeResponse {
    HaveBlock { cid: Vec<u8>, data: Vec<u8> },
    DontHave { cid: Vec<u8> },
}

impl ExchangeRequest {
    pub fn want(cid: &Cid) -> Self {
        ExchangeRequest::Want { cid: cid.to_bytes() }
    }

    pub fn cid(&self) -> Result<Cid, ExchangeError> {
        let ExchangeRequest::Want { cid } = self;
        Cid::try_from(cid.as_slice()).map_err(|e| ExchangeError::Malformed(e.to_string()))
    }

    pub fn encode(&self) -> Result<ExchangeMessage, ExchangeError> {
        bincode::serialize(self)
            .map(ExchangeMessage)
            .map_err(|e| ExchangeError::Malformed(e.to_string()))
    }

    pub fn decode(message: &ExchangeMessage) -> Result<Self, ExchangeError> {
        bincode::deserialize(&message.0).map_err(|e| ExchangeError::Malformed(e.to_string()))
    }
}

impl ExchangeResponse {
    pub fn have(cid: &Cid, data: Vec<u8>) -> Self {
        ExchangeResponse::HaveBlock { cid: cid.to_bytes(), data }
    }

    pub fn dont_have(cid: &Cid) -> Self {
        ExchangeResponse::DontHave { cid: cid.to_bytes() }
    }

    pub fn encode(&self) -> Result<ExchangeMessage, ExchangeError> {
        bincode::serialize(self)
            .map(ExchangeMessage)
            .map_err(|e| ExchangeError::Malformed(e.to_string()))
    }

    pub fn decode(message: &ExchangeMessage) -> Result<Self, ExchangeError> {
        bincode::deserialize(&message.0).map_err(|e| ExchangeError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multihash::Multihash;
    use sha2::{Digest, Sha256};

    fn cid_for(data: &[u8]) -> Cid {
        let digest = Sha256::digest(data);
        let hash = Multihash::wrap(0x12, &digest).unwrap();
        Cid::new_v1(0x55, hash)
    }

    #[test]
    fn request_round_trips_through_wire_encoding() {
        let cid = cid_for(b"hello");
        let request = ExchangeRequest::want(&cid);
        let encoded = request.encode().unwrap();
        let decoded = ExchangeRequest::decode(&encoded).unwrap();
        assert_eq!(decoded.cid().unwrap(), cid);
    }

    #[test]
    fn response_round_trips_through_wire_encoding() {
        let cid = cid_for(b"hello");
        let response = ExchangeResponse::have(&cid, b"hello".to_vec());
        let encoded = response.encode().unwrap();
        match ExchangeResponse::decode(&encoded).unwrap() {
            ExchangeResponse::HaveBlock { cid: got_cid, data } => {
                assert_eq!(Cid::try_from(got_cid.as_slice()).unwrap(), cid);
                assert_eq!(data, b"hello".to_vec());
            },
            ExchangeResponse::DontHave { .. } => panic!("expected HaveBlock"),
        }
    }
}
