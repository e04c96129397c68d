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

//! The decision of whether to send a held block to a requesting peer. This core ships a single
//! strategy: always send to whoever asks, with no ledger or debt ratio tracked. Kept as a trait
//! so a future strategy (tit-for-tat ledgers, peer allow-lists) has somewhere to plug in.

use tessera_comms::NodeIdentifier;

pub trait Strategy: Send + Sync {
    /// Whether a block held locally should be sent to `requester`.
    fn should_send(&self, requester: &NodeIdentifier) -> bool;
}

/// The trusting yes-strategy: if we have the block, we send it, unconditionally.
#[derive(Debug, Default, Clone, Copy)]
pub struct YesManStrategy;

impl Strategy for YesManStrategy {
    fn should_send(&self, _requester: &NodeIdentifier) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libp2p::PeerId;

    #[test]
    fn yes_man_always_sends() {
        let strategy = YesManStrategy;
        let peer = NodeIdentifier::from(PeerId::random());
        assert!(strategy.should_send(&peer));
    }
}
