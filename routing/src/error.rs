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

use thiserror::Error;

/// §7's error kinds, specialized to routing: not-found is returned verbatim and never logged as
/// an error; everything else is either a fatal construction error or a transient, retried one.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("not found")]
    NotFound,
    #[error("cancelled")]
    Cancelled,
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    #[error("routing transport error: {0}")]
    Transport(String),
    #[error("record signature verification failed")]
    InvalidSignature,
    #[error("no supernode servers configured")]
    NoServersConfigured,
}

impl From<tessera_comms::CommsError> for RoutingError {
    fn from(err: tessera_comms::CommsError) -> Self {
        RoutingError::Transport(err.to_string())
    }
}

impl From<tessera_repo::DatastoreError> for RoutingError {
    fn from(err: tessera_repo::DatastoreError) -> Self {
        RoutingError::Transport(err.to_string())
    }
}
