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

use std::fmt;

/// Process exit codes. §7 of the node core spec distinguishes configuration errors, identity
/// mismatch, already-initialized errors and network errors as fatal at construction; each gets
/// its own code here so operators and scripts can distinguish failure classes.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(i32)]
pub enum ExitCode {
    ConfigError = 101,
    IdentityError = 102,
    AlreadyInitialized = 103,
    NetworkError = 104,
    IoError = 105,
    UnknownError = 106,
}

impl ExitCode {
    /// A short operator-facing hint for this failure class, printed under the error by `main`.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ExitCode::ConfigError => Some("Check the repository configuration for malformed addresses or filters."),
            ExitCode::IdentityError => Some(
                "No usable identity: either no private key is configured, or the configured peer id does not match \
                 the private key's derived id. Run an init step to generate one, or fix the identity configuration.",
            ),
            ExitCode::NetworkError => Some("No usable listen address remained after filtering. Check Addresses.Swarm."),
            _ => None,
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, *self as i32)
    }
}

/// A fatal error paired with the exit code `main` should use when it propagates to the top.
#[derive(Debug)]
pub struct ExitError {
    pub exit_code: ExitCode,
    pub source: anyhow::Error,
}

impl ExitError {
    pub fn new(exit_code: ExitCode, source: impl Into<anyhow::Error>) -> Self {
        Self {
            exit_code,
            source: source.into(),
        }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.exit_code, self.source)
    }
}

impl std::error::Error for ExitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_code_and_source() {
        let err = ExitError::new(ExitCode::ConfigError, anyhow::anyhow!("bad cidr"));
        assert_eq!(err.to_string(), "ConfigError (101): bad cidr");
    }

    #[test]
    fn hints_present_for_common_failures() {
        assert!(ExitCode::ConfigError.hint().is_some());
        assert!(ExitCode::IdentityError.hint().is_some());
        assert!(ExitCode::UnknownError.hint().is_none());
    }
}
