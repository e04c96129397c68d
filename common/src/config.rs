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

use std::{path::Path, time::Duration};

use multiaddr::Multiaddr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Read(#[from] ::config::ConfigError),
    #[error("configuration field '{0}' is missing or malformed")]
    Invalid(&'static str),
}

/// Mirrors §6's configuration surface: `Identity.*`, `Addresses.*`, `Swarm.AddrFilters`,
/// `Discovery.MDNS.*` and `Bootstrap`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub identity: IdentityConfig,
    pub addresses: AddressesConfig,
    pub swarm: SwarmConfig,
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub bootstrap: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Base58/base64-encoded node identifier. If present, `private_key` must derive it exactly
    /// or construction fails with an identity-mismatch error (§8).
    pub peer_id: Option<String>,
    /// Base64-encoded private key bytes, preferred over the repository's persisted copy when
    /// present. Absent and no key previously saved to the repository is a fatal "identity not
    /// set" error (§4.1 step 1 / §7) — creating the initial key is an init step, not something
    /// `construct-offline`/`construct-online` does implicitly.
    pub private_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressesConfig {
    #[serde(default)]
    pub swarm: Vec<String>,
    pub api: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwarmConfig {
    #[serde(default)]
    pub addr_filters: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default)]
    pub mdns: MdnsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MdnsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(with = "humantime_secs", default = "default_mdns_interval")]
    pub interval: Duration,
}

impl Default for MdnsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: default_mdns_interval(),
        }
    }
}

fn default_mdns_interval() -> Duration {
    Duration::from_secs(30)
}

mod humantime_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl RepositoryConfig {
    /// Loads configuration layering a TOML file under `TESSERA_*`-prefixed environment variable
    /// overrides, matching the teacher's `load_configuration` layering.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ::config::Config::builder()
            .add_source(::config::File::from(path.as_ref()))
            .add_source(::config::Environment::with_prefix("TESSERA").separator("__"));
        let cfg = builder.build()?;
        cfg.try_deserialize().map_err(ConfigError::from)
    }

    pub fn parse_swarm_addresses(&self) -> Result<Vec<Multiaddr>, ConfigError> {
        self.addresses
            .swarm
            .iter()
            .map(|s| s.parse().map_err(|_| ConfigError::Invalid("Addresses.Swarm")))
            .collect()
    }

    pub fn parse_api_address(&self) -> Result<Option<Multiaddr>, ConfigError> {
        self.addresses
            .api
            .as_ref()
            .map(|s| s.parse().map_err(|_| ConfigError::Invalid("Addresses.API")))
            .transpose()
    }

    pub fn parse_bootstrap_addresses(&self) -> Result<Vec<Multiaddr>, ConfigError> {
        self.bootstrap
            .iter()
            .map(|s| s.parse().map_err(|_| ConfigError::Invalid("Bootstrap")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [identity]

            [addresses]
            swarm = ["/ip4/0.0.0.0/tcp/4001"]
            api = "/ip4/127.0.0.1/tcp/5001"

            [swarm]
            addr_filters = []

            [discovery.mdns]
            enabled = true
            interval = 30

            bootstrap = []
            "#
        )
        .unwrap();

        let cfg = RepositoryConfig::load(file.path()).unwrap();
        assert_eq!(cfg.addresses.swarm.len(), 1);
        assert!(cfg.discovery.mdns.enabled);
        assert_eq!(cfg.parse_swarm_addresses().unwrap().len(), 1);
    }

    #[test]
    fn rejects_malformed_swarm_address() {
        let cfg = RepositoryConfig {
            identity: IdentityConfig {
                peer_id: None,
                private_key: None,
            },
            addresses: AddressesConfig {
                swarm: vec!["not-a-multiaddr".to_string()],
                api: None,
            },
            swarm: SwarmConfig::default(),
            discovery: DiscoveryConfig {
                mdns: MdnsConfig::default(),
            },
            bootstrap: Vec::new(),
        };
        assert!(cfg.parse_swarm_addresses().is_err());
    }
}
