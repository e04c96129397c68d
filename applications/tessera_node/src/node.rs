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

//! The node lifecycle (§4.1): `construct-offline`, `construct-online`, `close` and `query mode`,
//! composed from every other crate in the workspace. A `Node` starts in [`NodeMode::Uninitialized`]
//! and is transitioned exactly once, either to [`NodeMode::Offline`] or [`NodeMode::Online`];
//! calling either constructor a second time is the "node already online" error.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex as StdMutex, RwLock as StdRwLock},
    time::Duration,
};

use async_trait::async_trait;
use log::info;
use multiaddr::Multiaddr;
use tessera_bootstrap::{start as start_bootstrap, BootstrapConfig, BootstrapHandle, ConfigPeerSupplier};
use tessera_comms::{BandwidthReporter, CommsBuilder, CommsNode, IdentityError, NodeIdentity};
use tessera_common::{
    cidr,
    config::RepositoryConfig,
    exit_codes::{ExitCode, ExitError},
};
use tessera_discovery::{Discovery, DiscoveryConfig, DiscoveryHandle};
use tessera_exchange::{BitswapExchange, Exchange, ReprovideLoop, YesManStrategy};
use tessera_namesys::{Publisher, Republisher, Resolver, DEFAULT_REPUBLISH_INTERVAL};
use tessera_repo::{Blockstore, Repository};
use tessera_routing::{BoxedRouting, DhtRouting, OfflineRouting, Routing, SupernodeClient};
use tessera_service_framework::{
    ServiceInitializationError, ServiceInitializer, ServiceInitializerContext, StackBuilder,
};
use tessera_shutdown::Shutdown;

use crate::{routed_host::RoutedHost, supernode_transport::CommsSupernodeTransport};

/// Mirrors the republish cadence: neither crate's contract fixes a reprovide interval, so this
/// core picks the same twelve-hour cadence `namesys::DEFAULT_REPUBLISH_INTERVAL` uses.
const DEFAULT_REPROVIDE_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeMode {
    Uninitialized,
    Offline,
    Online,
}

/// Which `Routing` backend `construct_online` wires in. §9's note on global mutable state: the
/// choice is a value passed at construction time rather than a compile-time feature flag, so one
/// binary can run either topology.
pub enum RoutingChoice {
    Dht,
    Supernode { servers: Vec<Multiaddr> },
}

/// The subsystems that exist only once `construct_online` has run, torn down together by `close`.
struct OnlineHandles {
    comms: CommsNode,
    host: RoutedHost,
    exchange: Arc<BitswapExchange<BoxedRouting, YesManStrategy>>,
    republisher: Arc<Republisher<BoxedRouting>>,
    discovery: Option<DiscoveryHandle>,
    bootstrap: BootstrapHandle,
}

pub struct Node {
    repository: Repository,
    mode: NodeMode,
    identity: Option<Arc<NodeIdentity>>,
    routing: Option<Arc<BoxedRouting>>,
    resolver: Option<Arc<Resolver<BoxedRouting>>>,
    publisher: Option<Arc<Publisher<BoxedRouting>>>,
    mounts: Vec<PathBuf>,
    shutdown: Shutdown,
    online: Option<OnlineHandles>,
}

impl Node {
    /// A fresh, uninitialized node over an already-open repository. Neither lifecycle
    /// constructor has run yet; `mode()` reports [`NodeMode::Uninitialized`].
    pub fn new(repository: Repository) -> Self {
        Self {
            repository,
            mode: NodeMode::Uninitialized,
            identity: None,
            routing: None,
            resolver: None,
            publisher: None,
            mounts: Vec::new(),
            shutdown: Shutdown::new(),
            online: None,
        }
    }

    pub fn mode(&self) -> NodeMode {
        self.mode
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn identity(&self) -> Option<&Arc<NodeIdentity>> {
        self.identity.as_ref()
    }

    pub fn routing(&self) -> Option<&Arc<BoxedRouting>> {
        self.routing.as_ref()
    }

    pub fn resolver(&self) -> Option<&Arc<Resolver<BoxedRouting>>> {
        self.resolver.as_ref()
    }

    pub fn publisher(&self) -> Option<&Arc<Publisher<BoxedRouting>>> {
        self.publisher.as_ref()
    }

    pub fn mounts(&self) -> &[PathBuf] {
        &self.mounts
    }

    /// Dials a peer known only by identifier, routed through the online host. `None` while
    /// offline or uninitialized: there is no peer host to dial through.
    pub fn routed_host(&self) -> Option<&RoutedHost> {
        self.online.as_ref().map(|o| &o.host)
    }

    pub fn exchange(&self) -> Option<&Arc<BitswapExchange<BoxedRouting, YesManStrategy>>> {
        self.online.as_ref().map(|o| &o.exchange)
    }

    /// §4.1 construct-offline: loads identity, attaches the repository (already held), installs
    /// an offline router keyed by the local private key, and installs a name system over it. No
    /// network sockets are opened.
    pub fn construct_offline(&mut self, config: &RepositoryConfig) -> Result<(), ExitError> {
        if self.mode != NodeMode::Uninitialized {
            return Err(ExitError::new(ExitCode::AlreadyInitialized, anyhow::anyhow!("node already initialized")));
        }

        let identity = load_identity(&self.repository, config)?;
        let datastore = self.repository.datastore().map_err(|e| ExitError::new(ExitCode::IoError, e))?;
        let offline = OfflineRouting::new(datastore, identity.identifier());
        let routing = Arc::new(BoxedRouting::new(Arc::new(offline)));

        self.resolver = Some(Arc::new(Resolver::new(routing.clone())));
        self.publisher = Some(Arc::new(Publisher::new(routing.clone())));
        self.routing = Some(routing);
        self.identity = Some(identity);
        self.mode = NodeMode::Offline;
        Ok(())
    }

    /// §4.1 construct-online, performed in its pinned nine-step order. `routing_choice` selects
    /// the DHT or supernode-client backend (§4.5); discovery is started only if
    /// `config.discovery.mdns.enabled`, matching "discovery if requested."
    pub async fn construct_online(&mut self, config: &RepositoryConfig, routing_choice: RoutingChoice) -> Result<(), ExitError> {
        if self.mode != NodeMode::Uninitialized {
            return Err(ExitError::new(ExitCode::AlreadyInitialized, anyhow::anyhow!("node already online")));
        }

        // Step 1: load the private key.
        let identity = load_identity(&self.repository, config)?;

        // Step 2: bandwidth reporter.
        let bandwidth = Arc::new(BandwidthReporter::new());

        // Step 3: parse address filters; malformed filter is fatal.
        let filters = cidr::parse_cidrs(&config.swarm.addr_filters).map_err(|e| ExitError::new(ExitCode::ConfigError, e))?;
        let configured = config.parse_swarm_addresses().map_err(|e| ExitError::new(ExitCode::ConfigError, e))?;
        let listen_addresses: Vec<Multiaddr> = configured.into_iter().filter(|a| cidr::is_allowed(a, &filters)).collect();
        if listen_addresses.is_empty() {
            return Err(ExitError::new(ExitCode::NetworkError, anyhow::anyhow!("no usable listen address remained after filtering")));
        }

        // Step 4/6: build the peer host and begin listening. `CommsBuilder::build` wires the
        // behaviour's protocol handlers (identify/ping/mdns/kad/exchange/supernode) in before the
        // swarm ever runs; this crate's `spawn()` both starts listening and hands back the
        // `CommsNode` handle in a single call, so steps 4 and 6 happen together here rather than
        // bracketing the wiring step as §4.2 describes for a host that could listen separately.
        let enable_kad = matches!(routing_choice, RoutingChoice::Dht);
        let enable_supernode_proxy = matches!(routing_choice, RoutingChoice::Supernode { .. });
        let comms = CommsBuilder::new()
            .with_node_identity(identity.clone())
            .with_shutdown_signal(self.shutdown.to_signal())
            .with_listener_addresses(listen_addresses)
            .with_bandwidth_reporter(bandwidth)
            .with_mdns(config.discovery.mdns.enabled)
            .with_dht_routing(enable_kad)
            .with_exchange_protocol(true)
            .with_supernode_proxy(enable_supernode_proxy)
            .build()
            .map_err(|e| ExitError::new(ExitCode::NetworkError, e))?
            .spawn()
            .map_err(|e| ExitError::new(ExitCode::NetworkError, e))?;

        // §4.2 step 2: build routing from the chosen backend.
        let routing: Arc<BoxedRouting> = match &routing_choice {
            RoutingChoice::Dht => Arc::new(BoxedRouting::new(Arc::new(DhtRouting::new(comms.clone(), identity.clone())))),
            RoutingChoice::Supernode { servers } => {
                let transport = CommsSupernodeTransport::new(comms.clone());
                Arc::new(BoxedRouting::new(Arc::new(SupernodeClient::new(transport, servers.clone(), identity.clone()))))
            },
        };

        let blockstore = self.repository.blockstore().map_err(|e| ExitError::new(ExitCode::IoError, e))?;
        let shared_config = Arc::new(StdRwLock::new(config.clone()));
        let discovery_config = DiscoveryConfig {
            interval: config.discovery.mdns.interval,
            ..DiscoveryConfig::default()
        };
        let discovery_slot: Arc<StdMutex<Option<DiscoveryHandle>>> = Arc::new(StdMutex::new(None));
        let bootstrap_slot: Arc<StdMutex<Option<BootstrapHandle>>> = Arc::new(StdMutex::new(None));

        // §4.2 steps 1/3-6, plus §4.1 steps 7-9: the generalized, dependency-ordered wiring
        // `tessera_service_framework` exists for. Each initializer reads what an earlier one
        // registered and, for the long-running subsystems, spawns its task against the node's
        // own shutdown signal.
        let handles = StackBuilder::new(self.shutdown.to_signal())
            .add_initializer(RoutedHostInitializer {
                comms: comms.clone(),
                routing: routing.clone(),
            })
            .add_initializer(ExchangeInitializer {
                blockstore: blockstore.clone(),
            })
            .add_initializer(NamesysInitializer {
                identity: identity.clone(),
            })
            .add_initializer(ReprovideInitializer {
                blockstore,
                interval: DEFAULT_REPROVIDE_INTERVAL,
            })
            .add_initializer(DiscoveryInitializer {
                enabled: config.discovery.mdns.enabled,
                config: discovery_config,
                slot: discovery_slot.clone(),
            })
            .add_initializer(BootstrapInitializer {
                supplier: Arc::new(ConfigPeerSupplier::new(shared_config)),
                config: BootstrapConfig::default(),
                slot: bootstrap_slot.clone(),
            })
            .build()
            .await
            .map_err(|e| ExitError::new(ExitCode::NetworkError, e))?;

        let host: RoutedHost = handles.expect_handle();
        let exchange: Arc<BitswapExchange<BoxedRouting, YesManStrategy>> = handles.expect_handle();
        let resolver: Arc<Resolver<BoxedRouting>> = handles.expect_handle();
        let publisher: Arc<Publisher<BoxedRouting>> = handles.expect_handle();
        let republisher: Arc<Republisher<BoxedRouting>> = handles.expect_handle();

        let discovery = discovery_slot.lock().expect("poisoned").take();
        let bootstrap = bootstrap_slot
            .lock()
            .expect("poisoned")
            .take()
            .expect("BootstrapInitializer always fills its slot before returning Ok");

        self.routing = Some(routing);
        self.resolver = Some(resolver);
        self.publisher = Some(publisher);
        self.identity = Some(identity);
        self.mode = NodeMode::Online;
        self.online = Some(OnlineHandles {
            comms,
            host,
            exchange,
            republisher,
            discovery,
            bootstrap,
        });
        Ok(())
    }

    /// Idempotent teardown. Attempts every closer and returns the first error encountered. Order
    /// honors §3's two pinned constraints: the name system has no handle to close of its own (it
    /// holds no task or socket), so the network/exchange layer closes first, and the repository
    /// closes last of all.
    pub async fn close(&mut self) -> Result<(), ExitError> {
        let mut first_error = None;

        if let Some(online) = self.online.take() {
            let OnlineHandles {
                comms: _comms,
                host: _host,
                exchange,
                republisher: _republisher,
                discovery,
                bootstrap,
            } = online;

            bootstrap.close().await;
            if let Some(discovery) = discovery {
                discovery.close().await;
            }
            // The exchange and republisher loops observe `self.shutdown`; triggering it below
            // asks them to return. They're not joined here because neither hands back a
            // `JoinHandle` of its own (see `Exchange::run`/`Republisher::run`'s contracts).
            drop(exchange);
        }

        self.shutdown.trigger();

        if let Err(err) = self.repository.close() {
            first_error.get_or_insert(ExitError::new(ExitCode::IoError, err));
        }

        self.mode = NodeMode::Uninitialized;
        info!(target: LOG_TARGET, "node closed");
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

const LOG_TARGET: &str = "tessera::node";

/// §4.1 construct-online step 1 / §7: loads the private key configured for this node, preferring
/// `config.identity.private_key` (§6) over the repository's persisted slot, and verifies it
/// derives `config.identity.peer_id` if one is configured. Fails fatally if neither source has a
/// key — matching the original `loadID`'s behavior, creating the initial keypair is the job of an
/// init step outside this core's four lifecycle operations, not something `construct-offline`/
/// `construct-online` does on the caller's behalf.
fn load_identity(repository: &Repository, config: &RepositoryConfig) -> Result<Arc<NodeIdentity>, ExitError> {
    let private_key_b64 = match &config.identity.private_key {
        Some(private_key_b64) => private_key_b64.clone(),
        None => repository
            .load_private_key()
            .map_err(|e| ExitError::new(ExitCode::IoError, e))?
            .ok_or_else(|| ExitError::new(ExitCode::IdentityError, IdentityError::NotSet))?,
    };

    NodeIdentity::load(&private_key_b64, config.identity.peer_id.as_deref(), Vec::new())
        .map_err(|e| ExitError::new(ExitCode::IdentityError, e))
}

struct RoutedHostInitializer {
    comms: CommsNode,
    routing: Arc<BoxedRouting>,
}

#[async_trait]
impl ServiceInitializer for RoutedHostInitializer {
    async fn initialize(&mut self, context: ServiceInitializerContext) -> Result<(), ServiceInitializationError> {
        context.handles().register(self.comms.clone());
        context.handles().register(self.routing.clone());
        context.handles().register(RoutedHost::new(self.comms.clone(), self.routing.clone()));
        Ok(())
    }
}

struct ExchangeInitializer {
    blockstore: Blockstore,
}

#[async_trait]
impl ServiceInitializer for ExchangeInitializer {
    async fn initialize(&mut self, context: ServiceInitializerContext) -> Result<(), ServiceInitializationError> {
        let comms: CommsNode = context.handles().expect_handle();
        let routing: Arc<BoxedRouting> = context.handles().expect_handle();
        let exchange = Arc::new(BitswapExchange::new(comms, self.blockstore.clone(), routing, YesManStrategy));

        let signal = context.shutdown_signal();
        let running = exchange.clone();
        context.spawn_until_shutdown(async move { running.run(signal).await });

        context.handles().register(exchange);
        Ok(())
    }
}

struct NamesysInitializer {
    identity: Arc<NodeIdentity>,
}

#[async_trait]
impl ServiceInitializer for NamesysInitializer {
    async fn initialize(&mut self, context: ServiceInitializerContext) -> Result<(), ServiceInitializationError> {
        let routing: Arc<BoxedRouting> = context.handles().expect_handle();
        let resolver = Arc::new(Resolver::new(routing.clone()));
        let publisher = Arc::new(Publisher::new(routing.clone()));
        let republisher = Arc::new(Republisher::new(routing, self.identity.clone(), DEFAULT_REPUBLISH_INTERVAL));
        republisher.register(self.identity.identifier()).await;

        let signal = context.shutdown_signal();
        let running = republisher.clone();
        context.spawn_until_shutdown(async move { running.run(signal).await });

        context.handles().register(resolver);
        context.handles().register(publisher);
        context.handles().register(republisher);
        Ok(())
    }
}

struct ReprovideInitializer {
    blockstore: Blockstore,
    interval: Duration,
}

#[async_trait]
impl ServiceInitializer for ReprovideInitializer {
    async fn initialize(&mut self, context: ServiceInitializerContext) -> Result<(), ServiceInitializationError> {
        let routing: Arc<BoxedRouting> = context.handles().expect_handle();
        let reprovide = Arc::new(ReprovideLoop::new(self.blockstore.clone(), routing, self.interval));

        let signal = context.shutdown_signal();
        context.spawn_until_shutdown(async move { reprovide.run(signal).await });
        Ok(())
    }
}

struct DiscoveryInitializer {
    enabled: bool,
    config: DiscoveryConfig,
    slot: Arc<StdMutex<Option<DiscoveryHandle>>>,
}

#[async_trait]
impl ServiceInitializer for DiscoveryInitializer {
    async fn initialize(&mut self, context: ServiceInitializerContext) -> Result<(), ServiceInitializationError> {
        if !self.enabled {
            return Ok(());
        }
        let comms: CommsNode = context.handles().expect_handle();
        info!(target: LOG_TARGET, "starting link-local discovery");
        let handle = Discovery::new(comms, self.config.clone()).spawn();
        *self.slot.lock().expect("poisoned") = Some(handle);
        Ok(())
    }
}

struct BootstrapInitializer {
    supplier: Arc<ConfigPeerSupplier>,
    config: BootstrapConfig,
    slot: Arc<StdMutex<Option<BootstrapHandle>>>,
}

#[async_trait]
impl ServiceInitializer for BootstrapInitializer {
    async fn initialize(&mut self, context: ServiceInitializerContext) -> Result<(), ServiceInitializationError> {
        let comms: CommsNode = context.handles().expect_handle();
        let handle = start_bootstrap(comms, self.supplier.clone(), self.config.clone(), None).await;
        *self.slot.lock().expect("poisoned") = Some(handle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tessera_comms::PeerFeatures;

    use super::*;

    /// Base64-encodes a freshly generated identity's keypair the way `config.identity.private_key`
    /// is expected to hold it.
    fn encode_private_key(identity: &NodeIdentity) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(identity.keypair().to_protobuf_encoding().unwrap())
    }

    /// A config carrying a real, matching `{peer_id, private_key}` pair, the way a node with an
    /// already-initialized identity would have one on disk.
    fn config_with_swarm_address(addr: &str) -> RepositoryConfig {
        use tessera_common::config::{AddressesConfig, DiscoveryConfig as ConfigDiscovery, IdentityConfig, MdnsConfig, SwarmConfig};
        let identity = NodeIdentity::generate(Vec::new(), PeerFeatures::default());
        RepositoryConfig {
            identity: IdentityConfig {
                peer_id: Some(identity.identifier().to_string()),
                private_key: Some(encode_private_key(&identity)),
            },
            addresses: AddressesConfig {
                swarm: vec![addr.to_string()],
                api: None,
            },
            swarm: SwarmConfig::default(),
            discovery: ConfigDiscovery {
                mdns: MdnsConfig::default(),
            },
            bootstrap: Vec::new(),
        }
    }

    #[test]
    fn fresh_node_is_uninitialized() {
        let repo = Repository::open_temporary().unwrap();
        let node = Node::new(repo);
        assert_eq!(node.mode(), NodeMode::Uninitialized);
        assert!(node.identity().is_none());
        assert!(node.routing().is_none());
    }

    #[test]
    fn construct_offline_installs_a_local_router_and_opens_no_sockets() {
        let repo = Repository::open_temporary().unwrap();
        let mut node = Node::new(repo);
        let config = config_with_swarm_address("/ip4/127.0.0.1/tcp/0");
        node.construct_offline(&config).unwrap();
        assert_eq!(node.mode(), NodeMode::Offline);
        assert!(node.identity().is_some());
        assert!(node.routing().is_some());
        assert!(node.routed_host().is_none());
    }

    #[test]
    fn construct_offline_twice_is_already_initialized() {
        let repo = Repository::open_temporary().unwrap();
        let mut node = Node::new(repo);
        let config = config_with_swarm_address("/ip4/127.0.0.1/tcp/0");
        node.construct_offline(&config).unwrap();
        let err = node.construct_offline(&config).unwrap_err();
        assert_eq!(err.exit_code, ExitCode::AlreadyInitialized);
    }

    #[tokio::test]
    async fn construct_online_rejects_an_all_filtered_address_list() {
        let repo = Repository::open_temporary().unwrap();
        let mut node = Node::new(repo);
        let mut config = config_with_swarm_address("/ip4/127.0.0.1/tcp/0");
        config.swarm.addr_filters = vec!["127.0.0.0/8".to_string()];
        let err = node.construct_online(&config, RoutingChoice::Dht).await.unwrap_err();
        assert_eq!(err.exit_code, ExitCode::NetworkError);
        assert_eq!(node.mode(), NodeMode::Uninitialized);
    }

    #[tokio::test]
    async fn construct_online_twice_is_node_already_online() {
        let repo = Repository::open_temporary().unwrap();
        let mut node = Node::new(repo);
        let config = config_with_swarm_address("/ip4/127.0.0.1/tcp/0");
        node.construct_online(&config, RoutingChoice::Dht).await.unwrap();
        assert_eq!(node.mode(), NodeMode::Online);
        let err = node.construct_online(&config, RoutingChoice::Dht).await.unwrap_err();
        assert_eq!(err.exit_code, ExitCode::AlreadyInitialized);
        node.close().await.unwrap();
    }

    #[tokio::test]
    async fn close_is_idempotent_and_resets_mode() {
        let repo = Repository::open_temporary().unwrap();
        let mut node = Node::new(repo);
        let config = config_with_swarm_address("/ip4/127.0.0.1/tcp/0");
        node.construct_online(&config, RoutingChoice::Dht).await.unwrap();
        node.close().await.unwrap();
        assert_eq!(node.mode(), NodeMode::Uninitialized);
        node.close().await.unwrap();
    }

    /// §4.1 step 1 / §7: an empty repository with no `identity.private_key` configured is a
    /// fatal "identity not set" error, not a reason to mint a fresh keypair.
    #[test]
    fn construct_offline_fails_when_no_identity_is_configured() {
        let repo = Repository::open_temporary().unwrap();
        let mut node = Node::new(repo);
        let mut config = config_with_swarm_address("/ip4/127.0.0.1/tcp/0");
        config.identity.private_key = None;
        let err = node.construct_offline(&config).unwrap_err();
        assert_eq!(err.exit_code, ExitCode::IdentityError);
        assert_eq!(node.mode(), NodeMode::Uninitialized);
        assert!(node.identity().is_none());
    }

    /// §8's invariant: a configured `peer_id` that the private key doesn't derive is fatal, even
    /// though the private key itself decodes fine — end-to-end scenario #2.
    #[test]
    fn construct_offline_fails_on_identity_mismatch() {
        let repo = Repository::open_temporary().unwrap();
        let mut node = Node::new(repo);
        let mut config = config_with_swarm_address("/ip4/127.0.0.1/tcp/0");
        let other = NodeIdentity::generate(Vec::new(), PeerFeatures::default());
        config.identity.peer_id = Some(other.identifier().to_string());
        let err = node.construct_offline(&config).unwrap_err();
        assert_eq!(err.exit_code, ExitCode::IdentityError);
        assert_eq!(node.mode(), NodeMode::Uninitialized);
    }

    /// `config.identity.private_key` (§6), not only the repository's persisted slot, must be a
    /// usable source of the node's identity.
    #[test]
    fn construct_offline_loads_identity_from_config_private_key() {
        let repo = Repository::open_temporary().unwrap();
        let mut node = Node::new(repo);
        let config = config_with_swarm_address("/ip4/127.0.0.1/tcp/0");
        let expected = config.identity.peer_id.clone().unwrap();
        node.construct_offline(&config).unwrap();
        assert_eq!(node.identity().unwrap().identifier().to_string(), expected);
    }
}
