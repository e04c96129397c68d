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

//! `CommsNode`: the only place in the process that touches the libp2p `Swarm` directly. Every
//! other subsystem — the DHT router, the bootstrapper, the exchange service — talks to it
//! through a command channel, the same actor shape the teacher uses for its discovery mock
//! (request in, oneshot reply out). This is how the node core's "cyclic reference" between the
//! peer host and its pluggable routing/exchange backends is broken: the host owns the swarm, and
//! hands out non-owning handles that can only ask it to do things.

use std::{collections::HashMap, sync::Arc, time::Duration};

use futures::StreamExt;
use libp2p::{
    identify,
    kad::{self, QueryId},
    mdns, ping,
    request_response::{self, OutboundRequestId, ResponseChannel},
    swarm::SwarmEvent,
    Multiaddr, PeerId, Swarm,
};
use log::{debug, info};
use tessera_shutdown::ShutdownSignal;
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex};

use crate::{
    bandwidth::BandwidthReporter,
    behaviour::{ExchangeMessage, SupernodeMessage, TesseraBehaviour, TesseraBehaviourEvent},
    builder::CommsError,
    identity::{NodeIdentifier, NodeIdentity},
    peerstore::Peerstore,
};

const LOG_TARGET: &str = "tessera::comms::node";

type Reply<T> = oneshot::Sender<Result<T, CommsError>>;

/// An inbound request on the block-exchange protocol. `tessera_exchange` is the only consumer:
/// it takes the receiver once (via [`CommsNode::take_exchange_requests`]) and answers each
/// request by calling [`CommsNode::respond_exchange`] with the matching `channel`.
pub struct InboundExchangeRequest {
    pub peer: NodeIdentifier,
    pub message: ExchangeMessage,
    pub channel: ResponseChannel<ExchangeMessage>,
}

pub enum DhtCommand {
    PutRecord { key: Vec<u8>, value: Vec<u8>, reply: Reply<()> },
    GetRecord { key: Vec<u8>, reply: Reply<Vec<Vec<u8>>> },
    StartProviding { key: Vec<u8>, reply: Reply<()> },
    GetProviders { key: Vec<u8>, reply: Reply<Vec<PeerId>> },
    FindPeer { peer: PeerId, reply: Reply<Vec<Multiaddr>> },
    Bootstrap { reply: Reply<()> },
}

pub enum CommsCommand {
    Dial { address: Multiaddr, reply: Reply<()> },
    Ping { peer: PeerId, reply: Reply<Duration> },
    SendExchange { peer: PeerId, message: ExchangeMessage, reply: Reply<ExchangeMessage> },
    SendSupernode { peer: PeerId, message: SupernodeMessage, reply: Reply<SupernodeMessage> },
    RespondExchange { channel: ResponseChannel<ExchangeMessage>, message: ExchangeMessage },
    Dht(DhtCommand),
    ListenAddresses { reply: oneshot::Sender<Vec<Multiaddr>> },
}

enum PendingQuery {
    GetRecord(Reply<Vec<Vec<u8>>>),
    StartProviding(Reply<()>),
    GetProviders(Reply<Vec<PeerId>>),
    Bootstrap(Reply<()>),
}

/// A built but not-yet-running peer host. Listening and dialing begin only once `spawn` is
/// called, per §4.2's "build before listen" ordering.
pub struct UnspawnedCommsNode {
    swarm: Swarm<TesseraBehaviour>,
    node_identity: Arc<NodeIdentity>,
    shutdown_signal: ShutdownSignal,
    listen_addresses: Vec<Multiaddr>,
    peerstore: Peerstore,
    bandwidth: Arc<BandwidthReporter>,
}

impl UnspawnedCommsNode {
    pub(crate) fn new(
        swarm: Swarm<TesseraBehaviour>,
        node_identity: Arc<NodeIdentity>,
        shutdown_signal: ShutdownSignal,
        listen_addresses: Vec<Multiaddr>,
        peerstore: Peerstore,
        bandwidth: Arc<BandwidthReporter>,
    ) -> Self {
        Self {
            swarm,
            node_identity,
            shutdown_signal,
            listen_addresses,
            peerstore,
            bandwidth,
        }
    }

    pub fn node_identity(&self) -> Arc<NodeIdentity> {
        self.node_identity.clone()
    }

    pub fn peerstore(&self) -> Peerstore {
        self.peerstore.clone()
    }

    /// Starts listening on the configured addresses and spawns the swarm-driving task. Returns a
    /// `CommsNode` handle immediately; the task itself runs until `shutdown_signal` resolves.
    pub fn spawn(mut self) -> Result<CommsNode, CommsError> {
        for addr in &self.listen_addresses {
            self.swarm
                .listen_on(addr.clone())
                .map_err(|source| CommsError::Listen { address: addr.clone(), source })?;
        }

        let (command_tx, command_rx) = mpsc::channel(256);
        let (exchange_request_tx, exchange_request_rx) = mpsc::channel(256);
        let node_identity = self.node_identity.clone();
        let peerstore = self.peerstore.clone();
        let bandwidth = self.bandwidth.clone();

        tokio::spawn(run_swarm_task(
            self.swarm,
            command_rx,
            self.peerstore,
            self.bandwidth,
            exchange_request_tx,
            self.shutdown_signal,
        ));

        Ok(CommsNode {
            node_identity,
            peerstore,
            bandwidth,
            command_tx,
            exchange_requests: Arc::new(AsyncMutex::new(Some(exchange_request_rx))),
        })
    }
}

/// A handle to a running peer host. Cheaply cloneable; every clone shares the same background
/// swarm task.
#[derive(Clone)]
pub struct CommsNode {
    node_identity: Arc<NodeIdentity>,
    peerstore: Peerstore,
    bandwidth: Arc<BandwidthReporter>,
    command_tx: mpsc::Sender<CommsCommand>,
    exchange_requests: Arc<AsyncMutex<Option<mpsc::Receiver<InboundExchangeRequest>>>>,
}

impl CommsNode {
    pub fn node_identity(&self) -> Arc<NodeIdentity> {
        self.node_identity.clone()
    }

    pub fn peerstore(&self) -> Peerstore {
        self.peerstore.clone()
    }

    pub fn bandwidth(&self) -> Arc<BandwidthReporter> {
        self.bandwidth.clone()
    }

    /// A non-owning handle into the DHT side of the command channel, for `tessera_routing`'s DHT
    /// implementation to use without ever touching the swarm.
    pub fn dht_handle(&self) -> DhtHandle {
        DhtHandle {
            command_tx: self.command_tx.clone(),
        }
    }

    pub async fn dial(&self, address: Multiaddr) -> Result<(), CommsError> {
        let (reply, rx) = oneshot::channel();
        self.send(CommsCommand::Dial { address, reply }, rx).await
    }

    pub async fn ping(&self, peer: PeerId) -> Result<Duration, CommsError> {
        let (reply, rx) = oneshot::channel();
        self.send(CommsCommand::Ping { peer, reply }, rx).await
    }

    pub async fn send_exchange_request(&self, peer: PeerId, message: ExchangeMessage) -> Result<ExchangeMessage, CommsError> {
        let (reply, rx) = oneshot::channel();
        self.send(CommsCommand::SendExchange { peer, message, reply }, rx).await
    }

    pub async fn send_supernode_request(&self, peer: PeerId, message: SupernodeMessage) -> Result<SupernodeMessage, CommsError> {
        let (reply, rx) = oneshot::channel();
        self.send(CommsCommand::SendSupernode { peer, message, reply }, rx).await
    }

    /// Takes the inbound exchange-request receiver. Returns `None` if already taken: only one
    /// subsystem (`tessera_exchange`'s service task) may own it at a time.
    pub async fn take_exchange_requests(&self) -> Option<mpsc::Receiver<InboundExchangeRequest>> {
        self.exchange_requests.lock().await.take()
    }

    /// Answers an inbound exchange request previously yielded by `take_exchange_requests`.
    pub async fn respond_exchange(&self, channel: ResponseChannel<ExchangeMessage>, message: ExchangeMessage) -> Result<(), CommsError> {
        self.command_tx
            .send(CommsCommand::RespondExchange { channel, message })
            .await
            .map_err(|_| CommsError::ShuttingDown)
    }

    pub async fn listen_addresses(&self) -> Vec<Multiaddr> {
        let (reply, rx) = oneshot::channel();
        if self.command_tx.send(CommsCommand::ListenAddresses { reply }).await.is_err() {
            return Vec::new();
        }
        rx.await.unwrap_or_default()
    }

    async fn send<T>(&self, command: CommsCommand, rx: oneshot::Receiver<Result<T, CommsError>>) -> Result<T, CommsError> {
        self.command_tx.send(command).await.map_err(|_| CommsError::ShuttingDown)?;
        rx.await.map_err(|_| CommsError::ShuttingDown)?
    }
}

/// Non-owning handle used by `tessera_routing`'s DHT backend to drive Kademlia operations on the
/// shared swarm, without the routing crate depending on (or owning) `libp2p::Swarm` itself.
#[derive(Clone)]
pub struct DhtHandle {
    command_tx: mpsc::Sender<CommsCommand>,
}

impl DhtHandle {
    pub async fn put_record(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), CommsError> {
        let (reply, rx) = oneshot::channel();
        self.dispatch(DhtCommand::PutRecord { key, value, reply }, rx).await
    }

    pub async fn get_record(&self, key: Vec<u8>) -> Result<Vec<Vec<u8>>, CommsError> {
        let (reply, rx) = oneshot::channel();
        self.dispatch(DhtCommand::GetRecord { key, reply }, rx).await
    }

    pub async fn start_providing(&self, key: Vec<u8>) -> Result<(), CommsError> {
        let (reply, rx) = oneshot::channel();
        self.dispatch(DhtCommand::StartProviding { key, reply }, rx).await
    }

    pub async fn get_providers(&self, key: Vec<u8>) -> Result<Vec<PeerId>, CommsError> {
        let (reply, rx) = oneshot::channel();
        self.dispatch(DhtCommand::GetProviders { key, reply }, rx).await
    }

    pub async fn find_peer(&self, peer: PeerId) -> Result<Vec<Multiaddr>, CommsError> {
        let (reply, rx) = oneshot::channel();
        self.dispatch(DhtCommand::FindPeer { peer, reply }, rx).await
    }

    pub async fn bootstrap(&self) -> Result<(), CommsError> {
        let (reply, rx) = oneshot::channel();
        self.dispatch(DhtCommand::Bootstrap { reply }, rx).await
    }

    async fn dispatch<T>(&self, command: DhtCommand, rx: oneshot::Receiver<Result<T, CommsError>>) -> Result<T, CommsError> {
        self.command_tx.send(CommsCommand::Dht(command)).await.map_err(|_| CommsError::ShuttingDown)?;
        rx.await.map_err(|_| CommsError::ShuttingDown)?
    }
}

async fn run_swarm_task(
    mut swarm: Swarm<TesseraBehaviour>,
    mut command_rx: mpsc::Receiver<CommsCommand>,
    peerstore: Peerstore,
    bandwidth: Arc<BandwidthReporter>,
    exchange_request_tx: mpsc::Sender<InboundExchangeRequest>,
    shutdown_signal: ShutdownSignal,
) {
    let mut pending_exchange: HashMap<OutboundRequestId, Reply<ExchangeMessage>> = HashMap::new();
    let mut pending_supernode: HashMap<OutboundRequestId, Reply<SupernodeMessage>> = HashMap::new();
    let mut pending_queries: HashMap<QueryId, PendingQuery> = HashMap::new();
    let mut last_ping_rtt: HashMap<PeerId, Duration> = HashMap::new();
    let mut dial_waiters: HashMap<PeerId, Vec<Reply<()>>> = HashMap::new();

    let mut shutdown_signal = shutdown_signal;
    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown_signal => {
                info!(target: LOG_TARGET, "peer host shutting down");
                break;
            }

            command = command_rx.recv() => {
                match command {
                    Some(command) => handle_command(
                        &mut swarm,
                        command,
                        &mut pending_exchange,
                        &mut pending_supernode,
                        &mut pending_queries,
                        &last_ping_rtt,
                        &mut dial_waiters,
                    ),
                    None => {
                        debug!(target: LOG_TARGET, "all comms node handles dropped, shutting down");
                        break;
                    }
                }
            }

            event = swarm.select_next_some() => {
                handle_swarm_event(
                    event,
                    &peerstore,
                    &bandwidth,
                    &mut pending_exchange,
                    &mut pending_supernode,
                    &mut pending_queries,
                    &mut last_ping_rtt,
                    &mut dial_waiters,
                    &exchange_request_tx,
                ).await;
            }
        }
    }
}

fn handle_command(
    swarm: &mut Swarm<TesseraBehaviour>,
    command: CommsCommand,
    pending_exchange: &mut HashMap<OutboundRequestId, Reply<ExchangeMessage>>,
    pending_supernode: &mut HashMap<OutboundRequestId, Reply<SupernodeMessage>>,
    pending_queries: &mut HashMap<QueryId, PendingQuery>,
    last_ping_rtt: &HashMap<PeerId, Duration>,
    dial_waiters: &mut HashMap<PeerId, Vec<Reply<()>>>,
) {
    match command {
        CommsCommand::Dial { address, reply } => {
            let peer = extract_peer_id(&address);
            match swarm.dial(address.clone()) {
                Ok(()) => match peer {
                    // A peer id is present in the address: wait for ConnectionEstablished /
                    // OutgoingConnectionError to resolve this reply.
                    Some(peer) => dial_waiters.entry(peer).or_default().push(reply),
                    // No peer id component to correlate against; libp2p accepted the dial, that's
                    // as much confirmation as we can give without one.
                    None => {
                        let _ = reply.send(Ok(()));
                    }
                },
                Err(e) => {
                    let _ = reply.send(Err(CommsError::Dial { address, source: e.to_string() }));
                }
            }
        }
        CommsCommand::Ping { peer, reply } => {
            let result = last_ping_rtt
                .get(&peer)
                .copied()
                .ok_or_else(|| CommsError::Transport(format!("no ping round-trip recorded yet for {peer}")));
            let _ = reply.send(result);
        }
        CommsCommand::SendExchange { peer, message, reply } => {
            if let Some(exchange) = swarm.behaviour_mut().exchange.as_mut() {
                let request_id = exchange.send_request(&peer, message);
                pending_exchange.insert(request_id, reply);
            } else {
                let _ = reply.send(Err(CommsError::Transport("exchange protocol is not enabled on this node".into())));
            }
        }
        CommsCommand::SendSupernode { peer, message, reply } => {
            if let Some(supernode) = swarm.behaviour_mut().supernode.as_mut() {
                let request_id = supernode.send_request(&peer, message);
                pending_supernode.insert(request_id, reply);
            } else {
                let _ = reply.send(Err(CommsError::Transport("supernode proxy protocol is not enabled on this node".into())));
            }
        }
        CommsCommand::RespondExchange { channel, message } => {
            if let Some(exchange) = swarm.behaviour_mut().exchange.as_mut() {
                let _ = exchange.send_response(channel, message);
            }
        }
        CommsCommand::Dht(dht_command) => handle_dht_command(swarm, dht_command, pending_queries),
        CommsCommand::ListenAddresses { reply } => {
            let addrs = swarm.listeners().cloned().collect();
            let _ = reply.send(addrs);
        }
    }
}

fn handle_dht_command(swarm: &mut Swarm<TesseraBehaviour>, command: DhtCommand, pending_queries: &mut HashMap<QueryId, PendingQuery>) {
    let Some(kad) = swarm.behaviour_mut().kad.as_mut() else {
        let err = || CommsError::Transport("DHT routing is not enabled on this node".into());
        match command {
            DhtCommand::PutRecord { reply, .. } => { let _ = reply.send(Err(err())); }
            DhtCommand::GetRecord { reply, .. } => { let _ = reply.send(Err(err())); }
            DhtCommand::StartProviding { reply, .. } => { let _ = reply.send(Err(err())); }
            DhtCommand::GetProviders { reply, .. } => { let _ = reply.send(Err(err())); }
            DhtCommand::FindPeer { reply, .. } => { let _ = reply.send(Err(err())); }
            DhtCommand::Bootstrap { reply } => { let _ = reply.send(Err(err())); }
        }
        return;
    };

    match command {
        DhtCommand::PutRecord { key, value, reply } => {
            let record = kad::Record::new(key, value);
            match kad.put_record(record, kad::Quorum::One) {
                Ok(_) => {
                    let _ = reply.send(Ok(()));
                }
                Err(e) => {
                    let _ = reply.send(Err(CommsError::Transport(e.to_string())));
                }
            }
        }
        DhtCommand::GetRecord { key, reply } => {
            let query_id = kad.get_record(kad::RecordKey::new(&key));
            pending_queries.insert(query_id, PendingQuery::GetRecord(reply));
        }
        DhtCommand::StartProviding { key, reply } => match kad.start_providing(kad::RecordKey::new(&key)) {
            Ok(query_id) => {
                pending_queries.insert(query_id, PendingQuery::StartProviding(reply));
            }
            Err(e) => {
                let _ = reply.send(Err(CommsError::Transport(e.to_string())));
            }
        },
        DhtCommand::GetProviders { key, reply } => {
            let query_id = kad.get_providers(kad::RecordKey::new(&key));
            pending_queries.insert(query_id, PendingQuery::GetProviders(reply));
        }
        DhtCommand::FindPeer { peer, reply } => {
            let addresses = kad.addresses_of_peer(&peer);
            let _ = reply.send(Ok(addresses));
        }
        DhtCommand::Bootstrap { reply } => match kad.bootstrap() {
            Ok(query_id) => {
                pending_queries.insert(query_id, PendingQuery::Bootstrap(reply));
            }
            Err(e) => {
                let _ = reply.send(Err(CommsError::Transport(e.to_string())));
            }
        },
    }
}

async fn handle_swarm_event(
    event: SwarmEvent<TesseraBehaviourEvent>,
    peerstore: &Peerstore,
    bandwidth: &Arc<BandwidthReporter>,
    pending_exchange: &mut HashMap<OutboundRequestId, Reply<ExchangeMessage>>,
    pending_supernode: &mut HashMap<OutboundRequestId, Reply<SupernodeMessage>>,
    pending_queries: &mut HashMap<QueryId, PendingQuery>,
    last_ping_rtt: &mut HashMap<PeerId, Duration>,
    dial_waiters: &mut HashMap<PeerId, Vec<Reply<()>>>,
    exchange_request_tx: &mpsc::Sender<InboundExchangeRequest>,
) {
    match event {
        SwarmEvent::ConnectionEstablished { peer_id, endpoint, .. } => {
            peerstore.mark_connected(&crate::identity::NodeIdentifier::from(peer_id)).await;
            peerstore
                .add_addresses(crate::identity::NodeIdentifier::from(peer_id), [endpoint.get_remote_address().clone()])
                .await;
            if let Some(waiters) = dial_waiters.remove(&peer_id) {
                for waiter in waiters {
                    let _ = waiter.send(Ok(()));
                }
            }
        }
        SwarmEvent::OutgoingConnectionError { peer_id: Some(peer_id), error, .. } => {
            if let Some(waiters) = dial_waiters.remove(&peer_id) {
                for waiter in waiters {
                    let _ = waiter.send(Err(CommsError::Transport(error.to_string())));
                }
            }
        }
        SwarmEvent::Behaviour(TesseraBehaviourEvent::Ping(ping::Event { peer, result: Ok(rtt), .. })) => {
            last_ping_rtt.insert(peer, rtt);
        }
        SwarmEvent::Behaviour(TesseraBehaviourEvent::Identify(identify::Event::Received { peer_id, info, .. })) => {
            peerstore
                .add_addresses(crate::identity::NodeIdentifier::from(peer_id), info.listen_addrs)
                .await;
        }
        SwarmEvent::Behaviour(TesseraBehaviourEvent::Mdns(mdns::Event::Discovered(discovered))) => {
            for (peer_id, addr) in discovered {
                peerstore.add_addresses(crate::identity::NodeIdentifier::from(peer_id), [addr]).await;
            }
        }
        SwarmEvent::Behaviour(TesseraBehaviourEvent::Exchange(request_response::Event::Message { peer, message, .. })) => match message {
            request_response::Message::Response { request_id, response } => {
                if let Some(reply) = pending_exchange.remove(&request_id) {
                    record_received(bandwidth, &response.0);
                    let _ = reply.send(Ok(response));
                }
            }
            request_response::Message::Request { request, channel, .. } => {
                record_received(bandwidth, &request.0);
                let inbound = InboundExchangeRequest {
                    peer: crate::identity::NodeIdentifier::from(peer),
                    message: request,
                    channel,
                };
                // If tessera_exchange hasn't taken the receiver (or has dropped it), the request
                // is simply unanswered; the requesting peer's own retry/timeout logic handles it.
                let _ = exchange_request_tx.try_send(inbound);
            }
        },
        SwarmEvent::Behaviour(TesseraBehaviourEvent::Exchange(request_response::Event::OutboundFailure { request_id, error, .. })) => {
            if let Some(reply) = pending_exchange.remove(&request_id) {
                let _ = reply.send(Err(CommsError::Transport(error.to_string())));
            }
        }
        SwarmEvent::Behaviour(TesseraBehaviourEvent::Supernode(request_response::Event::Message { message, .. })) => match message {
            request_response::Message::Response { request_id, response } => {
                if let Some(reply) = pending_supernode.remove(&request_id) {
                    record_received(bandwidth, &response.0);
                    let _ = reply.send(Ok(response));
                }
            }
            request_response::Message::Request { .. } => {}
        },
        SwarmEvent::Behaviour(TesseraBehaviourEvent::Supernode(request_response::Event::OutboundFailure { request_id, error, .. })) => {
            if let Some(reply) = pending_supernode.remove(&request_id) {
                let _ = reply.send(Err(CommsError::Transport(error.to_string())));
            }
        }
        SwarmEvent::Behaviour(TesseraBehaviourEvent::Kad(kad::Event::OutboundQueryProgressed { id, result, .. })) => {
            complete_kad_query(id, result, pending_queries);
        }
        other => {
            debug!(target: LOG_TARGET, "unhandled swarm event: {other:?}");
        }
    }
}

fn complete_kad_query(id: QueryId, result: kad::QueryResult, pending_queries: &mut HashMap<QueryId, PendingQuery>) {
    match result {
        kad::QueryResult::GetRecord(result) => {
            if let Some(PendingQuery::GetRecord(reply)) = pending_queries.remove(&id) {
                let values = match result {
                    Ok(kad::GetRecordOk::FoundRecord(peer_record)) => vec![peer_record.record.value],
                    Ok(kad::GetRecordOk::FinishedWithNoAdditionalRecord { .. }) => Vec::new(),
                    Err(e) => {
                        let _ = reply.send(Err(CommsError::Transport(e.to_string())));
                        return;
                    }
                };
                let _ = reply.send(Ok(values));
            }
        }
        kad::QueryResult::StartProviding(result) => {
            if let Some(PendingQuery::StartProviding(reply)) = pending_queries.remove(&id) {
                let _ = reply.send(result.map(|_| ()).map_err(|e| CommsError::Transport(e.to_string())));
            }
        }
        kad::QueryResult::GetProviders(result) => {
            if let Some(PendingQuery::GetProviders(reply)) = pending_queries.remove(&id) {
                let providers = match result {
                    Ok(kad::GetProvidersOk::FoundProviders { providers, .. }) => providers.into_iter().collect(),
                    Ok(kad::GetProvidersOk::FinishedWithNoAdditionalRecord { .. }) => Vec::new(),
                    Err(e) => {
                        let _ = reply.send(Err(CommsError::Transport(e.to_string())));
                        return;
                    }
                };
                let _ = reply.send(Ok(providers));
            }
        }
        kad::QueryResult::Bootstrap(result) => {
            if let Some(PendingQuery::Bootstrap(reply)) = pending_queries.remove(&id) {
                let _ = reply.send(result.map(|_| ()).map_err(|e| CommsError::Transport(e.to_string())));
            }
        }
        _ => {}
    }
}

fn record_received(bandwidth: &Arc<BandwidthReporter>, payload: &[u8]) {
    bandwidth.record_received(payload.len() as u64);
}

fn extract_peer_id(address: &Multiaddr) -> Option<PeerId> {
    address.iter().find_map(|proto| match proto {
        libp2p::multiaddr::Protocol::P2p(peer_id) => Some(peer_id),
        _ => None,
    })
}
