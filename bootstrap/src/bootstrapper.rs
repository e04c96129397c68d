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

//! §4.3: on each tick, count current peers; if below the configured minimum, sample up to the
//! shortfall from the supplier at random without replacement, skipping peers already connected,
//! and dial them concurrently with a per-dial timeout. Dial failures are logged and never abort
//! the tick.

use std::{sync::Arc, time::Duration};

use log::{debug, info, warn};
use multiaddr::Multiaddr;
use rand::seq::SliceRandom;
use tessera_comms::CommsNode;
use tessera_shutdown::{Shutdown, ShutdownSignal};

use crate::supplier::PeerSupplier;

const LOG_TARGET: &str = "tessera::bootstrap";

#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub period: Duration,
    pub min_peer_count: usize,
    pub dial_timeout: Duration,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(30),
            min_peer_count: 4,
            dial_timeout: Duration::from_secs(10),
        }
    }
}

pub struct Bootstrapper<S: PeerSupplier> {
    comms: CommsNode,
    supplier: Arc<S>,
    config: BootstrapConfig,
}

impl<S: PeerSupplier + 'static> Bootstrapper<S> {
    pub fn new(comms: CommsNode, supplier: Arc<S>, config: BootstrapConfig) -> Self {
        Self { comms, supplier, config }
    }

    /// Spawns the tick loop and returns a closable handle. Closing the handle stops the loop and
    /// waits for its timer and in-flight dials to release before returning.
    pub fn spawn(self) -> BootstrapHandle {
        let shutdown = Shutdown::new();
        let signal = shutdown.to_signal();
        let join_handle = tokio::spawn(async move { self.run(signal).await });
        BootstrapHandle { shutdown, join_handle }
    }

    async fn run(&self, mut shutdown_signal: ShutdownSignal) {
        let mut ticker = tokio::time::interval(self.config.period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown_signal => break,
                _ = ticker.tick() => self.tick().await,
            }
        }
    }

    async fn tick(&self) {
        let peers = self.comms.peerstore().all().await;
        let current = peers.iter().filter(|p| p.last_connected_at().is_some()).count();
        if current >= self.config.min_peer_count {
            debug!(target: LOG_TARGET, "{current}/{} peers connected, nothing to do", self.config.min_peer_count);
            return;
        }

        let shortfall = self.config.min_peer_count - current;
        let candidates = self.supplier.peers().await;
        let already_connected: Vec<&Multiaddr> = peers
            .iter()
            .filter(|p| p.last_connected_at().is_some())
            .flat_map(|p| p.addresses())
            .collect();
        let mut unconnected: Vec<Multiaddr> = candidates
            .into_iter()
            .filter(|addr| !already_connected.contains(&addr))
            .collect();

        let mut rng = rand::thread_rng();
        unconnected.shuffle(&mut rng);
        let selection: Vec<Multiaddr> = unconnected.into_iter().take(shortfall).collect();
        if selection.is_empty() {
            debug!(target: LOG_TARGET, "below minimum peer count but no unconnected candidates available");
            return;
        }

        info!(target: LOG_TARGET, "dialing {} peer(s) to reach minimum of {}", selection.len(), self.config.min_peer_count);
        let dials = selection.into_iter().map(|addr| self.dial_with_timeout(addr));
        futures::future::join_all(dials).await;
    }

    async fn dial_with_timeout(&self, addr: Multiaddr) {
        match tokio::time::timeout(self.config.dial_timeout, self.comms.dial(addr.clone())).await {
            Ok(Ok(())) => debug!(target: LOG_TARGET, "dial to {addr} initiated"),
            Ok(Err(err)) => warn!(target: LOG_TARGET, "dial to {addr} failed: {err}"),
            Err(_) => warn!(target: LOG_TARGET, "dial to {addr} timed out"),
        }
    }
}

/// A closable handle to a running bootstrapper task. Dropping it without calling [`close`] still
/// stops the loop — `Shutdown`'s `Drop` triggers the signal — but `close` additionally waits for
/// the task to fully exit before returning.
///
/// [`close`]: BootstrapHandle::close
pub struct BootstrapHandle {
    shutdown: Shutdown,
    join_handle: tokio::task::JoinHandle<()>,
}

impl BootstrapHandle {
    pub async fn close(mut self) {
        self.shutdown.trigger();
        let _ = self.join_handle.await;
    }
}

/// Starts a bootstrapper over `supplier`. If `previous` is `Some`, it is closed first: §4.3's
/// "starting bootstrap while a previous instance is live closes the previous instance first."
pub async fn start<S: PeerSupplier + 'static>(
    comms: CommsNode,
    supplier: Arc<S>,
    config: BootstrapConfig,
    previous: Option<BootstrapHandle>,
) -> BootstrapHandle {
    if let Some(previous) = previous {
        previous.close().await;
    }
    Bootstrapper::new(comms, supplier, config).spawn()
}
