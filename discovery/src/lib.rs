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

//! Link-local discovery (§2 item 11 / §4.1 step 8): the host's mDNS behaviour announces addresses
//! of peers it hears on the local network into the shared peerstore, but never dials them itself.
//! This crate closes that gap: on every tick it looks for peerstore entries that have addresses
//! but have never been connected, and dials each of them concurrently with a bounded timeout.
//! Failures are logged and never stop the loop; a peer that keeps failing is simply retried on
//! the next tick for as long as it stays in the peerstore.

use std::{collections::HashSet, time::Duration};

use log::{debug, info, warn};
use multiaddr::Multiaddr;
use tessera_comms::{CommsNode, NodeIdentifier};
use tessera_shutdown::{Shutdown, ShutdownSignal};

const LOG_TARGET: &str = "tessera::discovery";

/// Mirrors the original host's `discoveryConnTimeout`: how long a single dial of a newly
/// discovered peer is given before it's abandoned for this tick.
const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub interval: Duration,
    pub dial_timeout: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
        }
    }
}

pub struct Discovery {
    comms: CommsNode,
    config: DiscoveryConfig,
}

impl Discovery {
    pub fn new(comms: CommsNode, config: DiscoveryConfig) -> Self {
        Self { comms, config }
    }

    /// Spawns the tick loop and returns a closable handle.
    pub fn spawn(self) -> DiscoveryHandle {
        let shutdown = Shutdown::new();
        let signal = shutdown.to_signal();
        let join_handle = tokio::spawn(async move { self.run(signal).await });
        DiscoveryHandle { shutdown, join_handle }
    }

    async fn run(&self, mut shutdown_signal: ShutdownSignal) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown_signal => break,
                _ = ticker.tick() => self.tick().await,
            }
        }
    }

    async fn tick(&self) {
        let candidates: Vec<(NodeIdentifier, Vec<Multiaddr>)> = self
            .comms
            .peerstore()
            .all()
            .await
            .into_iter()
            .filter(|peer| peer.last_connected_at().is_none() && !peer.addresses().is_empty())
            .map(|peer| (peer.identifier(), peer.addresses().to_vec()))
            .collect();

        if candidates.is_empty() {
            return;
        }

        info!(target: LOG_TARGET, "connecting {} newly discovered peer(s)", candidates.len());
        let dials = candidates.into_iter().map(|(id, addresses)| self.connect(id, addresses));
        futures::future::join_all(dials).await;
    }

    /// Tries each known address for a discovered peer in turn, stopping at the first dial that
    /// succeeds within the timeout. Mirrors a direct connect attempt rather than the
    /// bootstrapper's random sampling: a freshly discovered peer has too few addresses to
    /// benefit from sampling and should be connected eagerly.
    async fn connect(&self, id: NodeIdentifier, addresses: Vec<Multiaddr>) {
        let mut tried = HashSet::new();
        for addr in addresses {
            if !tried.insert(addr.clone()) {
                continue;
            }
            match tokio::time::timeout(self.config.dial_timeout, self.comms.dial(addr.clone())).await {
                Ok(Ok(())) => {
                    debug!(target: LOG_TARGET, "connected to discovered peer {id} at {addr}");
                    return;
                },
                Ok(Err(err)) => warn!(target: LOG_TARGET, "dial to discovered peer {id} at {addr} failed: {err}"),
                Err(_) => warn!(target: LOG_TARGET, "dial to discovered peer {id} at {addr} timed out"),
            }
        }
    }
}

/// A closable handle to a running discovery task. Dropping it without calling [`close`] still
/// stops the loop, but `close` additionally waits for the task to fully exit.
///
/// [`close`]: DiscoveryHandle::close
pub struct DiscoveryHandle {
    shutdown: Shutdown,
    join_handle: tokio::task::JoinHandle<()>,
}

impl DiscoveryHandle {
    pub async fn close(mut self) {
        self.shutdown.trigger();
        let _ = self.join_handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dial_timeout_matches_thirty_seconds() {
        assert_eq!(DiscoveryConfig::default().dial_timeout, Duration::from_secs(30));
    }
}
