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

//! A cooperative shutdown signal.
//!
//! [`Shutdown`] is the trigger, owned by whoever is allowed to stop the process tree (usually
//! the application's `main`). [`ShutdownSignal`] is the cheaply-cloneable receiver handed to
//! every task that must observe the signal; it implements `Future` and resolves once
//! [`Shutdown::trigger`] has been called, or once the `Shutdown` is dropped.

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::sync::watch;

/// Owns the trigger side of a shutdown signal.
pub struct Shutdown {
    sender: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    /// Returns a new [`ShutdownSignal`] tied to this trigger.
    pub fn to_signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.sender.subscribe(),
        }
    }

    /// Triggers the shutdown signal. Idempotent: subsequent calls are no-ops.
    pub fn trigger(&mut self) {
        let _ = self.sender.send(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Shutdown {
    fn drop(&mut self) {
        self.trigger();
    }
}

/// A cloneable handle that resolves once the owning [`Shutdown`] has been triggered (or dropped).
#[derive(Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Waits for the shutdown signal. Convenience wrapper so callers don't need to import
    /// `std::future::Future` just to `.await` a signal.
    pub async fn wait(mut self) {
        // `has_changed` errors only when the sender is dropped, which itself means triggered.
        while !*self.receiver.borrow() {
            if self.receiver.changed().await.is_err() {
                return;
            }
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }
}

impl Future for ShutdownSignal {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.is_triggered() {
            return Poll::Ready(());
        }
        let this = self.get_mut();
        let mut changed = Box::pin(this.receiver.changed());
        match changed.as_mut().poll(cx) {
            Poll::Ready(Ok(())) | Poll::Ready(Err(_)) => Poll::Ready(()),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl std::fmt::Debug for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ShutdownSignal {{ triggered: {} }}", self.is_triggered())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn it_resolves_on_trigger() {
        let mut shutdown = Shutdown::new();
        let signal = shutdown.to_signal();
        assert!(!signal.is_triggered());
        shutdown.trigger();
        tokio::time::timeout(Duration::from_millis(100), signal.wait())
            .await
            .expect("signal should resolve promptly after trigger");
    }

    #[tokio::test]
    async fn it_resolves_on_drop() {
        let shutdown = Shutdown::new();
        let signal = shutdown.to_signal();
        drop(shutdown);
        tokio::time::timeout(Duration::from_millis(100), signal.wait())
            .await
            .expect("signal should resolve when the trigger is dropped");
    }

    #[tokio::test]
    async fn many_clones_all_resolve() {
        let mut shutdown = Shutdown::new();
        let signals: Vec<_> = (0..8).map(|_| shutdown.to_signal()).collect();
        shutdown.trigger();
        for signal in signals {
            tokio::time::timeout(Duration::from_millis(100), signal.wait())
                .await
                .expect("every clone should observe the trigger");
        }
    }

    #[test]
    fn trigger_is_idempotent() {
        let mut shutdown = Shutdown::new();
        shutdown.trigger();
        shutdown.trigger();
        assert!(shutdown.is_triggered());
    }
}
