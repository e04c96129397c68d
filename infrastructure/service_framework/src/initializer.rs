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

use async_trait::async_trait;
use tessera_shutdown::ShutdownSignal;
use thiserror::Error;

use crate::handles::ServiceHandles;

#[derive(Debug, Error)]
pub enum ServiceInitializationError {
    #[error("service '{service}' failed to initialize: {source}")]
    Failed {
        service: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ServiceInitializationError {
    pub fn new(service: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Failed {
            service,
            source: source.into(),
        }
    }
}

/// Context handed to each [`ServiceInitializer`] during [`crate::StackBuilder::build`].
///
/// Gives the initializer read/write access to the handles registered by earlier initializers in
/// the stack, and the shutdown signal that every spawned task must observe.
pub struct ServiceInitializerContext {
    handles: ServiceHandles,
    shutdown_signal: ShutdownSignal,
}

impl ServiceInitializerContext {
    pub fn new(handles: ServiceHandles, shutdown_signal: ShutdownSignal) -> Self {
        Self {
            handles,
            shutdown_signal,
        }
    }

    pub fn handles(&self) -> &ServiceHandles {
        &self.handles
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown_signal.clone()
    }

    /// Spawns `task`, returning its `JoinHandle`. Intended for services whose lifetime is the
    /// whole node's: the task itself is responsible for observing `shutdown_signal()` and
    /// returning promptly once it resolves.
    pub fn spawn_until_shutdown<F>(&self, task: F) -> tokio::task::JoinHandle<()>
    where F: std::future::Future<Output = ()> + Send + 'static {
        tokio::spawn(task)
    }
}

/// One entry in the node's dependency-ordered service stack.
///
/// Implementations perform exactly one subsystem's construction step and register whatever
/// handles downstream initializers or the application need via
/// [`ServiceInitializerContext::handles`]. Initializers run strictly in the order they were
/// added to the [`crate::StackBuilder`]; an initializer may call `handles().expect_handle` for
/// any handle registered by an initializer added earlier.
#[async_trait]
pub trait ServiceInitializer {
    /// A human-readable name used in error messages and logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    async fn initialize(&mut self, context: ServiceInitializerContext) -> Result<(), ServiceInitializationError>;
}
