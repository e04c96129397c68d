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

use log::*;
use tessera_shutdown::ShutdownSignal;

use crate::{
    handles::ServiceHandles,
    initializer::{ServiceInitializationError, ServiceInitializer, ServiceInitializerContext},
};

const LOG_TARGET: &str = "tessera::service_framework::stack_builder";

/// Builds the node's service stack by running a sequence of [`ServiceInitializer`]s in order.
///
/// This is the generalization of §4.1/§4.2's deterministic construction order: each call to
/// [`StackBuilder::add_initializer`] appends one subsystem's construction step, and
/// [`StackBuilder::build`] drives them to completion sequentially, stopping at (and returning)
/// the first error.
pub struct StackBuilder {
    initializers: Vec<Box<dyn ServiceInitializer + Send>>,
    shutdown_signal: ShutdownSignal,
}

impl StackBuilder {
    pub fn new(shutdown_signal: ShutdownSignal) -> Self {
        Self {
            initializers: Vec::new(),
            shutdown_signal,
        }
    }

    pub fn add_initializer<I>(mut self, initializer: I) -> Self
    where I: ServiceInitializer + Send + 'static {
        self.initializers.push(Box::new(initializer));
        self
    }

    /// Runs every added initializer in order, threading a shared [`ServiceHandles`] through each
    /// so later initializers can depend on handles registered by earlier ones.
    pub async fn build(self) -> Result<ServiceHandles, ServiceInitializationError> {
        let handles = ServiceHandles::new();
        for mut initializer in self.initializers {
            let name = initializer.name();
            debug!(target: LOG_TARGET, "Initializing service '{}'", name);
            let context = ServiceInitializerContext::new(handles.clone(), self.shutdown_signal.clone());
            initializer.initialize(context).await?;
            debug!(target: LOG_TARGET, "Service '{}' initialized", name);
        }
        Ok(handles)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tessera_shutdown::Shutdown;

    use super::*;

    #[derive(Clone)]
    struct Marker(&'static str);

    struct OkInitializer(&'static str);

    #[async_trait]
    impl ServiceInitializer for OkInitializer {
        async fn initialize(&mut self, context: ServiceInitializerContext) -> Result<(), ServiceInitializationError> {
            context.handles().register(Marker(self.0));
            Ok(())
        }
    }

    struct FailingInitializer;

    #[async_trait]
    impl ServiceInitializer for FailingInitializer {
        fn name(&self) -> &'static str {
            "FailingInitializer"
        }

        async fn initialize(&mut self, _context: ServiceInitializerContext) -> Result<(), ServiceInitializationError> {
            Err(ServiceInitializationError::new(self.name(), anyhow::anyhow!("boom")))
        }
    }

    struct DependentInitializer;

    #[async_trait]
    impl ServiceInitializer for DependentInitializer {
        async fn initialize(&mut self, context: ServiceInitializerContext) -> Result<(), ServiceInitializationError> {
            let marker: Marker = context.handles().expect_handle();
            context.handles().register(Marker(marker.0));
            Ok(())
        }
    }

    #[tokio::test]
    async fn runs_initializers_in_order() {
        let shutdown = Shutdown::new();
        let handles = StackBuilder::new(shutdown.to_signal())
            .add_initializer(OkInitializer("first"))
            .add_initializer(DependentInitializer)
            .build()
            .await
            .unwrap();
        assert_eq!(handles.expect_handle::<Marker>().0, "first");
    }

    #[tokio::test]
    async fn stops_at_first_error() {
        let shutdown = Shutdown::new();
        let result = StackBuilder::new(shutdown.to_signal())
            .add_initializer(OkInitializer("first"))
            .add_initializer(FailingInitializer)
            .add_initializer(OkInitializer("never runs"))
            .build()
            .await;
        assert!(result.is_err());
    }
}
