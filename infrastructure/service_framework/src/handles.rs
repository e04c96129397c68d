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

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::{Arc, RwLock},
};

/// A type-indexed registry of service handles built up during [`crate::StackBuilder::build`].
///
/// Each [`crate::ServiceInitializer`] registers zero or more handles here so that later
/// initializers (and the composing application) can retrieve them by type.
#[derive(Default, Clone)]
pub struct ServiceHandles {
    handles: Arc<RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>>,
}

impl ServiceHandles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handle, overwriting any previous handle of the same type.
    pub fn register<H>(&self, handle: H)
    where H: Any + Send + Sync {
        let mut handles = self.handles.write().expect("ServiceHandles lock poisoned");
        handles.insert(TypeId::of::<H>(), Arc::new(handle));
    }

    /// Returns a clone of a previously registered handle, or `None` if it was never registered.
    pub fn get_handle<H>(&self) -> Option<H>
    where H: Clone + 'static {
        let handles = self.handles.read().expect("ServiceHandles lock poisoned");
        handles.get(&TypeId::of::<H>()).and_then(|h| h.downcast_ref::<H>()).cloned()
    }

    /// Like [`Self::get_handle`], but panics with a descriptive message if the handle is absent.
    /// Use this at composition sites where the handle's presence is an invariant of construction
    /// order, not a recoverable condition.
    pub fn expect_handle<H>(&self) -> H
    where H: Clone + 'static {
        self.get_handle().unwrap_or_else(|| {
            panic!(
                "Could not find handle of type '{}'. Ensure the initializer that provides it was added to the stack.",
                std::any::type_name::<H>()
            )
        })
    }
}

impl std::fmt::Debug for ServiceHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self.handles.read().map(|h| h.len()).unwrap_or(0);
        write!(f, "ServiceHandles({} handles)", len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug)]
    struct Widget(u32);

    #[test]
    fn register_and_get() {
        let handles = ServiceHandles::new();
        assert!(handles.get_handle::<Widget>().is_none());
        handles.register(Widget(42));
        assert_eq!(handles.get_handle::<Widget>(), Some(Widget(42)));
    }

    #[test]
    #[should_panic(expected = "Widget")]
    fn expect_missing_panics() {
        let handles = ServiceHandles::new();
        handles.expect_handle::<Widget>();
    }

    #[test]
    fn register_overwrites() {
        let handles = ServiceHandles::new();
        handles.register(Widget(1));
        handles.register(Widget(2));
        assert_eq!(handles.get_handle::<Widget>(), Some(Widget(2)));
    }
}
