/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Event subscription bookkeeping (spec §9 "Event subscription cleanup").
//!
//! Grounded in the teacher's `ActorRegistry` (`components/devtools/actor.rs`):
//! a registry value with explicit register/drop methods rather than ambient
//! global state, so every `on()` has a paired `off()` that `CdpSession::close`
//! can walk deterministically.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

pub type HandlerId = u64;
type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Handlers registered against a single CDP method name (e.g.
/// `"Page.frameNavigated"`).
#[derive(Default)]
pub struct HandlerRegistry {
    next_id: AtomicU64,
    handlers: Mutex<HashMap<String, Vec<(HandlerId, Handler)>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a persistent handler for `method`. Returns an id usable
    /// with [`HandlerRegistry::off`].
    pub fn on<F>(&self, method: impl Into<String>, handler: F) -> HandlerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.handlers
            .lock()
            .unwrap()
            .entry(method.into())
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Unregister a previously registered handler, if it is still present.
    pub fn off(&self, id: HandlerId) {
        let mut handlers = self.handlers.lock().unwrap();
        for bucket in handlers.values_mut() {
            bucket.retain(|(hid, _)| *hid != id);
        }
        handlers.retain(|_, bucket| !bucket.is_empty());
    }

    /// Dispatch one event to every handler registered for its method.
    ///
    /// The matching bucket is cloned out from under the lock before any
    /// handler runs, so a handler may call `on`/`off` (e.g. a `once`
    /// handler removing itself) without deadlocking on its own registry.
    pub fn dispatch(&self, method: &str, params: &Value) {
        let bucket: Vec<(HandlerId, Handler)> = {
            let handlers = self.handlers.lock().unwrap();
            handlers.get(method).cloned().unwrap_or_default()
        };
        for (_, handler) in bucket {
            handler(params);
        }
    }

    /// Unregister every handler. Called from `CdpSession::close` before the
    /// transport is torn down, so no handler fires after `close` returns.
    pub fn clear(&self) {
        self.handlers.lock().unwrap().clear();
    }

    #[cfg(test)]
    pub fn handler_count(&self, method: &str) -> usize {
        self.handlers
            .lock()
            .unwrap()
            .get(method)
            .map(Vec::len)
            .unwrap_or(0)
    }
}
