/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The CDP transport boundary (spec §6 "CDP (consumed)", §9 "Dynamic JSON
//! at the CDP boundary").
//!
//! The wire format is heterogeneous per-domain JSON; rather than typing
//! every method's params/result, the transport is a single tagged
//! `send`/`next_event` surface carrying `serde_json::Value`, and
//! `snapshot-core` layers a runtime-validated, per-method codec on top
//! (its `CdpSession`). Implementing this trait — over a real devtools
//! WebSocket, a recorded fixture, or an in-process mock — is the one
//! thing an embedder must supply; everything else in this workspace is
//! pure given a transport.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SessionError;

/// One CDP event as delivered by the transport: method name, raw params,
/// and the originating session id (`None` for the browser-level session).
#[derive(Clone, Debug)]
pub struct CdpEvent {
    pub session_id: Option<String>,
    pub method: String,
    pub params: Value,
}

/// Minimal transport capability required by the CDP Session Abstraction
/// (spec §4.1). Implementations own the actual WebSocket/pipe and are
/// responsible for framing; this trait only carries already-decoded JSON.
#[async_trait]
pub trait CdpTransport: Send + Sync {
    /// Send one command and await its result. `session_id` selects a
    /// target's flattened session per the CDP `Target.sessionId` protocol
    /// extension; `None` addresses the browser-level session.
    async fn send(
        &self,
        session_id: Option<&str>,
        method: &str,
        params: Value,
    ) -> Result<Value, SessionError>;

    /// Await the next event from any session. Returns `None` once the
    /// transport is permanently closed.
    async fn next_event(&self) -> Option<CdpEvent>;

    /// Whether the underlying connection is still live. A session that has
    /// observed a transport-level close should report `false` here even if
    /// `next_event` has not yet returned `None`.
    fn is_active(&self) -> bool;
}
