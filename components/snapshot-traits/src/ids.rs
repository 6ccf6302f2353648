/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Newtype identity values. See spec §9 "Composite keys as identity":
//! `frame_id:loader_id:backend_node_id` and EIDs are first-class value
//! types here rather than stringly-typed map keys.

use std::fmt;

use serde::{Deserialize, Serialize};

/// CDP's per-frame identifier. Stable across navigations of the same frame.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct FrameId(pub String);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// CDP's identifier for a single document load within a frame. Changes on
/// every navigation of that frame.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct LoaderId(pub String);

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// CDP's per-session numeric handle on a DOM node. Not stable across
/// navigations; a freshly loaded document may reuse small integers that a
/// previous load also used.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BackendNodeId(pub i64);

impl fmt::Display for BackendNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `(backend_node_id, frame_id, loader_id)` — the only reliable cross-turn
/// reference to a DOM node (spec §3, §4.2).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ScopedElementRef {
    pub backend_node_id: BackendNodeId,
    pub frame_id: FrameId,
    pub loader_id: LoaderId,
}

impl ScopedElementRef {
    pub fn new(backend_node_id: BackendNodeId, frame_id: FrameId, loader_id: LoaderId) -> Self {
        Self {
            backend_node_id,
            frame_id,
            loader_id,
        }
    }
}

/// Element identifier: stable 12-hex-character fingerprint (plus optional
/// `-N` collision suffix) identifying an element across snapshots of the
/// same logical page (spec §4.5).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Eid(pub String);

impl Eid {
    /// The base 12-hex fingerprint without any collision suffix.
    pub fn base(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for Eid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier for a `BaseSnapshot`, minted fresh on every capture.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SnapshotId(pub uuid::Uuid);

impl SnapshotId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SnapshotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-node identifier, stable only within the snapshot that produced it
/// (spec §3: `"n<n>"` in document order).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
