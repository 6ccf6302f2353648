/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! `BaseSnapshot` (spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::SnapshotId;
use crate::node::ReadableNode;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub w: f64,
    pub h: f64,
}

/// Small page-wide scalars the Diff Engine compares as atoms (spec §4.9
/// step 6). Gathered by the Snapshot Compiler via a single cheap
/// `Runtime.evaluate` alongside the DOM/AX extraction, not derived from
/// `nodes`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PageAtoms {
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub loading_spinner_count: u32,
    pub validation_error_count: u32,
    pub toast_count: u32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SnapshotMeta {
    #[serde(default)]
    pub partial: bool,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub node_count: usize,
    pub interactive_count: usize,
    pub capture_duration_ms: u64,
}

/// The canonical perception of a page at one instant (spec §3).
///
/// Invariants (enforced by the Snapshot Compiler, not re-checked here):
/// every node's `backend_node_id` is unique within `nodes`;
/// `meta.interactive_count` equals the number of nodes whose `kind` is
/// interactive; the snapshot is immutable once constructed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BaseSnapshot {
    pub snapshot_id: SnapshotId,
    pub url: String,
    pub title: String,
    pub language: Option<String>,
    pub captured_at: DateTime<Utc>,
    pub viewport: Viewport,
    pub nodes: Vec<ReadableNode>,
    pub atoms: PageAtoms,
    pub meta: SnapshotMeta,
}

impl BaseSnapshot {
    pub fn find_by_eid(&self, eid: &crate::ids::Eid) -> Option<&ReadableNode> {
        self.nodes.iter().find(|n| n.eid.as_ref() == Some(eid))
    }
}
