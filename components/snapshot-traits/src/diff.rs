/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! `DiffResponse` and its component types (spec §3, §4.9).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::Eid;
use crate::node::Layer;

/// One of the abbreviated state-field keys a `changed` entry may carry
/// (spec §3: `vis, ena, chk, sel, exp, foc, req, inv, rdo, val, label`).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangedKey {
    Vis,
    Ena,
    Chk,
    Sel,
    Exp,
    Foc,
    Req,
    Inv,
    Rdo,
    Val,
    Label,
}

/// A single field change on a node that survived between two snapshots.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldChange {
    pub key: ChangedKey,
    pub from: Value,
    pub to: Value,
}

/// All field changes recorded for one EID.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChangedActionable {
    pub eid: Eid,
    pub changes: Vec<FieldChange>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActionableDiff {
    pub added: Vec<Eid>,
    pub removed: Vec<Eid>,
    pub changed: Vec<ChangedActionable>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationKind {
    Soft,
    Hard,
}

/// Document-level change: URL or title differs between the two snapshots
/// (spec §4.9 step 4).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocChange {
    pub url_from: String,
    pub url_to: String,
    pub title_from: String,
    pub title_to: String,
    pub navigation: NavigationKind,
}

/// Stacking-context transition: the ordered layer-type stack differs
/// between the two snapshots (spec §4.9 step 5).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LayerChange {
    pub stack_from: Vec<Layer>,
    pub stack_to: Vec<Layer>,
}

/// Small page-wide scalar state change (spec §3, GLOSSARY "Atoms").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AtomChange {
    pub k: String,
    pub from: Value,
    pub to: Value,
}

/// The `diff` payload of a `DiffResponse` (spec §3).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Diff {
    pub doc: Option<DocChange>,
    pub layer: Option<LayerChange>,
    pub actionables: ActionableDiff,
    pub atoms: Vec<AtomChange>,
}

impl Diff {
    /// True when nothing changed at all — the exact shape `diff(A, A)`
    /// must produce (spec §8 "Diff determinism").
    pub fn is_empty(&self) -> bool {
        self.doc.is_none()
            && self.layer.is_none()
            && self.actionables.added.is_empty()
            && self.actionables.removed.is_empty()
            && self.actionables.changed.is_empty()
            && self.atoms.is_empty()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiffResponse {
    pub mode: DiffMode,
    pub diff: Diff,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffMode {
    Diff,
}

impl Default for DiffMode {
    fn default() -> Self {
        DiffMode::Diff
    }
}
