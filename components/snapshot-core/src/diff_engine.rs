/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Diff Engine (spec §4.9): pure, deterministic comparison of two
//! `BaseSnapshot`s. Never throws on valid inputs (spec §7).

use rustc_hash::FxHashMap;
use serde_json::json;
use snapshot_traits::diff::{
    ActionableDiff, AtomChange, ChangedActionable, ChangedKey, Diff, DocChange, FieldChange,
    LayerChange, NavigationKind,
};
use snapshot_traits::node::{Layer, NodeState};
use snapshot_traits::{BaseSnapshot, Eid, ReadableNode};

/// Builds `prevMap`/`currMap` of visible interactive nodes keyed by EID
/// (spec §4.9 step 1), then runs every comparison step. `diff(a, a)`
/// produces `Diff::default()` (spec §8).
pub fn diff(prev: &BaseSnapshot, curr: &BaseSnapshot) -> Diff {
    let prev_map = actionable_map(prev);
    let curr_map = actionable_map(curr);

    Diff {
        doc: doc_change(prev, curr),
        layer: layer_change(prev, curr),
        actionables: actionable_diff(&prev_map, &curr_map),
        atoms: atom_changes(prev, curr),
    }
}

fn actionable_map(snapshot: &BaseSnapshot) -> FxHashMap<Eid, &ReadableNode> {
    snapshot
        .nodes
        .iter()
        .filter(|n| n.is_visible_interactive())
        .filter_map(|n| n.eid.clone().map(|eid| (eid, n)))
        .collect()
}

fn actionable_diff(
    prev: &FxHashMap<Eid, &ReadableNode>,
    curr: &FxHashMap<Eid, &ReadableNode>,
) -> ActionableDiff {
    let mut added: Vec<Eid> = curr.keys().filter(|eid| !prev.contains_key(*eid)).cloned().collect();
    let mut removed: Vec<Eid> = prev.keys().filter(|eid| !curr.contains_key(*eid)).cloned().collect();
    added.sort_by(|a, b| a.0.cmp(&b.0));
    removed.sort_by(|a, b| a.0.cmp(&b.0));

    let mut changed = Vec::new();
    let mut both: Vec<&Eid> = prev.keys().filter(|eid| curr.contains_key(*eid)).collect();
    both.sort_by(|a, b| a.0.cmp(&b.0));
    for eid in both {
        let before = prev[eid];
        let after = curr[eid];
        let changes = field_changes(before, after);
        if !changes.is_empty() {
            changed.push(ChangedActionable {
                eid: eid.clone(),
                changes,
            });
        }
    }

    ActionableDiff {
        added,
        removed,
        changed,
    }
}

fn field_changes(before: &ReadableNode, after: &ReadableNode) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    let empty_state = NodeState::default();
    let b = before.state.as_ref().unwrap_or(&empty_state);
    let a = after.state.as_ref().unwrap_or(&empty_state);

    push_bool(&mut changes, ChangedKey::Vis, b.visible, a.visible);
    push_bool(&mut changes, ChangedKey::Ena, b.enabled, a.enabled);
    push_opt_bool(&mut changes, ChangedKey::Chk, b.checked, a.checked);
    push_opt_bool(&mut changes, ChangedKey::Sel, b.selected, a.selected);
    push_opt_bool(&mut changes, ChangedKey::Exp, b.expanded, a.expanded);
    push_opt_bool(&mut changes, ChangedKey::Foc, b.focused, a.focused);
    push_opt_bool(&mut changes, ChangedKey::Req, b.required, a.required);
    push_opt_bool(&mut changes, ChangedKey::Inv, b.invalid, a.invalid);
    push_opt_bool(&mut changes, ChangedKey::Rdo, b.readonly, a.readonly);

    let b_val = before.attributes.as_ref().and_then(|a| a.value.clone());
    let a_val = after.attributes.as_ref().and_then(|a| a.value.clone());
    if b_val != a_val {
        changes.push(FieldChange {
            key: ChangedKey::Val,
            from: json!(b_val),
            to: json!(a_val),
        });
    }

    if before.label != after.label {
        changes.push(FieldChange {
            key: ChangedKey::Label,
            from: json!(before.label),
            to: json!(after.label),
        });
    }

    changes
}

fn push_bool(changes: &mut Vec<FieldChange>, key: ChangedKey, from: bool, to: bool) {
    if from != to {
        changes.push(FieldChange {
            key,
            from: json!(from),
            to: json!(to),
        });
    }
}

fn push_opt_bool(changes: &mut Vec<FieldChange>, key: ChangedKey, from: Option<bool>, to: Option<bool>) {
    if from != to {
        changes.push(FieldChange {
            key,
            from: json!(from),
            to: json!(to),
        });
    }
}

fn doc_change(prev: &BaseSnapshot, curr: &BaseSnapshot) -> Option<DocChange> {
    if prev.url == curr.url && prev.title == curr.title {
        return None;
    }
    Some(DocChange {
        url_from: prev.url.clone(),
        url_to: curr.url.clone(),
        title_from: prev.title.clone(),
        title_to: curr.title.clone(),
        navigation: classify_navigation(&prev.url, &curr.url),
    })
}

fn classify_navigation(from: &str, to: &str) -> NavigationKind {
    match (pathname(from), pathname(to)) {
        (Some(a), Some(b)) if a == b => NavigationKind::Soft,
        _ => NavigationKind::Hard,
    }
}

fn pathname(url: &str) -> Option<String> {
    let without_scheme = url.split("://").nth(1).unwrap_or(url);
    let without_query = without_scheme.split(['?', '#']).next()?;
    let path = without_query.splitn(2, '/').nth(1).map(|p| format!("/{p}")).unwrap_or_default();
    Some(path)
}

/// Ordered stack of distinct overlay layer types present in a snapshot,
/// nearest-to-page-order (spec §4.9 step 5). `main` never appears in the
/// stack — it is the absence of an overlay.
fn layer_stack(snapshot: &BaseSnapshot) -> Vec<Layer> {
    let mut stack = Vec::new();
    for node in &snapshot.nodes {
        if matches!(node.layer, Layer::Main) {
            continue;
        }
        if !stack.contains(&node.layer) {
            stack.push(node.layer.clone());
        }
    }
    stack
}

fn layer_change(prev: &BaseSnapshot, curr: &BaseSnapshot) -> Option<LayerChange> {
    let stack_from = layer_stack(prev);
    let stack_to = layer_stack(curr);
    if stack_from == stack_to {
        return None;
    }
    Some(LayerChange { stack_from, stack_to })
}

fn atom_changes(prev: &BaseSnapshot, curr: &BaseSnapshot) -> Vec<AtomChange> {
    let mut atoms = Vec::new();
    push_atom(&mut atoms, "viewport_w", json!(prev.viewport.w), json!(curr.viewport.w));
    push_atom(&mut atoms, "viewport_h", json!(prev.viewport.h), json!(curr.viewport.h));
    push_atom(&mut atoms, "scroll_x", json!(prev.atoms.scroll_x), json!(curr.atoms.scroll_x));
    push_atom(&mut atoms, "scroll_y", json!(prev.atoms.scroll_y), json!(curr.atoms.scroll_y));
    push_atom(
        &mut atoms,
        "loading_spinner_count",
        json!(prev.atoms.loading_spinner_count),
        json!(curr.atoms.loading_spinner_count),
    );
    push_atom(
        &mut atoms,
        "validation_error_count",
        json!(prev.atoms.validation_error_count),
        json!(curr.atoms.validation_error_count),
    );
    push_atom(&mut atoms, "toast_count", json!(prev.atoms.toast_count), json!(curr.atoms.toast_count));
    push_atom(
        &mut atoms,
        "focused_field",
        json!(focused_eid(prev)),
        json!(focused_eid(curr)),
    );
    atoms
}

fn focused_eid(snapshot: &BaseSnapshot) -> Option<String> {
    snapshot
        .nodes
        .iter()
        .find(|n| n.state.as_ref().and_then(|s| s.focused) == Some(true))
        .and_then(|n| n.eid.as_ref())
        .map(|eid| eid.0.clone())
}

fn push_atom(atoms: &mut Vec<AtomChange>, key: &str, from: serde_json::Value, to: serde_json::Value) {
    if from != to {
        atoms.push(AtomChange {
            k: key.to_string(),
            from,
            to,
        });
    }
}
