/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Element identity (spec §4.5): a deterministic 12-hex fingerprint plus
//! document-order collision resolution.

use rustc_hash::FxHashSet;
use sha2::{Digest, Sha256};
use snapshot_traits::node::{Layer, NodeKind};
use snapshot_traits::Eid;
use unicode_normalization::UnicodeNormalization;

/// Everything the fingerprint is derived from. Two nodes with identical
/// `Fingerprint`s get the same base EID.
pub struct Fingerprint<'a> {
    pub name: &'a str,
    pub kind: NodeKind,
    pub role: Option<&'a str>,
    pub landmark_path: &'a str,
    pub position_hint: Option<&'a str>,
    pub layer: &'a Layer,
    pub href: Option<&'a str>,
    pub shadow_path: Option<&'a [String]>,
}

/// NFKC-normalizes, lower-cases, collapses internal whitespace runs, and
/// caps at 100 chars (spec §4.5, reused "wherever labels are hashed" per
/// spec §9).
pub fn normalize_name(name: &str) -> String {
    let collapsed = name.nfkc().collect::<String>().trim().split_whitespace().collect::<Vec<_>>().join(" ");
    let lowered = collapsed.to_ascii_lowercase();
    lowered.chars().take(100).collect()
}

/// Hashes the fingerprint tuple with SHA-256, keeping the first 12 hex
/// characters. Scroll position, viewport size, and anything not listed in
/// `Fingerprint` must never enter this computation (spec §4.5 "Scroll and
/// viewport resize must not change any EID").
pub fn fingerprint_hash(fp: &Fingerprint<'_>) -> String {
    let normalized_name = normalize_name(fp.name);
    let shadow_path_joined = fp.shadow_path.map(|p| p.join(">")).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(normalized_name.as_bytes());
    hasher.update(b"\0");
    hasher.update(format!("{:?}", fp.kind).as_bytes());
    hasher.update(b"\0");
    hasher.update(fp.role.unwrap_or("").as_bytes());
    hasher.update(b"\0");
    hasher.update(fp.landmark_path.as_bytes());
    hasher.update(b"\0");
    hasher.update(fp.position_hint.unwrap_or("").as_bytes());
    hasher.update(b"\0");
    hasher.update(fp.layer.to_string().as_bytes());
    hasher.update(b"\0");
    hasher.update(fp.href.unwrap_or("").as_bytes());
    hasher.update(b"\0");
    hasher.update(shadow_path_joined.as_bytes());

    let digest = hasher.finalize();
    let hex = format!("{digest:x}");
    hex[..12].to_string()
}

/// The layer a node belongs to for identity purposes: `main` unless its
/// region is `dialog` or an overlay layer was explicitly passed in (spec
/// §4.5 "layer (`main` unless region is `dialog` or an overlay layer passed
/// in)").
pub fn layer_for_identity(region_is_dialog: bool, overlay_layer: Option<Layer>) -> Layer {
    if let Some(layer) = overlay_layer {
        return layer;
    }
    if region_is_dialog {
        Layer::Modal
    } else {
        Layer::Main
    }
}

/// Resolves collisions against bases already seen in this snapshot, in the
/// order `bases` is given (document order). The first occurrence of a base
/// keeps it bare; the second gets `-2`, the third `-3`, and so on.
pub fn resolve_collisions(bases: &[String]) -> Vec<Eid> {
    let mut seen_counts: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut out = Vec::with_capacity(bases.len());

    for base in bases {
        let count = seen_counts.entry(base.as_str()).or_insert(0);
        *count += 1;
        seen.insert(base.as_str());
        if *count == 1 {
            out.push(Eid(base.clone()));
        } else {
            out.push(Eid(format!("{base}-{count}")));
        }
    }
    out
}
