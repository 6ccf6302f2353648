/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! FactPack extractors (spec §4.6): dialog detector, form detector, page
//! classifier, action selector. All four run over a finalized
//! `BaseSnapshot`, sharing the Query Engine (`crate::query`) as their
//! common filtering surface.

pub mod action;
pub mod dialog;
pub mod form;
pub mod page;

use snapshot_traits::factpack::{FactPack, FactPackMeta};
use snapshot_traits::BaseSnapshot;

use crate::config::Config;

/// Builds a complete `FactPack` from a finalized snapshot. Extractors run
/// in dependency order: dialogs and forms first (actions references both
/// for the submit/in-dialog score bonuses), page classification reads the
/// detected forms, actions last.
pub fn build(snapshot: &BaseSnapshot, config: &Config) -> FactPack {
    let dialogs = dialog::detect(snapshot);
    let forms = form::detect(snapshot);
    let page_type = page::classify(snapshot, &forms);
    let actions = action::select(snapshot, &forms, &dialogs, config);

    let has_blocking_dialog = dialogs.iter().any(|d| d.blocking);

    FactPack {
        page_type,
        dialogs,
        forms,
        actions,
        meta: FactPackMeta {
            node_count: snapshot.nodes.len(),
            has_blocking_dialog,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_produces_empty_factpack() {
        let snapshot = BaseSnapshot {
            snapshot_id: snapshot_traits::SnapshotId::new(),
            url: "https://site.test/".to_string(),
            title: "Empty".to_string(),
            language: None,
            captured_at: chrono::Utc::now(),
            viewport: snapshot_traits::Viewport { w: 1280.0, h: 720.0 },
            nodes: vec![],
            atoms: Default::default(),
            meta: Default::default(),
        };
        let pack = build(&snapshot, &Config::default());
        assert!(pack.dialogs.is_empty());
        assert!(pack.forms.is_empty());
        assert!(pack.actions.is_empty());
        assert!(!pack.meta.has_blocking_dialog);
    }
}
