/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! XML Renderer + Token Budget (spec §4.10): one renderer per section,
//! each producing a full and a truncated form, composed by `budget` into a
//! single `<page_context>` document under a char-count token estimate.

pub mod actions;
pub mod budget;
pub mod dialogs;
pub mod forms;
pub mod page;
mod xml;

use snapshot_traits::factpack::FactPack;
use snapshot_traits::BaseSnapshot;

pub use budget::{apply_budget, Budget, BudgetTier, RenderedPage};
pub use xml::escape_xml;

/// One named, independently truncatable part of the rendered document
/// (spec §4.10 "Each rendered section declares…"). Sections are always
/// produced in the fixed order `render_sections` returns them in.
#[derive(Clone, Debug)]
pub struct Section {
    pub name: &'static str,
    pub content: String,
    pub truncated_content: String,
    pub can_truncate: bool,
    /// Lower cuts first. `i32::MAX` is the `<page>` section's sentinel:
    /// `can_truncate` being `false` is what actually protects it, this
    /// just keeps it last in any priority-sorted iteration too.
    pub truncation_priority: i32,
    /// Carried through so the budget algorithm can refuse to truncate a
    /// blocking `<dialogs>` section even though dialogs are normally
    /// truncatable (spec §4.10 step 2).
    pub blocking: bool,
}

/// Builds every section in the fixed `<page><dialogs><forms><actions>`
/// order. An optional `<state>` section (diff/observations) is composed by
/// the response builder, not here — it depends on a previous snapshot this
/// module has no access to.
pub fn render_sections(snapshot: &BaseSnapshot, fact_pack: &FactPack) -> Vec<Section> {
    vec![
        page::render(snapshot, fact_pack),
        dialogs::render(fact_pack),
        forms::render(fact_pack),
        actions::render(fact_pack),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_snapshot() -> BaseSnapshot {
        BaseSnapshot {
            snapshot_id: snapshot_traits::SnapshotId::new(),
            url: "https://site.test/".to_string(),
            title: "Empty".to_string(),
            language: None,
            captured_at: chrono::Utc::now(),
            viewport: snapshot_traits::Viewport { w: 1280.0, h: 720.0 },
            nodes: vec![],
            atoms: Default::default(),
            meta: Default::default(),
        }
    }

    #[test]
    fn section_order_matches_fixed_spec_order() {
        let snapshot = empty_snapshot();
        let fact_pack = crate::factpack::build(&snapshot, &crate::config::Config::default());
        let sections = render_sections(&snapshot, &fact_pack);
        let names: Vec<&str> = sections.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["page", "dialogs", "forms", "actions"]);
    }
}
