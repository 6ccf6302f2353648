/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Action selector (spec §4.6): additive 10-signal scoring over every
//! visible, enabled interactive node.

use regex::Regex;
use snapshot_traits::factpack::{ActionCategory, DetectedDialog, DetectedForm, ScoredAction};
use snapshot_traits::node::{NodeKind, Region};
use snapshot_traits::{BaseSnapshot, ReadableNode};

use crate::config::Config;

fn action_verb_regex() -> Regex {
    super::dialog::action_verb_regex()
}

/// Scores, ranks, and categorizes visible+enabled interactive nodes
/// (spec §4.6 "Action selector"). `forms`/`dialogs` supply the
/// submit-button and inside-dialog bonuses.
pub fn select(snapshot: &BaseSnapshot, forms: &[DetectedForm], dialogs: &[DetectedDialog], config: &Config) -> Vec<ScoredAction> {
    let candidates: Vec<&ReadableNode> = snapshot
        .nodes
        .iter()
        .filter(|n| n.kind.is_interactive())
        .filter(|n| n.state.as_ref().map(|s| s.visible && s.enabled).unwrap_or(false))
        .collect();

    if candidates.is_empty() {
        return Vec::new();
    }

    let median_area = median_bbox_area(&candidates);
    let verb_re = action_verb_regex();
    let submit_eids: std::collections::HashSet<&snapshot_traits::Eid> =
        forms.iter().filter_map(|f| f.submit.as_ref()).collect();
    let dialog_eids: std::collections::HashSet<&snapshot_traits::Eid> =
        dialogs.iter().flat_map(|d| d.actions.iter().map(|a| &a.eid)).collect();

    let mut scored: Vec<ScoredAction> = candidates
        .into_iter()
        .filter_map(|n| n.eid.clone().map(|eid| (n, eid)))
        .map(|(n, eid)| {
            let score = score_node(n, median_area, &verb_re, submit_eids.contains(&eid), dialog_eids.contains(&eid));
            let category = categorize(n, submit_eids.contains(&eid), dialog_eids.contains(&eid));
            ScoredAction {
                eid,
                label: n.label.clone(),
                kind: n.kind,
                score,
                category,
            }
        })
        .filter(|a| a.score >= config.min_action_score)
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
    scored.truncate(config.max_actions);
    scored
}

fn median_bbox_area(nodes: &[&ReadableNode]) -> f64 {
    let mut areas: Vec<f64> = nodes.iter().map(|n| n.layout.bbox.area()).collect();
    areas.sort_by(|a, b| a.partial_cmp(b).unwrap());
    if areas.is_empty() {
        return 0.0;
    }
    let mid = areas.len() / 2;
    if areas.len() % 2 == 0 && mid > 0 {
        (areas[mid - 1] + areas[mid]) / 2.0
    } else {
        areas[mid]
    }
}

fn above_the_fold(node: &ReadableNode) -> bool {
    node.layout.bbox.y < 900.0
}

fn score_node(node: &ReadableNode, median_area: f64, verb_re: &Regex, is_submit: bool, in_dialog: bool) -> f64 {
    let state = node.state.as_ref();
    let mut score = 0.0;

    if state.map(|s| s.visible).unwrap_or(false) {
        score += 0.1;
    }
    if state.map(|s| s.enabled).unwrap_or(false) {
        score += 0.1;
    }
    if above_the_fold(node) {
        score += 0.25;
    }
    match node.r#where.region {
        Region::Main => score += 0.15,
        Region::Header => score += 0.1,
        _ => {}
    }
    if node.kind == NodeKind::Button {
        score += 0.15;
    }
    if !node.label.trim().is_empty() {
        score += 0.1;
    }
    if verb_re.is_match(&node.label) {
        score += 0.15;
    }
    if node.layout.bbox.area() > median_area {
        score += 0.1;
    }
    if is_submit {
        score += 0.2;
    }
    if in_dialog {
        score += 0.15;
    }

    score
}

fn categorize(node: &ReadableNode, is_submit: bool, in_dialog: bool) -> ActionCategory {
    let label_lower = node.label.to_lowercase();
    if in_dialog {
        return ActionCategory::DialogAction;
    }
    if is_submit {
        return ActionCategory::FormSubmit;
    }
    if node.kind == NodeKind::Input && label_lower.contains("search") {
        return ActionCategory::Search;
    }
    if matches!(node.kind, NodeKind::Media) {
        return ActionCategory::MediaControl;
    }
    if ["cart", "add to bag", "add to cart"].iter().any(|w| label_lower.contains(w)) {
        return ActionCategory::CartAction;
    }
    if ["sign in", "log in", "sign up", "register"].iter().any(|w| label_lower.contains(w)) {
        return ActionCategory::AuthAction;
    }
    if node.kind == NodeKind::Link && node.r#where.region == Region::Nav {
        return ActionCategory::Navigation;
    }
    if ["buy", "checkout", "subscribe", "order now", "get started"]
        .iter()
        .any(|w| label_lower.contains(w))
    {
        return ActionCategory::PrimaryCta;
    }
    if node.kind == NodeKind::Button {
        return ActionCategory::SecondaryCta;
    }
    ActionCategory::Generic
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapshot_traits::node::{BBox, Layout, Locators, NodeState, Where};
    use snapshot_traits::{BackendNodeId, Eid, FrameId, LoaderId, NodeId, PageAtoms, SnapshotId, Viewport};

    fn node(kind: NodeKind, label: &str, region: Region, y: f64, w: f64, h: f64) -> ReadableNode {
        ReadableNode {
            node_id: NodeId("n1".to_string()),
            backend_node_id: BackendNodeId(1),
            frame_id: FrameId("main".to_string()),
            loader_id: LoaderId("L1".to_string()),
            kind,
            label: label.to_string(),
            r#where: Where { region, ..Where::default() },
            layout: Layout {
                bbox: BBox { x: 0.0, y, w, h },
                ..Layout::default()
            },
            state: Some(NodeState { visible: true, enabled: true, ..NodeState::default() }),
            find: Some(Locators::default()),
            attributes: None,
            eid: Some(Eid(format!("{label}-eid"))),
            layer: Default::default(),
        }
    }

    fn snapshot(nodes: Vec<ReadableNode>) -> BaseSnapshot {
        BaseSnapshot {
            snapshot_id: SnapshotId::new(),
            url: "https://shop.test/".to_string(),
            title: "Shop".to_string(),
            language: None,
            captured_at: chrono::Utc::now(),
            viewport: Viewport { w: 1280.0, h: 720.0 },
            nodes,
            atoms: PageAtoms::default(),
            meta: Default::default(),
        }
    }

    #[test]
    fn above_fold_button_with_cta_verb_outranks_plain_link() {
        let snap = snapshot(vec![
            node(NodeKind::Button, "Add to Cart", Region::Main, 100.0, 200.0, 50.0),
            node(NodeKind::Link, "Terms", Region::Footer, 2000.0, 50.0, 20.0),
        ]);
        let actions = select(&snap, &[], &[], &Config::default());
        assert_eq!(actions[0].label, "Add to Cart");
        assert_eq!(actions[0].category, ActionCategory::CartAction);
    }

    #[test]
    fn below_min_score_actions_are_dropped() {
        let snap = snapshot(vec![node(NodeKind::Link, "", Region::Unknown, 5000.0, 1.0, 1.0)]);
        let mut config = Config::default();
        config.min_action_score = 0.35;
        let actions = select(&snap, &[], &[], &config);
        assert!(actions.is_empty());
    }

    #[test]
    fn max_actions_caps_the_result_set() {
        let nodes: Vec<ReadableNode> = (0..20)
            .map(|i| node(NodeKind::Button, &format!("Buy item {i}"), Region::Main, 100.0, 200.0, 50.0))
            .collect();
        let snap = snapshot(nodes);
        let mut config = Config::default();
        config.max_actions = 5;
        let actions = select(&snap, &[], &[], &config);
        assert_eq!(actions.len(), 5);
    }
}
