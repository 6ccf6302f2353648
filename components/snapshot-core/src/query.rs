/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Query Engine (spec §4.7): AND-composed structured filters over a
//! finalized snapshot, a single linear pass preserving document order.

use snapshot_traits::node::{NodeKind, Region};
use snapshot_traits::{BaseSnapshot, ReadableNode};

/// State sub-filter; every `Some` field must match exactly.
#[derive(Clone, Debug, Default)]
pub struct StateFilter {
    pub visible: Option<bool>,
    pub enabled: Option<bool>,
    pub checked: Option<bool>,
    pub expanded: Option<bool>,
    pub selected: Option<bool>,
    pub focused: Option<bool>,
    pub required: Option<bool>,
    pub invalid: Option<bool>,
    pub readonly: Option<bool>,
}

impl StateFilter {
    fn matches(&self, state: Option<&snapshot_traits::node::NodeState>) -> bool {
        let empty = snapshot_traits::node::NodeState::default();
        let s = state.unwrap_or(&empty);
        field_matches(self.visible, Some(s.visible))
            && field_matches(self.enabled, Some(s.enabled))
            && field_matches(self.checked, s.checked)
            && field_matches(self.expanded, s.expanded)
            && field_matches(self.selected, s.selected)
            && field_matches(self.focused, s.focused)
            && field_matches(self.required, s.required)
            && field_matches(self.invalid, s.invalid)
            && field_matches(self.readonly, s.readonly)
    }
}

fn field_matches(wanted: Option<bool>, actual: Option<bool>) -> bool {
    match wanted {
        None => true,
        Some(w) => actual == Some(w),
    }
}

/// Query form (spec §4.7). All fields are optional and AND-composed.
#[derive(Clone, Debug, Default)]
pub struct Query {
    pub kind: Option<NodeKind>,
    pub region: Option<Region>,
    pub group_id: Option<String>,
    pub state: Option<StateFilter>,
    pub label_contains: Option<String>,
    pub near_text: Option<String>,
    pub limit: Option<usize>,
}

impl Query {
    fn matches(&self, node: &ReadableNode) -> bool {
        if let Some(kind) = self.kind {
            if node.kind != kind {
                return false;
            }
        }
        if let Some(region) = self.region {
            if node.r#where.region != region {
                return false;
            }
        }
        if let Some(group_id) = &self.group_id {
            if node.r#where.group_id.as_deref() != Some(group_id.as_str()) {
                return false;
            }
        }
        if let Some(state) = &self.state {
            if !state.matches(node.state.as_ref()) {
                return false;
            }
        }
        if let Some(needle) = &self.label_contains {
            if !node
                .label
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        if let Some(needle) = &self.near_text {
            if !nearby_text_matches(node, needle) {
                return false;
            }
        }
        true
    }
}

/// `near_text` (spec §4.7) checks the node's own label and its heading
/// context / group path, since a finalized snapshot carries no live
/// geometry search index — this is the cheap proxy for "near".
fn nearby_text_matches(node: &ReadableNode, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    if node.label.to_lowercase().contains(&needle) {
        return true;
    }
    if let Some(heading) = &node.r#where.heading_context {
        if heading.to_lowercase().contains(&needle) {
            return true;
        }
    }
    node.r#where
        .group_path
        .iter()
        .any(|segment| segment.to_lowercase().contains(&needle))
}

/// Runs `query` over `snapshot.nodes` in a single linear pass, preserving
/// document order, applying `limit` last.
pub fn run<'a>(snapshot: &'a BaseSnapshot, query: &Query) -> Vec<&'a ReadableNode> {
    let mut results: Vec<&ReadableNode> = Vec::new();
    for node in &snapshot.nodes {
        if query.matches(node) {
            results.push(node);
            if let Some(limit) = query.limit {
                if results.len() >= limit {
                    break;
                }
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapshot_traits::node::{BBox, Layout, Locators, NodeState, Where};
    use snapshot_traits::{BackendNodeId, Eid, FrameId, LoaderId, NodeId};

    fn node(kind: NodeKind, label: &str, region: Region, visible: bool) -> ReadableNode {
        ReadableNode {
            node_id: NodeId("n1".to_string()),
            backend_node_id: BackendNodeId(1),
            frame_id: FrameId("main".to_string()),
            loader_id: LoaderId("L1".to_string()),
            kind,
            label: label.to_string(),
            r#where: Where {
                region,
                ..Where::default()
            },
            layout: Layout {
                bbox: BBox::default(),
                ..Layout::default()
            },
            state: Some(NodeState {
                visible,
                enabled: true,
                ..NodeState::default()
            }),
            find: Some(Locators::default()),
            attributes: None,
            eid: Some(Eid("abc123456789".to_string())),
            layer: Default::default(),
        }
    }

    fn snapshot(nodes: Vec<ReadableNode>) -> BaseSnapshot {
        BaseSnapshot {
            snapshot_id: snapshot_traits::SnapshotId::new(),
            url: "https://site.test/".to_string(),
            title: "Test".to_string(),
            language: None,
            captured_at: chrono::Utc::now(),
            viewport: snapshot_traits::Viewport { w: 1280.0, h: 720.0 },
            nodes,
            atoms: Default::default(),
            meta: Default::default(),
        }
    }

    #[test]
    fn filters_compose_with_and() {
        let snap = snapshot(vec![
            node(NodeKind::Button, "Add to Cart", Region::Main, true),
            node(NodeKind::Button, "Remove", Region::Main, false),
            node(NodeKind::Link, "Add to Cart", Region::Main, true),
        ]);
        let query = Query {
            kind: Some(NodeKind::Button),
            label_contains: Some("add".to_string()),
            state: Some(StateFilter {
                visible: Some(true),
                ..StateFilter::default()
            }),
            ..Query::default()
        };
        let results = run(&snap, &query);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].label, "Add to Cart");
    }

    #[test]
    fn preserves_document_order() {
        let snap = snapshot(vec![
            node(NodeKind::Button, "Second", Region::Main, true),
            node(NodeKind::Button, "First", Region::Main, true),
        ]);
        let results = run(&snap, &Query::default());
        assert_eq!(results[0].label, "Second");
        assert_eq!(results[1].label, "First");
    }

    #[test]
    fn limit_caps_results_without_reordering() {
        let snap = snapshot(vec![
            node(NodeKind::Button, "A", Region::Main, true),
            node(NodeKind::Button, "B", Region::Main, true),
            node(NodeKind::Button, "C", Region::Main, true),
        ]);
        let query = Query {
            limit: Some(2),
            ..Query::default()
        };
        let results = run(&snap, &query);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].label, "A");
        assert_eq!(results[1].label, "B");
    }

    #[test]
    fn region_filter_excludes_non_matching_nodes() {
        let snap = snapshot(vec![
            node(NodeKind::Link, "Home", Region::Nav, true),
            node(NodeKind::Link, "Docs", Region::Main, true),
        ]);
        let query = Query {
            region: Some(Region::Nav),
            ..Query::default()
        };
        let results = run(&snap, &query);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].label, "Home");
    }
}
