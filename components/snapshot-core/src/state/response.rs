/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Renders the agent-facing XML surface (spec §6): `<state>` after a
//! navigation or mutation, `<result type="...">` for query tools, `<error>`
//! on failure. Propagation policy (spec §7): a state-mutating tool's error
//! additionally carries the pre-action snapshot so the agent can retry.

use snapshot_traits::diff::{Diff, NavigationKind};
use snapshot_traits::factpack::FactPack;
use snapshot_traits::node::Region;
use snapshot_traits::observation::{DomObservation, ObservationBatch, ObservationType};
use snapshot_traits::{BaseSnapshot, ReadableNode};

use crate::render::{self, escape_xml, Budget};

/// One page entry in a `list_pages` result.
pub struct PageSummary {
    pub page_id: String,
    pub url: String,
    pub title: String,
}

/// Renders the `<state>` block (spec §6): snapshot summary, diff, drained
/// observations, FactPack brief. `delta` is `None` on a page's first
/// capture, when there is nothing yet to diff against.
pub fn render_state(
    snapshot: &BaseSnapshot,
    delta: Option<&Diff>,
    observations: &ObservationBatch,
    fact_pack: &FactPack,
    budget: Budget,
) -> String {
    let sections = render::render_sections(snapshot, fact_pack);
    let rendered = render::apply_budget(&sections, budget);

    let snapshot_xml = format!(
        "<snapshot id=\"{}\" url=\"{}\" title=\"{}\" node_count=\"{}\" interactive_count=\"{}\" partial=\"{}\"/>",
        snapshot.snapshot_id,
        escape_xml(&snapshot.url),
        escape_xml(&snapshot.title),
        snapshot.meta.node_count,
        snapshot.meta.interactive_count,
        snapshot.meta.partial,
    );

    format!(
        "<state>{}{}{}{}</state>",
        snapshot_xml,
        delta.map(render_diff).unwrap_or_else(|| "<diff/>".to_string()),
        render_observations(observations),
        rendered.xml,
    )
}

fn render_diff(delta: &Diff) -> String {
    if delta.is_empty() {
        return "<diff/>".to_string();
    }
    let doc = delta
        .doc
        .as_ref()
        .map(|d| {
            format!(
                "<doc url_from=\"{}\" url_to=\"{}\" title_from=\"{}\" title_to=\"{}\" navigation=\"{}\"/>",
                escape_xml(&d.url_from),
                escape_xml(&d.url_to),
                escape_xml(&d.title_from),
                escape_xml(&d.title_to),
                navigation_str(d.navigation),
            )
        })
        .unwrap_or_default();
    let layer = delta
        .layer
        .as_ref()
        .map(|l| {
            format!(
                "<layer from=\"{}\" to=\"{}\"/>",
                l.stack_from.iter().map(ToString::to_string).collect::<Vec<_>>().join(","),
                l.stack_to.iter().map(ToString::to_string).collect::<Vec<_>>().join(","),
            )
        })
        .unwrap_or_default();
    let added: String = delta
        .actionables
        .added
        .iter()
        .map(|eid| format!("<added eid=\"{}\"/>", escape_xml(&eid.0)))
        .collect();
    let removed: String = delta
        .actionables
        .removed
        .iter()
        .map(|eid| format!("<removed eid=\"{}\"/>", escape_xml(&eid.0)))
        .collect();
    let changed: String = delta
        .actionables
        .changed
        .iter()
        .map(|c| format!("<changed eid=\"{}\"/>", escape_xml(&c.eid.0)))
        .collect();
    format!("<diff>{doc}{layer}{added}{removed}{changed}</diff>")
}

fn navigation_str(kind: NavigationKind) -> &'static str {
    match kind {
        NavigationKind::Soft => "soft",
        NavigationKind::Hard => "hard",
    }
}

fn render_observations(batch: &ObservationBatch) -> String {
    if batch.during_action.is_empty() && batch.since_previous.is_empty() {
        return "<observations/>".to_string();
    }
    let during: String = batch.during_action.iter().map(render_observation).collect();
    let since: String = batch.since_previous.iter().map(render_observation).collect();
    format!("<observations><during_action>{during}</during_action><since_previous>{since}</since_previous></observations>")
}

fn render_observation(obs: &DomObservation) -> String {
    format!(
        "<observation type=\"{}\" significance=\"{}\" tag=\"{}\">{}</observation>",
        observation_type_str(obs.r#type),
        obs.significance,
        escape_xml(&obs.content.tag),
        escape_xml(&obs.content.text),
    )
}

fn observation_type_str(kind: ObservationType) -> &'static str {
    match kind {
        ObservationType::Appeared => "appeared",
        ObservationType::Disappeared => "disappeared",
    }
}

/// `<result type="find_elements">` (spec §6): one `<element>` summary per
/// match, in the query's own order.
pub fn render_find_elements(nodes: &[&ReadableNode]) -> String {
    let elements: String = nodes.iter().map(|node| render_element_summary(node)).collect();
    format!("<result type=\"find_elements\">{elements}</result>")
}

fn render_element_summary(node: &ReadableNode) -> String {
    format!(
        "<element eid=\"{}\" kind=\"{}\" label=\"{}\" selector=\"{}\"/>",
        escape_xml(eid_str(node)),
        render::actions::kind_str(node.kind),
        escape_xml(&node.label),
        escape_xml(selector_str(node)),
    )
}

/// `<result type="get_element_details">` (spec §6): one element's full
/// state plus its primary locator, exposed as a `<selector>` child.
pub fn render_element_details(node: &ReadableNode) -> String {
    let state = node.state.as_ref();
    format!(
        "<result type=\"get_element_details\"><element eid=\"{}\" kind=\"{}\" label=\"{}\" region=\"{}\" visible=\"{}\" enabled=\"{}\"><selector>{}</selector></element></result>",
        escape_xml(eid_str(node)),
        render::actions::kind_str(node.kind),
        escape_xml(&node.label),
        node.r#where.region.as_str(),
        state.map(|s| s.visible).unwrap_or(false),
        state.map(|s| s.enabled).unwrap_or(false),
        escape_xml(selector_str(node)),
    )
}

fn eid_str(node: &ReadableNode) -> &str {
    node.eid.as_ref().map(|e| e.0.as_str()).unwrap_or("")
}

fn selector_str(node: &ReadableNode) -> &str {
    node.find.as_ref().map(|f| f.primary.as_str()).unwrap_or("")
}

/// `<result type="list_pages">` (spec §6).
pub fn render_list_pages(pages: &[PageSummary]) -> String {
    let items: String = pages
        .iter()
        .map(|p| {
            format!(
                "<page id=\"{}\" url=\"{}\" title=\"{}\"/>",
                escape_xml(&p.page_id),
                escape_xml(&p.url),
                escape_xml(&p.title),
            )
        })
        .collect();
    format!("<result type=\"list_pages\">{items}</result>")
}

pub fn render_close_page(page_id: &str) -> String {
    format!("<result type=\"close_page\">{}</result>", escape_xml(page_id))
}

pub fn render_close_session() -> String {
    "<result type=\"close_session\">closed</result>".to_string()
}

pub fn render_error(message: &str) -> String {
    format!("<error>{}</error>", escape_xml(message))
}

pub fn render_error_for<E: std::fmt::Display>(err: &E) -> String {
    render_error(&err.to_string())
}

/// A state-mutating tool's error additionally emits a `<state>` block with
/// the pre-action snapshot so the agent can retry (spec §7 "Propagation
/// policy").
pub fn render_error_with_state(
    message: &str,
    pre_action_snapshot: &BaseSnapshot,
    fact_pack: &FactPack,
    budget: Budget,
) -> String {
    let state = render_state(pre_action_snapshot, None, &ObservationBatch::default(), fact_pack, budget);
    format!("{}{}", render_error(message), state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapshot_traits::factpack::{FactPackMeta, PageClassification, PageType};
    use snapshot_traits::node::{BBox, Layer, Layout, Locators, NodeKind, NodeState, Where};
    use snapshot_traits::{BackendNodeId, Eid, FrameId, LoaderId, NodeId, PageAtoms, SnapshotId, Viewport};

    fn node() -> ReadableNode {
        ReadableNode {
            node_id: NodeId("n1".to_string()),
            backend_node_id: BackendNodeId(1),
            frame_id: FrameId("main".to_string()),
            loader_id: LoaderId("L1".to_string()),
            kind: NodeKind::Button,
            label: "Add to Cart".to_string(),
            r#where: Where { region: Region::Main, ..Where::default() },
            layout: Layout { bbox: BBox::default(), ..Layout::default() },
            state: Some(NodeState { visible: true, enabled: true, ..NodeState::default() }),
            find: Some(Locators { primary: "button#add-to-cart".to_string(), ..Locators::default() }),
            attributes: None,
            eid: Some(Eid("abc123456789".to_string())),
            layer: Layer::Main,
        }
    }

    fn snapshot() -> BaseSnapshot {
        BaseSnapshot {
            snapshot_id: SnapshotId::new(),
            url: "https://shop.test/cart".to_string(),
            title: "Your \"Cart\"".to_string(),
            language: None,
            captured_at: chrono::Utc::now(),
            viewport: Viewport { w: 1280.0, h: 800.0 },
            nodes: vec![],
            atoms: PageAtoms::default(),
            meta: Default::default(),
        }
    }

    fn fact_pack() -> FactPack {
        FactPack {
            page_type: PageClassification {
                r#type: PageType::Cart,
                confidence: 0.6,
                signals: vec![],
                entities: vec![],
                has_forms: false,
                has_navigation: false,
                has_main_content: true,
                has_search: false,
            },
            dialogs: vec![],
            forms: vec![],
            actions: vec![],
            meta: FactPackMeta { node_count: 0, has_blocking_dialog: false },
        }
    }

    #[test]
    fn missing_diff_renders_as_empty_element() {
        let xml = render_state(&snapshot(), None, &ObservationBatch::default(), &fact_pack(), Budget::Standard);
        assert!(xml.contains("<diff/>"));
    }

    #[test]
    fn state_escapes_title_attribute() {
        let xml = render_state(&snapshot(), None, &ObservationBatch::default(), &fact_pack(), Budget::Standard);
        assert!(xml.contains("title=\"Your &quot;Cart&quot;\""));
    }

    #[test]
    fn find_elements_lists_eid_and_selector() {
        let n = node();
        let xml = render_find_elements(&[&n]);
        assert!(xml.starts_with("<result type=\"find_elements\">"));
        assert!(xml.contains("eid=\"abc123456789\""));
        assert!(xml.contains("selector=\"button#add-to-cart\""));
    }

    #[test]
    fn error_message_is_escaped() {
        let xml = render_error("value must be <= 10");
        assert_eq!(xml, "<error>value must be &lt;= 10</error>");
    }

    #[test]
    fn mutation_error_carries_pre_action_state() {
        let xml = render_error_with_state("click failed", &snapshot(), &fact_pack(), Budget::Standard);
        assert!(xml.starts_with("<error>click failed</error>"));
        assert!(xml.contains("<state>"));
    }
}
