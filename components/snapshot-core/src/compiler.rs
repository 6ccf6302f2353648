/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Snapshot Compiler (spec §4.4): orchestrates DOM + AX extraction into one
//! `BaseSnapshot`. Runs the two tree fetches, builds the candidate node set,
//! resolves each candidate's label/region/grouping/layout/state/locators,
//! assigns document-order `node_id`s, and mints EIDs via `crate::identity`.

use std::collections::HashMap;
use std::time::Instant;

use rustc_hash::FxHashSet;
use serde_json::{json, Value};
use snapshot_traits::node::{Attributes, Layout, Locators, NodeState, Where};
use snapshot_traits::snapshot::SnapshotMeta;
use snapshot_traits::{
    BackendNodeId, BaseSnapshot, CaptureError, FrameId, LoaderId, NodeId, NodeKind, PageAtoms,
    ReadableNode, Region, SessionError, SnapshotId, Viewport,
};

use crate::extractors::ax::{self, AxExtraction, AxRoleClass, RawAxNode};
use crate::extractors::dom::{self, DomExtraction, RawDomNode};
use crate::extractors::grouping::{self, AncestorFacts as GroupAncestorFacts};
use crate::extractors::label;
use crate::extractors::layout;
use crate::extractors::locator::{self, LocatorInput};
use crate::extractors::region::{self, AncestorFacts as RegionAncestorFacts};
use crate::extractors::ExtractorContext;
use crate::identity::{self, Fingerprint};
use crate::session::CdpSession;

const INTERACTIVE_TAGS: &[(&str, NodeKind)] = &[
    ("a", NodeKind::Link),
    ("button", NodeKind::Button),
    ("input", NodeKind::Input),
    ("textarea", NodeKind::Textarea),
    ("select", NodeKind::Select),
];

const STRUCTURAL_TAGS: &[(&str, NodeKind)] = &[
    ("h1", NodeKind::Heading),
    ("h2", NodeKind::Heading),
    ("h3", NodeKind::Heading),
    ("h4", NodeKind::Heading),
    ("h5", NodeKind::Heading),
    ("h6", NodeKind::Heading),
    ("p", NodeKind::Paragraph),
    ("ul", NodeKind::List),
    ("ol", NodeKind::List),
    ("li", NodeKind::Listitem),
    ("img", NodeKind::Image),
    ("video", NodeKind::Media),
    ("audio", NodeKind::Media),
    ("table", NodeKind::Table),
    ("form", NodeKind::Form),
    ("dialog", NodeKind::Dialog),
    ("nav", NodeKind::Navigation),
    ("section", NodeKind::Section),
    ("article", NodeKind::Section),
];

const LANDMARK_TAGS: &[&str] = &["header", "nav", "main", "aside", "footer", "dialog", "form", "section"];

const TESTID_ATTRS: &[&str] = &["data-testid", "data-test", "data-cy", "data-test-id"];

/// Captures one `BaseSnapshot`, racing the whole orchestration against
/// `config.capture_timeout` (spec §4.4 "Failure semantics", §5).
pub async fn capture(
    ctx: &ExtractorContext,
    frame_id: FrameId,
    loader_id: LoaderId,
) -> Result<BaseSnapshot, CaptureError> {
    tokio::time::timeout(ctx.config.capture_timeout, capture_inner(ctx, frame_id, loader_id))
        .await
        .map_err(|_| CaptureError::DeadlineExceeded)?
}

async fn capture_inner(
    ctx: &ExtractorContext,
    frame_id: FrameId,
    loader_id: LoaderId,
) -> Result<BaseSnapshot, CaptureError> {
    let started = Instant::now();

    let dom_response: Value = ctx
        .session
        .send("DOM.getDocument", json!({ "depth": -1, "pierce": true }))
        .await
        .map_err(|err| CaptureError::DomExtractionFailed(err.to_string()))?;
    let dom = dom::extract(&dom_response);

    let sub_frame_ids = dedup_frame_ids(&dom.frame_ids);
    let ax = ax::extract(&ctx.session, &sub_frame_ids, ctx.config.ax_fanout_limit)
        .await
        .map_err(|err| CaptureError::AxExtractionFailed(err.to_string()))?;

    let shadow_hosts: FxHashSet<BackendNodeId> = dom.shadow_host_ids.iter().cloned().collect();
    let label_for_index = build_label_for_index(&dom);

    let mut warnings = Vec::new();
    let mut candidate_ids: Vec<BackendNodeId> = document_order(&dom)
        .into_iter()
        .filter(|id| is_candidate(*id, &dom, &ax))
        .collect();

    let total_candidates = candidate_ids.len();
    let partial = total_candidates > ctx.config.max_nodes;
    if partial {
        warnings.push(format!(
            "node cap ({}) reached; {} candidate nodes dropped",
            ctx.config.max_nodes,
            total_candidates - ctx.config.max_nodes
        ));
        candidate_ids.truncate(ctx.config.max_nodes);
    }

    let mut nodes: Vec<ReadableNode> = Vec::with_capacity(candidate_ids.len());
    for id in &candidate_ids {
        if let Some(node) = build_node(&dom, &ax, &shadow_hosts, &label_for_index, &frame_id, &loader_id, *id) {
            nodes.push(node);
        }
    }

    for node in &mut nodes {
        let layout_state = layout::extract(&ctx.session, node.backend_node_id).await;
        let ax_node = ax.nodes.get(&node.backend_node_id);
        let dom_node = dom.nodes.get(&node.backend_node_id);
        node.layout = layout_state.layout;
        node.state = dom_node.map(|dn| node_state(dn, ax_node, layout_state.visible));
    }

    let node_count = nodes.len();
    let interactive_count = nodes.iter().filter(|n| n.kind.is_interactive()).count();

    let bases: Vec<String> = nodes
        .iter()
        .map(|node| {
            let landmark_path = format!("{}/{}", node.r#where.region.as_str(), node.r#where.group_path.join("/"));
            identity::fingerprint_hash(&Fingerprint {
                name: &node.label,
                kind: node.kind,
                role: node.attributes.as_ref().and_then(|a| a.role.as_deref()),
                landmark_path: &landmark_path,
                position_hint: node.r#where.group_path.last().map(String::as_str),
                layer: &node.layer,
                href: node.attributes.as_ref().and_then(|a| a.href.as_deref()),
                shadow_path: node.find.as_ref().and_then(|f| f.shadow_path.as_deref()),
            })
        })
        .collect();
    let eids = identity::resolve_collisions(&bases);

    for (index, (node, eid)) in nodes.iter_mut().zip(eids.into_iter()).enumerate() {
        node.node_id = NodeId(format!("n{}", index + 1));
        node.eid = Some(eid);
    }

    let facts = fetch_page_facts(&ctx.session).await;

    Ok(BaseSnapshot {
        snapshot_id: SnapshotId::new(),
        url: facts.url,
        title: facts.title,
        language: facts.language,
        captured_at: chrono::Utc::now(),
        viewport: facts.viewport,
        nodes,
        atoms: facts.atoms,
        meta: SnapshotMeta {
            partial,
            warnings,
            node_count,
            interactive_count,
            capture_duration_ms: started.elapsed().as_millis() as u64,
        },
    })
}

fn dedup_frame_ids(ids: &[FrameId]) -> Vec<FrameId> {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut out = Vec::new();
    for id in ids {
        if seen.insert(id.0.clone()) {
            out.push(id.clone());
        }
    }
    out
}

fn build_label_for_index(dom: &DomExtraction) -> HashMap<String, BackendNodeId> {
    let mut map = HashMap::new();
    for node in dom.nodes.values() {
        if node.tag_lower() == "label" {
            if let Some(target) = node.attributes.get("for") {
                map.insert(target.clone(), node.backend_node_id);
            }
        }
    }
    map
}

fn document_order(dom: &DomExtraction) -> Vec<BackendNodeId> {
    let mut out = Vec::with_capacity(dom.nodes.len());
    if let Some(root) = dom.root_id {
        visit(dom, root, &mut out);
    }
    out
}

fn visit(dom: &DomExtraction, id: BackendNodeId, out: &mut Vec<BackendNodeId>) {
    out.push(id);
    if let Some(node) = dom.nodes.get(&id) {
        for &child in &node.child_node_ids {
            visit(dom, child, out);
        }
    }
}

fn is_candidate(id: BackendNodeId, dom: &DomExtraction, ax: &AxExtraction) -> bool {
    if let Some(ax_node) = ax.nodes.get(&id) {
        if matches!(ax_node.role_class, AxRoleClass::Interactive | AxRoleClass::Readable) {
            return true;
        }
    }
    let Some(dom_node) = dom.nodes.get(&id) else {
        return false;
    };
    let tag = dom_node.tag_lower();
    INTERACTIVE_TAGS.iter().any(|(t, _)| *t == tag) || STRUCTURAL_TAGS.iter().any(|(t, _)| *t == tag)
}

fn role_to_kind(role: &str) -> Option<NodeKind> {
    match role {
        "button" => Some(NodeKind::Button),
        "link" => Some(NodeKind::Link),
        "textbox" | "searchbox" => Some(NodeKind::Input),
        "combobox" => Some(NodeKind::Combobox),
        "checkbox" => Some(NodeKind::Checkbox),
        "radio" => Some(NodeKind::Radio),
        "switch" => Some(NodeKind::Switch),
        "slider" => Some(NodeKind::Slider),
        "tab" => Some(NodeKind::Tab),
        "menuitem" | "menuitemcheckbox" | "menuitemradio" | "option" => Some(NodeKind::Menuitem),
        "heading" => Some(NodeKind::Heading),
        "paragraph" => Some(NodeKind::Paragraph),
        "list" => Some(NodeKind::List),
        "listitem" => Some(NodeKind::Listitem),
        "img" | "figure" => Some(NodeKind::Image),
        "table" => Some(NodeKind::Table),
        "dialog" | "alertdialog" => Some(NodeKind::Dialog),
        "navigation" => Some(NodeKind::Navigation),
        "form" => Some(NodeKind::Form),
        _ => None,
    }
}

fn kind_for_input(input_type: Option<&str>) -> NodeKind {
    match input_type.unwrap_or("text") {
        "checkbox" => NodeKind::Checkbox,
        "radio" => NodeKind::Radio,
        _ => NodeKind::Input,
    }
}

fn heading_level(tag_lower: &str) -> Option<u8> {
    match tag_lower {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn classify_kind(tag_lower: &str, ax_role: Option<&str>, input_type: Option<&str>) -> NodeKind {
    if let Some(role) = ax_role {
        if let Some(kind) = role_to_kind(role) {
            return kind;
        }
    }
    if tag_lower == "input" {
        return kind_for_input(input_type);
    }
    if let Some((_, kind)) = INTERACTIVE_TAGS.iter().find(|(t, _)| *t == tag_lower) {
        return *kind;
    }
    if let Some((_, kind)) = STRUCTURAL_TAGS.iter().find(|(t, _)| *t == tag_lower) {
        return *kind;
    }
    NodeKind::Generic
}

/// Shallow text-content gather: used both for a candidate's own inner-text
/// label fallback and for a heading ancestor's text (spec §4.3 label/
/// grouping resolvers need *some* concrete string, not just a tag match).
fn node_text(dom: &DomExtraction, id: BackendNodeId) -> Option<String> {
    let mut text = String::new();
    collect_text(dom, id, &mut text, 0);
    let trimmed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn collect_text(dom: &DomExtraction, id: BackendNodeId, out: &mut String, depth: u32) {
    if depth > 6 || out.len() > 400 {
        return;
    }
    let Some(node) = dom.nodes.get(&id) else {
        return;
    };
    if node.node_type == 3 {
        if let Some(value) = &node.node_value {
            out.push_str(value);
            out.push(' ');
        }
    }
    for &child in &node.child_node_ids {
        collect_text(dom, child, out, depth + 1);
    }
}

fn shadow_path_for(dom: &DomExtraction, shadow_hosts: &FxHashSet<BackendNodeId>, id: BackendNodeId) -> Option<Vec<String>> {
    let mut path = Vec::new();
    let mut current = dom.nodes.get(&id).and_then(|n| n.parent_id);
    while let Some(pid) = current {
        if shadow_hosts.contains(&pid) {
            if let Some(node) = dom.nodes.get(&pid) {
                path.push(node.tag_lower());
            }
        }
        current = dom.nodes.get(&pid).and_then(|n| n.parent_id);
    }
    if path.is_empty() {
        None
    } else {
        path.reverse();
        Some(path)
    }
}

struct AncestorInfo {
    tag_lower: String,
    id_attr: Option<String>,
    testid_attr: Option<String>,
    heading_text: Option<String>,
    landmark_label: Option<String>,
    role: Option<String>,
    aria_modal: bool,
    is_open_dialog_element: bool,
}

fn ancestor_chain(dom: &DomExtraction, ax: &AxExtraction, id: BackendNodeId) -> Vec<AncestorInfo> {
    let mut out = Vec::new();
    let mut current = dom.nodes.get(&id).and_then(|n| n.parent_id);
    while let Some(pid) = current {
        let Some(node) = dom.nodes.get(&pid) else { break };
        let tag_lower = node.tag_lower();
        let heading_text = if heading_level(&tag_lower).is_some() {
            node_text(dom, pid)
        } else {
            None
        };
        let landmark_label = if LANDMARK_TAGS.contains(&tag_lower.as_str()) {
            node.attributes.get("aria-label").cloned()
        } else {
            None
        };
        out.push(AncestorInfo {
            id_attr: node.attributes.get("id").cloned(),
            testid_attr: TESTID_ATTRS.iter().find_map(|a| node.attributes.get(*a).cloned()),
            heading_text,
            landmark_label,
            role: ax.nodes.get(&pid).map(|n| n.role.clone()),
            aria_modal: node.attributes.get("aria-modal").map(|v| v == "true").unwrap_or(false),
            is_open_dialog_element: tag_lower == "dialog" && node.attributes.contains_key("open"),
            tag_lower,
        });
        current = node.parent_id;
    }
    out
}

fn node_state(dom_node: &RawDomNode, ax_node: Option<&RawAxNode>, visible: bool) -> NodeState {
    let prop_bool = |key: &str| ax_node.and_then(|n| n.properties.get(key)).and_then(Value::as_bool);
    let disabled = prop_bool("disabled").unwrap_or(false) || dom_node.attributes.contains_key("disabled");
    NodeState {
        visible,
        enabled: !disabled,
        checked: prop_bool("checked"),
        expanded: prop_bool("expanded"),
        selected: prop_bool("selected"),
        focused: prop_bool("focused"),
        required: prop_bool("required").or(dom_node.attributes.contains_key("required").then_some(true)),
        invalid: prop_bool("invalid").or(dom_node.attributes.get("aria-invalid").map(|v| v == "true")),
        readonly: prop_bool("readonly").or(dom_node.attributes.contains_key("readonly").then_some(true)),
    }
}

fn node_attributes(dom_node: &RawDomNode, ax_role: Option<&str>) -> Attributes {
    Attributes {
        input_type: dom_node.attributes.get("type").cloned(),
        placeholder: dom_node.attributes.get("placeholder").cloned(),
        value: dom_node.attributes.get("value").cloned(),
        href: dom_node.attributes.get("href").cloned(),
        alt: dom_node.attributes.get("alt").cloned(),
        src: dom_node.attributes.get("src").cloned(),
        heading_level: heading_level(&dom_node.tag_lower()),
        action: dom_node.attributes.get("action").cloned(),
        method: dom_node.attributes.get("method").cloned(),
        autocomplete: dom_node.attributes.get("autocomplete").cloned(),
        role: ax_role.map(str::to_string).or_else(|| dom_node.attributes.get("role").cloned()),
        test_id: TESTID_ATTRS.iter().find_map(|a| dom_node.attributes.get(*a).cloned()),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_node(
    dom: &DomExtraction,
    ax: &AxExtraction,
    shadow_hosts: &FxHashSet<BackendNodeId>,
    label_for_index: &HashMap<String, BackendNodeId>,
    main_frame_id: &FrameId,
    loader_id: &LoaderId,
    id: BackendNodeId,
) -> Option<ReadableNode> {
    let dom_node = dom.nodes.get(&id)?;
    let ax_node = ax.nodes.get(&id);
    let tag = dom_node.tag_lower();
    let input_type = dom_node.attributes.get("type").map(String::as_str);
    let kind = classify_kind(&tag, ax_node.map(|n| n.role.as_str()), input_type);

    let ancestors = ancestor_chain(dom, ax, id);
    let region_facts: Vec<RegionAncestorFacts> = ancestors
        .iter()
        .map(|a| RegionAncestorFacts {
            tag_lower: &a.tag_lower,
            role: a.role.as_deref(),
            aria_modal: a.aria_modal,
            is_open_dialog_element: a.is_open_dialog_element,
        })
        .collect();
    let region = region::resolve(&region_facts);

    let group_facts: Vec<GroupAncestorFacts> = ancestors
        .iter()
        .map(|a| GroupAncestorFacts {
            tag_lower: &a.tag_lower,
            id_attr: a.id_attr.as_deref(),
            testid_attr: a.testid_attr.as_deref(),
            heading_text: a.heading_text.as_deref(),
            landmark_label: a.landmark_label.as_deref(),
        })
        .collect();
    let grouping_result = grouping::resolve(&group_facts);

    let associated_label_text = dom_node
        .attributes
        .get("id")
        .and_then(|dom_id| label_for_index.get(dom_id))
        .and_then(|label_id| node_text(dom, *label_id));
    let inner_text = node_text(dom, id);
    let resolved_label = label::resolve(
        ax_node.map(|n| n.name.as_str()),
        dom_node,
        associated_label_text.as_deref(),
        inner_text.as_deref(),
    );

    let classes: Vec<String> = dom_node
        .attributes
        .get("class")
        .map(|c| c.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    let shadow_path = shadow_path_for(dom, shadow_hosts, id);
    let frame_path = dom_node
        .frame_id
        .as_ref()
        .filter(|f| *f != main_frame_id)
        .map(|f| vec![f.0.clone()]);

    let accessible_name = ax_node
        .map(|n| n.name.as_str())
        .filter(|s| !s.is_empty())
        .or_else(|| (!resolved_label.label.is_empty()).then_some(resolved_label.label.as_str()));

    let locators: Locators = locator::build(&LocatorInput {
        tag_lower: &tag,
        attributes: &dom_node.attributes,
        role: ax_node.map(|n| n.role.as_str()),
        accessible_name,
        id_attr: dom_node.attributes.get("id").map(String::as_str),
        classes: &classes,
        frame_path,
        shadow_path,
    });

    let attributes = node_attributes(dom_node, ax_node.map(|n| n.role.as_str()));
    let region_is_dialog = region == Region::Dialog;

    Some(ReadableNode {
        node_id: NodeId(String::new()),
        backend_node_id: id,
        frame_id: dom_node.frame_id.clone().unwrap_or_else(|| main_frame_id.clone()),
        loader_id: loader_id.clone(),
        kind,
        label: resolved_label.label,
        r#where: Where {
            region,
            group_id: grouping_result.group_id,
            group_path: grouping_result.group_path,
            heading_context: grouping_result.heading_context,
        },
        layout: Layout::default(),
        state: None,
        find: Some(locators),
        attributes: Some(attributes),
        eid: None,
        layer: identity::layer_for_identity(region_is_dialog, None),
    })
}

struct PageFacts {
    url: String,
    title: String,
    language: Option<String>,
    viewport: Viewport,
    atoms: PageAtoms,
}

/// One `Runtime.evaluate` for everything the Diff Engine treats as an atom
/// plus the page-level scalars (spec §4.4 step 4, §4.9 step 6). Counting
/// selectors (`.spinner`, `.toast`, …) are heuristics: no DOM convention
/// universally marks these, so this mirrors common patterns rather than a
/// spec'd contract.
const PAGE_FACTS_SCRIPT: &str = r#"(() => ({
    url: location.href,
    title: document.title,
    lang: document.documentElement.lang || null,
    viewportW: window.innerWidth,
    viewportH: window.innerHeight,
    scrollX: window.scrollX,
    scrollY: window.scrollY,
    loadingSpinnerCount: document.querySelectorAll('[aria-busy="true"], .spinner, .loading-spinner').length,
    validationErrorCount: document.querySelectorAll('[aria-invalid="true"]').length,
    toastCount: document.querySelectorAll('[role="status"], .toast').length,
}))()"#;

async fn fetch_page_facts(session: &CdpSession) -> PageFacts {
    let response: Result<Value, SessionError> = session
        .send(
            "Runtime.evaluate",
            json!({ "expression": PAGE_FACTS_SCRIPT, "returnByValue": true }),
        )
        .await;
    let value = response
        .ok()
        .and_then(|r| r.get("result").and_then(|r| r.get("value")).cloned())
        .unwrap_or(Value::Null);

    PageFacts {
        url: value.get("url").and_then(Value::as_str).unwrap_or_default().to_string(),
        title: value.get("title").and_then(Value::as_str).unwrap_or_default().to_string(),
        language: value.get("lang").and_then(Value::as_str).map(str::to_string),
        viewport: Viewport {
            w: value.get("viewportW").and_then(Value::as_f64).unwrap_or(0.0),
            h: value.get("viewportH").and_then(Value::as_f64).unwrap_or(0.0),
        },
        atoms: PageAtoms {
            scroll_x: value.get("scrollX").and_then(Value::as_f64).unwrap_or(0.0),
            scroll_y: value.get("scrollY").and_then(Value::as_f64).unwrap_or(0.0),
            loading_spinner_count: value.get("loadingSpinnerCount").and_then(Value::as_u64).unwrap_or(0) as u32,
            validation_error_count: value.get("validationErrorCount").and_then(Value::as_u64).unwrap_or(0) as u32,
            toast_count: value.get("toastCount").and_then(Value::as_u64).unwrap_or(0) as u32,
        },
    }
}
