/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! DOM extraction (spec §4.3 "DOM"): `DOM.getDocument(depth=-1, pierce=true)`
//! flattened into a `backend_node_id`-keyed map.

use std::collections::HashMap;

use rustc_hash::FxHashMap;
use serde_json::Value;
use snapshot_traits::{BackendNodeId, FrameId};

/// One DOM node as reported by CDP, attributes already parsed out of the
/// flat `[k, v, k, v, …]` array CDP sends.
#[derive(Clone, Debug)]
pub struct RawDomNode {
    pub backend_node_id: BackendNodeId,
    pub node_id: i64,
    pub node_name: String,
    pub node_type: i64,
    pub node_value: Option<String>,
    pub attributes: HashMap<String, String>,
    pub child_node_ids: Vec<BackendNodeId>,
    pub parent_id: Option<BackendNodeId>,
    pub shadow_root_type: Option<String>,
    pub frame_id: Option<FrameId>,
}

impl RawDomNode {
    pub fn tag_lower(&self) -> String {
        self.node_name.to_ascii_lowercase()
    }
}

/// Flattened result of one `DOM.getDocument` pierce traversal.
#[derive(Default)]
pub struct DomExtraction {
    pub nodes: FxHashMap<BackendNodeId, RawDomNode>,
    pub root_id: Option<BackendNodeId>,
    /// Sub-frame ids discovered via nodes carrying a `frameId`
    /// (`contentDocument` hosts), for Accessibility fan-out (spec §4.3).
    pub frame_ids: Vec<FrameId>,
    /// Host node ids of shadow roots encountered, for shadow-path locators.
    pub shadow_host_ids: Vec<BackendNodeId>,
}

/// Parses the raw JSON body of a `DOM.getDocument` response
/// (`{"root": {...}}`) into a flat node map, recursing through `children`,
/// `shadowRoots`, and `contentDocument`.
pub fn extract(response: &Value) -> DomExtraction {
    let mut extraction = DomExtraction::default();
    if let Some(root) = response.get("root") {
        extraction.root_id = walk(root, None, None, &mut extraction);
    }
    extraction
}

fn walk(
    node: &Value,
    parent_id: Option<BackendNodeId>,
    frame_id: Option<FrameId>,
    out: &mut DomExtraction,
) -> Option<BackendNodeId> {
    let backend_node_id = BackendNodeId(node.get("backendNodeId")?.as_i64()?);
    let node_id = node.get("nodeId").and_then(Value::as_i64).unwrap_or(0);
    let node_name = node
        .get("nodeName")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let node_type = node.get("nodeType").and_then(Value::as_i64).unwrap_or(0);
    let node_value = node
        .get("nodeValue")
        .and_then(Value::as_str)
        .map(str::to_string);
    let shadow_root_type = node
        .get("shadowRootType")
        .and_then(Value::as_str)
        .map(str::to_string);

    let own_frame_id = node
        .get("frameId")
        .and_then(Value::as_str)
        .map(|s| FrameId(s.to_string()))
        .or_else(|| frame_id.clone());
    if let Some(discovered) = node.get("frameId").and_then(Value::as_str) {
        out.frame_ids.push(FrameId(discovered.to_string()));
    }
    if shadow_root_type.is_some() {
        if let Some(parent) = parent_id {
            out.shadow_host_ids.push(parent);
        }
    }

    let attributes = parse_flat_attributes(node.get("attributes"));

    let mut child_node_ids = Vec::new();
    if let Some(children) = node.get("children").and_then(Value::as_array) {
        for child in children {
            if let Some(id) = walk(child, Some(backend_node_id), own_frame_id.clone(), out) {
                child_node_ids.push(id);
            }
        }
    }
    if let Some(shadow_roots) = node.get("shadowRoots").and_then(Value::as_array) {
        for root in shadow_roots {
            if let Some(id) = walk(root, Some(backend_node_id), own_frame_id.clone(), out) {
                child_node_ids.push(id);
            }
        }
    }
    if let Some(content_doc) = node.get("contentDocument") {
        if let Some(id) = walk(content_doc, Some(backend_node_id), own_frame_id.clone(), out) {
            child_node_ids.push(id);
        }
    }

    out.nodes.insert(
        backend_node_id,
        RawDomNode {
            backend_node_id,
            node_id,
            node_name,
            node_type,
            node_value,
            attributes,
            child_node_ids,
            parent_id,
            shadow_root_type,
            frame_id: own_frame_id,
        },
    );

    Some(backend_node_id)
}

fn parse_flat_attributes(value: Option<&Value>) -> HashMap<String, String> {
    let mut out = HashMap::new();
    let Some(array) = value.and_then(Value::as_array) else {
        return out;
    };
    let mut iter = array.iter();
    while let (Some(key), Some(val)) = (iter.next(), iter.next()) {
        if let (Some(key), Some(val)) = (key.as_str(), val.as_str()) {
            out.insert(key.to_string(), val.to_string());
        }
    }
    out
}
