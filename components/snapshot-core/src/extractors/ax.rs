/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Accessibility tree extraction (spec §4.3 "Accessibility"):
//! `Accessibility.getFullAXTree(depth=-1)` for the main frame, fanned out
//! (bounded by `ax_fanout_limit`) across discovered sub-frames.

use futures::stream::{self, StreamExt};
use rustc_hash::FxHashMap;
use serde_json::Value;
use snapshot_traits::{BackendNodeId, FrameId, SessionError};

use crate::session::CdpSession;

/// Closed classification of an AX role (spec §4.3).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AxRoleClass {
    Interactive,
    Readable,
    Structural,
    Unknown,
}

const IGNORED_ROLES: &[&str] = &["none", "presentation", "generic", "InlineTextBox"];

const INTERACTIVE_ROLES: &[&str] = &[
    "button", "link", "textbox", "searchbox", "combobox", "checkbox", "radio", "switch",
    "slider", "tab", "menuitem", "menuitemcheckbox", "menuitemradio", "option",
];

const READABLE_ROLES: &[&str] = &[
    "heading", "paragraph", "listitem", "list", "img", "figure", "table", "row", "cell",
    "columnheader", "rowheader", "article", "status", "alert", "tooltip",
];

const STRUCTURAL_ROLES: &[&str] = &[
    "form", "dialog", "navigation", "main", "banner", "contentinfo", "complementary", "search",
    "region", "group", "section",
];

pub fn classify_role(role: &str) -> AxRoleClass {
    let role = role.to_ascii_lowercase();
    if INTERACTIVE_ROLES.contains(&role.as_str()) {
        AxRoleClass::Interactive
    } else if READABLE_ROLES.contains(&role.as_str()) {
        AxRoleClass::Readable
    } else if STRUCTURAL_ROLES.contains(&role.as_str()) {
        AxRoleClass::Structural
    } else {
        AxRoleClass::Unknown
    }
}

#[derive(Clone, Debug)]
pub struct RawAxNode {
    pub ax_node_id: String,
    pub backend_node_id: BackendNodeId,
    pub role: String,
    pub name: String,
    pub properties: FxHashMap<String, Value>,
    pub child_ids: Vec<String>,
    pub role_class: AxRoleClass,
}

#[derive(Default)]
pub struct AxExtraction {
    pub nodes: FxHashMap<BackendNodeId, RawAxNode>,
    pub interactive_ids: Vec<BackendNodeId>,
    pub readable_ids: Vec<BackendNodeId>,
}

impl AxExtraction {
    fn merge(&mut self, other: AxExtraction) {
        self.nodes.extend(other.nodes);
        self.interactive_ids.extend(other.interactive_ids);
        self.readable_ids.extend(other.readable_ids);
    }
}

/// Fetches the main-frame AX tree plus one per `sub_frame_ids`, with
/// concurrency bounded by `fanout_limit`. Per-frame failures (routine for
/// cross-origin frames) are swallowed and logged, not propagated.
pub async fn extract(
    session: &CdpSession,
    sub_frame_ids: &[FrameId],
    fanout_limit: usize,
) -> Result<AxExtraction, SessionError> {
    let main: Value = session
        .send("Accessibility.getFullAXTree", serde_json::json!({}))
        .await?;
    let mut merged = parse_ax_tree(&main);

    let fetches = stream::iter(sub_frame_ids.iter().cloned().map(|frame_id| async move {
        let result: Result<Value, SessionError> = session
            .send(
                "Accessibility.getFullAXTree",
                serde_json::json!({ "frameId": frame_id.0 }),
            )
            .await;
        match result {
            Ok(value) => Some(parse_ax_tree(&value)),
            Err(err) => {
                log::debug!("accessibility fan-out failed for frame {frame_id}: {err}");
                None
            }
        }
    }))
    .buffer_unordered(fanout_limit.max(1))
    .collect::<Vec<_>>()
    .await;

    for extraction in fetches.into_iter().flatten() {
        merged.merge(extraction);
    }

    Ok(merged)
}

fn parse_ax_tree(response: &Value) -> AxExtraction {
    let mut out = AxExtraction::default();
    let Some(nodes) = response.get("nodes").and_then(Value::as_array) else {
        return out;
    };

    for node in nodes {
        if node.get("ignored").and_then(Value::as_bool).unwrap_or(false) {
            continue;
        }
        let Some(backend_node_id) = node.get("backendDOMNodeId").and_then(Value::as_i64) else {
            continue;
        };
        let role = node
            .get("role")
            .and_then(|r| r.get("value"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if IGNORED_ROLES.contains(&role.as_str()) {
            continue;
        }
        let name = node
            .get("name")
            .and_then(|n| n.get("value"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let ax_node_id = node
            .get("nodeId")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let child_ids = node
            .get("childIds")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let properties = node
            .get("properties")
            .and_then(Value::as_array)
            .map(|props| {
                props
                    .iter()
                    .filter_map(|p| {
                        let name = p.get("name").and_then(Value::as_str)?;
                        let value = p.get("value").and_then(|v| v.get("value")).cloned()?;
                        Some((name.to_string(), value))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let backend_node_id = BackendNodeId(backend_node_id);
        let role_class = classify_role(&role);
        match role_class {
            AxRoleClass::Interactive => out.interactive_ids.push(backend_node_id),
            AxRoleClass::Readable => out.readable_ids.push(backend_node_id),
            _ => {}
        }
        out.nodes.insert(
            backend_node_id,
            RawAxNode {
                ax_node_id,
                backend_node_id,
                role,
                name,
                properties,
                child_ids,
                role_class,
            },
        );
    }

    out
}
