/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Layout / visibility / state extraction (spec §4.3 "Layout / Visibility /
//! State"): `DOM.getBoxModel` plus `CSS.getComputedStyleForNode` per
//! candidate node. Failures on hidden/detached elements are expected and
//! logged at debug level rather than surfaced.

use serde_json::Value;
use snapshot_traits::node::{BBox, Layout};
use snapshot_traits::BackendNodeId;

use crate::session::CdpSession;

#[derive(Clone, Debug, Default)]
pub struct LayoutState {
    pub layout: Layout,
    pub visible: bool,
}

/// Fetches box model and computed style for one node. Never returns
/// `Err`: a failed box model or style read produces `visible: false` and a
/// zero bbox, matching spec §4.3's "marked visible:false with zero bbox".
pub async fn extract(session: &CdpSession, backend_node_id: BackendNodeId) -> LayoutState {
    let bbox = fetch_box_model(session, backend_node_id).await;
    let style = fetch_computed_style(session, backend_node_id).await;

    let display = style.as_ref().and_then(|s| s.get("display").cloned());
    let positioning = style.as_ref().and_then(|s| s.get("position").cloned());
    let visibility = style
        .as_ref()
        .and_then(|s| s.get("visibility").cloned())
        .unwrap_or_else(|| "visible".to_string());

    let is_display_none = display.as_deref() == Some("none");
    let is_visibility_hidden = matches!(visibility.as_str(), "hidden" | "collapse");
    let bbox_present = bbox.is_some();
    let bbox = bbox.unwrap_or_default();

    let visible = bbox_present && !is_display_none && !is_visibility_hidden && !bbox.is_empty();

    LayoutState {
        layout: Layout {
            bbox,
            display,
            positioning,
            flow: style.as_ref().and_then(|s| s.get("float").cloned()),
            screen_zone: None,
        },
        visible,
    }
}

async fn fetch_box_model(session: &CdpSession, backend_node_id: BackendNodeId) -> Option<BBox> {
    let result: Result<Value, _> = session
        .send(
            "DOM.getBoxModel",
            serde_json::json!({ "backendNodeId": backend_node_id.0 }),
        )
        .await;
    let value = match result {
        Ok(value) => value,
        Err(err) => {
            log::debug!("box model unavailable for node {backend_node_id}: {err}");
            return None;
        }
    };
    let quad = value.get("model")?.get("content")?.as_array()?;
    if quad.len() < 8 {
        return None;
    }
    let xs: Vec<f64> = (0..8).step_by(2).filter_map(|i| quad[i].as_f64()).collect();
    let ys: Vec<f64> = (1..8).step_by(2).filter_map(|i| quad[i].as_f64()).collect();
    let (x_min, x_max) = min_max(&xs)?;
    let (y_min, y_max) = min_max(&ys)?;
    Some(BBox {
        x: x_min,
        y: y_min,
        w: x_max - x_min,
        h: y_max - y_min,
    })
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if min.is_finite() && max.is_finite() {
        Some((min, max))
    } else {
        None
    }
}

async fn fetch_computed_style(
    session: &CdpSession,
    backend_node_id: BackendNodeId,
) -> Option<std::collections::HashMap<String, String>> {
    let result: Result<Value, _> = session
        .send(
            "CSS.getComputedStyleForNode",
            serde_json::json!({ "nodeId": backend_node_id.0 }),
        )
        .await;
    let value = match result {
        Ok(value) => value,
        Err(err) => {
            log::debug!("computed style unavailable for node {backend_node_id}: {err}");
            return None;
        }
    };
    let entries = value.get("computedStyle")?.as_array()?;
    Some(
        entries
            .iter()
            .filter_map(|entry| {
                let name = entry.get("name")?.as_str()?;
                let value = entry.get("value")?.as_str()?;
                Some((name.to_string(), value.to_string()))
            })
            .collect(),
    )
}
