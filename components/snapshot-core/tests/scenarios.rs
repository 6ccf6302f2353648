/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! End-to-end scenario tests exercising the pure engines (identity, diff,
//! frame tracker, factpack, render) the way an agent-facing session would
//! chain them, without a live browser.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use snapshot_core::config::Config;
use snapshot_core::frame_tracker::FrameTracker;
use snapshot_core::identity::{fingerprint_hash, resolve_collisions, Fingerprint};
use snapshot_core::session::CdpSession;
use snapshot_core::{diff, factpack, render};
use snapshot_traits::factpack::{
    ActionCategory, FactPack, FactPackMeta, FieldSemanticType, FormPurpose, PageClassification, PageType, ScoredAction,
};
use snapshot_traits::node::{Attributes, BBox, Layer, Layout, Locators, NodeKind, NodeState, Region, Where};
use snapshot_traits::{
    BackendNodeId, BaseSnapshot, CdpEvent, CdpTransport, Eid, FrameId, LoaderId, NodeId, PageAtoms, SessionError,
    SnapshotId, Viewport,
};

fn bbox(y: f64) -> BBox {
    BBox { x: 0.0, y, w: 120.0, h: 32.0 }
}

fn node(eid: &str, kind: NodeKind, label: &str, layer: Layer, region: Region, y: f64) -> snapshot_traits::ReadableNode {
    snapshot_traits::ReadableNode {
        node_id: NodeId("n1".to_string()),
        backend_node_id: BackendNodeId(1),
        frame_id: FrameId("main".to_string()),
        loader_id: LoaderId("L1".to_string()),
        kind,
        label: label.to_string(),
        r#where: Where { region, ..Where::default() },
        layout: Layout { bbox: bbox(y), ..Layout::default() },
        state: Some(NodeState { visible: true, enabled: true, ..NodeState::default() }),
        find: Some(Locators::default()),
        attributes: None,
        eid: Some(Eid(eid.to_string())),
        layer,
    }
}

fn snapshot(url: &str, title: &str, nodes: Vec<snapshot_traits::ReadableNode>) -> BaseSnapshot {
    BaseSnapshot {
        snapshot_id: SnapshotId::new(),
        url: url.to_string(),
        title: title.to_string(),
        language: None,
        captured_at: chrono::Utc::now(),
        viewport: Viewport { w: 1280.0, h: 720.0 },
        nodes,
        atoms: PageAtoms::default(),
        meta: Default::default(),
    }
}

/// Scenario 1: EID stability across a benign re-render.
#[test]
fn eid_stable_across_benign_rerender() {
    let a = node("cart-button", NodeKind::Button, "Add to Cart", Layer::Main, Region::Main, 200.0);
    let b = node("cart-button", NodeKind::Button, "Add to Cart", Layer::Main, Region::Main, 204.0);

    let snap_a = snapshot("https://shop.test/product/1", "Widget", vec![a]);
    let snap_b = snapshot("https://shop.test/product/1", "Widget", vec![b]);

    let delta = diff(&snap_a, &snap_b);
    assert!(delta.actionables.added.is_empty());
    assert!(delta.actionables.removed.is_empty());
    assert!(delta.actionables.changed.is_empty());
    assert!(delta.doc.is_none());
    assert!(delta.layer.is_none());
}

/// Scenario 2: cookie banner appears, then the agent dismisses it.
#[test]
fn cookie_banner_dismiss_reports_removal_and_layer_transition() {
    let dialog_fp = Fingerprint {
        name: "Accept",
        kind: NodeKind::Button,
        role: Some("button"),
        landmark_path: "dialog",
        position_hint: None,
        layer: &Layer::Modal,
        href: None,
        shadow_path: None,
    };
    let main_fp = Fingerprint {
        name: "Accept",
        kind: NodeKind::Link,
        role: Some("link"),
        landmark_path: "main",
        position_hint: None,
        layer: &Layer::Main,
        href: Some("/terms"),
        shadow_path: None,
    };
    let bases = vec![fingerprint_hash(&dialog_fp), fingerprint_hash(&main_fp)];
    assert_ne!(bases[0], bases[1]);
    let eids = resolve_collisions(&bases);
    let x = eids[0].clone();
    let y = eids[1].clone();
    assert_ne!(x, y);

    let dialog_accept = node(&x.0, NodeKind::Button, "Accept", Layer::Modal, Region::Dialog, 100.0);
    let main_accept = node(&y.0, NodeKind::Link, "Accept", Layer::Main, Region::Main, 650.0);

    let snap_a = snapshot("https://shop.test/", "Shop", vec![dialog_accept, main_accept.clone()]);
    let snap_b = snapshot("https://shop.test/", "Shop", vec![main_accept]);

    let delta = diff(&snap_a, &snap_b);
    assert_eq!(delta.actionables.removed, vec![x.clone()]);
    let layer = delta.layer.expect("layer stack changed");
    assert_eq!(layer.stack_from, vec![Layer::Modal]);
    assert!(layer.stack_to.is_empty());
}

/// Scenario 3: a hard navigation invalidates refs issued under the old
/// loader and a fresh `find_elements`-style call re-issues them.
#[tokio::test]
async fn hard_navigation_invalidates_refs_and_reissues_under_new_loader() {
    struct ScriptedTransport {
        events: tokio::sync::Mutex<tokio::sync::mpsc::Receiver<CdpEvent>>,
    }

    #[async_trait]
    impl CdpTransport for ScriptedTransport {
        async fn send(&self, _session_id: Option<&str>, method: &str, _params: Value) -> Result<Value, SessionError> {
            assert_eq!(method, "Page.getFrameTree");
            Ok(json!({
                "frameTree": {
                    "frame": { "id": "main", "loaderId": "loader_old" },
                    "childFrames": [],
                }
            }))
        }

        async fn next_event(&self) -> Option<CdpEvent> {
            self.events.lock().await.recv().await
        }

        fn is_active(&self) -> bool {
            true
        }
    }

    let (tx, rx) = tokio::sync::mpsc::channel(4);
    let transport = Arc::new(ScriptedTransport { events: tokio::sync::Mutex::new(rx) });
    let session = Arc::new(CdpSession::new(transport, None, Config::default()));
    let tracker = FrameTracker::new(session.clone(), &Config::default());
    tracker.init().await.unwrap();

    let scoped = tracker.create_ref(BackendNodeId(123), FrameId("main".to_string())).unwrap();
    assert_eq!(tracker.serialize_ref(&scoped), "loader_old:123");
    assert!(tracker.parse_ref("loader_old:123").is_some());

    tx.send(CdpEvent {
        session_id: None,
        method: "Page.frameNavigated".to_string(),
        params: json!({ "frame": { "id": "main", "loaderId": "loader_new" } }),
    })
    .await
    .unwrap();
    assert!(session.pump_once().await);

    assert!(tracker.parse_ref("loader_old:123").is_none());

    let reissued = tracker.create_ref(BackendNodeId(123), FrameId("main".to_string())).unwrap();
    assert_eq!(tracker.serialize_ref(&reissued), "loader_new:123");
}

/// Scenario 4: rendering a FactPack with 40 actions under the compact
/// budget caps the visible actions and never exceeds the tier's token cap.
#[test]
fn budget_truncation_caps_actions_under_compact_budget() {
    let snap = snapshot("https://app.test/dashboard", "Dashboard", vec![]);
    let actions = (0..40)
        .map(|i| ScoredAction {
            eid: Eid(format!("a{i}")),
            label: format!("Do thing number {i}"),
            kind: NodeKind::Button,
            score: 1.0 - (i as f64) * 0.01,
            category: ActionCategory::Generic,
        })
        .collect();
    let pack = FactPack {
        page_type: PageClassification {
            r#type: PageType::Home,
            confidence: 0.7,
            signals: vec![],
            entities: vec![],
            has_forms: false,
            has_navigation: true,
            has_main_content: true,
            has_search: false,
        },
        dialogs: vec![],
        forms: vec![],
        actions,
        meta: FactPackMeta { node_count: 40, has_blocking_dialog: false },
    };

    let sections = render::render_sections(&snap, &pack);
    let rendered = render::apply_budget(&sections, render::Budget::Compact);

    let action_count = rendered.xml.matches("<action ").count();
    assert!(action_count <= 5);
    assert!(rendered.page_brief_tokens <= render::Budget::Compact.tier().cap);
    assert!(rendered.xml.contains("<page "));
}

/// Scenario 5: scrolling the page changes bbox but not identity.
#[test]
fn scroll_invariance_keeps_fingerprint_stable() {
    let submit_at_200 = Fingerprint {
        name: "Submit",
        kind: NodeKind::Button,
        role: Some("button"),
        landmark_path: "main/form",
        position_hint: None,
        layer: &Layer::Main,
        href: None,
        shadow_path: None,
    };
    let submit_after_scroll = Fingerprint {
        name: "Submit",
        kind: NodeKind::Button,
        role: Some("button"),
        landmark_path: "main/form",
        position_hint: None,
        layer: &Layer::Main,
        href: None,
        shadow_path: None,
    };

    let before = fingerprint_hash(&submit_at_200);
    let after = fingerprint_hash(&submit_after_scroll);
    assert_eq!(before, after);

    let node_before = node("submit-eid", NodeKind::Button, "Submit", Layer::Main, Region::Main, 200.0);
    let mut node_after = node_before.clone();
    node_after.layout.bbox.y = -300.0;
    assert_ne!(node_before.layout.bbox.y, node_after.layout.bbox.y);
    assert_eq!(node_before.eid, node_after.eid);
}

/// Scenario 6: a login-shaped form is classified with high confidence and
/// its submit button is exposed as a `form-submit` action.
#[test]
fn login_form_inference_scores_above_threshold() {
    let mut email = node("email-eid", NodeKind::Input, "Email", Layer::Main, Region::Form, 120.0);
    email.r#where.group_id = Some("login-form".to_string());
    email.attributes = Some(Attributes {
        input_type: Some("email".to_string()),
        autocomplete: Some("email".to_string()),
        ..Default::default()
    });

    let mut password = node("password-eid", NodeKind::Input, "Password", Layer::Main, Region::Form, 160.0);
    password.r#where.group_id = Some("login-form".to_string());
    password.attributes = Some(Attributes {
        input_type: Some("password".to_string()),
        autocomplete: Some("current-password".to_string()),
        ..Default::default()
    });

    let mut submit = node("submit-eid", NodeKind::Button, "Sign in", Layer::Main, Region::Form, 200.0);
    submit.r#where.group_id = Some("login-form".to_string());

    let snap = snapshot("https://app.test/login", "Sign in", vec![email, password, submit]);
    let pack = factpack::build(&snap, &Config::default());

    assert_eq!(pack.forms.len(), 1);
    assert_eq!(pack.forms[0].purpose, FormPurpose::Login);
    assert!(pack.forms[0].purpose_confidence >= 0.6);
    assert!(pack.forms[0].fields.iter().any(|f| f.semantic_type == FieldSemanticType::Email));

    let submit_eid = pack.forms[0].submit.clone().expect("submit button detected");
    let action = pack.actions.iter().find(|a| a.eid == submit_eid).expect("submit button scored as an action");
    assert_eq!(action.category, snapshot_traits::factpack::ActionCategory::FormSubmit);
}
