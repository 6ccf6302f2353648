/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Dialog detector (spec §4.6).

use regex::Regex;
use snapshot_traits::factpack::{DetectedDialog, DialogAction, DialogActionRole, DialogDetectionMethod, DialogType};
use snapshot_traits::node::{NodeKind, Region};
use snapshot_traits::{BaseSnapshot, ReadableNode};

use crate::query::{Query, StateFilter};

const PRIMARY_WORDS: &[&str] = &["accept", "agree", "confirm", "ok", "yes", "allow", "continue", "got it"];
const SECONDARY_WORDS: &[&str] = &["decline", "cancel", "no thanks", "reject", "later"];
const DISMISS_WORDS: &[&str] = &["close", "dismiss", "×", "x"];

struct TypePattern {
    dialog_type: DialogType,
    words: &'static [&'static str],
}

const TYPE_PATTERNS: &[TypePattern] = &[
    TypePattern {
        dialog_type: DialogType::CookieConsent,
        words: &["cookie", "cookies", "gdpr", "consent", "privacy preferences"],
    },
    TypePattern {
        dialog_type: DialogType::Newsletter,
        words: &["newsletter", "subscribe", "sign up for updates", "email list"],
    },
    TypePattern {
        dialog_type: DialogType::AgeGate,
        words: &["age", "years old", "birth date", "verify your age", "18+", "21+"],
    },
    TypePattern {
        dialog_type: DialogType::LoginPrompt,
        words: &["sign in", "log in", "login", "create an account"],
    },
];

/// Detects all visible dialog nodes (spec §4.6 "Dialog detector").
pub fn detect(snapshot: &BaseSnapshot) -> Vec<DetectedDialog> {
    let dialog_query = Query {
        state: Some(StateFilter {
            visible: Some(true),
            ..StateFilter::default()
        }),
        ..Query::default()
    };
    let candidates: Vec<&ReadableNode> = crate::query::run(snapshot, &dialog_query)
        .into_iter()
        .filter(|n| n.kind == NodeKind::Dialog || n.r#where.region == Region::Dialog)
        .collect();

    candidates
        .into_iter()
        .filter_map(|node| node.eid.clone().map(|eid| build_dialog(snapshot, node, eid)))
        .collect()
}

fn build_dialog(snapshot: &BaseSnapshot, dialog: &ReadableNode, eid: snapshot_traits::Eid) -> DetectedDialog {
    let method = detect_method(dialog);
    let title = find_title(snapshot, dialog);
    let actions = collect_actions(snapshot, dialog);
    let dialog_type = if method == DialogDetectionMethod::RoleAlertdialog {
        DialogType::Alert
    } else {
        classify_type(&title, &actions)
    };
    let confidence = if method == DialogDetectionMethod::RoleAlertdialog {
        0.9
    } else {
        type_confidence(&title, &actions, dialog_type)
    };

    DetectedDialog {
        eid,
        method,
        title,
        dialog_type,
        confidence,
        blocking: method != DialogDetectionMethod::Heuristic,
        actions,
    }
}

fn detect_method(node: &ReadableNode) -> DialogDetectionMethod {
    let role = node
        .attributes
        .as_ref()
        .and_then(|a| a.role.as_deref())
        .unwrap_or_default();
    match role {
        "alertdialog" => DialogDetectionMethod::RoleAlertdialog,
        "dialog" => DialogDetectionMethod::RoleDialog,
        _ if node.kind == NodeKind::Dialog => DialogDetectionMethod::HtmlDialog,
        _ => DialogDetectionMethod::Heuristic,
    }
}

fn find_title(snapshot: &BaseSnapshot, dialog: &ReadableNode) -> Option<String> {
    if let Some(heading) = &dialog.r#where.heading_context {
        return Some(heading.clone());
    }
    snapshot
        .nodes
        .iter()
        .find(|n| n.kind == NodeKind::Heading && n.r#where.group_id == dialog.r#where.group_id)
        .map(|n| n.label.clone())
}

fn collect_actions(snapshot: &BaseSnapshot, dialog: &ReadableNode) -> Vec<DialogAction> {
    snapshot
        .nodes
        .iter()
        .filter(|n| n.kind.is_interactive())
        .filter(|n| n.r#where.group_id == dialog.r#where.group_id || n.r#where.region == Region::Dialog)
        .filter_map(|n| n.eid.clone().map(|eid| (n, eid)))
        .map(|(n, eid)| DialogAction {
            eid,
            label: n.label.clone(),
            role: classify_action_role(&n.label),
        })
        .collect()
}

fn classify_action_role(label: &str) -> DialogActionRole {
    let lower = label.to_lowercase();
    if PRIMARY_WORDS.iter().any(|w| lower.contains(w)) {
        DialogActionRole::Primary
    } else if SECONDARY_WORDS.iter().any(|w| lower.contains(w)) {
        DialogActionRole::Secondary
    } else if DISMISS_WORDS.iter().any(|w| lower.contains(w)) {
        DialogActionRole::Dismiss
    } else {
        DialogActionRole::Unknown
    }
}

fn corpus(title: &Option<String>, actions: &[DialogAction]) -> String {
    let mut text = title.clone().unwrap_or_default();
    for action in actions {
        text.push(' ');
        text.push_str(&action.label);
    }
    text.to_lowercase()
}

fn classify_type(title: &Option<String>, actions: &[DialogAction]) -> DialogType {
    let text = corpus(title, actions);
    TYPE_PATTERNS
        .iter()
        .max_by_key(|p| p.words.iter().filter(|w| text.contains(*w)).count())
        .filter(|p| p.words.iter().any(|w| text.contains(w)))
        .map(|p| p.dialog_type)
        .unwrap_or(DialogType::Unknown)
}

fn type_confidence(title: &Option<String>, actions: &[DialogAction], dialog_type: DialogType) -> f64 {
    let Some(pattern) = TYPE_PATTERNS.iter().find(|p| p.dialog_type == dialog_type) else {
        return 0.3;
    };
    let text = corpus(title, actions);
    let matches = pattern.words.iter().filter(|w| text.contains(*w)).count();
    (0.5 + matches as f64 * 0.15).min(0.95)
}

/// Compiled once for callers that need raw regex matching over free text
/// rather than the substring word lists above (reserved for richer action
/// verb matching shared with the action selector).
pub fn action_verb_regex() -> Regex {
    Regex::new(r"(?i)\b(buy|add|checkout|sign\s?up|log\s?in|subscribe|continue|submit|order|apply)\b")
        .expect("static action verb pattern is valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapshot_traits::node::{BBox, Layout, Locators, NodeState, Where};
    use snapshot_traits::{BackendNodeId, Eid, FrameId, LoaderId, NodeId, PageAtoms, SnapshotId, Viewport};

    fn node(kind: NodeKind, label: &str, region: Region, group_id: Option<&str>, role: Option<&str>) -> ReadableNode {
        ReadableNode {
            node_id: NodeId("n1".to_string()),
            backend_node_id: BackendNodeId(1),
            frame_id: FrameId("main".to_string()),
            loader_id: LoaderId("L1".to_string()),
            kind,
            label: label.to_string(),
            r#where: Where {
                region,
                group_id: group_id.map(|s| s.to_string()),
                ..Where::default()
            },
            layout: Layout {
                bbox: BBox::default(),
                ..Layout::default()
            },
            state: Some(NodeState {
                visible: true,
                enabled: true,
                ..NodeState::default()
            }),
            find: Some(Locators::default()),
            attributes: role.map(|r| snapshot_traits::node::Attributes {
                role: Some(r.to_string()),
                ..Default::default()
            }),
            eid: Some(Eid(format!("{label}-eid"))),
            layer: Default::default(),
        }
    }

    fn snapshot(nodes: Vec<ReadableNode>) -> BaseSnapshot {
        BaseSnapshot {
            snapshot_id: SnapshotId::new(),
            url: "https://site.test/".to_string(),
            title: "Test".to_string(),
            language: None,
            captured_at: chrono::Utc::now(),
            viewport: Viewport { w: 1280.0, h: 720.0 },
            nodes,
            atoms: PageAtoms::default(),
            meta: Default::default(),
        }
    }

    #[test]
    fn cookie_banner_classified_by_keyword_matches() {
        let snap = snapshot(vec![
            node(NodeKind::Dialog, "Cookie notice", Region::Dialog, Some("cookie-banner"), None),
            node(NodeKind::Button, "Accept cookies", Region::Dialog, Some("cookie-banner"), None),
            node(NodeKind::Button, "Decline", Region::Dialog, Some("cookie-banner"), None),
        ]);
        let dialogs = detect(&snap);
        assert_eq!(dialogs.len(), 1);
        assert_eq!(dialogs[0].dialog_type, DialogType::CookieConsent);
        assert_eq!(dialogs[0].actions.len(), 2);
    }

    #[test]
    fn alertdialog_role_is_alert_at_fixed_confidence() {
        let snap = snapshot(vec![node(
            NodeKind::Dialog,
            "Are you sure?",
            Region::Dialog,
            Some("confirm-box"),
            Some("alertdialog"),
        )]);
        let dialogs = detect(&snap);
        assert_eq!(dialogs[0].method, DialogDetectionMethod::RoleAlertdialog);
        assert_eq!(dialogs[0].dialog_type, DialogType::Alert);
        assert_eq!(dialogs[0].confidence, 0.9);
    }

    #[test]
    fn action_roles_classified_from_label_pattern_sets() {
        assert_eq!(classify_action_role("Accept All"), DialogActionRole::Primary);
        assert_eq!(classify_action_role("Decline"), DialogActionRole::Secondary);
        assert_eq!(classify_action_role("Close"), DialogActionRole::Dismiss);
        assert_eq!(classify_action_role("Learn more"), DialogActionRole::Unknown);
    }
}
