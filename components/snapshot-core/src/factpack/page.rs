/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Page classifier (spec §4.6).

use snapshot_traits::factpack::{DetectedForm, PageClassification, PageType};
use snapshot_traits::node::{NodeKind, Region};
use snapshot_traits::BaseSnapshot;

struct UrlPattern {
    page_type: PageType,
    needles: &'static [&'static str],
    weight: f64,
}

const URL_PATTERNS: &[UrlPattern] = &[
    UrlPattern { page_type: PageType::Login, needles: &["/login", "/signin", "/sign-in"], weight: 0.8 },
    UrlPattern { page_type: PageType::Signup, needles: &["/signup", "/register", "/sign-up"], weight: 0.8 },
    UrlPattern { page_type: PageType::Checkout, needles: &["/checkout", "/payment"], weight: 0.8 },
    UrlPattern { page_type: PageType::Cart, needles: &["/cart", "/basket"], weight: 0.7 },
    UrlPattern { page_type: PageType::Search, needles: &["/search", "?q=", "?query="], weight: 0.6 },
    UrlPattern { page_type: PageType::ProductDetail, needles: &["/product/", "/p/", "/item/"], weight: 0.6 },
    UrlPattern { page_type: PageType::ProductListing, needles: &["/products", "/category", "/shop"], weight: 0.55 },
    UrlPattern { page_type: PageType::Article, needles: &["/article/", "/blog/", "/news/"], weight: 0.55 },
];

/// Emits `{type, confidence, signals, entities, has_forms/...}` (spec §4.6
/// "Page classifier"): highest-weighted signal among URL pattern, title
/// tokens, and detected-form purpose wins; below-threshold collapses to
/// `unknown`. Summary flags are computed unconditionally.
pub fn classify(snapshot: &BaseSnapshot, forms: &[DetectedForm]) -> PageClassification {
    let mut signals: Vec<(PageType, f64, String)> = Vec::new();
    let url_lower = snapshot.url.to_lowercase();
    let title_lower = snapshot.title.to_lowercase();

    for pattern in URL_PATTERNS {
        if pattern.needles.iter().any(|n| url_lower.contains(n)) {
            signals.push((pattern.page_type, pattern.weight, format!("url:{}", pattern.needles[0])));
        }
    }
    if title_lower.contains("log in") || title_lower.contains("sign in") {
        signals.push((PageType::Login, 0.5, "title:login".to_string()));
    }
    if title_lower.contains("checkout") {
        signals.push((PageType::Checkout, 0.5, "title:checkout".to_string()));
    }
    if title_lower.contains("cart") || title_lower.contains("basket") {
        signals.push((PageType::Cart, 0.5, "title:cart".to_string()));
    }
    if is_root_path(&url_lower) {
        signals.push((PageType::Home, 0.3, "url:root".to_string()));
    }
    for form in forms {
        use snapshot_traits::factpack::FormPurpose;
        let mapped = match form.purpose {
            FormPurpose::Login => Some(PageType::Login),
            FormPurpose::Signup => Some(PageType::Signup),
            FormPurpose::Checkout => Some(PageType::Checkout),
            FormPurpose::Search => Some(PageType::Search),
            _ => None,
        };
        if let Some(page_type) = mapped {
            signals.push((page_type, form.purpose_confidence * 0.6, "form:purpose".to_string()));
        }
    }

    let best = signals
        .iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap());

    let (r#type, confidence) = match best {
        Some((t, w, _)) if *w >= 0.4 => (*t, *w),
        Some((_, w, _)) => (PageType::Unknown, *w),
        None => (PageType::Unknown, 0.0),
    };

    let entities = extract_entities(snapshot);
    let signal_labels = signals.into_iter().map(|(_, _, label)| label).collect();

    PageClassification {
        r#type,
        confidence,
        signals: signal_labels,
        entities,
        has_forms: !forms.is_empty(),
        has_navigation: snapshot.nodes.iter().any(|n| n.r#where.region == Region::Nav),
        has_main_content: snapshot.nodes.iter().any(|n| n.r#where.region == Region::Main),
        has_search: snapshot.nodes.iter().any(|n| n.kind == NodeKind::Input && is_search_input(n)),
    }
}

fn is_search_input(node: &snapshot_traits::ReadableNode) -> bool {
    node.attributes
        .as_ref()
        .and_then(|a| a.input_type.as_deref())
        .map(|t| t == "search")
        .unwrap_or(false)
        || node.label.to_lowercase().contains("search")
}

fn is_root_path(url: &str) -> bool {
    let without_scheme = url.split("://").nth(1).unwrap_or(url);
    matches!(without_scheme.splitn(2, '/').nth(1), None | Some("") | Some("?") )
}

fn extract_entities(snapshot: &BaseSnapshot) -> Vec<String> {
    snapshot
        .nodes
        .iter()
        .filter(|n| n.kind == NodeKind::Heading && n.r#where.region == Region::Main)
        .map(|n| n.label.clone())
        .filter(|l| !l.is_empty())
        .take(5)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapshot_traits::node::{BBox, Layout, Locators, NodeState, Where};
    use snapshot_traits::{BackendNodeId, Eid, FrameId, LoaderId, NodeId, PageAtoms, ReadableNode, SnapshotId, Viewport};

    fn heading(label: &str, region: Region) -> ReadableNode {
        ReadableNode {
            node_id: NodeId("n1".to_string()),
            backend_node_id: BackendNodeId(1),
            frame_id: FrameId("main".to_string()),
            loader_id: LoaderId("L1".to_string()),
            kind: NodeKind::Heading,
            label: label.to_string(),
            r#where: Where { region, ..Where::default() },
            layout: Layout { bbox: BBox::default(), ..Layout::default() },
            state: None,
            find: None,
            attributes: None,
            eid: Some(Eid("heading-eid".to_string())),
            layer: Default::default(),
        }
    }

    fn snapshot(url: &str, title: &str, nodes: Vec<ReadableNode>) -> BaseSnapshot {
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

    #[test]
    fn login_url_pattern_classifies_as_login() {
        let snap = snapshot("https://shop.test/login", "Sign In", vec![]);
        let result = classify(&snap, &[]);
        assert_eq!(result.r#type, PageType::Login);
        assert!(result.confidence >= 0.4);
    }

    #[test]
    fn no_signals_collapses_to_unknown() {
        let snap = snapshot("https://shop.test/about-us", "About Us", vec![]);
        let result = classify(&snap, &[]);
        assert_eq!(result.r#type, PageType::Unknown);
    }

    #[test]
    fn summary_flags_always_computed() {
        let snap = snapshot(
            "https://shop.test/",
            "Home",
            vec![heading("Welcome", Region::Main)],
        );
        let result = classify(&snap, &[]);
        assert!(result.has_main_content);
        assert!(!result.entities.is_empty());
    }
}
