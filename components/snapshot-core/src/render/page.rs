/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! `<page>` section renderer. Never truncated (spec §4.10): it is the
//! orientation anchor every other section is interpreted against.

use snapshot_traits::factpack::{FactPack, PageType};
use snapshot_traits::BaseSnapshot;

use super::xml::escape_xml;
use super::Section;

pub fn render(snapshot: &BaseSnapshot, fact_pack: &FactPack) -> Section {
    let classification = &fact_pack.page_type;
    let entities: String = classification
        .entities
        .iter()
        .map(|entity| format!("<entity>{}</entity>", escape_xml(entity)))
        .collect();
    let content = format!(
        "<page url=\"{}\" title=\"{}\" type=\"{}\" confidence=\"{:.2}\" has_forms=\"{}\" has_navigation=\"{}\" has_main_content=\"{}\" has_search=\"{}\">{}</page>",
        escape_xml(&snapshot.url),
        escape_xml(&snapshot.title),
        page_type_str(classification.r#type),
        classification.confidence,
        classification.has_forms,
        classification.has_navigation,
        classification.has_main_content,
        classification.has_search,
        entities,
    );

    Section {
        name: "page",
        truncated_content: content.clone(),
        content,
        can_truncate: false,
        truncation_priority: i32::MAX,
        blocking: false,
    }
}

fn page_type_str(kind: PageType) -> &'static str {
    match kind {
        PageType::Login => "login",
        PageType::Signup => "signup",
        PageType::Checkout => "checkout",
        PageType::ProductListing => "product-listing",
        PageType::ProductDetail => "product-detail",
        PageType::Search => "search",
        PageType::Article => "article",
        PageType::Home => "home",
        PageType::Cart => "cart",
        PageType::Unknown => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapshot_traits::factpack::{FactPackMeta, PageClassification};

    fn snapshot() -> BaseSnapshot {
        BaseSnapshot {
            snapshot_id: snapshot_traits::SnapshotId::new(),
            url: "https://shop.test/cart?x=1&y=2".to_string(),
            title: "Your \"Cart\"".to_string(),
            language: None,
            captured_at: chrono::Utc::now(),
            viewport: snapshot_traits::Viewport { w: 1280.0, h: 720.0 },
            nodes: vec![],
            atoms: Default::default(),
            meta: Default::default(),
        }
    }

    fn fact_pack(classification: PageClassification) -> FactPack {
        FactPack {
            page_type: classification,
            dialogs: vec![],
            forms: vec![],
            actions: vec![],
            meta: FactPackMeta { node_count: 0, has_blocking_dialog: false },
        }
    }

    #[test]
    fn page_section_is_never_truncatable() {
        let classification = PageClassification {
            r#type: PageType::Cart,
            confidence: 0.8,
            signals: vec![],
            entities: vec![],
            has_forms: false,
            has_navigation: true,
            has_main_content: true,
            has_search: false,
        };
        let section = render(&snapshot(), &fact_pack(classification));
        assert!(!section.can_truncate);
        assert_eq!(section.truncation_priority, i32::MAX);
        assert_eq!(section.content, section.truncated_content);
    }

    #[test]
    fn page_section_escapes_url_and_title() {
        let classification = PageClassification {
            r#type: PageType::Unknown,
            confidence: 0.0,
            signals: vec![],
            entities: vec!["Acme & Co".to_string()],
            has_forms: false,
            has_navigation: false,
            has_main_content: false,
            has_search: false,
        };
        let section = render(&snapshot(), &fact_pack(classification));
        assert!(section.content.contains("x=1&amp;y=2"));
        assert!(section.content.contains("Your &quot;Cart&quot;"));
        assert!(section.content.contains("<entity>Acme &amp; Co</entity>"));
    }
}
