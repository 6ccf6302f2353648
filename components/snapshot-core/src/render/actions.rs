/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! `<actions>` section renderer. The truncated form caps the list at the
//! five highest-scored actions (spec §4.10); `action::select` has already
//! sorted by score descending.

use snapshot_traits::factpack::{ActionCategory, FactPack, ScoredAction};
use snapshot_traits::NodeKind;

use super::xml::escape_xml;
use super::Section;

const PRIORITY: i32 = 1;
const TRUNCATED_LIMIT: usize = 5;

pub fn render(fact_pack: &FactPack) -> Section {
    if fact_pack.actions.is_empty() {
        return Section {
            name: "actions",
            content: String::new(),
            truncated_content: String::new(),
            can_truncate: true,
            truncation_priority: PRIORITY,
            blocking: false,
        };
    }

    let full: String = fact_pack.actions.iter().map(render_action).collect();
    let short: String = fact_pack.actions.iter().take(TRUNCATED_LIMIT).map(render_action).collect();

    Section {
        name: "actions",
        content: format!("<actions>{full}</actions>"),
        truncated_content: format!("<actions>{short}</actions>"),
        can_truncate: true,
        truncation_priority: PRIORITY,
        blocking: false,
    }
}

fn render_action(action: &ScoredAction) -> String {
    format!(
        "<action eid=\"{}\" kind=\"{}\" category=\"{}\" score=\"{:.2}\">{}</action>",
        escape_xml(&action.eid.0),
        kind_str(action.kind),
        category_str(action.category),
        action.score,
        escape_xml(&action.label),
    )
}

pub(crate) fn kind_str(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Link => "link",
        NodeKind::Button => "button",
        NodeKind::Input => "input",
        NodeKind::Textarea => "textarea",
        NodeKind::Select => "select",
        NodeKind::Combobox => "combobox",
        NodeKind::Checkbox => "checkbox",
        NodeKind::Radio => "radio",
        NodeKind::Switch => "switch",
        NodeKind::Slider => "slider",
        NodeKind::Tab => "tab",
        NodeKind::Menuitem => "menuitem",
        NodeKind::Heading => "heading",
        NodeKind::Paragraph => "paragraph",
        NodeKind::List => "list",
        NodeKind::Listitem => "listitem",
        NodeKind::Image => "image",
        NodeKind::Media => "media",
        NodeKind::Table => "table",
        NodeKind::Form => "form",
        NodeKind::Dialog => "dialog",
        NodeKind::Navigation => "navigation",
        NodeKind::Section => "section",
        NodeKind::Generic => "generic",
    }
}

fn category_str(category: ActionCategory) -> &'static str {
    match category {
        ActionCategory::PrimaryCta => "primary-cta",
        ActionCategory::SecondaryCta => "secondary-cta",
        ActionCategory::Navigation => "navigation",
        ActionCategory::FormSubmit => "form-submit",
        ActionCategory::Search => "search",
        ActionCategory::CartAction => "cart-action",
        ActionCategory::AuthAction => "auth-action",
        ActionCategory::DialogAction => "dialog-action",
        ActionCategory::MediaControl => "media-control",
        ActionCategory::Generic => "generic",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapshot_traits::factpack::{FactPackMeta, PageClassification, PageType};
    use snapshot_traits::Eid;

    fn pack_with_actions(count: usize) -> FactPack {
        let actions = (0..count)
            .map(|i| ScoredAction {
                eid: Eid(format!("a{i}")),
                label: format!("Action {i}"),
                kind: NodeKind::Button,
                score: 1.0 - (i as f64) * 0.01,
                category: ActionCategory::Generic,
            })
            .collect();
        FactPack {
            page_type: PageClassification {
                r#type: PageType::Unknown,
                confidence: 0.0,
                signals: vec![],
                entities: vec![],
                has_forms: false,
                has_navigation: false,
                has_main_content: false,
                has_search: false,
            },
            dialogs: vec![],
            forms: vec![],
            actions,
            meta: FactPackMeta { node_count: count, has_blocking_dialog: false },
        }
    }

    #[test]
    fn truncated_form_caps_at_five_actions() {
        let section = render(&pack_with_actions(12));
        let full_count = section.content.matches("<action ").count();
        let short_count = section.truncated_content.matches("<action ").count();
        assert_eq!(full_count, 12);
        assert_eq!(short_count, TRUNCATED_LIMIT);
    }
}
