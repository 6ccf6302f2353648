/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Label resolution (spec §4.3 "Label resolver"): priority chain from AX
//! name down to bounded inner text.

use unicode_normalization::UnicodeNormalization;

use crate::extractors::dom::RawDomNode;

const MAX_INNER_TEXT_LEN: usize = 120;

/// Source a label was resolved from, kept for diagnostics (spec §4.3
/// "Records the chosen source").
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LabelSource {
    AxName,
    AriaLabel,
    AssociatedLabel,
    Placeholder,
    InnerText,
    Empty,
}

pub struct LabelResolution {
    pub label: String,
    pub source: LabelSource,
}

fn normalize(raw: &str) -> String {
    raw.nfkc().collect::<String>().trim().to_string()
}

/// `associated_label_text` is the resolved `<label>`/`<legend>` text for
/// form controls, computed by the caller (requires sibling/`for`-id lookup
/// across the whole DOM map, out of scope for this pure function).
pub fn resolve(
    ax_name: Option<&str>,
    node: &RawDomNode,
    associated_label_text: Option<&str>,
    inner_text: Option<&str>,
) -> LabelResolution {
    if let Some(name) = ax_name.map(normalize).filter(|s| !s.is_empty()) {
        return LabelResolution {
            label: name,
            source: LabelSource::AxName,
        };
    }
    if let Some(aria) = node
        .attributes
        .get("aria-label")
        .map(|s| normalize(s))
        .filter(|s| !s.is_empty())
    {
        return LabelResolution {
            label: aria,
            source: LabelSource::AriaLabel,
        };
    }
    if let Some(assoc) = associated_label_text.map(normalize).filter(|s| !s.is_empty()) {
        return LabelResolution {
            label: assoc,
            source: LabelSource::AssociatedLabel,
        };
    }
    if let Some(placeholder) = node
        .attributes
        .get("placeholder")
        .map(|s| normalize(s))
        .filter(|s| !s.is_empty())
    {
        return LabelResolution {
            label: placeholder,
            source: LabelSource::Placeholder,
        };
    }
    if let Some(text) = inner_text.map(normalize).filter(|s| !s.is_empty()) {
        let truncated: String = text.chars().take(MAX_INNER_TEXT_LEN).collect();
        return LabelResolution {
            label: truncated,
            source: LabelSource::InnerText,
        };
    }
    LabelResolution {
        label: String::new(),
        source: LabelSource::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use snapshot_traits::BackendNodeId;

    fn node_with(attrs: &[(&str, &str)]) -> RawDomNode {
        RawDomNode {
            backend_node_id: BackendNodeId(1),
            node_id: 1,
            node_name: "BUTTON".to_string(),
            node_type: 1,
            node_value: None,
            attributes: attrs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<HashMap<_, _>>(),
            child_node_ids: vec![],
            parent_id: None,
            shadow_root_type: None,
            frame_id: None,
        }
    }

    #[test]
    fn prefers_ax_name_over_everything() {
        let node = node_with(&[("aria-label", "fallback")]);
        let resolved = resolve(Some("Submit order"), &node, None, Some("ignored"));
        assert_eq!(resolved.label, "Submit order");
        assert_eq!(resolved.source, LabelSource::AxName);
    }

    #[test]
    fn falls_through_to_placeholder_then_inner_text() {
        let empty = node_with(&[]);
        let resolved = resolve(None, &empty, None, Some("Click me"));
        assert_eq!(resolved.label, "Click me");
        assert_eq!(resolved.source, LabelSource::InnerText);

        let with_placeholder = node_with(&[("placeholder", "Search…")]);
        let resolved = resolve(None, &with_placeholder, None, Some("ignored"));
        assert_eq!(resolved.source, LabelSource::Placeholder);
    }

    #[test]
    fn blank_ax_name_does_not_win_over_aria_label() {
        let node = node_with(&[("aria-label", "Close dialog")]);
        let resolved = resolve(Some("   "), &node, None, None);
        assert_eq!(resolved.label, "Close dialog");
        assert_eq!(resolved.source, LabelSource::AriaLabel);
    }
}
