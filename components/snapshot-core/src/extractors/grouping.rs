/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Grouping resolution (spec §4.3 "Grouping resolver"): nearest semantic
//! container, `group_id`/`group_path`, and `heading_context`.

const CONTAINER_TAGS: &[&str] = &["form", "fieldset", "article", "section", "nav"];

/// One ancestor's grouping-relevant facts, nearest-first.
pub struct AncestorFacts<'a> {
    pub tag_lower: &'a str,
    pub id_attr: Option<&'a str>,
    pub testid_attr: Option<&'a str>,
    /// A nearby heading's text, if this ancestor is a heading or carries
    /// one as a direct preceding sibling within the same region.
    pub heading_text: Option<&'a str>,
    pub landmark_label: Option<&'a str>,
}

pub struct Grouping {
    pub group_id: Option<String>,
    pub group_path: Vec<String>,
    pub heading_context: Option<String>,
}

fn is_container(tag_lower: &str) -> bool {
    CONTAINER_TAGS.contains(&tag_lower)
}

/// `group_id` prefers a container's own `data-testid`/`id`; absent either,
/// falls back to `"<tag>:<ordinal>"`-free tag-only identity (ordinal
/// disambiguation across repeated containers is the caller's job, since it
/// requires document-order context this pure function doesn't have).
pub fn resolve(ancestors: &[AncestorFacts<'_>]) -> Grouping {
    let mut heading_context = None;
    let mut group_path = Vec::new();

    for facts in ancestors {
        if heading_context.is_none() {
            heading_context = facts.heading_text.map(str::to_string);
        }
        if let Some(label) = facts.landmark_label {
            group_path.push(label.to_string());
        }
    }
    group_path.reverse();

    for facts in ancestors {
        if is_container(facts.tag_lower) {
            let group_id = facts
                .testid_attr
                .or(facts.id_attr)
                .map(str::to_string)
                .unwrap_or_else(|| facts.tag_lower.to_string());
            return Grouping {
                group_id: Some(group_id),
                group_path,
                heading_context,
            };
        }
    }

    Grouping {
        group_id: None,
        group_path,
        heading_context,
    }
}
