/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Region resolution (spec §4.3 "Region resolver"): landmark role / tag
//! mapping to the closed `Region` set, with dialog-ancestor override.

use snapshot_traits::node::Region;

/// One ancestor's landmark-relevant facts, nearest-first. The caller walks
/// up the DOM and AX trees to build this; this function is otherwise pure.
pub struct AncestorFacts<'a> {
    pub tag_lower: &'a str,
    pub role: Option<&'a str>,
    pub aria_modal: bool,
    pub is_open_dialog_element: bool,
}

fn landmark_role_to_region(role: &str) -> Option<Region> {
    match role {
        "banner" => Some(Region::Header),
        "navigation" => Some(Region::Nav),
        "main" => Some(Region::Main),
        "complementary" => Some(Region::Aside),
        "contentinfo" => Some(Region::Contentinfo),
        "search" => Some(Region::Search),
        "form" => Some(Region::Form),
        "dialog" | "alertdialog" => Some(Region::Dialog),
        _ => None,
    }
}

fn tag_to_region(tag_lower: &str) -> Option<Region> {
    match tag_lower {
        "header" => Some(Region::Header),
        "nav" => Some(Region::Nav),
        "main" => Some(Region::Main),
        "aside" => Some(Region::Aside),
        "footer" => Some(Region::Contentinfo),
        "dialog" => Some(Region::Dialog),
        _ => None,
    }
}

/// Walks `ancestors` nearest-first and returns the first landmark found,
/// with a dialog ancestor (by role, `aria-modal`, or an open `<dialog>`
/// element) counting as a landmark at its own depth rather than a tag or
/// `role` match further up.
pub fn resolve(ancestors: &[AncestorFacts<'_>]) -> Region {
    for facts in ancestors {
        if facts.aria_modal || facts.is_open_dialog_element {
            return Region::Dialog;
        }
        if let Some(role) = facts.role {
            if let Some(region) = landmark_role_to_region(role) {
                return region;
            }
        }
        if let Some(region) = tag_to_region(facts.tag_lower) {
            return region;
        }
    }
    Region::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts<'a>(tag: &'a str, role: Option<&'a str>) -> AncestorFacts<'a> {
        AncestorFacts {
            tag_lower: tag,
            role,
            aria_modal: false,
            is_open_dialog_element: false,
        }
    }

    #[test]
    fn nearest_landmark_wins() {
        let ancestors = vec![facts("section", None), facts("nav", None), facts("body", None)];
        assert_eq!(resolve(&ancestors), Region::Nav);
    }

    #[test]
    fn dialog_ancestor_overrides_deeper_landmarks() {
        let mut modal = facts("div", None);
        modal.aria_modal = true;
        let ancestors = vec![facts("section", None), modal, facts("main", None)];
        assert_eq!(resolve(&ancestors), Region::Dialog);
    }

    #[test]
    fn no_landmark_ancestor_is_unknown() {
        let ancestors = vec![facts("div", None), facts("span", None)];
        assert_eq!(resolve(&ancestors), Region::Unknown);
    }
}
