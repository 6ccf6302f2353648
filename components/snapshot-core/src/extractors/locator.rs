/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Locator building (spec §4.3 "Locator builder"): an ordered, deduplicated
//! selector list with `primary`/`alternates`, CSSOM-escaped.

use snapshot_traits::node::Locators;

const GENERIC_CLASS_NAMES: &[&str] = &[
    "container", "wrapper", "row", "col", "column", "flex", "grid", "hidden", "active", "inner",
    "outer",
];

const TESTID_ATTRS: &[&str] = &["data-testid", "data-test", "data-cy", "data-test-id"];

pub struct LocatorInput<'a> {
    pub tag_lower: &'a str,
    pub attributes: &'a std::collections::HashMap<String, String>,
    pub role: Option<&'a str>,
    pub accessible_name: Option<&'a str>,
    pub id_attr: Option<&'a str>,
    pub classes: &'a [String],
    pub frame_path: Option<Vec<String>>,
    pub shadow_path: Option<Vec<String>>,
}

/// Escapes `value` per the CSSOM escape algorithm: a leading digit (or a
/// leading hyphen followed by a digit) is hex-escaped, control characters
/// are hex-escaped, and everything else that isn't `[a-zA-Z0-9_-]` or
/// non-ASCII is backslash-escaped.
pub fn css_escape_ident(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let chars: Vec<char> = value.chars().collect();
    for (i, &ch) in chars.iter().enumerate() {
        let code = ch as u32;
        if code == 0 {
            out.push('\u{FFFD}');
            continue;
        }
        if (0x1..=0x1f).contains(&code) || code == 0x7f {
            out.push_str(&format!("\\{code:x} "));
            continue;
        }
        if i == 0 && ch.is_ascii_digit() {
            out.push_str(&format!("\\{code:x} "));
            continue;
        }
        if i == 1 && chars[0] == '-' && ch.is_ascii_digit() {
            out.push_str(&format!("\\{code:x} "));
            continue;
        }
        if i == 0 && ch == '-' && chars.len() == 1 {
            out.push('\\');
            out.push(ch);
            continue;
        }
        if ch == '-' || ch == '_' || ch.is_ascii_alphanumeric() || code >= 0x80 {
            out.push(ch);
            continue;
        }
        out.push('\\');
        out.push(ch);
    }
    out
}

/// Escapes a value destined for a `[...="value"]` attribute selector:
/// backslash and double-quote only.
pub fn escape_attr_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn first_meaningful_class(classes: &[String]) -> Option<&str> {
    classes
        .iter()
        .find(|c| !GENERIC_CLASS_NAMES.contains(&c.as_str()))
        .map(String::as_str)
}

/// Builds the ordered candidate list, returns `(primary, alternates)`.
pub fn build(input: &LocatorInput<'_>) -> Locators {
    let mut candidates: Vec<String> = Vec::new();

    for attr in TESTID_ATTRS {
        if let Some(value) = input.attributes.get(*attr) {
            candidates.push(format!("[{attr}=\"{}\"]", escape_attr_value(value)));
        }
    }

    if let Some(role) = input.role {
        match input.accessible_name {
            Some(name) if !name.is_empty() => {
                candidates.push(format!("role={role}[name=\"{}\"]", escape_attr_value(name)));
            }
            _ => {}
        }
    }

    if let Some(id) = input.id_attr {
        candidates.push(format!("#{}", css_escape_ident(id)));
    }

    if let Some(aria_label) = input.attributes.get("aria-label") {
        candidates.push(format!("[aria-label=\"{}\"]", escape_attr_value(aria_label)));
    }

    if matches!(input.tag_lower, "input" | "select" | "textarea") {
        if let Some(name) = input.attributes.get("name") {
            candidates.push(format!("[name=\"{}\"]", escape_attr_value(name)));
        }
    }

    if let Some(class) = first_meaningful_class(input.classes) {
        candidates.push(format!("{}.{}", input.tag_lower, css_escape_ident(class)));
    }

    candidates.push(input.tag_lower.to_string());

    let mut deduped = Vec::new();
    for candidate in candidates {
        if !deduped.contains(&candidate) {
            deduped.push(candidate);
        }
    }

    let primary = deduped.first().cloned().unwrap_or_else(|| input.tag_lower.to_string());
    let alternates = deduped.into_iter().skip(1).take(3).collect();

    Locators {
        primary,
        alternates,
        frame_path: input.frame_path.clone(),
        shadow_path: input.shadow_path.clone(),
    }
}
