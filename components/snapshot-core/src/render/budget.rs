/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Token budget application (spec §4.10): join sections, estimate size,
//! and truncate lowest-priority-first until the result fits under a tier's
//! cap, falling back to a hard cut if truncation alone isn't enough.

use super::Section;

/// Chars-per-token heuristic the estimator uses in place of a real
/// tokenizer; spec §4.10 calls this out as approximate by design.
const CHARS_PER_TOKEN: usize = 4;
const TRUNCATION_MARKER: &str = "\n[...truncated]";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Budget {
    Compact,
    Standard,
    Detailed,
}

#[derive(Clone, Copy, Debug)]
pub struct BudgetTier {
    pub target: usize,
    pub cap: usize,
}

impl Budget {
    pub fn tier(self) -> BudgetTier {
        match self {
            Budget::Compact => BudgetTier { target: 400, cap: 800 },
            Budget::Standard => BudgetTier { target: 1000, cap: 2000 },
            Budget::Detailed => BudgetTier { target: 2500, cap: 5000 },
        }
    }
}

pub struct RenderedPage {
    pub xml: String,
    pub page_brief_tokens: usize,
}

pub fn estimate_tokens(text: &str) -> usize {
    let chars = text.chars().count();
    (chars + CHARS_PER_TOKEN - 1) / CHARS_PER_TOKEN
}

/// Applies spec §4.10's three-step algorithm: return early if the full
/// join is already under target; otherwise swap in truncated forms by
/// ascending `truncation_priority` until under cap; otherwise hard-cut at
/// the last newline before the cap.
pub fn apply_budget(sections: &[Section], budget: Budget) -> RenderedPage {
    let tier = budget.tier();

    let full_join = join(sections.iter().map(|s| s.content.as_str()));
    let full_tokens = estimate_tokens(&full_join);
    if full_tokens <= tier.target {
        return wrap(full_join, full_tokens);
    }

    let mut bodies: Vec<String> = sections.iter().map(|s| s.content.clone()).collect();
    let mut order: Vec<usize> = (0..sections.len()).collect();
    order.sort_by_key(|&i| sections[i].truncation_priority);

    for index in order {
        let joined = join(bodies.iter().map(String::as_str));
        if estimate_tokens(&joined) <= tier.cap {
            break;
        }
        let section = &sections[index];
        if !section.can_truncate {
            continue;
        }
        bodies[index] = section.truncated_content.clone();
    }

    let mut joined = join(bodies.iter().map(String::as_str));
    let mut tokens = estimate_tokens(&joined);
    if tokens > tier.cap {
        joined = hard_truncate(&joined, tier.cap);
        tokens = estimate_tokens(&joined);
    }
    wrap(joined, tokens)
}

fn join<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.filter(|part| !part.is_empty()).collect::<Vec<_>>().join("\n\n")
}

fn wrap(body: String, tokens: usize) -> RenderedPage {
    RenderedPage {
        xml: format!("<page_context>\n{body}\n</page_context>"),
        page_brief_tokens: tokens,
    }
}

fn hard_truncate(text: &str, cap_tokens: usize) -> String {
    let cap_chars = cap_tokens * CHARS_PER_TOKEN;
    if text.chars().count() <= cap_chars {
        return text.to_string();
    }
    let budget_chars = cap_chars.saturating_sub(TRUNCATION_MARKER.len());
    let prefix: String = text.chars().take(budget_chars).collect();
    let cut = prefix.rfind('\n').unwrap_or(prefix.len());
    let mut out = prefix[..cut].to_string();
    out.push_str(TRUNCATION_MARKER);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(name: &'static str, content: &str, truncated: &str, can_truncate: bool, priority: i32, blocking: bool) -> Section {
        Section {
            name,
            content: content.to_string(),
            truncated_content: truncated.to_string(),
            can_truncate,
            truncation_priority: priority,
            blocking,
        }
    }

    #[test]
    fn under_target_returns_full_content_untouched() {
        let sections = vec![section("page", "<page/>", "<page/>", false, i32::MAX, false)];
        let rendered = apply_budget(&sections, Budget::Standard);
        assert!(rendered.xml.contains("<page/>"));
        assert!(rendered.page_brief_tokens <= Budget::Standard.tier().cap);
    }

    #[test]
    fn over_cap_truncates_lowest_priority_section_first() {
        let big_actions = "x".repeat(4000);
        let small_actions = "y".repeat(10);
        let sections = vec![
            section("page", "p", "p", false, i32::MAX, false),
            section("actions", &big_actions, &small_actions, true, 1, false),
        ];
        let rendered = apply_budget(&sections, Budget::Compact);
        assert!(rendered.xml.contains(&small_actions));
        assert!(!rendered.xml.contains(&big_actions));
        assert!(rendered.page_brief_tokens <= Budget::Compact.tier().cap);
    }

    #[test]
    fn non_truncatable_page_section_survives_even_when_oversized() {
        let huge_page = "p".repeat(4000);
        let sections = vec![section("page", &huge_page, &huge_page, false, i32::MAX, false)];
        let rendered = apply_budget(&sections, Budget::Compact);
        assert!(rendered.page_brief_tokens <= Budget::Compact.tier().cap);
        assert!(rendered.xml.contains("[...truncated]"));
    }

    #[test]
    fn blocking_dialog_is_never_swapped_for_its_truncated_form() {
        let big_dialogs = "d".repeat(200);
        let small_dialogs = "s".repeat(10);
        let sections = vec![
            section("page", "p", "p", false, i32::MAX, false),
            section("dialogs", &big_dialogs, &small_dialogs, false, 3, true),
            section("actions", &"a".repeat(4000), "", true, 1, false),
        ];
        let rendered = apply_budget(&sections, Budget::Compact);
        assert!(rendered.xml.contains(&big_dialogs));
    }

    #[test]
    fn estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }
}
