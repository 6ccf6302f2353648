/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Attribute and text escaping shared by every section renderer.

/// Escapes the five XML-reserved characters. `&` must go first or it would
/// double-escape the entities this function itself introduces.
pub fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_all_five_reserved_characters() {
        assert_eq!(escape_xml(r#"<a href="x&y">'z'</a>"#), "&lt;a href=&quot;x&amp;y&quot;&gt;&apos;z&apos;&lt;/a&gt;");
    }

    #[test]
    fn leaves_plain_text_untouched() {
        assert_eq!(escape_xml("Buy now"), "Buy now");
    }
}
