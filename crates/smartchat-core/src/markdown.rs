//! Markdown stripping for model replies.
//!
//! Models answer in markdown even when the surface shows plain text. The
//! rules here remove the common markup and keep the words.

use std::sync::LazyLock;

use regex::Regex;

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

fn rule(pattern: &str, replacement: &'static str) -> Rule {
    Rule {
        pattern: Regex::new(pattern).expect("markdown rule must compile"),
        replacement,
    }
}

/// Applied in order. Bold must run before italic so `**x**` is not split.
///
/// Line-anchored rules run in CRLF mode so `\r` also ends a line.
static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        // Headers
        rule(r"(?mR)^#{1,6}\s+", ""),
        // Bold, then italic
        rule(r"\*\*(.*?)\*\*", "${1}"),
        rule(r"\*(.*?)\*", "${1}"),
        // Fenced code blocks, content included
        rule(r"(?s)```.*?```", ""),
        // Inline code
        rule(r"`([^`]+)`", "${1}"),
        // Links keep their label
        rule(r"\[([^\]]+)\]\([^)]+\)", "${1}"),
        // Strikethrough
        rule(r"~~(.*?)~~", "${1}"),
        // Blockquote markers
        rule(r"(?mR)^>\s+", ""),
        // Horizontal rules
        rule(r"(?mR)^[-*_]{3,}$", ""),
        // Blank-line runs, CRLF included
        rule(r"\r?\n\s*\n", "\n\n"),
    ]
});

fn clean_once(text: &str) -> String {
    let mut out = text.to_string();
    for rule in RULES.iter() {
        out = rule.pattern.replace_all(&out, rule.replacement).into_owned();
    }
    out.trim().to_string()
}

/// Strips markdown markup from `text`, keeping the readable content.
///
/// Total and idempotent: a single pass can uncover new markup (`> # Title`
/// loses its quote marker and becomes a header), so passes repeat until the
/// text is stable. No rule ever lengthens the text, which bounds the loop.
pub fn clean_markdown(text: &str) -> String {
    let mut current = clean_once(text);
    loop {
        let next = clean_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}
