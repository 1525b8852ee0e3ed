//! Channel name normalization
//!
//! Rules run in order, each on the previous rule's output:
//! 1. broadcaster aliases (`cctv`, `中央`, `央视`) become `CCTV`
//! 2. quality and punctuation noise is stripped
//! 3. `CCTV<N><anything>` collapses to `CCTV-<N>`
//!
//! The rule set is applied until the name stops changing, so normalizing a
//! normalized name is a no-op.

use regex::Regex;
use std::sync::LazyLock;

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    [
        (r"cctv|中央|央视", "CCTV"),
        (r"高清|超高|HD|标清|频道|-| |\+|＋|\(|\)", ""),
        (r"CCTV(\d+).*", "CCTV-${1}"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| Rule {
        pattern: Regex::new(pattern)
            .unwrap_or_else(|e| panic!("invalid normalization pattern {pattern}: {e}")),
        replacement,
    })
    .collect()
});

fn apply_rules(name: &str) -> String {
    RULES.iter().fold(name.to_string(), |current, rule| {
        rule.pattern
            .replace_all(&current, rule.replacement)
            .into_owned()
    })
}

/// Normalize a channel name from a portal manifest
pub fn normalize_channel_name(name: &str) -> String {
    let mut current = apply_rules(name);
    // Rules only shrink or re-tag the name, so this settles quickly
    for _ in 0..(name.len() * 2 + 4) {
        let next = apply_rules(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}
