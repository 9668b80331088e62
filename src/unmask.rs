use regex::Captures;

use crate::token::{Token, TokenMap, PLACEHOLDER_RE};

/// Restores token placeholders to the values they replaced.
///
/// Placeholders absent from the map (echoed or invented by the model) are
/// left verbatim. Restored values are never rescanned, so a value that
/// itself looks like a placeholder is not expanded a second time.
pub fn unmask(text: &str, tokens: &TokenMap) -> String {
    let mut unresolved = 0usize;

    let restored = PLACEHOLDER_RE.replace_all(text, |caps: &Captures| {
        match Token::parse(&caps[0]).and_then(|t| tokens.value(t)) {
            Some(value) => value.to_string(),
            None => {
                unresolved += 1;
                caps[0].to_string()
            }
        }
    });
    let restored = restored.into_owned();

    if unresolved > 0 {
        tracing::debug!(unresolved, "left unknown placeholders in place");
    }
    restored
}

/// Placeholders in `text` that `tokens` cannot resolve.
pub fn unresolved_placeholders<'a>(text: &'a str, tokens: &TokenMap) -> Vec<&'a str> {
    PLACEHOLDER_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|p| Token::parse(p).and_then(|t| tokens.value(t)).is_none())
        .collect()
}
