use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;

/// Matches any placeholder-shaped substring, known to a map or not.
pub static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#TOKEN_([0-9]+)#").expect("placeholder regex is valid"));

/// Matches the start of a placeholder, complete or not. Raw input containing
/// this could be completed into a placeholder by a token minted after it.
static PLACEHOLDER_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#TOKEN_[0-9]*#?").expect("placeholder prefix regex is valid"));

/// A placeholder minted for one sensitive value: `#TOKEN_<n>#`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(u64);

impl Token {
    pub fn number(&self) -> u64 {
        self.0
    }

    /// Parse a full placeholder string. Returns `None` for anything that is
    /// not exactly the `Display` form `#TOKEN_<positive integer>#`, so
    /// `#TOKEN_01#` is not token 1.
    pub fn parse(s: &str) -> Option<Self> {
        let digits = s.strip_prefix("#TOKEN_")?.strip_suffix('#')?;
        if digits.is_empty()
            || digits.starts_with('0')
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        digits.parse::<u64>().ok().map(Self)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#TOKEN_{}#", self.0)
    }
}

/// Per-request bidirectional association between tokens and the values they
/// stand for.
///
/// A map is created by one `mask` call and handed to the matching `unmask`
/// call. It is not `Serialize`, and its `Debug` output never includes values.
#[derive(Clone, Default)]
pub struct TokenMap {
    forward: BTreeMap<Token, String>,
    reverse: HashMap<String, Token>,
    last: u64,
}

impl std::fmt::Debug for TokenMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenMap")
            .field("tokens", &self.forward.len())
            .field("values", &"<redacted>")
            .finish()
    }
}

impl TokenMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the token for `value`, minting the next sequential one if the
    /// value has not been seen in this map.
    pub fn mint(&mut self, value: &str) -> Token {
        if let Some(token) = self.reverse.get(value) {
            return *token;
        }
        self.last += 1;
        let token = Token(self.last);
        self.forward.insert(token, value.to_string());
        self.reverse.insert(value.to_string(), token);
        token
    }

    pub fn value(&self, token: Token) -> Option<&str> {
        self.forward.get(&token).map(String::as_str)
    }

    pub fn token_for(&self, value: &str) -> Option<Token> {
        self.reverse.get(value).copied()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Entries in minting order.
    pub fn iter(&self) -> impl Iterator<Item = (Token, &str)> {
        self.forward.iter().map(|(t, v)| (*t, v.as_str()))
    }
}

/// Text together with the token map that makes it reversible.
#[derive(Debug, Clone, Default)]
pub struct Masked {
    pub text: String,
    pub tokens: TokenMap,
}

impl Masked {
    /// Start a fresh invocation over `text` with an empty map.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tokens: TokenMap::new(),
        }
    }

    pub fn into_parts(self) -> (String, TokenMap) {
        (self.text, self.tokens)
    }
}

/// First placeholder or placeholder prefix (`#TOKEN_`, `#TOKEN_12`) in
/// `text`, if any.
pub fn find_placeholder(text: &str) -> Option<&str> {
    PLACEHOLDER_PREFIX_RE.find(text).map(|m| m.as_str())
}
