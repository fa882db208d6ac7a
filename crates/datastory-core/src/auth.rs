use std::fmt;

/// Tokens shorter than this are never partially revealed
const MIN_REVEAL_LEN: usize = 12;

/// Bearer credential passed to every remote call
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Parse a token from user input; blank input yields `None`
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form safe for display
    pub fn masked(&self) -> String {
        if self.0.chars().count() < MIN_REVEAL_LEN {
            return "****".to_string();
        }
        let visible: String = self.0.chars().take(4).collect();
        format!("{}…", visible)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}
