//! Identifier validation and quoting.
//!
//! SQL identifiers cannot be bound as statement parameters, so every name the
//! factories emit goes through one of these functions. Quoting wraps the name
//! in the dialect's quote pair and doubles any embedded closing quote, which
//! makes [`QuotePair::unquote`] an exact inverse of [`QuotePair::quote`].

use serde::{Deserialize, Serialize};

use crate::error::{Result, SqlWeaveError};

/// Maximum identifier length (conservative limit across databases).
/// - PostgreSQL: 63 bytes
/// - SQL Server: 128 characters
/// - Oracle 12.2+: 128 bytes
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier for security issues.
///
/// Rejects:
/// - Empty identifiers
/// - Identifiers containing null bytes (injection vector)
/// - Identifiers exceeding maximum length
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SqlWeaveError::Config(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(SqlWeaveError::Config(format!(
            "SECURITY: Identifier contains null byte (possible injection attempt): {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(SqlWeaveError::Config(format!(
            "SECURITY: Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Case a dialect folds unquoted identifiers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefaultCase {
    UpperCase,
    LowerCase,
    /// Mixed case is stored as written.
    AsIs,
}

/// Opening and closing identifier quote characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotePair {
    pub open: char,
    pub close: char,
}

impl QuotePair {
    /// `"name"` (ANSI, PostgreSQL, Oracle, ...)
    pub const DOUBLE: QuotePair = QuotePair {
        open: '"',
        close: '"',
    };
    /// `` `name` `` (MySQL, MariaDB, Spanner)
    pub const BACKTICK: QuotePair = QuotePair {
        open: '`',
        close: '`',
    };
    /// `[name]` (SQL Server, Sybase, MS Jet)
    pub const BRACKET: QuotePair = QuotePair {
        open: '[',
        close: ']',
    };

    /// Whether `target` is already wrapped in this quote pair.
    pub fn is_quoted(&self, target: &str) -> bool {
        let mut chars = target.chars();
        match (chars.next(), chars.next_back()) {
            (Some(first), Some(last)) => first == self.open && last == self.close,
            _ => false,
        }
    }

    /// Wrap `name` and double any embedded closing quote.
    pub fn quote(&self, name: &str) -> String {
        let mut out = String::with_capacity(name.len() + 2);
        out.push(self.open);
        for ch in name.chars() {
            if ch == self.close {
                out.push(ch);
            }
            out.push(ch);
        }
        out.push(self.close);
        out
    }

    /// Strip the quote pair and collapse doubled closing quotes.
    ///
    /// Unquoted input is returned unchanged.
    pub fn unquote(&self, target: &str) -> String {
        if !self.is_quoted(target) {
            return target.to_string();
        }
        let inner = &target[self.open.len_utf8()..target.len() - self.close.len_utf8()];
        let doubled: String = [self.close, self.close].iter().collect();
        inner.replace(&doubled, &self.close.to_string())
    }

    /// Whether an unquoted `target` would be folded or misparsed.
    pub fn needs_quote(&self, target: &str, default_case: DefaultCase) -> bool {
        if target.is_empty() || self.is_quoted(target) {
            return false;
        }
        let bare = target
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
        if !bare {
            return true;
        }
        match default_case {
            DefaultCase::UpperCase => target.to_ascii_uppercase() != target,
            DefaultCase::LowerCase => target.to_ascii_lowercase() != target,
            DefaultCase::AsIs => false,
        }
    }

    /// Quote only when [`needs_quote`](Self::needs_quote) says so.
    pub fn quote_if_needed(&self, target: &str, default_case: DefaultCase) -> String {
        if self.needs_quote(target, default_case) {
            self.quote(target)
        } else {
            target.to_string()
        }
    }
}
