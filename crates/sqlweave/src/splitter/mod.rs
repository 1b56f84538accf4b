//! SQL script splitting.
//!
//! A single left-to-right pass over the script. Literals, quoted identifiers,
//! dollar-quoted bodies and comments are skipped as opaque runs so a
//! delimiter inside them never ends a statement. The delimiter itself is
//! mutable: a `DELIMITER x` line switches it for the rest of the script, and
//! a line holding only a terminator token (`GO`, `/`) closes the current
//! statement regardless of the delimiter.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::core::QuotePair;

/// Candidates tried, in order, when a temporary delimiter is needed.
pub const DEFAULT_DELIMITER_CANDIDATES: [&str; 3] = ["$$", "//", "@@"];

static PROCEDURAL_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^(?:CREATE\s+(?:OR\s+(?:REPLACE|ALTER)\s+)?(?:EDITIONABLE\s+|NONEDITIONABLE\s+)?(?:PROCEDURE|PROC|FUNCTION|TRIGGER|PACKAGE|TYPE\s+BODY)\b|ALTER\s+(?:PROCEDURE|PROC|FUNCTION|TRIGGER|PACKAGE)\b|DECLARE\b|BEGIN\b)",
    )
    .expect("valid procedural regex")
});

static TRANSACTION_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^BEGIN\s+(?:TRAN|TRANSACTION|WORK)\b|^BEGIN\s*;?$")
        .expect("valid transaction regex")
});

static LEADING_COMMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(?:\s+|--[^\n]*(?:\n|$)|/\*.*?\*/)*").expect("valid comment regex")
});

/// Byte range of a statement within the script it was split from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// One statement (or a free-standing comment) of a split script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitResult {
    /// Statement text without its delimiter, trimmed.
    pub text: String,
    /// Where `text` sits in the original script.
    pub span: Span,
    /// 1-based line of the first character.
    pub line: usize,
    /// The chunk holds nothing but a comment.
    pub comment_only: bool,
}

/// Lexical rules of one dialect's scripts.
#[derive(Debug, Clone)]
pub struct SplitterRules {
    /// Initial statement delimiter.
    pub delimiter: String,
    /// Tokens that end a statement when they fill a whole line.
    pub line_terminators: Vec<String>,
    /// `DELIMITER x` lines switch the delimiter.
    pub delimiter_command: bool,
    /// A `;` inside a procedural block does not end it; only a line
    /// terminator does.
    pub procedural_blocks: bool,
    /// `#` starts a line comment.
    pub hash_comments: bool,
    /// Backslash escapes the next character inside string literals.
    pub backslash_escapes: bool,
    /// `$tag$ ... $tag$` bodies.
    pub dollar_quotes: bool,
    /// `/* /* */ */` nests.
    pub nested_comments: bool,
    /// Identifier quotes other than `"`.
    pub identifier_quote: Option<QuotePair>,
}

impl SplitterRules {
    pub fn new(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
            line_terminators: Vec::new(),
            delimiter_command: false,
            procedural_blocks: false,
            hash_comments: false,
            backslash_escapes: false,
            dollar_quotes: false,
            nested_comments: false,
            identifier_quote: None,
        }
    }
}

impl Default for SplitterRules {
    fn default() -> Self {
        Self::new(";")
    }
}

/// Splits scripts into executable statements.
#[derive(Debug, Clone, Default)]
pub struct SqlSplitter {
    rules: SplitterRules,
}

impl SqlSplitter {
    pub fn new(rules: SplitterRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &SplitterRules {
        &self.rules
    }

    /// Split `script` into statements, comments standing before a statement
    /// included as their own comment-only results.
    pub fn split(&self, script: &str) -> Vec<SplitResult> {
        let mut scan = Scan {
            rules: &self.rules,
            script,
            bytes: script.as_bytes(),
            pos: 0,
            delimiter: self.rules.delimiter.clone(),
            statement_start: None,
            results: Vec::new(),
        };
        scan.run();
        debug!(
            "Split script of {} bytes into {} statements",
            script.len(),
            scan.results.len()
        );
        scan.results
    }
}

struct Scan<'a> {
    rules: &'a SplitterRules,
    script: &'a str,
    bytes: &'a [u8],
    pos: usize,
    delimiter: String,
    statement_start: Option<usize>,
    results: Vec<SplitResult>,
}

impl<'a> Scan<'a> {
    fn run(&mut self) {
        while self.pos < self.bytes.len() {
            if self.at_line_start() && self.line_directive() {
                continue;
            }

            let c = self.bytes[self.pos];
            if c.is_ascii_whitespace() {
                self.pos += 1;
                continue;
            }

            if self.starts_with("--") || (c == b'#' && self.rules.hash_comments) {
                let end = self.line_end(self.pos);
                self.comment(end);
                continue;
            }
            if self.starts_with("/*") {
                let end = self.block_comment_end(self.pos);
                self.comment(end);
                continue;
            }

            if c == b'\'' {
                self.begin();
                self.pos = self.quoted_end(self.pos, b'\'', b'\'', self.rules.backslash_escapes);
                continue;
            }
            if c == b'"' {
                self.begin();
                self.pos = self.quoted_end(self.pos, b'"', b'"', false);
                continue;
            }
            if let Some(pair) = self.rules.identifier_quote {
                if pair.open.is_ascii() && c == pair.open as u8 {
                    self.begin();
                    self.pos = self.quoted_end(self.pos, pair.open as u8, pair.close as u8, false);
                    continue;
                }
            }
            if c == b'$' && self.rules.dollar_quotes {
                if let Some(end) = self.dollar_quoted_end(self.pos) {
                    self.begin();
                    self.pos = end;
                    continue;
                }
            }

            if self.at_delimiter() && !self.delimiter_is_swallowed() {
                let len = self.delimiter.len();
                self.flush(self.pos);
                self.pos += len;
                continue;
            }

            self.begin();
            self.pos += self.char_len();
        }
        self.flush(self.bytes.len());
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || self.bytes[self.pos - 1] == b'\n'
    }

    /// Handle a `DELIMITER x` line or a terminator line at `pos`.
    fn line_directive(&mut self) -> bool {
        let end = self.line_end(self.pos);
        let line = self.script[self.pos..end].trim();

        if self.rules.delimiter_command && self.statement_start.is_none() {
            let mut words = line.split_whitespace();
            if let (Some(word), Some(next), None) = (words.next(), words.next(), words.next()) {
                if word.eq_ignore_ascii_case("DELIMITER") {
                    debug!("Delimiter changed from {} to {}", self.delimiter, next);
                    self.delimiter = next.to_string();
                    self.pos = end;
                    return true;
                }
            }
        }

        if !line.is_empty()
            && self
                .rules
                .line_terminators
                .iter()
                .any(|t| t.eq_ignore_ascii_case(line))
        {
            self.flush(self.pos);
            self.pos = end;
            return true;
        }
        false
    }

    fn starts_with(&self, token: &str) -> bool {
        self.bytes[self.pos..].starts_with(token.as_bytes())
    }

    fn at_delimiter(&self) -> bool {
        let d = self.delimiter.as_bytes();
        !d.is_empty()
            && self.bytes.len() - self.pos >= d.len()
            && self.bytes[self.pos..self.pos + d.len()].eq_ignore_ascii_case(d)
    }

    /// `;` inside a procedural block belongs to the block.
    fn delimiter_is_swallowed(&self) -> bool {
        if !self.rules.procedural_blocks || self.delimiter != ";" {
            return false;
        }
        match self.statement_start {
            Some(start) => is_procedural(&self.script[start..self.pos]),
            None => false,
        }
    }

    fn begin(&mut self) {
        if self.statement_start.is_none() {
            self.statement_start = Some(self.pos);
        }
    }

    /// A comment between statements is its own result; inside a statement
    /// it is part of the statement.
    fn comment(&mut self, end: usize) {
        if self.statement_start.is_none() {
            self.push(self.pos, end, true);
        }
        self.pos = end;
    }

    fn flush(&mut self, end: usize) {
        if let Some(start) = self.statement_start.take() {
            self.push(start, end, false);
        }
    }

    fn push(&mut self, start: usize, end: usize, comment_only: bool) {
        let text = self.script[start..end].trim_end();
        if text.is_empty() {
            return;
        }
        let line = self.script[..start].matches('\n').count() + 1;
        self.results.push(SplitResult {
            text: text.to_string(),
            span: Span::new(start, start + text.len()),
            line,
            comment_only,
        });
    }

    fn char_len(&self) -> usize {
        self.script[self.pos..]
            .chars()
            .next()
            .map_or(1, char::len_utf8)
    }

    fn line_end(&self, from: usize) -> usize {
        self.bytes[from..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(self.bytes.len(), |p| from + p)
    }

    fn block_comment_end(&self, from: usize) -> usize {
        let mut depth = 0usize;
        let mut i = from;
        while i + 1 < self.bytes.len() {
            match (self.bytes[i], self.bytes[i + 1]) {
                (b'/', b'*') if depth == 0 || self.rules.nested_comments => {
                    depth += 1;
                    i += 2;
                }
                (b'*', b'/') => {
                    depth -= 1;
                    i += 2;
                    if depth == 0 {
                        return i;
                    }
                }
                _ => i += 1,
            }
        }
        self.bytes.len()
    }

    /// End of a quoted run opened at `from`; a doubled closing quote is an
    /// escaped quote. Unterminated runs extend to the end of the script.
    fn quoted_end(&self, from: usize, open: u8, close: u8, backslash: bool) -> usize {
        debug_assert_eq!(self.bytes[from], open);
        let mut i = from + 1;
        while i < self.bytes.len() {
            let b = self.bytes[i];
            if backslash && b == b'\\' {
                i += 2;
                continue;
            }
            if b == close {
                if self.bytes.get(i + 1) == Some(&close) {
                    i += 2;
                    continue;
                }
                return i + 1;
            }
            i += 1;
        }
        self.bytes.len()
    }

    /// End of a `$tag$ ... $tag$` body, `None` when `from` does not open one.
    fn dollar_quoted_end(&self, from: usize) -> Option<usize> {
        let rest = &self.bytes[from + 1..];
        let tag_len = rest
            .iter()
            .position(|&b| !(b.is_ascii_alphanumeric() || b == b'_'))?;
        if rest[tag_len] != b'$' || rest.first().is_some_and(u8::is_ascii_digit) {
            return None;
        }
        let tag = &self.script[from..from + tag_len + 2];
        let body = from + tag.len();
        Some(
            self.script[body..]
                .find(tag)
                .map_or(self.bytes.len(), |p| body + p + tag.len()),
        )
    }
}

/// Whether `statement` opens a procedural block (procedure, function,
/// trigger, package or anonymous `BEGIN`/`DECLARE` block). Leading comments
/// are ignored; `BEGIN TRANSACTION` is not a block.
pub fn is_procedural(statement: &str) -> bool {
    let skipped = LEADING_COMMENTS
        .find(statement)
        .map_or(0, |m| m.end());
    let body = statement[skipped..].trim_end();
    PROCEDURAL_START.is_match(body) && !TRANSACTION_START.is_match(body)
}

/// A delimiter that does not occur anywhere in `script`.
///
/// Each candidate is tried in turn; when all of them occur, every candidate
/// is repeated once more and tried again. A repetition longer than the
/// script cannot occur in it, so the search always ends.
pub fn safe_delimiter(script: &str, candidates: &[&str]) -> String {
    let mut candidates: Vec<&str> = candidates.iter().copied().filter(|c| !c.is_empty()).collect();
    if candidates.is_empty() {
        candidates = DEFAULT_DELIMITER_CANDIDATES.to_vec();
    }
    let mut repeat = 1;
    loop {
        for candidate in &candidates {
            let delimiter = candidate.repeat(repeat);
            if !script.contains(&delimiter) {
                return delimiter;
            }
        }
        repeat += 1;
    }
}
