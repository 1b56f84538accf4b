//! Type matcher: resolves a raw vendor type and size against a catalog and
//! normalizes a column's type fields.
//!
//! Resolution runs as a bounded loop over an immutable candidate pool:
//!
//! 1. candidates registered under the vendor name (or the canonical type when
//!    no name is given)
//! 2. if none fits the requested size, the entries of the first candidate's
//!    canonical type, preferring those answering to the original name
//! 3. if the canonical type was already tried, the first candidate's oversize
//!    surrogate, or a definite no-match when it has none
//!
//! Widening through a surrogate is logged as suspect: it can hide a catalog
//! whose bounds are configured too narrow.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::core::{Column, DataType};
use crate::error::{Result, SqlWeaveError};

use super::catalog::{DataTypeCatalog, DbDataType};

/// Size requested for a vendor type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeRequest {
    Absent,
    Length(u64),
    /// The `MAX` marker: `VARCHAR(MAX)`.
    Max,
}

impl SizeRequest {
    pub fn from_length(length: Option<u64>) -> Self {
        length.map(SizeRequest::Length).unwrap_or(SizeRequest::Absent)
    }

    fn length(&self) -> Option<u64> {
        match self {
            SizeRequest::Length(len) => Some(*len),
            _ => None,
        }
    }
}

/// Result of resolving a type against a catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'c> {
    /// An entry fits the requested size.
    Found(&'c DbDataType),
    /// No entry fits; the first candidate's surrogate stands in.
    Widened {
        original: &'c DbDataType,
        surrogate: &'c DbDataType,
    },
    /// No entry fits and no surrogate is declared.
    Unfit(&'c DbDataType),
    /// The catalog knows neither the name nor the canonical type.
    Unknown,
}

/// What [`TypeMatcher::apply`] did to a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The column carries a pass-through type; fields were set verbatim.
    PassThrough,
    /// Matched a catalog entry.
    Matched { name: String },
    /// Widened to a surrogate because the size fits no entry.
    Widened { from: String, to: String },
    /// No catalog entry; the existing canonical type was kept.
    Fallback,
    /// No entry fits and there is no surrogate; the column is unchanged.
    NoMatch,
}

/// A parsed `name(args)` type spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTypeName {
    pub base: String,
    pub size: SizeRequest,
    pub scale: Option<u32>,
}

static TYPE_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([^()]+?)\s*\(\s*([^)]*?)\s*\)\s*(.*?)\s*$")
        .expect("Invalid type name pattern")
});

/// Split `NVARCHAR(MAX)`, `DECIMAL(9,2)` or `VARCHAR(10) BINARY` into the base
/// name and the size arguments.
pub fn parse_type_name(name: &str) -> ParsedTypeName {
    let Some(caps) = TYPE_NAME_PATTERN.captures(name) else {
        return ParsedTypeName {
            base: name.trim().to_string(),
            size: SizeRequest::Absent,
            scale: None,
        };
    };
    let base = match caps.get(3).map(|m| m.as_str()).filter(|s| !s.is_empty()) {
        Some(trailing) => format!("{} {}", &caps[1], trailing),
        None => caps[1].to_string(),
    };
    let mut args = caps[2].split(',').map(str::trim);
    let size = match args.next() {
        Some(first) if first.eq_ignore_ascii_case("max") => SizeRequest::Max,
        Some(first) => first
            .parse::<u64>()
            .map(SizeRequest::Length)
            .unwrap_or(SizeRequest::Absent),
        None => SizeRequest::Absent,
    };
    let scale = args.next().and_then(|s| s.parse::<u32>().ok());
    ParsedTypeName { base, size, scale }
}

/// Resolves vendor types against one catalog.
#[derive(Debug, Clone, Copy)]
pub struct TypeMatcher<'c> {
    catalog: &'c DataTypeCatalog,
}

impl<'c> TypeMatcher<'c> {
    pub fn new(catalog: &'c DataTypeCatalog) -> Self {
        Self { catalog }
    }

    /// Resolve a vendor name (or canonical type) and size to a catalog entry.
    ///
    /// With a name, `data_type` only orders the candidates: entries of that
    /// canonical type come first when one spelling serves several types.
    /// Never mutates anything; [`apply`](Self::apply) builds on this.
    pub fn resolve(
        &self,
        name: Option<&str>,
        data_type: Option<DataType>,
        size: SizeRequest,
    ) -> Resolution<'c> {
        let candidates: Vec<&'c DbDataType> = match (name, data_type) {
            (Some(name), preferred) => {
                let mut by_name = self.catalog.by_name(name);
                if let Some(dt) = preferred {
                    by_name.sort_by_key(|e| e.data_type != dt);
                }
                by_name
            }
            (None, Some(dt)) => self.catalog.by_type(dt),
            (None, None) => Vec::new(),
        };
        let Some(&first) = candidates.first() else {
            return Resolution::Unknown;
        };

        let mut seen: HashSet<DataType> = HashSet::new();
        let mut pool = candidates;
        loop {
            if let Some(hit) = pick(&pool, size) {
                return Resolution::Found(hit);
            }
            let canonical = pool[0].data_type;
            if !seen.insert(canonical) {
                break;
            }
            let mut retry = self.catalog.by_type(canonical);
            if let Some(hint) = name {
                // Stable sort keeps registration order within each group.
                retry.sort_by_key(|e| !e.answers_to(hint));
            }
            if retry.is_empty() {
                break;
            }
            pool = retry;
        }

        match self.catalog.surrogate_of(first) {
            Some(surrogate) => Resolution::Widened {
                original: first,
                surrogate,
            },
            None => Resolution::Unfit(first),
        }
    }

    /// Match `type_name` with the given size and write the result into
    /// `column`.
    ///
    /// `length`/`scale` take precedence over sizes spelled inside the name.
    /// With no name, the column's canonical type is re-resolved, which makes
    /// re-matching an already matched column a no-op.
    pub fn apply(
        &self,
        column: &mut Column,
        type_name: Option<&str>,
        length: Option<u64>,
        scale: Option<u32>,
    ) -> Result<MatchOutcome> {
        // Pass-through types bypass the catalog.
        if let Some(dt) = column.data_type.filter(DataType::is_pass_through) {
            if let Some(name) = type_name {
                column.data_type_name = Some(name.to_string());
            }
            column.length = length;
            column.scale = scale;
            debug!("Column '{}' keeps pass-through type {}", column.name, dt);
            return Ok(MatchOutcome::PassThrough);
        }

        let (lookup_name, size, scale) = match type_name {
            Some(raw) => self.split_name(raw, length, scale),
            None => (None, SizeRequest::from_length(length), scale),
        };

        let resolution = self.resolve(lookup_name.as_deref(), column.data_type, size);

        match resolution {
            Resolution::Found(entry) => {
                self.check_reconcilable(column, type_name, entry)?;
                self.store(column, entry, size, scale);
                Ok(MatchOutcome::Matched {
                    name: entry.name.clone(),
                })
            }
            Resolution::Widened {
                original,
                surrogate,
            } => {
                self.check_reconcilable(column, type_name, surrogate)?;
                warn!(
                    "Column '{}': {:?} exceeds the bounds of {}, widening to {} (check the catalog bounds)",
                    column.name, size, original.name, surrogate.name
                );
                self.store(column, surrogate, size, scale);
                Ok(MatchOutcome::Widened {
                    from: original.name.clone(),
                    to: surrogate.name.clone(),
                })
            }
            Resolution::Unfit(entry) => {
                warn!(
                    "Column '{}': {:?} fits no {} entry and no surrogate is registered",
                    column.name, size, entry.name
                );
                Ok(MatchOutcome::NoMatch)
            }
            Resolution::Unknown => {
                let dt = column.data_type.unwrap_or(DataType::Other);
                if let Some(name) = type_name {
                    warn!(
                        "Column '{}': unknown vendor type '{}', keeping {}",
                        column.name, name, dt
                    );
                }
                column.data_type = Some(dt);
                column.data_type_name = type_name
                    .filter(|n| !dt.matches_type_name(n))
                    .map(str::to_string);
                column.length = if dt.is_fixed_size() { size.length() } else { None };
                column.scale = if dt.is_fixed_scale() { scale } else { None };
                Ok(MatchOutcome::Fallback)
            }
        }
    }

    /// Re-run the match for a column using its own fields.
    pub fn rematch(&self, column: &mut Column) -> Result<MatchOutcome> {
        let name = column.data_type_name.clone();
        let (length, scale) = (column.length, column.scale);
        self.apply(column, name.as_deref(), length, scale)
    }

    /// Prefer the full spelling when registered (`DOUBLE PRECISION`,
    /// `NVARCHAR(MAX)` aliases), else split off the size arguments.
    fn split_name(
        &self,
        raw: &str,
        length: Option<u64>,
        scale: Option<u32>,
    ) -> (Option<String>, SizeRequest, Option<u32>) {
        if !self.catalog.by_name(raw).is_empty() {
            return (Some(raw.trim().to_string()), SizeRequest::from_length(length), scale);
        }
        let parsed = parse_type_name(raw);
        let size = match length {
            Some(len) => SizeRequest::Length(len),
            None => parsed.size,
        };
        (Some(parsed.base), size, scale.or(parsed.scale))
    }

    /// Write `entry` into the column. The vendor name is dropped only when the
    /// canonical type alone resolves back to this same entry, so a later
    /// [`rematch`](Self::rematch) lands on it again.
    fn store(&self, column: &mut Column, entry: &'c DbDataType, size: SizeRequest, scale: Option<u32>) {
        let length = size.length().filter(|len| entry.fits(Some(*len)));
        column.data_type = Some(entry.data_type);
        column.length = match (size.length(), length) {
            (Some(_), None) => entry.max_length.or(entry.default_length),
            _ => entry.effective_length(length),
        };
        column.scale = entry.effective_scale(scale);

        let implied = entry.data_type.matches_type_name(&entry.name)
            && matches!(
                self.resolve(None, Some(entry.data_type), SizeRequest::from_length(column.length)),
                Resolution::Found(found) if std::ptr::eq(found, entry)
            );
        column.data_type_name = if implied { None } else { Some(entry.name.clone()) };
    }

    fn check_reconcilable(
        &self,
        column: &Column,
        type_name: Option<&str>,
        entry: &DbDataType,
    ) -> Result<()> {
        let (Some(name), Some(existing)) = (type_name, column.data_type) else {
            return Ok(());
        };
        if existing.is_reconcilable_with(entry.data_type) {
            return Ok(());
        }
        Err(SqlWeaveError::TypeMismatch {
            type_name: name.to_string(),
            expected: existing.to_string(),
            found: entry.data_type.to_string(),
        })
    }
}

fn pick<'c>(pool: &[&'c DbDataType], size: SizeRequest) -> Option<&'c DbDataType> {
    match size {
        SizeRequest::Absent => pool
            .iter()
            .find(|e| !e.oversize)
            .or_else(|| pool.first())
            .copied(),
        SizeRequest::Length(len) => pool.iter().find(|e| e.fits(Some(len))).copied(),
        SizeRequest::Max => pool.iter().find(|e| e.oversize).copied(),
    }
}
