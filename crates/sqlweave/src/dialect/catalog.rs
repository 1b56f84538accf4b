//! Per-dialect data type catalog.
//!
//! A catalog is an ordered list of [`DbDataType`] entries. Order matters: the
//! matcher picks the first entry whose bounds fit, so narrow width classes are
//! registered before wide ones, and oversize entries (`NVARCHAR(MAX)`, `TEXT`)
//! come last for a given vendor name.

use crate::core::{DataType, SqlValue};

/// 1 GiB, the SQL Server `NVARCHAR(MAX)` bound in characters.
pub const LEN_1GB: u64 = 1 << 30;
/// 2 GiB - 1, the SQL Server `VARCHAR(MAX)`/`TEXT` bound.
pub const LEN_2GB_MINUS_1: u64 = (1 << 31) - 1;
/// 4 GiB - 1, the MySQL `LONGTEXT`/`LONGBLOB` bound.
pub const LEN_4GB_MINUS_1: u64 = (1 << 32) - 1;

/// How a catalog entry is spelled in DDL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSyntax {
    /// The bare name: `INT`, `TEXT`.
    Plain,
    /// `NAME(length)`, or the bare name when no length is known.
    Length,
    /// `NAME(precision, scale)`, `NAME(precision)` or the bare name.
    LengthScale,
    /// A fixed spelling: `NVARCHAR(MAX)`.
    Fixed(String),
}

/// Conversion applied to a value before it is wrapped in the literal
/// prefix/suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueConverter {
    #[default]
    AsIs,
    /// `TRUE` / `FALSE`.
    BooleanWords,
    /// `1` / `0`.
    BooleanDigits,
}

/// One vendor type registered in a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct DbDataType {
    /// Canonical type this entry maps onto.
    pub data_type: DataType,

    /// Vendor name the entry is registered under (upper case).
    pub name: String,

    /// Additional vendor spellings resolving to this entry.
    pub aliases: Vec<String>,

    pub syntax: TypeSyntax,

    /// Smallest accepted length/precision.
    pub min_length: u64,

    /// Largest accepted length/precision, `None` when unbounded.
    pub max_length: Option<u64>,

    /// Length used when the column carries none.
    pub default_length: Option<u64>,

    pub max_scale: Option<u32>,
    pub default_scale: Option<u32>,

    /// Whether the entry answers the `MAX` size marker.
    pub oversize: bool,

    /// Name of the wider entry substituted when a size exceeds this entry's
    /// bounds.
    pub surrogate: Option<String>,

    pub literal_prefix: Option<String>,
    pub literal_suffix: Option<String>,
    pub converter: ValueConverter,
}

impl DbDataType {
    /// An unsized entry spelled by its name.
    pub fn new(data_type: DataType, name: impl Into<String>) -> Self {
        Self {
            data_type,
            name: name.into().to_ascii_uppercase(),
            aliases: Vec::new(),
            syntax: TypeSyntax::Plain,
            min_length: 0,
            max_length: None,
            default_length: None,
            max_scale: None,
            default_scale: None,
            oversize: false,
            surrogate: None,
            literal_prefix: None,
            literal_suffix: None,
            converter: ValueConverter::AsIs,
        }
    }

    /// A `NAME(length)` entry accepting `min..=max`.
    pub fn sized(data_type: DataType, name: impl Into<String>, min: u64, max: u64) -> Self {
        let mut entry = Self::new(data_type, name);
        entry.syntax = TypeSyntax::Length;
        entry.min_length = min;
        entry.max_length = Some(max);
        entry
    }

    /// A `NAME(precision, scale)` entry.
    pub fn scaled(data_type: DataType, name: impl Into<String>, max_precision: u64, max_scale: u32) -> Self {
        let mut entry = Self::new(data_type, name);
        entry.syntax = TypeSyntax::LengthScale;
        entry.min_length = 1;
        entry.max_length = Some(max_precision);
        entry.max_scale = Some(max_scale);
        entry
    }

    /// An unsized entry whose implicit length is `max` (`TEXT`, `CLOB`).
    pub fn bounded(data_type: DataType, name: impl Into<String>, max: u64) -> Self {
        let mut entry = Self::new(data_type, name);
        entry.max_length = Some(max);
        entry
    }

    /// An entry with a fixed spelling answering the `MAX` marker.
    pub fn max_of(data_type: DataType, name: impl Into<String>, spelling: &str, max: u64) -> Self {
        let mut entry = Self::bounded(data_type, name, max);
        entry.syntax = TypeSyntax::Fixed(spelling.to_string());
        entry.oversize = true;
        entry
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_ascii_uppercase());
        self
    }

    pub fn default_length(mut self, length: u64) -> Self {
        self.default_length = Some(length);
        self
    }

    pub fn default_scale(mut self, scale: u32) -> Self {
        self.default_scale = Some(scale);
        self
    }

    pub fn surrogate(mut self, name: &str) -> Self {
        self.surrogate = Some(name.to_ascii_uppercase());
        self
    }

    pub fn oversize(mut self) -> Self {
        self.oversize = true;
        self
    }

    pub fn literal(mut self, prefix: &str, suffix: &str) -> Self {
        self.literal_prefix = Some(prefix.to_string());
        self.literal_suffix = Some(suffix.to_string());
        self
    }

    pub fn converter(mut self, converter: ValueConverter) -> Self {
        self.converter = converter;
        self
    }

    /// Whether `name` is the registered name or one of the aliases.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    /// Whether the entry declares a length in its spelling.
    pub fn is_sized(&self) -> bool {
        matches!(self.syntax, TypeSyntax::Length | TypeSyntax::LengthScale)
    }

    /// Whether a requested length fits this entry's bounds.
    pub fn fits(&self, length: Option<u64>) -> bool {
        match length {
            None => true,
            Some(len) if self.is_sized() => {
                len >= self.min_length && self.max_length.map_or(true, |max| len <= max)
            }
            Some(len) => self.max_length.map_or(true, |max| len <= max),
        }
    }

    /// Length a column takes once matched to this entry.
    pub fn effective_length(&self, requested: Option<u64>) -> Option<u64> {
        if self.is_sized() {
            requested.or(self.default_length)
        } else {
            self.max_length
        }
    }

    /// Scale a column takes once matched to this entry.
    pub fn effective_scale(&self, requested: Option<u32>) -> Option<u32> {
        match self.syntax {
            TypeSyntax::LengthScale => {
                let scale = requested.or(self.default_scale);
                match (scale, self.max_scale) {
                    (Some(s), Some(max)) => Some(s.min(max)),
                    (s, _) => s,
                }
            }
            _ => None,
        }
    }

    /// DDL spelling for the given length and scale.
    pub fn render(&self, length: Option<u64>, scale: Option<u32>) -> String {
        match &self.syntax {
            TypeSyntax::Plain => self.name.clone(),
            TypeSyntax::Fixed(spelling) => spelling.clone(),
            TypeSyntax::Length => match length.or(self.default_length) {
                Some(len) => format!("{}({})", self.name, len),
                None => self.name.clone(),
            },
            TypeSyntax::LengthScale => match (length.or(self.default_length), scale) {
                (Some(p), Some(s)) => format!("{}({}, {})", self.name, p, s),
                (Some(p), None) => format!("{}({})", self.name, p),
                (None, _) => self.name.clone(),
            },
        }
    }

    /// Render a value as a literal of this type.
    ///
    /// Quotes matching the literal suffix are doubled inside the literal.
    pub fn literal_of(&self, value: &SqlValue) -> String {
        let text = match (value, self.converter) {
            (SqlValue::Null, _) => return "NULL".to_string(),
            (SqlValue::Bool(v), ValueConverter::BooleanWords) => {
                return if *v { "TRUE" } else { "FALSE" }.to_string();
            }
            (SqlValue::Bool(v), ValueConverter::BooleanDigits) => {
                return if *v { "1" } else { "0" }.to_string();
            }
            (other, _) => other.raw_text().unwrap_or_default(),
        };
        match (&self.literal_prefix, &self.literal_suffix) {
            (None, None) => text,
            (prefix, suffix) => {
                let suffix = suffix.as_deref().unwrap_or("");
                let escaped = if suffix.is_empty() {
                    text
                } else {
                    text.replace(suffix, &format!("{suffix}{suffix}"))
                };
                format!("{}{}{}", prefix.as_deref().unwrap_or(""), escaped, suffix)
            }
        }
    }
}

/// Ordered collection of vendor types for one dialect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTypeCatalog {
    entries: Vec<DbDataType>,
}

impl DataTypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn register(&mut self, entry: DbDataType) -> &mut Self {
        self.entries.push(entry);
        self
    }

    /// Replace every entry registered under `entry.name` with `entry`, keeping
    /// the position of the first one. Appends when none exists.
    pub fn replace(&mut self, entry: DbDataType) -> &mut Self {
        match self.entries.iter().position(|e| e.name == entry.name) {
            Some(pos) => {
                let name = entry.name.clone();
                self.entries[pos] = entry;
                let mut index = 0;
                self.entries.retain(|e| {
                    let keep = index == pos || e.name != name;
                    index += 1;
                    keep
                });
            }
            None => {
                self.entries.push(entry);
            }
        }
        self
    }

    /// Remove every entry registered under `name`.
    pub fn remove(&mut self, name: &str) -> &mut Self {
        self.entries.retain(|e| !e.name.eq_ignore_ascii_case(name));
        self
    }

    /// Keep only the entries `keep` accepts.
    pub fn retain(&mut self, keep: impl FnMut(&DbDataType) -> bool) -> &mut Self {
        self.entries.retain(keep);
        self
    }

    pub fn entries(&self) -> &[DbDataType] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries answering to a vendor name, in registration order.
    pub fn by_name(&self, name: &str) -> Vec<&DbDataType> {
        let name = name.trim();
        self.entries.iter().filter(|e| e.answers_to(name)).collect()
    }

    /// Entries mapped onto a canonical type, in registration order.
    pub fn by_type(&self, data_type: DataType) -> Vec<&DbDataType> {
        self.entries
            .iter()
            .filter(|e| e.data_type == data_type)
            .collect()
    }

    /// First entry registered under `name`.
    pub fn get(&self, name: &str) -> Option<&DbDataType> {
        self.entries.iter().find(|e| e.answers_to(name))
    }

    /// The entry substituted for `entry` when a size exceeds its bounds.
    pub fn surrogate_of(&self, entry: &DbDataType) -> Option<&DbDataType> {
        entry.surrogate.as_deref().and_then(|name| self.get(name))
    }
}
