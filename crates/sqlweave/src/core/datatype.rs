//! Canonical (database-agnostic) data types.
//!
//! Every vendor type registered in a dialect's catalog maps onto exactly one
//! [`DataType`]. Lengths, precisions and scales are carried by the column, not
//! by the canonical type, so one canonical type can be registered several
//! times at different width classes.
//!
//! ```text
//! vendor spelling  →  DataType   →  vendor spelling
//!   NVARCHAR(MAX)  →  NVarchar   →  NVARCHAR(MAX) / NCLOB / TEXT
//!   INT4           →  Int        →  INTEGER
//! ```

use serde::{Deserialize, Serialize};

/// Coarse grouping used to decide whether two canonical types can be
/// reconciled by the type matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    Boolean,
    Integer,
    Approximate,
    Exact,
    Character,
    Binary,
    DateTime,
    Interval,
    Structured,
    PassThrough,
}

/// Canonical type representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    // ===== Boolean =====
    Bit,
    Boolean,

    // ===== Integer Types =====
    TinyInt,
    UTinyInt,
    SmallInt,
    USmallInt,
    MediumInt,
    Int,
    UInt,
    BigInt,
    UBigInt,

    // ===== Floating Point =====
    Real,
    Float,
    Double,

    // ===== Decimal/Numeric =====
    Decimal,
    Numeric,
    SmallMoney,
    Money,

    // ===== String Types =====
    Char,
    Varchar,
    LongVarchar,
    Clob,
    NChar,
    NVarchar,
    LongNVarchar,
    NClob,

    // ===== Binary Types =====
    Binary,
    Varbinary,
    LongVarbinary,
    Blob,

    // ===== Date/Time Types =====
    Date,
    Time,
    TimeWithTimeZone,
    SmallDateTime,
    DateTime,
    Timestamp,
    TimestampWithTimeZone,
    IntervalYearToMonth,
    IntervalDayToSecond,

    // ===== Special Types =====
    Uuid,
    Json,
    Xml,
    RowId,
    Geometry,
    Enum,
    Set,

    // ===== Pass-through =====
    /// A domain declared in the schema.
    Domain,
    /// A user-defined type.
    Type,
    /// Anything the catalog cannot classify.
    Other,
}

impl DataType {
    /// Standard SQL spelling of the type.
    ///
    /// A column whose display type name equals this spelling does not need to
    /// keep the explicit name: regenerating it from the canonical type yields
    /// the same text.
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::Bit => "BIT",
            DataType::Boolean => "BOOLEAN",
            DataType::TinyInt => "TINYINT",
            DataType::UTinyInt => "TINYINT UNSIGNED",
            DataType::SmallInt => "SMALLINT",
            DataType::USmallInt => "SMALLINT UNSIGNED",
            DataType::MediumInt => "MEDIUMINT",
            DataType::Int => "INT",
            DataType::UInt => "INT UNSIGNED",
            DataType::BigInt => "BIGINT",
            DataType::UBigInt => "BIGINT UNSIGNED",
            DataType::Real => "REAL",
            DataType::Float => "FLOAT",
            DataType::Double => "DOUBLE",
            DataType::Decimal => "DECIMAL",
            DataType::Numeric => "NUMERIC",
            DataType::SmallMoney => "SMALLMONEY",
            DataType::Money => "MONEY",
            DataType::Char => "CHAR",
            DataType::Varchar => "VARCHAR",
            DataType::LongVarchar => "LONGVARCHAR",
            DataType::Clob => "CLOB",
            DataType::NChar => "NCHAR",
            DataType::NVarchar => "NVARCHAR",
            DataType::LongNVarchar => "LONGNVARCHAR",
            DataType::NClob => "NCLOB",
            DataType::Binary => "BINARY",
            DataType::Varbinary => "VARBINARY",
            DataType::LongVarbinary => "LONGVARBINARY",
            DataType::Blob => "BLOB",
            DataType::Date => "DATE",
            DataType::Time => "TIME",
            DataType::TimeWithTimeZone => "TIME WITH TIME ZONE",
            DataType::SmallDateTime => "SMALLDATETIME",
            DataType::DateTime => "DATETIME",
            DataType::Timestamp => "TIMESTAMP",
            DataType::TimestampWithTimeZone => "TIMESTAMP WITH TIME ZONE",
            DataType::IntervalYearToMonth => "INTERVAL YEAR TO MONTH",
            DataType::IntervalDayToSecond => "INTERVAL DAY TO SECOND",
            DataType::Uuid => "UUID",
            DataType::Json => "JSON",
            DataType::Xml => "XML",
            DataType::RowId => "ROWID",
            DataType::Geometry => "GEOMETRY",
            DataType::Enum => "ENUM",
            DataType::Set => "SET",
            DataType::Domain => "DOMAIN",
            DataType::Type => "TYPE",
            DataType::Other => "OTHER",
        }
    }

    /// Whether `name` is a spelling the canonical type implies on its own.
    pub fn matches_type_name(&self, name: &str) -> bool {
        if self.type_name().eq_ignore_ascii_case(name) {
            return true;
        }
        matches!(self, DataType::Boolean) && name.eq_ignore_ascii_case("bool")
    }

    pub fn family(&self) -> TypeFamily {
        use DataType::*;
        match self {
            Bit | Boolean => TypeFamily::Boolean,
            TinyInt | UTinyInt | SmallInt | USmallInt | MediumInt | Int | UInt | BigInt
            | UBigInt => TypeFamily::Integer,
            Real | Float | Double => TypeFamily::Approximate,
            Decimal | Numeric | SmallMoney | Money => TypeFamily::Exact,
            Char | Varchar | LongVarchar | Clob | NChar | NVarchar | LongNVarchar | NClob => {
                TypeFamily::Character
            }
            Binary | Varbinary | LongVarbinary | Blob => TypeFamily::Binary,
            Date | Time | TimeWithTimeZone | SmallDateTime | DateTime | Timestamp
            | TimestampWithTimeZone => TypeFamily::DateTime,
            IntervalYearToMonth | IntervalDayToSecond => TypeFamily::Interval,
            Uuid | Json | Xml | RowId | Geometry | Enum | Set => TypeFamily::Structured,
            Domain | Type | Other => TypeFamily::PassThrough,
        }
    }

    /// Domains, user types and unclassified types bypass the catalog.
    pub fn is_pass_through(&self) -> bool {
        self.family() == TypeFamily::PassThrough
    }

    /// Whether a length or precision is meaningful for this type.
    pub fn is_fixed_size(&self) -> bool {
        use DataType::*;
        matches!(
            self,
            Char | Varchar
                | NChar
                | NVarchar
                | Binary
                | Varbinary
                | Decimal
                | Numeric
                | Float
                | Bit
                | Time
                | TimeWithTimeZone
                | Timestamp
                | TimestampWithTimeZone
        )
    }

    /// Whether a scale is meaningful for this type.
    pub fn is_fixed_scale(&self) -> bool {
        matches!(self, DataType::Decimal | DataType::Numeric)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self.family(),
            TypeFamily::Integer | TypeFamily::Approximate | TypeFamily::Exact
        )
    }

    pub fn is_character(&self) -> bool {
        self.family() == TypeFamily::Character
    }

    pub fn is_binary(&self) -> bool {
        self.family() == TypeFamily::Binary
    }

    pub fn is_date_time(&self) -> bool {
        self.family() == TypeFamily::DateTime
    }

    /// Types whose values are generated by the database on insert.
    pub fn is_auto_incrementable(&self) -> bool {
        matches!(self, DataType::RowId)
    }

    /// Whether a vendor type of `other` can stand in for a column declared as
    /// `self` without an explicit conversion.
    pub fn is_reconcilable_with(&self, other: DataType) -> bool {
        if *self == other || self.is_pass_through() || other.is_pass_through() {
            return true;
        }
        match (self.family(), other.family()) {
            (a, b) if a == b => true,
            (TypeFamily::Integer, TypeFamily::Exact) | (TypeFamily::Exact, TypeFamily::Integer) => {
                true
            }
            (TypeFamily::Boolean, TypeFamily::Integer)
            | (TypeFamily::Integer, TypeFamily::Boolean) => true,
            (TypeFamily::Approximate, TypeFamily::Exact)
            | (TypeFamily::Exact, TypeFamily::Approximate) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}
