//! SQL values rendered into literals by the dialect.
//!
//! Factories emit named parameters (`:column`) for DML, so values only turn
//! into literal text when a caller asks a dialect for
//! [`sql_value_literal`](crate::dialect::Dialect::sql_value_literal), e.g. to
//! write a seed-data script.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Exact numeric kept in its textual form.
    Decimal(String),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
}

impl SqlValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Text of the value as it goes between the literal prefix and suffix.
    ///
    /// Returns `None` for NULL.
    pub fn raw_text(&self) -> Option<String> {
        match self {
            SqlValue::Null => None,
            SqlValue::Bool(v) => Some(if *v { "1" } else { "0" }.to_string()),
            SqlValue::Int(v) => Some(v.to_string()),
            SqlValue::Float(v) => Some(v.to_string()),
            SqlValue::Decimal(v) | SqlValue::Text(v) => Some(v.clone()),
            SqlValue::Bytes(v) => Some(hex::encode_upper(v)),
            SqlValue::Date(v) => Some(v.format("%Y-%m-%d").to_string()),
            SqlValue::Time(v) => Some(v.format("%H:%M:%S%.f").to_string()),
            SqlValue::DateTime(v) => Some(v.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            SqlValue::DateTimeOffset(v) => Some(v.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string()),
        }
    }

    /// Human-readable rendering; NULL shows as `<NULL>`.
    pub fn value_for_display(&self) -> String {
        self.raw_text().unwrap_or_else(|| "<NULL>".to_string())
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(i64::from(v))
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_text() {
        assert_eq!(SqlValue::Null.raw_text(), None);
        assert_eq!(SqlValue::Bool(true).raw_text().as_deref(), Some("1"));
        assert_eq!(SqlValue::Bytes(vec![0xca, 0xfe]).raw_text().as_deref(), Some("CAFE"));
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(SqlValue::from(date).raw_text().as_deref(), Some("2024-02-29"));
    }

    #[test]
    fn test_value_for_display() {
        assert_eq!(SqlValue::Null.value_for_display(), "<NULL>");
        assert_eq!(SqlValue::from("abc").value_for_display(), "abc");
        assert_eq!(SqlValue::from(None::<i64>), SqlValue::Null);
    }
}
