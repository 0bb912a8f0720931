//! Binding cell values as SQL parameters

use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use tabmerge_core::CellValue;

/// A cell bound as a statement parameter
pub(crate) struct SqlCell<'a>(pub &'a CellValue);

impl ToSql for SqlCell<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            CellValue::Empty => ToSqlOutput::Owned(Value::Null),
            CellValue::Boolean(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
            CellValue::Number(n) => ToSqlOutput::Owned(number(*n)),
            CellValue::String(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_str().as_bytes())),
            CellValue::Error(e) => ToSqlOutput::Borrowed(ValueRef::Text(e.as_str().as_bytes())),
        })
    }
}

/// Whole numbers that fit in an `i64` bind as INTEGER, the rest as REAL
fn number(n: f64) -> Value {
    // i64::MAX as f64 rounds up to 2^63, which is out of range.
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        Value::Integer(n as i64)
    } else {
        Value::Real(n)
    }
}
