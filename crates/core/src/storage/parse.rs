//! Database value parsing utilities
//!
//! Provides error-safe parsing of stored values.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Error as SqlError;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use uuid::Uuid;

fn conversion_error<E>(column: usize, err: E) -> SqlError
where
    E: std::error::Error + Send + Sync + 'static,
{
    SqlError::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

/// Parse a UUID from a database string column
pub fn parse_uuid(s: &str) -> Result<Uuid, SqlError> {
    Uuid::parse_str(s).map_err(|e| conversion_error(0, e))
}

/// Parse an optional UUID from a database string column
pub fn parse_uuid_opt(s: Option<String>) -> Result<Option<Uuid>, SqlError> {
    s.map(|s| parse_uuid(&s)).transpose()
}

/// Parse a DateTime from an RFC3339 string
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, SqlError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(0, e))
}

/// Parse an optional DateTime from an RFC3339 string
pub fn parse_datetime_opt(s: Option<String>) -> Result<Option<DateTime<Utc>>, SqlError> {
    s.map(|s| parse_datetime(&s)).transpose()
}

/// Parse an exact decimal stored as text
pub fn parse_decimal(s: &str) -> Result<Decimal, SqlError> {
    Decimal::from_str(s).map_err(|e| conversion_error(0, e))
}

pub fn parse_decimal_opt(s: Option<String>) -> Result<Option<Decimal>, SqlError> {
    s.map(|s| parse_decimal(&s)).transpose()
}

/// Parse a text-coded enum (roles, statuses)
pub fn parse_enum<T>(s: &str) -> Result<T, SqlError>
where
    T: FromStr<Err = crate::error::Error>,
{
    T::from_str(s).map_err(|e| conversion_error(0, e))
}

/// Parse a JSON column
pub fn parse_json<T: DeserializeOwned>(s: &str) -> Result<T, SqlError> {
    serde_json::from_str(s).map_err(|e| conversion_error(0, e))
}

/// Extension trait for converting rusqlite Results to Option
pub trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, SqlError>;
}

impl<T> OptionalExt<T> for Result<T, SqlError> {
    fn optional(self) -> Result<Option<T>, SqlError> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(SqlError::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("100.00").unwrap(), dec!(100));
        assert!(parse_decimal("abc").is_err());
    }

    #[test]
    fn test_parse_enum() {
        assert_eq!(parse_enum::<Role>("BREWER").unwrap(), Role::Brewer);
        assert!(parse_enum::<Role>("OWNER").is_err());
    }

    #[test]
    fn test_optional_ext() {
        let missing: Result<u32, SqlError> = Err(SqlError::QueryReturnedNoRows);
        assert_eq!(missing.optional().unwrap(), None);
    }
}
