use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::fmt;

/// Caller-defined label identifier.
///
/// Strings spelling an integer in canonical decimal form are normalized to
/// [`Numeric`](Self::Numeric), so `"12"` and `12` name the same label while
/// `"012"` stays text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LabelId {
    Numeric(u64),
    Text(String),
}

impl LabelId {
    /// Valid identifiers are positive integers or non-empty strings that do
    /// not spell out a non-positive integer.
    ///
    /// # Examples
    ///
    /// ```
    /// use localekit_store::LabelId;
    /// assert!(LabelId::from(3u64).is_valid());
    /// assert!(LabelId::from("greeting").is_valid());
    /// assert!(!LabelId::from(0u64).is_valid());
    /// assert!(!LabelId::from("").is_valid());
    /// assert!(!LabelId::from("-4").is_valid());
    /// ```
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Numeric(n) => *n > 0,
            Self::Text(s) => !s.is_empty() && s.parse::<i64>().map_or(true, |n| n > 0),
        }
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for LabelId {
    fn from(value: u64) -> Self {
        Self::Numeric(value)
    }
}
impl From<u32> for LabelId {
    fn from(value: u32) -> Self {
        Self::Numeric(u64::from(value))
    }
}
impl From<i64> for LabelId {
    fn from(value: i64) -> Self {
        match u64::try_from(value) {
            Ok(n) => Self::Numeric(n),
            Err(_) => Self::Text(value.to_string()),
        }
    }
}
impl From<i32> for LabelId {
    fn from(value: i32) -> Self {
        Self::from(i64::from(value))
    }
}
impl From<String> for LabelId {
    fn from(value: String) -> Self {
        match value.parse::<u64>() {
            Ok(n) if n.to_string() == value => Self::Numeric(n),
            _ => Self::Text(value),
        }
    }
}
impl From<&str> for LabelId {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

/// A single label row for one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub id: LabelId,
    pub value: String,
}

impl<'r> FromRow<'r, SqliteRow> for Label {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        // Stored ids are either INTEGER or TEXT values.
        let id = match row.try_get::<i64, _>("id") {
            Ok(n) => LabelId::from(n),
            Err(_) => LabelId::from(row.try_get::<String, _>("id")?),
        };
        Ok(Self { id, value: row.try_get("value")? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("12", LabelId::Numeric(12))]
    #[case("0", LabelId::Numeric(0))]
    #[case("greeting", LabelId::Text("greeting".to_string()))]
    #[case("-7", LabelId::Text("-7".to_string()))]
    #[case("", LabelId::Text(String::new()))]
    #[case("007", LabelId::Text("007".to_string()))]
    #[case("+5", LabelId::Text("+5".to_string()))]
    #[case("18446744073709551615", LabelId::Numeric(u64::MAX))]
    fn test_from_str_normalizes(#[case] input: &str, #[case] expected: LabelId) {
        assert_eq!(LabelId::from(input), expected);
    }

    #[rstest]
    #[case(LabelId::Numeric(1), true)]
    #[case(LabelId::Numeric(0), false)]
    #[case(LabelId::Text("menu.title".to_string()), true)]
    #[case(LabelId::Text(String::new()), false)]
    #[case(LabelId::Text("-1".to_string()), false)]
    #[case(LabelId::from(-5i64), false)]
    fn test_validity(#[case] id: LabelId, #[case] expected: bool) {
        assert_eq!(id.is_valid(), expected);
    }

    #[test]
    fn test_display() {
        assert_eq!(LabelId::Numeric(42).to_string(), "42");
        assert_eq!(LabelId::from("menu.title").to_string(), "menu.title");
    }
}
