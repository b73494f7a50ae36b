/// A locale supported by a package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, sqlx::FromRow)]
pub struct Locale {
    /// Internal key, referenced by `labels.locale`.
    pub id: i64,
    /// ISO language family (e.g., "en").
    #[sqlx(rename = "lang")]
    pub language: String,
    /// Full locale code (e.g., "en-US").
    pub code: String,
    /// Reserved locale; surfaced as-is, nothing here enforces it.
    pub locked: bool,
}
