//! Settings database operations
//!
//! Key/value accessors over the `settings` table.

use crate::models::Locale;
use jkps_common::{Error, Result};
use sqlx::{Pool, Sqlite};

/// Settings key holding the selected output locale
pub const LOCALE_KEY: &str = "language";

/// Get the persisted output locale
///
/// **Returns:** Some(locale) if set, None otherwise
pub async fn get_locale(db: &Pool<Sqlite>) -> Result<Option<Locale>> {
    get_setting::<Locale>(db, LOCALE_KEY).await
}

/// Persist the output locale
pub async fn set_locale(db: &Pool<Sqlite>, locale: Locale) -> Result<()> {
    set_setting(db, LOCALE_KEY, locale).await
}

/// Generic setting getter (internal)
async fn get_setting<T>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    match row {
        Some((value,)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting {} failed: {}", key, e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter (internal)
async fn set_setting<T>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    /// Single-connection in-memory database with the production schema
    async fn setup_test_db() -> Pool<Sqlite> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        jkps_common::db::create_tables(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_locale_unset() {
        let db = setup_test_db().await;
        assert_eq!(get_locale(&db).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_locale_round_trip_and_overwrite() {
        let db = setup_test_db().await;

        set_locale(&db, Locale::Tr).await.unwrap();
        assert_eq!(get_locale(&db).await.unwrap(), Some(Locale::Tr));

        set_locale(&db, Locale::En).await.unwrap();
        assert_eq!(get_locale(&db).await.unwrap(), Some(Locale::En));
    }

    #[tokio::test]
    async fn test_stored_as_language_code() {
        let db = setup_test_db().await;
        set_locale(&db, Locale::Tr).await.unwrap();

        let value: String = sqlx::query_scalar("SELECT value FROM settings WHERE key = 'language'")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(value, "tr");
    }

    #[tokio::test]
    async fn test_unparseable_locale_is_config_error() {
        let db = setup_test_db().await;
        sqlx::query("INSERT INTO settings (key, value) VALUES ('language', 'klingon')")
            .execute(&db)
            .await
            .unwrap();

        assert!(matches!(get_locale(&db).await, Err(Error::Config(_))));
    }
}
