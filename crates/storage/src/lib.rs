use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

pub const AUTH_FLAG_KEY: &str = "is_authenticated";
pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const SAVED_SEARCH_KEY: &str = "customers_search_term";

/// Durable key-value state for the console: session credentials plus a
/// handful of remembered UI inputs. Backed by a single sqlite table so
/// a wiped row never leaves partial state behind.
#[derive(Clone)]
pub struct LocalStore {
    pool: Pool<Sqlite>,
}

impl LocalStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM local_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<String, _>(0)))
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO local_state (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=CURRENT_TIMESTAMP",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM local_state WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Records a signed-in session: the flag and token land together or
    /// not at all.
    pub async fn store_session(&self, token: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (key, value) in [(AUTH_FLAG_KEY, "true"), (AUTH_TOKEN_KEY, token)] {
            sqlx::query(
                "INSERT INTO local_state (key, value) VALUES (?, ?)
                 ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=CURRENT_TIMESTAMP",
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.get(AUTH_FLAG_KEY).await?.as_deref() == Some("true"))
    }

    pub async fn session_token(&self) -> Result<Option<String>> {
        self.get(AUTH_TOKEN_KEY).await
    }

    pub async fn clear_session(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for key in [AUTH_FLAG_KEY, AUTH_TOKEN_KEY] {
            sqlx::query("DELETE FROM local_state WHERE key = ?")
                .bind(key)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Persists the customers search term. An empty term clears the
    /// slot instead of storing "".
    pub async fn save_search_term(&self, term: &str) -> Result<()> {
        if term.is_empty() {
            self.remove(SAVED_SEARCH_KEY).await
        } else {
            self.set(SAVED_SEARCH_KEY, term).await
        }
    }

    pub async fn saved_search_term(&self) -> Result<Option<String>> {
        self.get(SAVED_SEARCH_KEY).await
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
