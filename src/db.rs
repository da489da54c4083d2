//! Pool construction and first-run database creation.

use crate::config::Settings;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

/// Build the pool the services share. Connects eagerly so a bad URL fails at startup.
pub async fn connect(settings: &Settings) -> Result<PgPool, sqlx::Error> {
    if settings.ensure_database {
        ensure_database_exists(&settings.database_url).await?;
    }
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await?;
    tracing::info!(max_connections = settings.max_connections, "database pool ready");
    Ok(pool)
}

/// Connect to the `postgres` maintenance database on the same server and
/// create the target database when it is missing.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    let (admin_url, db_name) = split_database_url(database_url)
        .ok_or_else(|| sqlx::Error::Configuration("DATABASE_URL has no database path".into()))?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let mut conn = PgConnectOptions::from_str(&admin_url)?.connect().await?;
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

/// `(admin_url, db_name)`: the same URL pointed at `postgres`, query string kept.
fn split_database_url(url: &str) -> Option<(String, String)> {
    let scheme_end = url.find("://")? + 3;
    let path_start = scheme_end + url[scheme_end..].find('/')? + 1;
    let rest = &url[path_start..];
    let (db_name, query) = match rest.split_once('?') {
        Some((name, q)) => (name, Some(q)),
        None => (rest, None),
    };
    let mut admin_url = format!("{}postgres", &url[..path_start]);
    if let Some(q) = query {
        admin_url.push('?');
        admin_url.push_str(q);
    }
    Some((admin_url, db_name.trim().to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_database_name() {
        assert_eq!(
            split_database_url("postgres://u:p@localhost:5432/hotel"),
            Some(("postgres://u:p@localhost:5432/postgres".into(), "hotel".into()))
        );
        assert_eq!(
            split_database_url("postgres://localhost/hotel?sslmode=disable"),
            Some(("postgres://localhost/postgres?sslmode=disable".into(), "hotel".into()))
        );
        assert_eq!(
            split_database_url("postgres://localhost/"),
            Some(("postgres://localhost/postgres".into(), "".into()))
        );
        assert_eq!(split_database_url("postgres://localhost"), None);
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("hotel"), "\"hotel\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }
}
