use crate::model::PictureEntity;
use anyhow::{Context, Result};
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{info, instrument, warn};

pub type Pool = SqlitePool;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const PICTURE_COLUMNS: &str = "id, albumId, title, url, thumbnailUrl";

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let in_memory = normalized.starts_with("sqlite::memory");

    let mut options = SqliteConnectOptions::from_str(&normalized)
        .with_context(|| format!("invalid database url: {normalized}"))?
        .create_if_missing(true);
    if !in_memory {
        // WAL with full durability for the on-disk store.
        options = options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full);
    }

    // Every connection to `sqlite::memory:` opens its own database, so the
    // in-memory store is pinned to a single connection that never expires.
    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new()
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .context("failed to open sqlite database")?;
    Ok(pool)
}

/// If using a file-backed SQLite URL, expand a leading `~/` and ensure the parent
/// directory exists. Leaves in-memory URLs untouched.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") || url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    let rest = &url["sqlite:".len()..];
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);
    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };
    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded_path = match (path_part.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path_part.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    let mut rebuilt = format!("sqlite://{expanded_path}");
    if let Some(q) = query_part {
        rebuilt.push('?');
        rebuilt.push_str(q);
    }
    rebuilt
}

/// Apply the embedded schema. A database whose migration history does not
/// match the embedded one is wiped and rebuilt; saved pictures do not survive
/// a schema change.
///
/// Tables left by a build that predates the migration history are dropped the
/// same way.
pub async fn run_migrations(pool: &Pool) -> Result<()> {
    if has_unmanaged_tables(pool).await? {
        warn!("found tables without migration history; resetting picture store");
        drop_all_tables(pool).await?;
    }
    match MIGRATOR.run(pool).await {
        Ok(()) => {}
        Err(err @ (MigrateError::VersionMissing(_) | MigrateError::VersionMismatch(_))) => {
            warn!(%err, "local schema does not match; resetting picture store");
            drop_all_tables(pool).await?;
            MIGRATOR
                .run(pool)
                .await
                .context("failed to re-apply migrations after reset")?;
            info!("picture store reset to current schema");
        }
        Err(err) => return Err(err).context("failed to apply migrations"),
    }
    Ok(())
}

async fn has_unmanaged_tables(pool: &Pool) -> Result<bool> {
    let names: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )
    .fetch_all(pool)
    .await
    .context("failed to list tables")?;
    Ok(!names.is_empty() && !names.iter().any(|name| name == "_sqlx_migrations"))
}

async fn drop_all_tables(pool: &Pool) -> Result<(), MigrateError> {
    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )
    .fetch_all(pool)
    .await?;
    for table in tables {
        sqlx::query(&format!("DROP TABLE IF EXISTS \"{table}\""))
            .execute(pool)
            .await?;
    }
    Ok(())
}

/// Insert a picture unless one with the same id is already stored.
/// Returns whether a row was written.
#[instrument(skip_all, fields(id = picture.id))]
pub async fn insert_picture(pool: &Pool, picture: &PictureEntity) -> sqlx::Result<bool> {
    let res = sqlx::query(
        "INSERT OR IGNORE INTO picture (id, albumId, title, url, thumbnailUrl) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(picture.id)
    .bind(picture.album_id)
    .bind(&picture.title)
    .bind(&picture.url)
    .bind(&picture.thumbnail_url)
    .execute(pool)
    .await?;
    Ok(res.rows_affected() > 0)
}

/// Delete the row equal to `picture` in every column. Returns whether a row was removed.
#[instrument(skip_all, fields(id = picture.id))]
pub async fn delete_picture(pool: &Pool, picture: &PictureEntity) -> sqlx::Result<bool> {
    let res = sqlx::query(
        "DELETE FROM picture WHERE id = ? AND albumId = ? AND title = ? AND url = ? AND thumbnailUrl = ?",
    )
    .bind(picture.id)
    .bind(picture.album_id)
    .bind(&picture.title)
    .bind(&picture.url)
    .bind(&picture.thumbnail_url)
    .execute(pool)
    .await?;
    Ok(res.rows_affected() > 0)
}

/// Every stored picture, in storage order.
pub async fn all_pictures(pool: &Pool) -> sqlx::Result<Vec<PictureEntity>> {
    sqlx::query_as::<_, PictureEntity>(&format!("SELECT {PICTURE_COLUMNS} FROM picture"))
        .fetch_all(pool)
        .await
}

pub async fn picture_by_id(pool: &Pool, id: i64) -> sqlx::Result<Option<PictureEntity>> {
    sqlx::query_as::<_, PictureEntity>(&format!(
        "SELECT {PICTURE_COLUMNS} FROM picture WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_pool() -> Pool {
        let pool = init_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    async fn count_pictures(pool: &Pool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM picture")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    fn picture(id: i64) -> PictureEntity {
        PictureEntity {
            id,
            album_id: 1,
            title: format!("picture {id}"),
            url: format!("https://via.placeholder.com/600/{id}"),
            thumbnail_url: format!("https://via.placeholder.com/150/{id}"),
        }
    }

    #[tokio::test]
    async fn insert_ignores_duplicate_ids() {
        let pool = setup_pool().await;
        assert!(insert_picture(&pool, &picture(1)).await.unwrap());

        let mut changed = picture(1);
        changed.title = "other".into();
        assert!(!insert_picture(&pool, &changed).await.unwrap());

        assert_eq!(count_pictures(&pool).await, 1);
        let stored = picture_by_id(&pool, 1).await.unwrap().unwrap();
        assert_eq!(stored.title, "picture 1");
    }

    #[tokio::test]
    async fn delete_requires_matching_record() {
        let pool = setup_pool().await;
        insert_picture(&pool, &picture(1)).await.unwrap();

        let mut stale = picture(1);
        stale.title = "renamed".into();
        assert!(!delete_picture(&pool, &stale).await.unwrap());
        assert!(delete_picture(&pool, &picture(1)).await.unwrap());
        assert!(!delete_picture(&pool, &picture(1)).await.unwrap());
        assert_eq!(count_pictures(&pool).await, 0);
    }

    #[tokio::test]
    async fn all_pictures_follows_storage_order() {
        let pool = setup_pool().await;
        for id in [3, 1, 2] {
            insert_picture(&pool, &picture(id)).await.unwrap();
        }
        let ids: Vec<i64> = all_pictures(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn mismatched_history_resets_store() {
        let pool = setup_pool().await;
        insert_picture(&pool, &picture(1)).await.unwrap();
        sqlx::query("UPDATE _sqlx_migrations SET checksum = x'00'")
            .execute(&pool)
            .await
            .unwrap();

        run_migrations(&pool).await.unwrap();
        assert_eq!(count_pictures(&pool).await, 0);
        insert_picture(&pool, &picture(2)).await.unwrap();
        assert_eq!(count_pictures(&pool).await, 1);
    }

    #[tokio::test]
    async fn table_without_history_is_replaced() {
        let pool = init_pool("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE picture (id INTEGER PRIMARY KEY NOT NULL, title TEXT)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO picture (id, title) VALUES (1, 'old')")
            .execute(&pool)
            .await
            .unwrap();

        run_migrations(&pool).await.unwrap();
        assert_eq!(count_pictures(&pool).await, 0);
        assert!(insert_picture(&pool, &picture(1)).await.unwrap());
        assert_eq!(picture_by_id(&pool, 1).await.unwrap(), Some(picture(1)));
    }

    #[tokio::test]
    async fn rerunning_migrations_keeps_rows() {
        let pool = setup_pool().await;
        insert_picture(&pool, &picture(1)).await.unwrap();
        run_migrations(&pool).await.unwrap();
        assert_eq!(count_pictures(&pool).await, 1);
    }

    #[test]
    fn memory_urls_pass_through() {
        assert_eq!(prepare_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            prepare_sqlite_url("postgres://localhost/db"),
            "postgres://localhost/db"
        );
    }

    #[test]
    fn file_urls_are_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("pictures.db");
        let url = format!("sqlite:{}?mode=rwc", path.display());
        let normalized = prepare_sqlite_url(&url);
        assert_eq!(normalized, format!("sqlite://{}?mode=rwc", path.display()));
        assert!(dir.path().join("nested").exists());
    }
}
