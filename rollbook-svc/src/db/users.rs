//! User records mirrored from the identity collaborator
//!
//! The identity provider is the source of truth for who a user is;
//! this table just records acting users so listings can resolve names
//! and `submitted_by` / `approved_by` references stay meaningful.

use chrono::Utc;
use sqlx::SqlitePool;

use rollbook_common::Result;

use crate::models::Role;

/// Upsert the acting user from the resolved request identity
pub async fn ensure_user(pool: &SqlitePool, user_id: &str, role: Role) -> Result<()> {
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO users (id, role, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            role = excluded.role,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(role.as_str())
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(())
}
