use chrono::{
    DateTime,
    Utc,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::EntityName;
use crate::pagination::PageFilter;

const NEWSLETTER_COLUMNS: &str = "id, name, user_id, active, created_at";

#[derive(Clone, Debug, serde::Serialize, sqlx::FromRow)]
pub struct Newsletter {
    pub id: Uuid,
    pub name: String,
    pub user_id: Uuid,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewNewsletter {
    pub name: EntityName,
    pub user_id: Uuid,
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Newsletter>, sqlx::Error> {
    sqlx::query_as::<_, Newsletter>(&format!(
        "SELECT {} FROM newsletters WHERE id = $1",
        NEWSLETTER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_all(pool: &PgPool, filter: &PageFilter) -> Result<Vec<Newsletter>, sqlx::Error> {
    sqlx::query_as::<_, Newsletter>(&format!(
        "SELECT {} FROM newsletters \
         WHERE ($1::uuid IS NULL OR user_id = $1) \
           AND ($2::text IS NULL OR name ILIKE $2) \
         ORDER BY created_at DESC, id \
         LIMIT $3 OFFSET $4",
        NEWSLETTER_COLUMNS
    ))
    .bind(filter.user_id)
    .bind(filter.name_pattern())
    .bind(filter.limit())
    .bind(filter.offset())
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, filter: &PageFilter) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM newsletters \
         WHERE ($1::uuid IS NULL OR user_id = $1) \
           AND ($2::text IS NULL OR name ILIKE $2)",
    )
    .bind(filter.user_id)
    .bind(filter.name_pattern())
    .fetch_one(pool)
    .await
}

#[tracing::instrument(name = "inserting newsletter record", skip(pool, new_newsletter))]
pub async fn insert(
    pool: &PgPool,
    new_newsletter: &NewNewsletter,
) -> Result<Newsletter, sqlx::Error> {
    sqlx::query_as::<_, Newsletter>(&format!(
        "INSERT INTO newsletters (id, name, user_id, created_at) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {}",
        NEWSLETTER_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(new_newsletter.name.as_ref())
    .bind(new_newsletter.user_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

#[tracing::instrument(name = "updating newsletter record", skip(pool, name))]
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: &EntityName,
    user_id: Uuid,
) -> Result<Newsletter, sqlx::Error> {
    sqlx::query_as::<_, Newsletter>(&format!(
        "UPDATE newsletters SET name = $2, user_id = $3 WHERE id = $1 RETURNING {}",
        NEWSLETTER_COLUMNS
    ))
    .bind(id)
    .bind(name.as_ref())
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn set_active(pool: &PgPool, id: Uuid, active: bool) -> Result<Newsletter, sqlx::Error> {
    sqlx::query_as::<_, Newsletter>(&format!(
        "UPDATE newsletters SET active = $2 WHERE id = $1 RETURNING {}",
        NEWSLETTER_COLUMNS
    ))
    .bind(id)
    .bind(active)
    .fetch_one(pool)
    .await
}

#[tracing::instrument(name = "deleting newsletter record", skip(pool))]
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM newsletters WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
