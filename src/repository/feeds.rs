use chrono::{
    DateTime,
    Utc,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    EntityName,
    FeedUrl,
};

/// A source feed attached to a newsletter.
#[derive(Clone, Debug, serde::Serialize, sqlx::FromRow)]
pub struct Feed {
    pub id: Uuid,
    pub newsletter_id: Uuid,
    pub title: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewFeed {
    pub newsletter_id: Uuid,
    pub title: EntityName,
    pub address: FeedUrl,
}

pub async fn find_by_newsletter(
    pool: &PgPool,
    newsletter_id: Uuid,
) -> Result<Vec<Feed>, sqlx::Error> {
    sqlx::query_as::<_, Feed>(
        "SELECT id, newsletter_id, title, address, created_at \
         FROM feeds \
         WHERE newsletter_id = $1 \
         ORDER BY created_at, id",
    )
    .bind(newsletter_id)
    .fetch_all(pool)
    .await
}

#[tracing::instrument(name = "inserting feed record", skip(pool, new_feed))]
pub async fn insert(pool: &PgPool, new_feed: &NewFeed) -> Result<Feed, sqlx::Error> {
    sqlx::query_as::<_, Feed>(
        "INSERT INTO feeds (id, newsletter_id, title, address, created_at) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, newsletter_id, title, address, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(new_feed.newsletter_id)
    .bind(new_feed.title.as_ref())
    .bind(new_feed.address.as_ref())
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}
