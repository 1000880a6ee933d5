use anyhow::Context;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::users::User;

/// Append an audit entry for a mutating action, attributed to `actor`.
///
/// The write happens on a detached task: a failed insert is logged and
/// never surfaces in the HTTP response.
pub fn record_activity(pool: &PgPool, entity: String, action: &str, actor: &User) {
    let pool = pool.clone();
    let action = action.to_string();
    let actor_id = actor.id;
    let actor_name = actor.name.clone();
    tokio::spawn(async move {
        if let Err(e) = insert_entry(&pool, &entity, &action, actor_id, &actor_name).await {
            tracing::warn!("failed to record audit entry: {:?}", e);
        }
    });
}

async fn insert_entry(
    pool: &PgPool,
    entity: &str,
    action: &str,
    actor_id: Uuid,
    actor_name: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO audit_log (id, entity, action, actor_id, actor_name, recorded_at) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(Uuid::new_v4())
    .bind(entity)
    .bind(action)
    .bind(actor_id)
    .bind(actor_name)
    .bind(Utc::now())
    .execute(pool)
    .await
    .with_context(|| format!("inserting audit entry `{} {}`", entity, action))?;
    Ok(())
}
