use std::convert::TryFrom;

use actix_web::{
    web,
    HttpResponse,
};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::audit::record_activity;
use crate::auth::{
    resolve_caller,
    CallerId,
    Permission,
};
use crate::domain::{
    EntityName,
    FeedUrl,
};
use crate::pagination::{
    Page,
    PageFilter,
};
use crate::repository::feeds::{
    self,
    Feed,
    NewFeed,
};
use crate::repository::newsletters::{
    self,
    NewNewsletter,
    Newsletter,
};
use crate::routes::{
    ApiError,
    FieldError,
    FieldErrors,
};

#[derive(Deserialize)]
pub struct NewsletterData {
    name: String,
    user_id: Option<Uuid>,
}

struct ValidNewsletterData {
    name: EntityName,
    user_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct FeedData {
    title: String,
    address: String,
}

/// A newsletter together with its source feeds, for the detail view.
#[derive(serde::Serialize)]
pub struct NewsletterDetail {
    #[serde(flatten)]
    pub newsletter: Newsletter,
    pub feeds: Vec<Feed>,
}

#[tracing::instrument(name = "listing newsletters", skip(filter, pool))]
pub async fn list_newsletters(
    filter: web::Query<PageFilter>,
    pool: web::Data<PgPool>,
    caller_id: CallerId,
) -> Result<HttpResponse, ApiError> {
    let caller = resolve_caller(pool.get_ref(), caller_id).await?;
    let permission = Permission::evaluate(caller, true)?;

    let mut filter = filter.into_inner();
    // A restricted caller only ever sees his own newsletters, whatever the
    // requested owner filter says. `logged_user` opts into the same view.
    if permission.only_himself || filter.logged_user {
        filter.user_id = Some(permission.caller.id);
    }

    let rows = newsletters::find_all(pool.get_ref(), &filter).await?;
    let total = newsletters::count(pool.get_ref(), &filter).await?;
    Ok(HttpResponse::Ok().json(Page::from_rows(rows, total as u64, &filter)))
}

#[tracing::instrument(name = "reading newsletter", skip(pool))]
pub async fn get_newsletter(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    caller_id: CallerId,
) -> Result<HttpResponse, ApiError> {
    let caller = resolve_caller(pool.get_ref(), caller_id).await?;
    let permission = Permission::evaluate(caller, true)?;

    let newsletter = load_gated(pool.get_ref(), id.into_inner(), &permission).await?;
    let feeds = feeds::find_by_newsletter(pool.get_ref(), newsletter.id).await?;
    Ok(HttpResponse::Ok().json(Page::single(NewsletterDetail { newsletter, feeds })))
}

#[tracing::instrument(name = "creating newsletter", skip(data, pool))]
pub async fn create_newsletter(
    data: web::Json<NewsletterData>,
    pool: web::Data<PgPool>,
    caller_id: CallerId,
) -> Result<HttpResponse, ApiError> {
    let data = validate(data.into_inner())?;
    let caller = resolve_caller(pool.get_ref(), caller_id).await?;
    let permission = Permission::evaluate(caller, true)?;

    // A missing owner defaults to the caller itself.
    let owner_id = data.user_id.unwrap_or(permission.caller.id);
    if !permission.may_act_on(owner_id) {
        return Err(ApiError::Forbidden);
    }

    let created = newsletters::insert(
        pool.get_ref(),
        &NewNewsletter {
            name: data.name,
            user_id: owner_id,
        },
    )
    .await?;
    record_activity(
        pool.get_ref(),
        format!("Newsletter #{} ({})", created.id, created.name),
        "was created",
        &permission.caller,
    );
    Ok(HttpResponse::Created().json(created))
}

/// Attach a source feed to a newsletter, gated like any other edit of it.
#[tracing::instrument(name = "attaching feed to newsletter", skip(data, pool))]
pub async fn create_feed(
    id: web::Path<Uuid>,
    data: web::Json<FeedData>,
    pool: web::Data<PgPool>,
    caller_id: CallerId,
) -> Result<HttpResponse, ApiError> {
    let (title, address) = validate_feed(data.into_inner())?;
    let caller = resolve_caller(pool.get_ref(), caller_id).await?;
    let permission = Permission::evaluate(caller, true)?;

    let newsletter = load_gated(pool.get_ref(), id.into_inner(), &permission).await?;
    let created = feeds::insert(
        pool.get_ref(),
        &NewFeed {
            newsletter_id: newsletter.id,
            title,
            address,
        },
    )
    .await?;
    record_activity(
        pool.get_ref(),
        format!(
            "Feed #{} ({}) of newsletter #{}",
            created.id, created.title, newsletter.id
        ),
        "was attached",
        &permission.caller,
    );
    Ok(HttpResponse::Created().json(created))
}

#[tracing::instrument(name = "editing newsletter", skip(data, pool))]
pub async fn edit_newsletter(
    id: web::Path<Uuid>,
    data: web::Json<NewsletterData>,
    pool: web::Data<PgPool>,
    caller_id: CallerId,
) -> Result<HttpResponse, ApiError> {
    let data = validate(data.into_inner())?;
    let caller = resolve_caller(pool.get_ref(), caller_id).await?;
    let permission = Permission::evaluate(caller, true)?;

    let existing = load_gated(pool.get_ref(), id.into_inner(), &permission).await?;
    let owner_id = data.user_id.unwrap_or(existing.user_id);
    // A restricted caller cannot hand his newsletter over to someone else.
    if !permission.may_act_on(owner_id) {
        return Err(ApiError::Forbidden);
    }

    let updated = newsletters::update(pool.get_ref(), existing.id, &data.name, owner_id).await?;
    record_activity(
        pool.get_ref(),
        format!("Newsletter #{} ({})", updated.id, updated.name),
        "was edited",
        &permission.caller,
    );
    Ok(HttpResponse::Ok().json(updated))
}

#[tracing::instrument(name = "activating newsletter", skip(pool))]
pub async fn activate_newsletter(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    caller_id: CallerId,
) -> Result<HttpResponse, ApiError> {
    set_newsletter_active(id.into_inner(), pool, caller_id, true).await
}

#[tracing::instrument(name = "deactivating newsletter", skip(pool))]
pub async fn deactivate_newsletter(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    caller_id: CallerId,
) -> Result<HttpResponse, ApiError> {
    set_newsletter_active(id.into_inner(), pool, caller_id, false).await
}

#[tracing::instrument(name = "removing newsletter", skip(pool))]
pub async fn remove_newsletter(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    caller_id: CallerId,
) -> Result<HttpResponse, ApiError> {
    let caller = resolve_caller(pool.get_ref(), caller_id).await?;
    let permission = Permission::evaluate(caller, true)?;

    let newsletter = load_gated(pool.get_ref(), id.into_inner(), &permission).await?;
    newsletters::delete(pool.get_ref(), newsletter.id).await?;
    record_activity(
        pool.get_ref(),
        format!("Newsletter #{} ({})", newsletter.id, newsletter.name),
        "was removed",
        &permission.caller,
    );
    Ok(HttpResponse::NoContent().finish())
}

async fn set_newsletter_active(
    id: Uuid,
    pool: web::Data<PgPool>,
    caller_id: CallerId,
    active: bool,
) -> Result<HttpResponse, ApiError> {
    let caller = resolve_caller(pool.get_ref(), caller_id).await?;
    let permission = Permission::evaluate(caller, true)?;

    let newsletter = load_gated(pool.get_ref(), id, &permission).await?;
    let updated = newsletters::set_active(pool.get_ref(), newsletter.id, active).await?;
    record_activity(
        pool.get_ref(),
        format!("Newsletter #{} ({})", updated.id, updated.name),
        if active {
            "was activated"
        } else {
            "was deactivated"
        },
        &permission.caller,
    );
    Ok(HttpResponse::Ok().json(updated))
}

/// Load the target newsletter, checking existence before ownership.
async fn load_gated(
    pool: &PgPool,
    id: Uuid,
    permission: &Permission,
) -> Result<Newsletter, ApiError> {
    let newsletter = newsletters::find_by_id(pool, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    if !permission.may_act_on(newsletter.user_id) {
        return Err(ApiError::Forbidden);
    }
    Ok(newsletter)
}

fn validate_feed(data: FeedData) -> Result<(EntityName, FeedUrl), ApiError> {
    let title = EntityName::try_from(data.title);
    let address = FeedUrl::try_from(data.address);
    match (title, address) {
        (Ok(title), Ok(address)) => Ok((title, address)),
        (title, address) => Err(ApiError::ValidationFailed {
            errors: FieldErrors(
                vec![title.err(), address.err()]
                    .into_iter()
                    .flatten()
                    .map(FieldError::from)
                    .collect(),
            ),
        }),
    }
}

fn validate(data: NewsletterData) -> Result<ValidNewsletterData, ApiError> {
    match EntityName::try_from(data.name) {
        Ok(name) => Ok(ValidNewsletterData {
            name,
            user_id: data.user_id,
        }),
        Err(e) => Err(ApiError::ValidationFailed {
            errors: FieldErrors(vec![e.into()]),
        }),
    }
}
