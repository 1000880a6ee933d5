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
    Password,
    UserEmail,
};
use crate::pagination::{
    Page,
    PageFilter,
};
use crate::repository::users::{
    self,
    NewUser,
    UserChanges,
};
use crate::routes::{
    ApiError,
    FieldError,
    FieldErrors,
};

#[derive(Deserialize)]
pub struct NewUserData {
    name: String,
    email: String,
    password: String,
    pending_confirm: Option<bool>,
}

#[derive(Deserialize)]
pub struct EditUserData {
    name: String,
    email: String,
    password: Option<String>,
    is_super: Option<bool>,
    pending_confirm: Option<bool>,
}

#[derive(Deserialize)]
pub struct PasswordData {
    password: String,
}

#[tracing::instrument(name = "listing users", skip(filter, pool))]
pub async fn list_users(
    filter: web::Query<PageFilter>,
    pool: web::Data<PgPool>,
    caller_id: CallerId,
) -> Result<HttpResponse, ApiError> {
    let caller = resolve_caller(pool.get_ref(), caller_id).await?;
    let permission = Permission::evaluate(caller, true)?;

    let filter = filter.into_inner();
    // A restricted caller only ever sees himself: a degenerate one-item page.
    // `logged_user` opts into the same view.
    if permission.only_himself || filter.logged_user {
        return Ok(HttpResponse::Ok().json(Page::single(permission.caller)));
    }
    let rows = users::find_all(pool.get_ref(), &filter).await?;
    let total = users::count(pool.get_ref(), &filter).await?;
    Ok(HttpResponse::Ok().json(Page::from_rows(rows, total as u64, &filter)))
}

#[tracing::instrument(name = "reading user", skip(pool))]
pub async fn get_user(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    caller_id: CallerId,
) -> Result<HttpResponse, ApiError> {
    let caller = resolve_caller(pool.get_ref(), caller_id).await?;
    let permission = Permission::evaluate(caller, true)?;

    let id = id.into_inner();
    // The target resource is a user, so for a restricted caller the identity
    // comparison comes before any load: the record is already in hand.
    if permission.only_himself {
        if id != permission.caller.id {
            return Err(ApiError::Forbidden);
        }
        return Ok(HttpResponse::Ok().json(Page::single(permission.caller)));
    }

    let user = users::find_by_id(pool.get_ref(), id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(Page::single(user)))
}

#[tracing::instrument(name = "creating user", skip(data, pool))]
pub async fn create_user(
    data: web::Json<NewUserData>,
    pool: web::Data<PgPool>,
    caller_id: CallerId,
) -> Result<HttpResponse, ApiError> {
    let data = validate_new(data.into_inner())?;
    let caller = resolve_caller(pool.get_ref(), caller_id).await?;
    let permission = Permission::evaluate(caller, true)?;

    // A new user record never belongs to the caller, so a restricted caller
    // cannot create one.
    if permission.only_himself {
        return Err(ApiError::Forbidden);
    }

    let password_hash = data.password.hash()?;
    let created = users::insert(
        pool.get_ref(),
        &NewUser {
            name: data.name,
            email: data.email,
            password_hash,
            pending_confirm: data.pending_confirm,
        },
    )
    .await?;
    record_activity(
        pool.get_ref(),
        format!("User #{} ({})", created.id, created.name),
        "was created",
        &permission.caller,
    );
    Ok(HttpResponse::Created().json(created))
}

#[tracing::instrument(name = "editing user", skip(data, pool))]
pub async fn edit_user(
    id: web::Path<Uuid>,
    data: web::Json<EditUserData>,
    pool: web::Data<PgPool>,
    caller_id: CallerId,
) -> Result<HttpResponse, ApiError> {
    let data = validate_edit(data.into_inner())?;
    let caller = resolve_caller(pool.get_ref(), caller_id).await?;
    let permission = Permission::evaluate(caller, true)?;

    let existing = users::find_by_id(pool.get_ref(), id.into_inner())
        .await?
        .ok_or(ApiError::NotFound)?;
    if !permission.may_act_on(existing.id) {
        return Err(ApiError::Forbidden);
    }

    let is_super = data.is_super.unwrap_or(existing.is_super);
    let pending_confirm = data.pending_confirm.unwrap_or(existing.pending_confirm);
    // Privilege flags cannot be self-assigned: that is what promote is for.
    if permission.only_himself
        && (is_super != existing.is_super || pending_confirm != existing.pending_confirm)
    {
        return Err(ApiError::Forbidden);
    }

    let password_hash = match &data.password {
        Some(password) => Some(password.hash()?),
        None => None,
    };
    let updated = users::update(
        pool.get_ref(),
        existing.id,
        &UserChanges {
            name: data.name,
            email: data.email,
            password_hash,
            is_super,
            pending_confirm,
        },
    )
    .await?;
    record_activity(
        pool.get_ref(),
        format!("User #{} ({})", updated.id, updated.name),
        "was edited",
        &permission.caller,
    );
    Ok(HttpResponse::Ok().json(updated))
}

#[tracing::instrument(name = "activating user", skip(pool))]
pub async fn activate_user(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    caller_id: CallerId,
) -> Result<HttpResponse, ApiError> {
    set_user_active(id.into_inner(), pool, caller_id, true).await
}

#[tracing::instrument(name = "deactivating user", skip(pool))]
pub async fn deactivate_user(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    caller_id: CallerId,
) -> Result<HttpResponse, ApiError> {
    set_user_active(id.into_inner(), pool, caller_id, false).await
}

#[tracing::instrument(name = "promoting user", skip(pool))]
pub async fn promote_user(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    caller_id: CallerId,
) -> Result<HttpResponse, ApiError> {
    let caller = resolve_caller(pool.get_ref(), caller_id).await?;
    let permission = Permission::evaluate(caller, true)?;

    if !permission.is_super {
        return Err(ApiError::Forbidden);
    }
    let id = id.into_inner();
    if id == permission.caller.id {
        return Err(ApiError::BadRequest {
            message: "an account cannot promote itself".to_string(),
        });
    }

    users::find_by_id(pool.get_ref(), id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let promoted = users::promote(pool.get_ref(), id).await?;
    record_activity(
        pool.get_ref(),
        format!("User #{} ({})", promoted.id, promoted.name),
        "was promoted",
        &permission.caller,
    );
    Ok(HttpResponse::Ok().json(promoted))
}

/// Complete a password change, lifting a pending forced reset.
///
/// This is the one action evaluated without the pending-password gate:
/// it must stay reachable for a blocked caller.
#[tracing::instrument(name = "changing user password", skip(data, pool))]
pub async fn change_password(
    id: web::Path<Uuid>,
    data: web::Json<PasswordData>,
    pool: web::Data<PgPool>,
    caller_id: CallerId,
) -> Result<HttpResponse, ApiError> {
    let password = validate_password(data.into_inner())?;
    let caller = resolve_caller(pool.get_ref(), caller_id).await?;
    let permission = Permission::evaluate(caller, false)?;

    let id = id.into_inner();
    if !permission.may_act_on(id) {
        return Err(ApiError::Forbidden);
    }
    users::find_by_id(pool.get_ref(), id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let password_hash = password.hash()?;
    let updated = users::replace_password(pool.get_ref(), id, &password_hash).await?;
    record_activity(
        pool.get_ref(),
        format!("User #{} ({})", updated.id, updated.name),
        "changed password",
        &permission.caller,
    );
    Ok(HttpResponse::Ok().json(updated))
}

#[tracing::instrument(name = "removing user", skip(pool))]
pub async fn remove_user(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    caller_id: CallerId,
) -> Result<HttpResponse, ApiError> {
    let caller = resolve_caller(pool.get_ref(), caller_id).await?;
    let permission = Permission::evaluate(caller, true)?;

    let id = id.into_inner();
    if permission.only_himself {
        if id != permission.caller.id {
            return Err(ApiError::Forbidden);
        }
        // Terminal branch: self-deletion must never fall through to the
        // generic path below.
        users::delete(pool.get_ref(), id).await?;
        record_activity(
            pool.get_ref(),
            format!("User #{} ({})", permission.caller.id, permission.caller.name),
            "was removed",
            &permission.caller,
        );
        return Ok(HttpResponse::NoContent().finish());
    }

    let target = users::find_by_id(pool.get_ref(), id)
        .await?
        .ok_or(ApiError::NotFound)?;
    users::delete(pool.get_ref(), target.id).await?;
    record_activity(
        pool.get_ref(),
        format!("User #{} ({})", target.id, target.name),
        "was removed",
        &permission.caller,
    );
    Ok(HttpResponse::NoContent().finish())
}

async fn set_user_active(
    id: Uuid,
    pool: web::Data<PgPool>,
    caller_id: CallerId,
    active: bool,
) -> Result<HttpResponse, ApiError> {
    let caller = resolve_caller(pool.get_ref(), caller_id).await?;
    let permission = Permission::evaluate(caller, true)?;

    let target = users::find_by_id(pool.get_ref(), id)
        .await?
        .ok_or(ApiError::NotFound)?;
    if !permission.may_act_on(target.id) {
        return Err(ApiError::Forbidden);
    }

    let updated = users::set_active(pool.get_ref(), target.id, active).await?;
    record_activity(
        pool.get_ref(),
        format!("User #{} ({})", updated.id, updated.name),
        if active {
            "was activated"
        } else {
            "was deactivated"
        },
        &permission.caller,
    );
    Ok(HttpResponse::Ok().json(updated))
}

struct ValidNewUser {
    name: EntityName,
    email: UserEmail,
    password: Password,
    pending_confirm: bool,
}

struct ValidEditUser {
    name: EntityName,
    email: UserEmail,
    password: Option<Password>,
    is_super: Option<bool>,
    pending_confirm: Option<bool>,
}

fn validate_new(data: NewUserData) -> Result<ValidNewUser, ApiError> {
    let name = EntityName::try_from(data.name);
    let email = UserEmail::try_from(data.email);
    let password = Password::try_from(data.password);
    match (name, email, password) {
        (Ok(name), Ok(email), Ok(password)) => Ok(ValidNewUser {
            name,
            email,
            password,
            pending_confirm: data.pending_confirm.unwrap_or(false),
        }),
        (name, email, password) => Err(field_errors(vec![
            name.err(),
            email.err(),
            password.err(),
        ])),
    }
}

fn validate_edit(data: EditUserData) -> Result<ValidEditUser, ApiError> {
    let name = EntityName::try_from(data.name);
    let email = UserEmail::try_from(data.email);
    let password = data.password.map(Password::try_from).transpose();
    match (name, email, password) {
        (Ok(name), Ok(email), Ok(password)) => Ok(ValidEditUser {
            name,
            email,
            password,
            is_super: data.is_super,
            pending_confirm: data.pending_confirm,
        }),
        (name, email, password) => Err(field_errors(vec![
            name.err(),
            email.err(),
            password.err(),
        ])),
    }
}

fn validate_password(data: PasswordData) -> Result<Password, ApiError> {
    Password::try_from(data.password).map_err(|e| field_errors(vec![Some(e)]))
}

fn field_errors(errors: Vec<Option<crate::domain::MalformedInput>>) -> ApiError {
    ApiError::ValidationFailed {
        errors: FieldErrors(
            errors
                .into_iter()
                .flatten()
                .map(FieldError::from)
                .collect(),
        ),
    }
}
