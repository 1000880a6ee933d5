use std::future::{
    ready,
    Ready,
};

use actix_web::dev::Payload;
use actix_web::http::header::HeaderMap;
use actix_web::{
    FromRequest,
    HttpRequest,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::repository::users::{
    self,
    User,
};
use crate::routes::ApiError;

/// The header upstream auth middleware attaches the authenticated caller id to.
pub const CALLER_ID_HEADER: &str = "X-Caller-Id";

/// The authenticated caller id extracted from the request.
///
/// Extraction only parses the header: the matching user record is loaded
/// per-request by [`resolve_caller`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CallerId(pub Uuid);

impl FromRequest for CallerId {
    type Error = ApiError;
    type Future = Ready<Result<CallerId, ApiError>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(caller_id_from_headers(req.headers()))
    }
}

fn caller_id_from_headers(headers: &HeaderMap) -> Result<CallerId, ApiError> {
    let raw_id = headers
        .get(CALLER_ID_HEADER)
        .ok_or(AuthError::MissingCallerId)?
        .to_str()
        .map_err(|_| AuthError::MissingCallerId)?;
    let id = Uuid::parse_str(raw_id).map_err(|_| AuthError::MissingCallerId)?;
    Ok(CallerId(id))
}

/// Load the caller's persisted record.
///
/// A well-formed caller id without a matching record means the auth token and
/// the store disagree: that is `Unauthorized`, not `NotFound`.
#[tracing::instrument(name = "resolving caller identity", skip(pool))]
pub async fn resolve_caller(pool: &PgPool, caller_id: CallerId) -> Result<User, ApiError> {
    users::find_by_id(pool, caller_id.0)
        .await
        .map_err(|source| AuthError::DatabaseError { source })?
        .ok_or(AuthError::UnknownCaller)
        .map_err(ApiError::from)
}
