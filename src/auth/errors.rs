use custom_error::custom_error;

custom_error! {
///! Error resolving or gating the authenticated caller.
pub AuthError
    MissingCallerId = "missing or malformed caller identity header",
    UnknownCaller = "the caller identity does not match any user record",
    PendingPasswordChange = "a pending password change must be completed first",
    DatabaseError{source: sqlx::Error} = "{source}",
}
