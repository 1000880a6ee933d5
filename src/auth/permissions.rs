use crate::auth::AuthError;
use crate::repository::users::User;

/// The caller's effective authority for the current request.
///
/// `only_himself` and `is_super` are derived once per request and are
/// mutually exclusive: a super grant that is still pending confirmation
/// behaves like an ordinary account until confirmed.
#[derive(Debug)]
pub struct Permission {
    pub caller: User,
    pub only_himself: bool,
    pub is_super: bool,
}

impl Permission {
    /// Derive the caller's authority flags.
    ///
    /// With `block_on_pending_password` set (the default for every gated
    /// action), a caller holding a forced password reset is rejected before
    /// any resource is touched.
    pub fn evaluate(caller: User, block_on_pending_password: bool) -> Result<Permission, AuthError> {
        if block_on_pending_password && caller.pending_password {
            return Err(AuthError::PendingPasswordChange);
        }
        let is_super = caller.is_super && !caller.pending_confirm;
        Ok(Permission {
            only_himself: !is_super,
            is_super,
            caller,
        })
    }

    /// Whether the caller may act on a resource owned by `owner_id`.
    pub fn may_act_on(&self, owner_id: uuid::Uuid) -> bool {
        !self.only_himself || self.caller.id == owner_id
    }
}
