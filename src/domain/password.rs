use std::convert::TryFrom;

use argon2::password_hash::SaltString;
use argon2::{
    Argon2,
    PasswordHasher,
};

use crate::domain::errors::MalformedInput;

const MIN_LENGTH: usize = 8;
const MAX_LENGTH: usize = 128;

/// A plaintext password accepted from a request body.
///
/// It never reaches the store as-is: [`Password::hash`] produces the
/// argon2 PHC string persisted instead.
#[derive(Clone)]
pub struct Password(String);

impl TryFrom<String> for Password {
    type Error = MalformedInput;

    fn try_from(password: String) -> Result<Self, Self::Error> {
        let length = password.chars().count();
        if length < MIN_LENGTH || length > MAX_LENGTH {
            Err(MalformedInput::InvalidPassword {
                message: format!(
                    "password must be between {} and {} characters",
                    MIN_LENGTH, MAX_LENGTH
                ),
            })
        } else {
            Ok(Self(password))
        }
    }
}

impl Password {
    pub fn hash(&self) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        Ok(Argon2::default()
            .hash_password(self.0.as_bytes(), &salt)?
            .to_string())
    }
}

// Keep the plaintext out of request traces.
impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(*****)")
    }
}
