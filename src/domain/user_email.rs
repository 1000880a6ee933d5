use std::convert::TryFrom;

use validator::validate_email;

use crate::domain::errors::MalformedInput;

#[derive(Clone, Debug)]
pub struct UserEmail(String);

impl AsRef<str> for UserEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserEmail {
    type Error = MalformedInput;

    fn try_from(email: String) -> Result<Self, Self::Error> {
        if validate_email(email.clone()) {
            Ok(UserEmail(email))
        } else {
            Err(MalformedInput::InvalidEmail {
                message: format!("invalid email: {}", email),
            })
        }
    }
}
