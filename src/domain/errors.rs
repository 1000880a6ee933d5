use custom_error::custom_error;

custom_error! {
///! Custom error for a request body field that fails validation.
pub MalformedInput
    InvalidName{message:String} = "{message}",
    InvalidEmail{message:String} = "{message}",
    InvalidPassword{message:String} = "{message}",
    InvalidUrl{message:String} = "{message}",
}

impl MalformedInput {
    /// The request body field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            MalformedInput::InvalidName { .. } => "name",
            MalformedInput::InvalidEmail { .. } => "email",
            MalformedInput::InvalidPassword { .. } => "password",
            MalformedInput::InvalidUrl { .. } => "address",
        }
    }
}
