pub use errors::{
    ApiError,
    FieldError,
    FieldErrors,
};
pub use health_check::health_check;
pub use newsletters::*;
pub use users::*;

mod errors;
mod health_check;
mod newsletters;
mod users;
