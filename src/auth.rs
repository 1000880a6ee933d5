pub use caller::{
    resolve_caller,
    CallerId,
    CALLER_ID_HEADER,
};
pub use errors::AuthError;
pub use permissions::Permission;

mod caller;
mod errors;
mod permissions;
