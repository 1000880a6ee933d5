pub use entity_name::EntityName;
pub use errors::MalformedInput;
pub use feed_url::FeedUrl;
pub use password::Password;
pub use user_email::UserEmail;

mod entity_name;
mod errors;
mod feed_url;
mod password;
mod user_email;
