pub mod feeds;
pub mod newsletters;
pub mod users;
