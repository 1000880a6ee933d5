pub use configuration::*;
pub use startup::FeedstandApp;
pub use telemetry::setup_tracing;

mod configuration;
mod startup;
mod telemetry;
