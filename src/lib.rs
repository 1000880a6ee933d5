//! The `feedstand` library: a newsletter/feed subscription management backend.

pub mod app;
pub mod audit;
pub mod auth;
pub mod domain;
pub mod pagination;
pub mod repository;
pub mod routes;
