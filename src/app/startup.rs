use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::{
    web,
    App,
    HttpServer,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_actix_web::TracingLogger;

use crate::app::configuration::{
    DatabaseSettings,
    Settings,
};
use crate::routes::*;

pub struct FeedstandApp {
    pub server: Result<Server, std::io::Error>,
    pub port: u16,
}

impl FeedstandApp {
    pub async fn from(configuration: Settings) -> Result<FeedstandApp, std::io::Error> {
        let tcp_listener = TcpListener::bind(configuration.application.binding_address())?;
        let port = tcp_listener.local_addr()?.port();
        let postgres_pool =
            web::Data::new(FeedstandApp::postgres_pool(configuration.database).await);

        // HttpServer handles all transport level concerns
        let server = HttpServer::new(move || {
            // App is where all the application logic lives: routing, middlewares, request
            // handlers, etc.
            App::new()
                .wrap(TracingLogger::default())
                .route("/health_check", web::get().to(health_check))
                .route("/newsletters", web::get().to(list_newsletters))
                .route("/newsletters", web::post().to(create_newsletter))
                .route("/newsletters/{id}", web::get().to(get_newsletter))
                .route("/newsletters/{id}", web::put().to(edit_newsletter))
                .route("/newsletters/{id}", web::delete().to(remove_newsletter))
                .route("/newsletters/{id}/feeds", web::post().to(create_feed))
                .route(
                    "/newsletters/{id}/activate",
                    web::post().to(activate_newsletter),
                )
                .route(
                    "/newsletters/{id}/deactivate",
                    web::post().to(deactivate_newsletter),
                )
                .route("/users", web::get().to(list_users))
                .route("/users", web::post().to(create_user))
                .route("/users/{id}", web::get().to(get_user))
                .route("/users/{id}", web::put().to(edit_user))
                .route("/users/{id}", web::delete().to(remove_user))
                .route("/users/{id}/activate", web::post().to(activate_user))
                .route("/users/{id}/deactivate", web::post().to(deactivate_user))
                .route("/users/{id}/promote", web::post().to(promote_user))
                .route("/users/{id}/password", web::post().to(change_password))
                .app_data(postgres_pool.clone())
        })
        .backlog(configuration.application.max_pending_connections)
        .listen(tcp_listener)
        .map(HttpServer::run);
        Ok(FeedstandApp { port, server })
    }

    pub async fn postgres_pool(database_config: DatabaseSettings) -> PgPool {
        PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_secs(
                database_config.connect_timeout_seconds,
            ))
            .max_connections(database_config.max_db_connections)
            .connect_with(database_config.database_connection_options())
            .await
            .unwrap_or_else(|_| {
                panic!(
                    "error creating postgres connection pool from config: {:?}",
                    database_config
                )
            })
    }
}
