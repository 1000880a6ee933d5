use feedstand::app::{
    load_configuration,
    setup_tracing,
    FeedstandApp,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    setup_tracing("feedstand".into(), "info".into());
    let configuration = load_configuration().expect("error loading configuration");
    let app = FeedstandApp::from(configuration).await?;
    app.server?.await
}
