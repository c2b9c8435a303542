use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use studysheet_server::{
    app_state::AppState,
    config::Config,
    handlers::{export_pdf, extract_pdf, generate, health_check, normalize},
    middleware::RequestIdMiddleware,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env();
    config.warn_if_incomplete();

    let bind_address = (config.web_server_host.clone(), config.web_server_port);
    let max_upload_bytes = config.max_upload_bytes;
    let state = AppState::new(config);

    log::info!(
        "Starting HTTP server on {}:{}",
        bind_address.0,
        bind_address.1
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::PayloadConfig::new(max_upload_bytes))
            .app_data(web::JsonConfig::default().limit(max_upload_bytes))
            .wrap(RequestIdMiddleware)
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .service(health_check)
            .service(generate)
            .service(normalize)
            .service(extract_pdf)
            .service(export_pdf)
    })
    .bind(bind_address)?
    .run()
    .await
}
