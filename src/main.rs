mod api;
mod config;
mod database;
mod middleware;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::services::upload_service;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // All configuration is read once; nothing below touches the environment
    let config = Config::from_env().expect("Invalid environment configuration");

    log::info!("🚀 Starting Trip Budget Service...");
    log::info!("📊 Database: {}", config.database_url);

    // Uploaded avatars live on local disk and are served back at /uploads
    std::fs::create_dir_all(upload_service::UPLOAD_DIR)
        .expect("Failed to create uploads directory");

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&config.database_url)
        .await
        .expect("Failed to connect to MongoDB");

    let db_data = web::Data::new(db);
    let config_data = web::Data::new(config.clone());

    log::info!("✅ MongoDB connected successfully");

    let host = config.host;
    let port = config.port;

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://127.0.0.1:3000")
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .supports_credentials()
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .app_data(config_data.clone())
            // Malformed JSON bodies answer in the same error shape as the handlers
            .app_data(web::JsonConfig::default().error_handler(utils::error::json_error_handler))
            .wrap(cors)
            .wrap(Logger::default())
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
            // Health check
            .route("/health", web::get().to(api::health::health_check))
            // Profile of the authenticated user - Requires JWT
            .service(
                web::scope("/api/auth")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("/user", web::get().to(api::auth::get_user)),
            )
            // Avatar upload - Requires JWT
            .service(
                web::scope("/api/user")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("/avatar", web::post().to(api::users::upload_avatar)),
            )
            // Trips and expenses - Requires JWT
            .service(
                web::scope("/api/trips")
                    .wrap(middleware::auth::AuthMiddleware)
                    .service(api::trips::list_trips)
                    .service(api::trips::create_trip)
                    .service(api::trips::add_expense),
            )
            // Public register/login (broad /api scope, MUST stay after the
            // protected /api/* scopes above)
            .service(
                web::scope("/api")
                    .route("/register", web::post().to(api::auth::register))
                    .route("/login", web::post().to(api::auth::login)),
            )
            // Stored avatars served as static files
            .service(Files::new("/uploads", upload_service::UPLOAD_DIR))
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}
